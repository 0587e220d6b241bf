use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use ulid::Ulid;

use crate::account::models::PublicUser;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 60 * 60; // 1 hour

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionTokenHeader {
    pub alg: String,
    pub typ: String,
}

impl SessionTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub iss: String,
    /// User id.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

/// Mints and validates signed session tokens for authenticated identities.
pub trait TokenIssuer: Send + Sync {
    /// # Errors
    /// Returns an error if the claims cannot be serialized or signed.
    fn issue(&self, user: &PublicUser) -> Result<String, TokenError>;

    /// # Errors
    /// Returns an error if the token is malformed, the signature does not
    /// verify, or the token has expired.
    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError>;
}

/// Compact HS256 JWT issuer. Self-contained tokens verified offline; the
/// MAC comparison is constant-time.
pub struct HmacTokenIssuer {
    key: SecretString,
    issuer: String,
    ttl_seconds: i64,
}

impl HmacTokenIssuer {
    #[must_use]
    pub fn new(key: SecretString, issuer: String) -> Self {
        Self {
            key,
            issuer,
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }
}

impl TokenIssuer for HmacTokenIssuer {
    fn issue(&self, user: &PublicUser) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now,
            exp: now + self.ttl_seconds,
            jti: Ulid::new().to_string(),
        };

        let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(
            &SessionTokenHeader::hs256(),
        )?);
        let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&claims)?);
        let signing_input = format!("{header}.{payload}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = Base64UrlUnpadded::encode_string(mac.finalize().into_bytes().as_slice());

        Ok(format!("{signing_input}.{signature}"))
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::TokenFormat);
        };

        let header_bytes =
            Base64UrlUnpadded::decode_vec(header).map_err(|_| TokenError::Base64)?;
        let parsed_header: SessionTokenHeader = serde_json::from_slice(&header_bytes)?;
        if parsed_header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlg(parsed_header.alg));
        }

        let signature_bytes =
            Base64UrlUnpadded::decode_vec(signature).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac()?;
        mac.update(format!("{header}.{payload}").as_bytes());
        mac.verify_slice(&signature_bytes)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload_bytes =
            Base64UrlUnpadded::decode_vec(payload).map_err(|_| TokenError::Base64)?;
        let claims: SessionClaims = serde_json::from_slice(&payload_bytes)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn issuer() -> HmacTokenIssuer {
        HmacTokenIssuer::new(
            SecretString::from("test-signing-key".to_string()),
            "konto.test".to_string(),
        )
    }

    fn sample_user() -> PublicUser {
        PublicUser {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issue_then_verify() {
        let issuer = issuer();
        let user = sample_user();

        let token = issuer.issue(&user).expect("issue token");
        let claims = issuer.verify(&token).expect("verify token");

        assert_eq!(claims.iss, "konto.test");
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > claims.iat);
        assert!(Ulid::from_string(&claims.jti).is_ok());
    }

    #[test]
    fn tampered_payload_rejected() {
        let issuer = issuer();
        let token = issuer.issue(&sample_user()).expect("issue token");

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_claims = SessionClaims {
            iss: "konto.test".to_string(),
            sub: Uuid::new_v4().to_string(),
            username: "mallory".to_string(),
            iat: 0,
            exp: i64::MAX,
            jti: Ulid::new().to_string(),
        };
        let forged = Base64UrlUnpadded::encode_string(
            &serde_json::to_vec(&forged_claims).expect("serialize"),
        );
        parts[1] = forged.as_str();
        let tampered = parts.join(".");

        assert!(matches!(
            issuer.verify(&tampered),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn wrong_key_rejected() {
        let token = issuer().issue(&sample_user()).expect("issue token");
        let other = HmacTokenIssuer::new(
            SecretString::from("a-different-key".to_string()),
            "konto.test".to_string(),
        );

        assert!(matches!(
            other.verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn expired_token_rejected() {
        let issuer = issuer().with_ttl_seconds(-10);
        let token = issuer.issue(&sample_user()).expect("issue token");

        assert!(matches!(issuer.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn malformed_token_rejected() {
        let issuer = issuer();

        assert!(matches!(
            issuer.verify("not-a-token"),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            issuer.verify("a.b.c.d"),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            issuer.verify("!!.!!.!!"),
            Err(TokenError::Base64)
        ));
    }
}
