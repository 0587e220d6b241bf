use std::sync::Arc;

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use rand::{rngs::OsRng, RngCore};
use tracing::{debug, error};
use uuid::Uuid;

use crate::account::{
    error::AccountError,
    hasher::PasswordHasher,
    models::{PublicUser, SessionGrant, User},
    notifier::ResetNotifier,
    store::CredentialStore,
    token::TokenIssuer,
};

const RESET_CODE_BYTES: usize = 32;

/// The credential lifecycle engines behind the HTTP layer: registration,
/// authentication, the three-phase reset protocol, and authenticated
/// password change.
///
/// Every operation is a short-lived unit of work; the only shared mutable
/// state is the [`CredentialStore`]. Stored passwords are mutated only here,
/// and only after all validation for the operation has passed.
pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    notifier: Arc<dyn ResetNotifier>,
}

impl AccountService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            notifier,
        }
    }

    /// Register a new user. Duplicate checks run before any mutation; the
    /// store's unique constraints backstop the remaining race window.
    ///
    /// # Errors
    /// `DuplicateUsername` or `DuplicateEmail` when either is already taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, AccountError> {
        if self.store.exists_by_username(username).await? {
            return Err(AccountError::DuplicateUsername);
        }
        if self.store.exists_by_email(email).await? {
            return Err(AccountError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(password)?;
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            reset_code: None,
            created_at: Utc::now(),
        };
        self.store.save(&user).await?;

        debug!(user_id = %user.id, username = %user.username, "user registered");

        Ok(user.into())
    }

    /// Verify username + password and mint a session grant. No stored state
    /// is mutated. An unknown username and a wrong password are
    /// indistinguishable to the caller.
    ///
    /// # Errors
    /// `InvalidCredentials` on either failure mode.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionGrant, AccountError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            return Err(AccountError::InvalidCredentials);
        };

        if !self.hasher.matches(password, &user.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        let user = PublicUser::from(user);
        let token = self
            .tokens
            .issue(&user)
            .map_err(|err| AccountError::Internal(err.into()))?;

        Ok(SessionGrant { token, user })
    }

    /// Reset phase 1: generate a fresh opaque code for the account behind
    /// `email`, superseding any previous code, and hand it to the notifier.
    /// Delivery is fire-and-forget; a delivery failure is logged, not
    /// surfaced.
    ///
    /// # Errors
    /// `UnknownEmail` when no account matches.
    pub async fn request_reset(&self, email: &str) -> Result<(), AccountError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            return Err(AccountError::UnknownEmail);
        };

        let code = generate_reset_code()?;
        // Targeted update: a password change landing between the read and
        // this write is never clobbered by the stale row.
        self.store.set_reset_code(user.id, &code).await?;

        if let Err(err) = self.notifier.send_reset_instructions(&user, &code) {
            error!(email = %user.email, "failed to send reset instructions: {err:?}");
        }

        Ok(())
    }

    /// Reset phase 2: read-only validity check. Does not consume the code,
    /// so the caller can confirm it before asking the user for a new
    /// password.
    ///
    /// # Errors
    /// `InvalidResetCode` when no account holds the code.
    pub async fn verify_reset_code(&self, code: &str) -> Result<PublicUser, AccountError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AccountError::InvalidResetCode);
        }

        match self.store.find_by_reset_code(code).await? {
            Some(user) => Ok(user.into()),
            None => Err(AccountError::InvalidResetCode),
        }
    }

    /// Reset phase 3: set the new password and consume the code in one
    /// atomic store update. The confirmation check runs before any lookup,
    /// so a mismatch never touches the code.
    ///
    /// # Errors
    /// `PasswordMismatch` when the confirmation differs, `InvalidResetCode`
    /// when the code is unknown or already consumed.
    pub async fn complete_reset(
        &self,
        code: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AccountError> {
        if new_password != confirm_password {
            return Err(AccountError::PasswordMismatch);
        }

        let code = code.trim();
        if code.is_empty() {
            return Err(AccountError::InvalidResetCode);
        }

        let password_hash = self.hasher.hash(new_password)?;
        match self.store.consume_reset_code(code, &password_hash).await? {
            Some(user) => {
                debug!(user_id = %user.id, "password reset completed");
                Ok(())
            }
            None => Err(AccountError::InvalidResetCode),
        }
    }

    /// Authenticated password change. Leaves any pending reset code
    /// untouched; the reset flow is an independent channel.
    ///
    /// # Errors
    /// `PasswordMismatch`, `UserNotFound`, or `InvalidOldPassword`, checked
    /// in that order before any mutation.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AccountError> {
        if new_password != confirm_password {
            return Err(AccountError::PasswordMismatch);
        }

        let Some(user) = self.store.find_by_id(user_id).await? else {
            return Err(AccountError::UserNotFound);
        };

        if !self.hasher.matches(old_password, &user.password_hash) {
            return Err(AccountError::InvalidOldPassword);
        }

        let new_hash = self.hasher.hash(new_password)?;
        self.store.set_password_hash(user.id, &new_hash).await?;

        debug!(user_id = %user.id, "password changed");

        Ok(())
    }

    /// # Errors
    /// `UserNotFound` when the id does not resolve.
    pub async fn user(&self, user_id: Uuid) -> Result<PublicUser, AccountError> {
        match self.store.find_by_id(user_id).await? {
            Some(user) => Ok(user.into()),
            None => Err(AccountError::UserNotFound),
        }
    }

    /// # Errors
    /// `UserNotFound` when the id does not resolve.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AccountError> {
        if self.store.delete(user_id).await? {
            Ok(())
        } else {
            Err(AccountError::UserNotFound)
        }
    }
}

fn generate_reset_code() -> Result<String> {
    let mut bytes = [0u8; RESET_CODE_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate reset code")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{
        hasher::Argon2Hasher, notifier::LogResetNotifier, store::MemoryCredentialStore,
        token::HmacTokenIssuer,
    };
    use secrecy::SecretString;

    fn service() -> (AccountService, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = AccountService::new(
            store.clone(),
            Arc::new(Argon2Hasher),
            Arc::new(HmacTokenIssuer::new(
                SecretString::from("test-signing-key".to_string()),
                "konto.test".to_string(),
            )),
            Arc::new(LogResetNotifier),
        );
        (service, store)
    }

    async fn pending_code(store: &MemoryCredentialStore, email: &str) -> String {
        store
            .find_by_email(email)
            .await
            .expect("store lookup")
            .expect("user exists")
            .reset_code
            .expect("reset code pending")
    }

    #[tokio::test]
    async fn register_then_login() {
        let (service, _store) = service();
        let user = service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");
        assert_eq!(user.username, "alice");

        let grant = service.authenticate("alice", "pw1").await.expect("login");
        assert!(!grant.token.is_empty());
        assert_eq!(grant.user, user);

        assert!(matches!(
            service.authenticate("alice", "wrong").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            service.authenticate("nobody", "pw1").await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn registration_never_stores_plaintext() {
        let (service, store) = service();
        service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");

        let stored = store
            .find_by_username("alice")
            .await
            .expect("lookup")
            .expect("stored user");
        assert_ne!(stored.password_hash, "pw1");
        assert!(stored.password_hash.starts_with("$argon2"));
        assert!(stored.reset_code.is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_rejected() {
        let (service, store) = service();
        service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");

        assert!(matches!(
            service.register("alice", "other@x.com", "pw2").await,
            Err(AccountError::DuplicateUsername)
        ));
        assert!(matches!(
            service.register("bob", "a@x.com", "pw2").await,
            Err(AccountError::DuplicateEmail)
        ));

        // No second record was created under either key.
        assert!(store
            .find_by_email("other@x.com")
            .await
            .expect("lookup")
            .is_none());
        assert!(store
            .find_by_username("bob")
            .await
            .expect("lookup")
            .is_none());
    }

    #[tokio::test]
    async fn reset_request_supersedes_previous_code() {
        let (service, store) = service();
        service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");

        service.request_reset("a@x.com").await.expect("first reset");
        let first = pending_code(&store, "a@x.com").await;

        service
            .request_reset("a@x.com")
            .await
            .expect("second reset");
        let second = pending_code(&store, "a@x.com").await;

        assert_ne!(first, second);
        assert!(matches!(
            service.verify_reset_code(&first).await,
            Err(AccountError::InvalidResetCode)
        ));
        assert!(service.verify_reset_code(&second).await.is_ok());
    }

    #[tokio::test]
    async fn reset_request_leaves_password_alone() {
        let (service, store) = service();
        service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");
        let before = store
            .find_by_username("alice")
            .await
            .expect("lookup")
            .expect("stored user")
            .password_hash;

        service.request_reset("a@x.com").await.expect("reset");

        let after = store
            .find_by_username("alice")
            .await
            .expect("lookup")
            .expect("stored user")
            .password_hash;
        assert_eq!(before, after);
        assert!(service.authenticate("alice", "pw1").await.is_ok());
    }

    #[tokio::test]
    async fn reset_request_unknown_email_rejected() {
        let (service, _store) = service();
        assert!(matches!(
            service.request_reset("nobody@x.com").await,
            Err(AccountError::UnknownEmail)
        ));
    }

    #[tokio::test]
    async fn reset_code_is_single_use() {
        let (service, store) = service();
        service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");
        service.request_reset("a@x.com").await.expect("reset");
        let code = pending_code(&store, "a@x.com").await;

        service
            .complete_reset(&code, "pw2", "pw2")
            .await
            .expect("first completion");
        assert!(matches!(
            service.complete_reset(&code, "pw3", "pw3").await,
            Err(AccountError::InvalidResetCode)
        ));

        // The first completion won: pw2 authenticates, pw3 does not.
        assert!(service.authenticate("alice", "pw2").await.is_ok());
        assert!(service.authenticate("alice", "pw3").await.is_err());
    }

    #[tokio::test]
    async fn reset_mismatch_does_not_consume_code() {
        let (service, store) = service();
        service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");
        service.request_reset("a@x.com").await.expect("reset");
        let code = pending_code(&store, "a@x.com").await;

        assert!(matches!(
            service.complete_reset(&code, "x", "y").await,
            Err(AccountError::PasswordMismatch)
        ));

        // Code is still live and still redeemable.
        assert!(service.verify_reset_code(&code).await.is_ok());
        service
            .complete_reset(&code, "pw2", "pw2")
            .await
            .expect("completion after mismatch");
    }

    #[tokio::test]
    async fn full_reset_flow() {
        let (service, store) = service();
        service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");

        service.request_reset("a@x.com").await.expect("request");
        let code = pending_code(&store, "a@x.com").await;

        let verified = service.verify_reset_code(&code).await.expect("verify");
        assert_eq!(verified.email, "a@x.com");

        service
            .complete_reset(&code, "pw2", "pw2")
            .await
            .expect("complete");

        assert!(matches!(
            service.verify_reset_code(&code).await,
            Err(AccountError::InvalidResetCode)
        ));
        assert!(service.authenticate("alice", "pw1").await.is_err());
        assert!(service.authenticate("alice", "pw2").await.is_ok());
    }

    #[tokio::test]
    async fn change_password_rotates_credentials() {
        let (service, _store) = service();
        let user = service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");

        service
            .change_password(user.id, "pw1", "pw2", "pw2")
            .await
            .expect("change password");

        assert!(matches!(
            service.authenticate("alice", "pw1").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(service.authenticate("alice", "pw2").await.is_ok());
    }

    #[tokio::test]
    async fn change_password_failure_modes() {
        let (service, _store) = service();
        let user = service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");

        assert!(matches!(
            service.change_password(user.id, "pw1", "x", "y").await,
            Err(AccountError::PasswordMismatch)
        ));
        assert!(matches!(
            service
                .change_password(Uuid::new_v4(), "pw1", "pw2", "pw2")
                .await,
            Err(AccountError::UserNotFound)
        ));
        assert!(matches!(
            service.change_password(user.id, "wrong", "pw2", "pw2").await,
            Err(AccountError::InvalidOldPassword)
        ));

        // None of the failures touched the stored hash.
        assert!(service.authenticate("alice", "pw1").await.is_ok());
    }

    #[tokio::test]
    async fn change_password_leaves_reset_code_alone() {
        let (service, store) = service();
        let user = service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");
        service.request_reset("a@x.com").await.expect("reset");
        let code = pending_code(&store, "a@x.com").await;

        service
            .change_password(user.id, "pw1", "pw2", "pw2")
            .await
            .expect("change password");

        // Independent channels: the pending code survives the change.
        assert!(service.verify_reset_code(&code).await.is_ok());
    }

    #[tokio::test]
    async fn lookup_and_delete() {
        let (service, _store) = service();
        let user = service
            .register("alice", "a@x.com", "pw1")
            .await
            .expect("register");

        assert_eq!(service.user(user.id).await.expect("lookup"), user);

        service.delete_user(user.id).await.expect("delete");
        assert!(matches!(
            service.user(user.id).await,
            Err(AccountError::UserNotFound)
        ));
        assert!(matches!(
            service.delete_user(user.id).await,
            Err(AccountError::UserNotFound)
        ));
    }

    #[test]
    fn reset_codes_are_opaque_and_unique() {
        let first = generate_reset_code().expect("generate");
        let second = generate_reset_code().expect("generate");

        assert_ne!(first, second);
        // 32 random bytes, base64url without padding
        assert_eq!(first.len(), 43);
    }
}
