use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A stored user record. `password_hash` is always an Argon2id PHC string,
/// never plaintext. `reset_code` is present only while a password reset is
/// pending and is cleared when the reset completes.
///
/// Deliberately not `Serialize`: password material must never leave the
/// store layer. Use [`PublicUser`] for anything client-facing.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub reset_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client-facing view of a user, with all credential material stripped.
#[derive(ToSchema, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        user.clone().into()
    }
}

/// Result of a successful login: the session token plus the authenticated
/// identity. Ephemeral; never persisted.
#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct SessionGrant {
    pub token: String,
    pub user: PublicUser,
}
