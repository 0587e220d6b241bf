//! Durable user records, queryable by id, username, email, or reset code.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::account::models::User;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Collaborator contract for user persistence. `save` is an upsert keyed by
/// id; `consume_reset_code` is the single mutation that must be atomic, so
/// two concurrent reset completions can never both succeed on one code.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_reset_code(&self, code: &str) -> Result<Option<User>>;

    async fn exists_by_username(&self, username: &str) -> Result<bool>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// Insert or replace the record with this id.
    async fn save(&self, user: &User) -> Result<()>;

    /// Set only `reset_code`, superseding any pending code. Targeted so a
    /// concurrent password change can never be overwritten by a stale row.
    async fn set_reset_code(&self, id: Uuid, code: &str) -> Result<()>;

    /// Set only `password_hash`, leaving any pending reset code in place.
    async fn set_password_hash(&self, id: Uuid, new_hash: &str) -> Result<()>;

    /// Returns `false` when no record had this id.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Atomically set `password_hash` and clear `reset_code` on the single
    /// record currently holding `code`. Returns the updated record, or
    /// `None` when no record holds the code (already consumed or never
    /// issued).
    async fn consume_reset_code(&self, code: &str, new_password_hash: &str)
        -> Result<Option<User>>;
}
