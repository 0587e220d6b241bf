use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::account::models::User;
use crate::account::store::CredentialStore;

/// In-memory credential store for local runs and tests. The write lock makes
/// `consume_reset_code` atomic, matching the Postgres single-statement
/// update.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_reset_code(&self, code: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.reset_code.as_deref() == Some(code))
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn save(&self, user: &User) -> Result<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn set_reset_code(&self, id: Uuid, code: &str) -> Result<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.reset_code = Some(code.to_string());
        }
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, new_hash: &str) -> Result<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.password_hash = new_hash.to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn consume_reset_code(
        &self,
        code: &str,
        new_password_hash: &str,
    ) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users
            .values_mut()
            .find(|user| user.reset_code.as_deref() == Some(code))
        else {
            return Ok(None);
        };

        user.password_hash = new_password_hash.to_string();
        user.reset_code = None;
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(username: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash-1".to_string(),
            reset_code: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_is_upsert() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let mut alice = user("alice", "alice@example.com");
        store.save(&alice).await?;

        alice.password_hash = "hash-2".to_string();
        store.save(&alice).await?;

        let stored = store.find_by_id(alice.id).await?.expect("stored user");
        assert_eq!(stored.password_hash, "hash-2");
        assert!(store.exists_by_username("alice").await?);
        assert!(!store.exists_by_username("bob").await?);

        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_presence() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let alice = user("alice", "alice@example.com");
        store.save(&alice).await?;

        assert!(store.delete(alice.id).await?);
        assert!(!store.delete(alice.id).await?);
        assert!(store.find_by_id(alice.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn targeted_updates_touch_only_their_field() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let mut alice = user("alice", "alice@example.com");
        alice.reset_code = Some("code-1".to_string());
        store.save(&alice).await?;

        store.set_password_hash(alice.id, "hash-2").await?;
        let stored = store.find_by_id(alice.id).await?.expect("stored user");
        assert_eq!(stored.password_hash, "hash-2");
        assert_eq!(stored.reset_code.as_deref(), Some("code-1"));

        store.set_reset_code(alice.id, "code-2").await?;
        let stored = store.find_by_id(alice.id).await?.expect("stored user");
        assert_eq!(stored.password_hash, "hash-2");
        assert_eq!(stored.reset_code.as_deref(), Some("code-2"));

        Ok(())
    }

    #[tokio::test]
    async fn consume_reset_code_is_single_use() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let mut alice = user("alice", "alice@example.com");
        alice.reset_code = Some("code-1".to_string());
        store.save(&alice).await?;

        let consumed = store.consume_reset_code("code-1", "hash-2").await?;
        let consumed = consumed.expect("code should consume once");
        assert_eq!(consumed.password_hash, "hash-2");
        assert!(consumed.reset_code.is_none());

        assert!(store.consume_reset_code("code-1", "hash-3").await?.is_none());

        let stored = store.find_by_id(alice.id).await?.expect("stored user");
        assert_eq!(stored.password_hash, "hash-2");

        Ok(())
    }
}
