use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::account::models::User;
use crate::account::store::CredentialStore;

/// Postgres-backed credential store. The `users` table carries unique
/// constraints on `username` and `email` (see `sql/schema.sql`), so the
/// check-then-act duplicate checks in the service are backstopped at the
/// store level.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by(&self, query: &str, value: &str) -> Result<Option<User>> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, User>(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch user")
    }

    async fn exists_by(&self, query: &str, value: &str) -> Result<bool> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_scalar::<_, bool>(query)
            .bind(value)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to check user existence")
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = "SELECT * FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, User>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch user by id")
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_by("SELECT * FROM users WHERE username = $1", username)
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_by("SELECT * FROM users WHERE email = $1", email)
            .await
    }

    async fn find_by_reset_code(&self, code: &str) -> Result<Option<User>> {
        self.fetch_by("SELECT * FROM users WHERE reset_code = $1", code)
            .await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        self.exists_by(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
            username,
        )
        .await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        self.exists_by(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
            email,
        )
        .await
    }

    async fn save(&self, user: &User) -> Result<()> {
        let query = r"
            INSERT INTO users (id, username, email, password_hash, reset_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                reset_code = EXCLUDED.reset_code
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.reset_code)
            .bind(user.created_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to save user")?;

        Ok(())
    }

    async fn set_reset_code(&self, id: Uuid, code: &str) -> Result<()> {
        let query = "UPDATE users SET reset_code = $2 WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(code)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to set reset code")?;

        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, new_hash: &str) -> Result<()> {
        let query = "UPDATE users SET password_hash = $2 WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(new_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to set password hash")?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let query = "DELETE FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }

    async fn consume_reset_code(
        &self,
        code: &str,
        new_password_hash: &str,
    ) -> Result<Option<User>> {
        // Single statement: consumption doubles as the existence check, so a
        // code can never be redeemed twice even under concurrent calls.
        let query = r"
            UPDATE users
            SET password_hash = $2,
                reset_code = NULL
            WHERE reset_code = $1
            RETURNING *
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query_as::<_, User>(query)
            .bind(code)
            .bind(new_password_hash)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to consume reset code")
    }
}
