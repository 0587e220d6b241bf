use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString},
    Argon2,
};

/// One-way hash + verify primitive for credential storage.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into an opaque storable string.
    ///
    /// # Errors
    /// Returns an error if hashing fails.
    fn hash(&self, plain: &str) -> Result<String>;

    /// Whether `plain` verifies against a previously stored hash. A hash
    /// that fails to parse verifies nothing.
    fn matches(&self, plain: &str, hash: &str) -> bool;
}

/// Argon2id with default parameters, producing PHC string format hashes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String> {
        use argon2::password_hash::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| anyhow!("failed to hash password: {err}"))
    }

    fn matches(&self, plain: &str, hash: &str) -> bool {
        PasswordHash::new(hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
    }
}
