//! Domain core: user records, credential engines, and their collaborators.
//!
//! Everything here returns a discriminated [`AccountError`] instead of
//! panicking or raising; the HTTP layer maps each kind to a status code.

pub mod error;
pub mod hasher;
pub mod models;
pub mod notifier;
pub mod service;
pub mod store;
pub mod token;

pub use error::AccountError;
pub use hasher::{Argon2Hasher, PasswordHasher};
pub use models::{PublicUser, SessionGrant, User};
pub use notifier::{LogResetNotifier, ResetNotifier};
pub use service::AccountService;
pub use store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
pub use token::{HmacTokenIssuer, SessionClaims, TokenError, TokenIssuer};
