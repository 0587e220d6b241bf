//! # Konto (User Accounts & Credential Lifecycle)
//!
//! `konto` is a user-account service covering the full credential lifecycle:
//! registration, login with a signed session token, password reset via a
//! one-time code, and authenticated password change.
//!
//! ## Credential Lifecycle
//!
//! Passwords are stored only as Argon2id hashes in PHC string format; the
//! plaintext is never persisted or logged. Reset codes are opaque bearer
//! credentials: at most one is live per user, a new reset request supersedes
//! any prior code, and completing a reset consumes the code atomically so it
//! can never be replayed.
//!
//! ## Sessions
//!
//! A successful login mints a compact HS256 session token bound to the
//! authenticated identity. Tokens are self-contained (issuer, subject,
//! expiry, ULID token id) and verified offline.
//!
//! ## Layout
//!
//! - [`account`]: the domain core with models, engines, hasher, token
//!   issuer, and credential store.
//! - [`api`]: thin HTTP glue mapping domain results to status codes.
//! - [`cli`]: argument parsing, telemetry setup, and server startup.

pub mod account;
pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
