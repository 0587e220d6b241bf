use thiserror::Error;

/// Failure taxonomy for account operations. Every variant except
/// [`AccountError::Internal`] is user-recoverable: the client can retry with
/// corrected input.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username is already taken")]
    DuplicateUsername,
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("no account matches that email")]
    UnknownEmail,
    #[error("invalid or expired reset code")]
    InvalidResetCode,
    #[error("new password and confirmation do not match")]
    PasswordMismatch,
    #[error("user not found")]
    UserNotFound,
    #[error("old password is incorrect")]
    InvalidOldPassword,
    /// Store or hashing failure; not actionable by the client.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
