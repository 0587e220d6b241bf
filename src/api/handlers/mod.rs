pub mod change_password;
pub mod health;
pub mod login;
pub mod register;
pub mod reset;
pub mod users;

pub use self::change_password::change_password;
pub use self::health::health;
pub use self::login::login;
pub use self::register::register;
pub use self::reset::{forgot_password, reset_password, verify_reset_code};
pub use self::users::{delete_user, get_user};

// common functions for the handlers
use axum::http::StatusCode;
use regex::Regex;
use tracing::error;

use crate::account::AccountError;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 32;
pub const PASSWORD_MIN_LENGTH: usize = 8;

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

pub fn valid_username(username: &str) -> bool {
    let length = username.len();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        return false;
    }
    Regex::new(r"^[a-z0-9][a-z0-9_-]*$").is_ok_and(|re| re.is_match(username))
}

pub fn valid_password(password: &str) -> bool {
    password.len() >= PASSWORD_MIN_LENGTH
}

/// Map a domain failure to a client-facing status and message. Internal
/// failures are logged here and never echoed to the client.
pub fn error_response(err: &AccountError) -> (StatusCode, String) {
    let status = match err {
        AccountError::DuplicateUsername | AccountError::DuplicateEmail => StatusCode::CONFLICT,
        AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AccountError::UserNotFound => StatusCode::NOT_FOUND,
        AccountError::UnknownEmail
        | AccountError::InvalidResetCode
        | AccountError::PasswordMismatch
        | AccountError::InvalidOldPassword => StatusCode::BAD_REQUEST,
        AccountError::Internal(inner) => {
            error!("account operation failed: {inner:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            );
        }
    };

    (status, err.to_string())
}
