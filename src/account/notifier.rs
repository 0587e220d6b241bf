use anyhow::Result;
use tracing::info;

use crate::account::models::User;

/// Delivery abstraction for password-reset instructions. Fire-and-forget:
/// callers log delivery failures but do not fail the reset request on them.
pub trait ResetNotifier: Send + Sync {
    /// Deliver the reset code to the user or return an error.
    ///
    /// # Errors
    /// Returns an error if delivery fails.
    fn send_reset_instructions(&self, user: &User, code: &str) -> Result<()>;
}

/// Local dev notifier that logs the payload instead of sending real email.
#[derive(Clone, Copy, Debug)]
pub struct LogResetNotifier;

impl ResetNotifier for LogResetNotifier {
    fn send_reset_instructions(&self, user: &User, code: &str) -> Result<()> {
        info!(
            email = %user.email,
            username = %user.username,
            reset_code = %code,
            "password reset instructions send stub"
        );
        Ok(())
    }
}
