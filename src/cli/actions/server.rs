use crate::api;
use crate::cli::actions::Action;
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            session_key,
        } => {
            // Fail early on a malformed DSN instead of at pool creation
            let dsn = Url::parse(&dsn).context("invalid database DSN")?;

            api::new(port, dsn.to_string(), session_key).await?;
        }
    }

    Ok(())
}
