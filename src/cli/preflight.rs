//! Pre-flight checks before expensive operations.
//!
//! Validates that the API keys an operation needs are set before it starts,
//! instead of failing on the first request.

use crate::config::Settings;
use crate::error::{ColabError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion embeds every chunk.
    Ingest,
    /// Searching embeds the query.
    Search,
    /// Asking calls the chat model and embeds tool queries.
    Ask,
    /// Reading local state only.
    Local,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Search => {
            check_api_key(&settings.embedding.api_key_env)?;
        }
        Operation::Ask => {
            check_api_key(&settings.llm.api_key_env)?;
            check_api_key(&settings.embedding.api_key_env)?;
        }
        Operation::Local => {}
    }
    Ok(())
}

/// Check that the environment variable `name` holds a key.
fn check_api_key(name: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(ColabError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            name, name
        ))),
        Err(_) => Err(ColabError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            name, name
        ))),
    }
}
