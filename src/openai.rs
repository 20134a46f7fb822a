//! OpenAI-compatible client configuration with sensible defaults.

use crate::error::{ColabError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for an OpenAI-compatible endpoint.
///
/// The API key is read from the environment variable named by `api_key_env`,
/// so keys never end up in the config file.
pub fn create_client(api_base: &str, api_key_env: &str) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(api_base, api_key_env, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(
    api_base: &str,
    api_key_env: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    if api_base.is_empty() {
        return Err(ColabError::Config("API base URL is empty".to_string()));
    }

    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let api_key = std::env::var(api_key_env).unwrap_or_default();
    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
