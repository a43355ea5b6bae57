//! Authentication for the model API
//!
//! The API key lives in an environment variable named by the repo config
//! (`models.api_key_env`, default `ANTHROPIC_API_KEY`). A missing key is
//! fatal: the run aborts before any logs are read or parsed.

use mend_core::{MendError, Result};
use std::env;

/// Read the API key from the configured environment variable
pub fn get_api_key(env_var: &str) -> Result<String> {
    match env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(MendError::Auth(format!(
            "No API key found. Set {} before running.",
            env_var
        ))),
    }
}
