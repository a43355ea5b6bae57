//! Anthropic API client for the self-healing loop
//!
//! One run makes exactly one completion request: the composed prompt goes
//! up, the raw response text comes back. Rate limits and transient server
//! errors are retried with capped exponential backoff; everything else is
//! fatal to the run. The whole request carries an explicit deadline so a
//! hung call can never stall the loop indefinitely.

use crate::auth;
use crate::types::{ApiMessage, ApiRequest, ApiResponse, CompletionResult};
use chrono::Utc;
use mend_core::{MendError, ModelConfig, Result};
use std::time::Duration;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

// Rate limit retry configuration
const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF_SECS: u64 = 30;
const MAX_BACKOFF_SECS: u64 = 300; // 5 minutes max

/// Client for one-shot model completions
#[derive(Debug, Clone)]
pub struct AgentClient {
    model: String,
    max_tokens: usize,
    api_key_env: String,
    request_timeout: Duration,
}

impl AgentClient {
    /// Create a client from the repo's model configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            model: config.default.clone(),
            max_tokens: config.max_tokens,
            api_key_env: config.api_key_env.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Set max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Request one completion for the given system + user prompt
    ///
    /// Fatal errors: missing API key, request timeout, non-retryable API
    /// errors, and a response with no content.
    pub async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<CompletionResult> {
        let api_key = auth::get_api_key(&self.api_key_env)?;

        let request = ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system_prompt.to_string(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            }],
        };

        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| MendError::Api(format!("Failed to build HTTP client: {}", e)))?;

        // Retry loop with exponential backoff for rate limits
        let mut retries = 0;
        let mut backoff_secs = INITIAL_BACKOFF_SECS;

        loop {
            tracing::debug!("Sending completion request (attempt {})", retries + 1);

            let response = client
                .post(API_URL)
                .header("x-api-key", &api_key)
                .header("anthropic-version", API_VERSION)
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        MendError::Timeout(self.request_timeout.as_secs())
                    } else {
                        MendError::Api(format!("Failed to send request: {}", e))
                    }
                })?;

            let status = response.status();

            // Handle rate limit (429) with retry
            if status.as_u16() == 429 {
                retries += 1;

                if retries > MAX_RETRIES {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown".to_string());
                    return Err(MendError::ApiLimit(format!(
                        "Rate limit exceeded after {} retries. Last error: {}",
                        MAX_RETRIES, error_text
                    )));
                }

                // Parse retry-after header if present, otherwise use exponential backoff
                let wait_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(backoff_secs);

                tracing::warn!(
                    "Rate limited (429). Waiting {} seconds before retry {}/{}",
                    wait_secs,
                    retries,
                    MAX_RETRIES
                );

                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown".to_string());

                // Retry on 5xx errors
                if status.is_server_error() && retries < MAX_RETRIES {
                    retries += 1;
                    tracing::warn!(
                        "Server error ({}). Waiting {} seconds before retry {}/{}",
                        status,
                        backoff_secs,
                        retries,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                return Err(MendError::Api(format!(
                    "API error {}: {}",
                    status, error_text
                )));
            }

            // Success - parse response
            let api_response: ApiResponse = response
                .json()
                .await
                .map_err(|e| MendError::Api(format!("Failed to parse response: {}", e)))?;

            let output = api_response
                .content
                .first()
                .ok_or_else(|| MendError::Api("No content in response".to_string()))?
                .text
                .clone();

            let usage = api_response.usage;

            if let Some(ref usage_info) = usage {
                tracing::info!(
                    "Completion received ({} chars, {} input tokens, {} output tokens)",
                    output.len(),
                    usage_info.input_tokens,
                    usage_info.output_tokens
                );
            } else {
                tracing::info!("Completion received ({} chars)", output.len());
            }

            return Ok(CompletionResult {
                output,
                timestamp: Utc::now(),
                usage,
            });
        }
    }
}
