//! Type definitions for model API interactions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Result from a single model invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    /// The model's raw output text
    pub output: String,
    /// When this result was generated
    pub timestamp: DateTime<Utc>,
    /// Token usage if available
    pub usage: Option<Usage>,
}

/// Anthropic API message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

/// Anthropic API request format
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequest {
    pub model: String,
    pub max_tokens: usize,
    pub system: String,
    pub messages: Vec<ApiMessage>,
}

/// Anthropic API response format
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    #[allow(dead_code)]
    pub id: String,
    pub content: Vec<ApiContent>,
    pub usage: Option<Usage>,
}

/// Content block in an API response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiContent {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub content_type: String,
    pub text: String,
}
