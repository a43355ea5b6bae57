//! Configuration management for Mend
//!
//! Repository-level settings loaded from `.mend/config.toml`: remote and
//! timeout settings for git, model selection, and the input/log file paths
//! the run driver reads and appends.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

/// Repository-level Mend configuration
///
/// Loaded from `.mend/config.toml` in the repo root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MendConfig {
    /// Git remote and command timeout settings
    #[serde(default)]
    pub git: GitConfig,

    /// Model selection
    #[serde(default)]
    pub models: ModelConfig,

    /// Input and log file paths
    #[serde(default)]
    pub files: FilesConfig,
}

/// Git settings for the change applier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Remote that branches are force-pushed to
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Deadline for every git invocation, in seconds
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Default model to use
    #[serde(default = "default_model")]
    pub default: String,

    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Overall deadline for one model request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

/// Input and log file paths, relative to the repo root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Failure-evidence file the run driver reads
    #[serde(default = "default_fail_log")]
    pub fail_log: String,

    /// Append-only conversation log
    #[serde(default = "default_conversation_log")]
    pub conversation_log: String,

    /// Rotate the conversation log once it exceeds this many bytes.
    /// `None` (the default) disables rotation; the log grows unbounded.
    #[serde(default)]
    pub rotate_above_bytes: Option<u64>,
}

// Default value providers
fn default_remote() -> String {
    "origin".to_string()
}

fn default_command_timeout_secs() -> u64 {
    120
}

fn default_model() -> String {
    "claude-sonnet-4".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_max_tokens() -> usize {
    8000
}

fn default_fail_log() -> String {
    "fail_logs.txt".to_string()
}

fn default_conversation_log() -> String {
    "conversation_log.md".to_string()
}

impl MendConfig {
    /// Load configuration from `.mend/config.toml` or use defaults
    pub fn load_or_default(repo_root: &Path) -> Result<Self> {
        let config_path = repo_root.join(".mend/config.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content).map_err(|e| {
                crate::MendError::Config(format!("Failed to parse config file: {}", e))
            })?)
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `.mend/config.toml`
    pub fn write_default(repo_root: &Path) -> Result<()> {
        let config_dir = repo_root.join(".mend");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let config = Self::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| crate::MendError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

impl Default for MendConfig {
    fn default() -> Self {
        Self {
            git: GitConfig::default(),
            models: ModelConfig::default(),
            files: FilesConfig::default(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default: default_model(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            fail_log: default_fail_log(),
            conversation_log: default_conversation_log(),
            rotate_above_bytes: None,
        }
    }
}
