//! Git command executor abstraction layer
//!
//! This module provides an abstraction for executing git commands, allowing
//! for both real command execution and mocked execution for testing. Every
//! real invocation carries an explicit deadline: the directives being applied
//! come from an untrusted model, and a hung subprocess must surface as a
//! per-directive timeout failure instead of stalling the whole run.

use async_trait::async_trait;
use mend_core::{MendError, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

#[cfg(test)]
use std::collections::HashMap;

/// Trait for executing git commands
#[async_trait]
pub trait GitExecutor: Send + Sync {
    /// Execute a git command with the given arguments
    ///
    /// # Arguments
    /// * `args` - Command line arguments to pass to git
    ///
    /// # Returns
    /// The stdout output from the command on success
    async fn exec(&self, args: &[&str]) -> Result<String>;
}

/// Default implementation of GitExecutor using tokio Command
///
/// This executor runs actual git commands against a repository, each bounded
/// by the configured timeout.
pub struct GitCommand {
    repo_path: PathBuf,
    timeout: Duration,
}

impl GitCommand {
    /// Create a new GitCommand executor for the given repository
    ///
    /// # Arguments
    /// * `repo_path` - Path to the git repository
    /// * `timeout` - Deadline for each individual git invocation
    pub fn new(repo_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            repo_path: repo_path.into(),
            timeout,
        }
    }

    /// Get the repository path
    pub fn repo_path(&self) -> &PathBuf {
        &self.repo_path
    }
}

#[async_trait]
impl GitExecutor for GitCommand {
    async fn exec(&self, args: &[&str]) -> Result<String> {
        if !self.repo_path.exists() {
            return Err(MendError::Git(format!(
                "Repository path does not exist: {}",
                self.repo_path.display()
            )));
        }

        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(args = ?args, "Running git command");
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| MendError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| MendError::Git(format!("Failed to execute git command: {}", e)))?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| MendError::Parse(format!("invalid UTF-8 in stdout: {}", e)))?;
        let stderr = String::from_utf8(output.stderr)
            .map_err(|e| MendError::Parse(format!("invalid UTF-8 in stderr: {}", e)))?;

        if !output.status.success() {
            return Err(MendError::Git(format!(
                "git {:?} failed with exit code {:?}: {}",
                args,
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(stdout)
    }
}

/// Mock executor for testing
///
/// Returns pre-configured responses or failures for specific command
/// arguments and records every call, allowing deterministic tests without
/// running git.
#[cfg(test)]
pub struct MockGitExecutor {
    /// Map of command arguments to their stdout responses
    responses: HashMap<Vec<String>, String>,
    /// Map of command arguments to injected failure messages
    failures: HashMap<Vec<String>, String>,
    /// Every call made, in order
    calls: std::sync::Mutex<Vec<Vec<String>>>,
}

#[cfg(test)]
impl MockGitExecutor {
    /// Create a mock where unknown commands succeed with empty output
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            failures: HashMap::new(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Pre-configure a stdout response for a specific command
    pub fn with_response(mut self, args: &[&str], response: &str) -> Self {
        let args_vec: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.responses.insert(args_vec, response.to_string());
        self
    }

    /// Pre-configure a failure for a specific command
    pub fn with_failure(mut self, args: &[&str], message: &str) -> Self {
        let args_vec: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.failures.insert(args_vec, message.to_string());
        self
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Default for MockGitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[async_trait]
impl GitExecutor for MockGitExecutor {
    async fn exec(&self, args: &[&str]) -> Result<String> {
        let args_vec: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.calls.lock().unwrap().push(args_vec.clone());

        if let Some(message) = self.failures.get(&args_vec) {
            return Err(MendError::Git(message.clone()));
        }

        Ok(self.responses.get(&args_vec).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_configured_response() {
        let mock = MockGitExecutor::new()
            .with_response(&["rev-parse", "--abbrev-ref", "HEAD"], "main\n");
        let out = mock.exec(&["rev-parse", "--abbrev-ref", "HEAD"]).await.unwrap();
        assert_eq!(out, "main\n");
    }

    #[tokio::test]
    async fn mock_returns_configured_failure() {
        let mock = MockGitExecutor::new().with_failure(&["push"], "remote rejected");
        let err = mock.exec(&["push"]).await.unwrap_err();
        assert!(err.to_string().contains("remote rejected"));
    }

    #[tokio::test]
    async fn mock_records_calls_in_order() {
        let mock = MockGitExecutor::new();
        mock.exec(&["checkout", "a"]).await.unwrap();
        mock.exec(&["add", "f"]).await.unwrap();
        assert_eq!(
            mock.calls(),
            vec![vec!["checkout".to_string(), "a".to_string()],
                 vec!["add".to_string(), "f".to_string()]]
        );
    }

    #[tokio::test]
    async fn missing_repo_path_is_an_error() {
        let executor = GitCommand::new("/does/not/exist", Duration::from_secs(5));
        let err = executor.exec(&["status"]).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
