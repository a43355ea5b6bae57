//! Change applier - turns parsed directives into working-tree side effects
//!
//! File-change directives become branch commits and force-pushes; run
//! directives are never executed, only queued for operator review. Each
//! directive is applied as an unguarded step sequence with no rollback: a
//! failure is recorded against that directive alone and the loop moves on.
//! The directive source is an untrusted model, so failing the whole batch on
//! one bad directive would discard otherwise-valid fixes.

use mend_core::{ApplyReport, ChangeResult, Directive, MendError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::executor::GitExecutor;

/// Files/directories that directives may never overwrite
const PROTECTED_FILES: &[&str] = &[".git", ".mend", ".env", ".secrets"];

/// Handle to the local working tree the applier mutates
///
/// Exclusive-access contract: the tree and its checked-out branch belong to
/// the applier for the duration of one `apply` call. No other component may
/// read or mutate the tree concurrently during that window.
#[derive(Debug, Clone)]
pub struct WorkTree {
    root: PathBuf,
    remote: String,
}

impl WorkTree {
    /// Create a handle for the tree at `root`, pushing to `remote`
    pub fn new(root: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            remote: remote.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }
}

/// Applies directives to a working tree, strictly in input order
pub struct ChangeApplier<E: GitExecutor> {
    executor: E,
    tree: WorkTree,
}

impl<E: GitExecutor> ChangeApplier<E> {
    pub fn new(executor: E, tree: WorkTree) -> Self {
        Self { executor, tree }
    }

    /// Apply a directive batch, one directive at a time
    ///
    /// Returns one [`ChangeResult`] per directive, in order. Run directives
    /// are routed to the proposal queue and never reach a shell.
    pub async fn apply(&mut self, directives: &[Directive]) -> ApplyReport {
        let mut report = ApplyReport::default();

        for directive in directives {
            match directive {
                Directive::RunCommand { commands } => {
                    info!("Model proposed commands (not executed):\n{}", commands);
                    report.proposed_commands.push(commands.clone());
                    report.results.push(ChangeResult::Applied {
                        directive: directive.describe(),
                    });
                }
                Directive::FileChange {
                    branch,
                    path,
                    content,
                } => match self.apply_file_change(branch, path, content).await {
                    Ok(()) => {
                        info!("Committed '{}' to branch '{}'", path, branch);
                        report.results.push(ChangeResult::Applied {
                            directive: directive.describe(),
                        });
                    }
                    Err(e) => {
                        // No cleanup, no branch restoration: the tree stays
                        // wherever this directive left it.
                        warn!("Failed to apply '{}' on branch '{}': {}", path, branch, e);
                        report.results.push(ChangeResult::Failed {
                            directive: directive.describe(),
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        report
    }

    async fn apply_file_change(&self, branch: &str, path: &str, content: &str) -> Result<()> {
        // Switch to the branch; a failed checkout just means it may not
        // exist yet, which the rev-parse check below decides.
        let _ = self.executor.exec(&["checkout", branch]).await;

        let current = self
            .executor
            .exec(&["rev-parse", "--abbrev-ref", "HEAD"])
            .await
            .map_err(as_branch_switch)?;
        if current.trim() != branch {
            // Create from whatever ref is currently checked out.
            self.executor
                .exec(&["checkout", "-b", branch])
                .await
                .map_err(as_branch_switch)?;
        }

        let relative = validate_path(path)?;
        let full_path = self.tree.root.join(&relative);
        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Verbatim, last-write-wins: no diff, no merge.
        tokio::fs::write(&full_path, content).await?;

        self.executor
            .exec(&["add", path])
            .await
            .map_err(as_commit)?;
        let message = format!("Update {} [skip ci]", path);
        self.executor
            .exec(&["commit", "-m", &message])
            .await
            .map_err(as_commit)?;

        self.executor
            .exec(&["push", "--set-upstream", self.tree.remote(), branch, "--force"])
            .await
            .map_err(as_push)?;

        Ok(())
    }
}

// Timeouts keep their own variant so operators can tell a hung subprocess
// from a rejected command.
fn as_branch_switch(e: MendError) -> MendError {
    match e {
        MendError::Timeout(_) => e,
        other => MendError::BranchSwitch(other.to_string()),
    }
}

fn as_commit(e: MendError) -> MendError {
    match e {
        MendError::Timeout(_) => e,
        other => MendError::Commit(other.to_string()),
    }
}

fn as_push(e: MendError) -> MendError {
    match e {
        MendError::Timeout(_) => e,
        other => MendError::Push(other.to_string()),
    }
}

/// Validate that a directive path is safe to write to
pub fn validate_path(path: &str) -> Result<PathBuf> {
    let path = Path::new(path);

    if path.is_absolute() {
        return Err(MendError::PathValidation(format!(
            "Absolute paths not allowed: {}",
            path.display()
        )));
    }

    for component in path.components() {
        if let std::path::Component::ParentDir = component {
            return Err(MendError::PathValidation(format!(
                "Path traversal not allowed: {}",
                path.display()
            )));
        }
    }

    if let Some(first) = path.components().next() {
        let first = first.as_os_str().to_string_lossy();
        for protected in PROTECTED_FILES {
            if first == *protected {
                return Err(MendError::PathValidation(format!(
                    "Cannot write to protected path: {}",
                    path.display()
                )));
            }
        }
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MockGitExecutor;
    use tempfile::TempDir;

    fn file_change(branch: &str, path: &str, content: &str) -> Directive {
        Directive::FileChange {
            branch: branch.to_string(),
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn file_change_runs_the_full_git_sequence() {
        let tree_dir = TempDir::new().unwrap();
        let mock = MockGitExecutor::new();
        let mut applier = ChangeApplier::new(mock, WorkTree::new(tree_dir.path(), "origin"));

        let report = applier
            .apply(&[file_change("backend", "backend/app.py", "print(\"hi\")\n")])
            .await;

        assert_eq!(report.results.len(), 1);
        assert!(report.results[0].is_applied());

        let written = std::fs::read_to_string(tree_dir.path().join("backend/app.py")).unwrap();
        assert_eq!(written, "print(\"hi\")\n");

        let calls = applier.executor.calls();
        let flat: Vec<String> = calls.iter().map(|c| c.join(" ")).collect();
        assert_eq!(
            flat,
            vec![
                "checkout backend",
                "rev-parse --abbrev-ref HEAD",
                "checkout -b backend",
                "add backend/app.py",
                "commit -m Update backend/app.py [skip ci]",
                "push --set-upstream origin backend --force",
            ]
        );
    }

    #[tokio::test]
    async fn existing_branch_is_not_recreated() {
        let tree_dir = TempDir::new().unwrap();
        let mock = MockGitExecutor::new()
            .with_response(&["rev-parse", "--abbrev-ref", "HEAD"], "backend\n");
        let mut applier = ChangeApplier::new(mock, WorkTree::new(tree_dir.path(), "origin"));

        applier
            .apply(&[file_change("backend", "app.py", "x")])
            .await;

        let calls = applier.executor.calls();
        assert!(!calls.iter().any(|c| c.first().map(String::as_str) == Some("checkout")
            && c.get(1).map(String::as_str) == Some("-b")));
    }

    #[tokio::test]
    async fn push_failure_does_not_stop_later_directives() {
        let tree_dir = TempDir::new().unwrap();
        let mock = MockGitExecutor::new().with_failure(
            &["push", "--set-upstream", "origin", "a", "--force"],
            "remote rejected",
        );
        let mut applier = ChangeApplier::new(mock, WorkTree::new(tree_dir.path(), "origin"));

        let report = applier
            .apply(&[
                file_change("a", "one.txt", "1"),
                file_change("b", "two.txt", "2"),
            ])
            .await;

        assert_eq!(report.results.len(), 2);
        match &report.results[0] {
            ChangeResult::Failed { reason, .. } => {
                assert!(reason.contains("Push failed"));
                assert!(reason.contains("remote rejected"));
            }
            other => panic!("expected first directive to fail, got {:?}", other),
        }
        assert!(report.results[1].is_applied());
        assert!(tree_dir.path().join("two.txt").exists());
    }

    #[tokio::test]
    async fn commit_failure_is_isolated_too() {
        let tree_dir = TempDir::new().unwrap();
        let mock = MockGitExecutor::new()
            .with_failure(&["commit", "-m", "Update one.txt [skip ci]"], "nothing to commit");
        let mut applier = ChangeApplier::new(mock, WorkTree::new(tree_dir.path(), "origin"));

        let report = applier
            .apply(&[
                file_change("a", "one.txt", "1"),
                file_change("a", "two.txt", "2"),
            ])
            .await;

        assert!(!report.results[0].is_applied());
        assert!(report.results[1].is_applied());
    }

    #[tokio::test]
    async fn run_commands_are_queued_never_executed() {
        let tree_dir = TempDir::new().unwrap();
        let mock = MockGitExecutor::new();
        let mut applier = ChangeApplier::new(mock, WorkTree::new(tree_dir.path(), "origin"));

        let report = applier
            .apply(&[Directive::RunCommand {
                commands: "pip install foo".to_string(),
            }])
            .await;

        assert_eq!(report.proposed_commands, vec!["pip install foo"]);
        assert!(report.results[0].is_applied());
        // Nothing reached the executor at all.
        assert!(applier.executor.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_path_fails_the_directive_only() {
        let tree_dir = TempDir::new().unwrap();
        let mock = MockGitExecutor::new();
        let mut applier = ChangeApplier::new(mock, WorkTree::new(tree_dir.path(), "origin"));

        let report = applier
            .apply(&[
                file_change("a", "../escape.txt", "nope"),
                file_change("a", "ok.txt", "fine"),
            ])
            .await;

        assert!(!report.results[0].is_applied());
        assert!(report.results[1].is_applied());
        assert!(tree_dir.path().join("ok.txt").exists());
    }

    #[test]
    fn validate_path_rejects_absolute() {
        assert!(validate_path("/etc/passwd").is_err());
    }

    #[test]
    fn validate_path_rejects_traversal() {
        assert!(validate_path("../../etc/passwd").is_err());
    }

    #[test]
    fn validate_path_rejects_protected() {
        assert!(validate_path(".git/config").is_err());
        assert!(validate_path(".mend/config.toml").is_err());
    }

    #[test]
    fn validate_path_accepts_nested_relative() {
        assert!(validate_path("src/main.rs").is_ok());
    }
}
