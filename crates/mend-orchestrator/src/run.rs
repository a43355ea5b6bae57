//! One self-healing run, end to end
//!
//! [`run_once`] gathers inputs and makes the model call; [`handle_response`]
//! does everything after the raw text exists (parse, log, apply) and is what
//! the tests exercise. The split keeps the model call - the one step that
//! needs credentials and a network - at the very edge.

use chrono::Utc;
use mend_agent::{parse_response, AgentClient};
use mend_core::{ApplyReport, MendConfig, MendError, Result, RunReport};
use mend_vcs::{ChangeApplier, GitCommand, GitExecutor, WorkTree};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::conversation::ConversationLog;
use crate::prompt::{compose_user_prompt, system_prompt};

/// Options for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root of the working tree being healed
    pub repo_root: PathBuf,
    /// Parse and report only; no log append, no git side effects
    pub dry_run: bool,
}

/// Execute one full self-healing run against `repo_root`
///
/// Fatal errors (missing fail log, missing API key, upstream call failure)
/// abort before any side effects.
pub async fn run_once(options: &RunOptions) -> Result<RunReport> {
    let config = MendConfig::load_or_default(&options.repo_root)?;

    let fail_log_path = options.repo_root.join(&config.files.fail_log);
    if !fail_log_path.exists() {
        return Err(MendError::MissingInput(format!(
            "No {} found, nothing to fix",
            config.files.fail_log
        )));
    }
    let fail_logs = std::fs::read_to_string(&fail_log_path)?;

    let log = ConversationLog::new(options.repo_root.join(&config.files.conversation_log))
        .with_rotation(config.files.rotate_above_bytes);
    let conversation = log.load()?;

    let client = AgentClient::from_config(&config.models);
    let completion = client
        .complete(
            &system_prompt(),
            &compose_user_prompt(&fail_logs, &conversation),
        )
        .await?;

    if options.dry_run {
        let parsed = parse_response(&completion.output);
        for directive in &parsed.directives {
            info!("Would apply: {}", directive.describe());
        }
        return Ok(RunReport {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            summary: parsed.summary.clone(),
            directives_parsed: parsed.directives.len(),
            blocks_skipped: parsed.skipped.len(),
            apply: ApplyReport::default(),
        });
    }

    let executor = GitCommand::new(
        &options.repo_root,
        Duration::from_secs(config.git.command_timeout_secs),
    );
    let mut applier = ChangeApplier::new(
        executor,
        WorkTree::new(&options.repo_root, config.git.remote.clone()),
    );

    handle_response(&completion.output, &log, &mut applier).await
}

/// Parse a raw model response, record its summary, and apply its directives
///
/// The summary is appended before application, so the operator sees it even
/// when directives fail. Per-directive failures are recorded in the report
/// and never propagate.
pub async fn handle_response<E: GitExecutor>(
    raw: &str,
    log: &ConversationLog,
    applier: &mut ChangeApplier<E>,
) -> Result<RunReport> {
    let parsed = parse_response(raw);

    info!(
        "Parsed {} directive(s), {} skipped block(s)",
        parsed.directives.len(),
        parsed.skipped.len()
    );
    for block in &parsed.skipped {
        warn!("Ignoring block with unrecognized header: {:?}", block.header);
    }

    log.append(&parsed.summary)?;

    let apply = applier.apply(&parsed.directives).await;

    for result in &apply.results {
        match result {
            mend_core::ChangeResult::Applied { directive } => {
                info!("Applied: {}", directive);
            }
            mend_core::ChangeResult::Failed { directive, reason } => {
                warn!("Failed: {} ({})", directive, reason);
            }
        }
    }

    Ok(RunReport {
        run_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        summary: parsed.summary,
        directives_parsed: parsed.directives.len(),
        blocks_skipped: parsed.skipped.len(),
        apply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Executor that accepts everything, so tests only exercise the driver.
    struct YesExecutor;

    #[async_trait]
    impl GitExecutor for YesExecutor {
        async fn exec(&self, _args: &[&str]) -> Result<String> {
            Ok(String::new())
        }
    }

    fn applier_in(dir: &TempDir) -> ChangeApplier<YesExecutor> {
        ChangeApplier::new(YesExecutor, WorkTree::new(dir.path(), "origin"))
    }

    #[tokio::test]
    async fn response_flows_through_log_and_applier() {
        let dir = TempDir::new().unwrap();
        let log = ConversationLog::new(dir.path().join("conversation_log.md"));
        let mut applier = applier_in(&dir);

        let raw = "```branch=backend, path=backend/app.py\nprint(\"hi\")\n```\n\
                   ```run\npip install foo\n```\n\
                   summary=Fixed a null check\n";
        let report = handle_response(raw, &log, &mut applier).await.unwrap();

        assert_eq!(report.directives_parsed, 2);
        assert_eq!(report.blocks_skipped, 0);
        assert_eq!(report.summary, "Fixed a null check");
        assert_eq!(report.apply.proposed_commands, vec!["pip install foo"]);
        assert!(report.apply.results.iter().all(|r| r.is_applied()));

        assert!(dir.path().join("backend/app.py").exists());
        assert!(log.load().unwrap().contains("Fixed a null check"));
    }

    #[tokio::test]
    async fn summary_is_logged_even_when_nothing_applies() {
        let dir = TempDir::new().unwrap();
        let log = ConversationLog::new(dir.path().join("conversation_log.md"));
        let mut applier = applier_in(&dir);

        let raw = "```mystery\nblob\n```\nsummary=Could not find a fix\n";
        let report = handle_response(raw, &log, &mut applier).await.unwrap();

        assert_eq!(report.directives_parsed, 0);
        assert_eq!(report.blocks_skipped, 1);
        assert!(log.load().unwrap().contains("Could not find a fix"));
    }

    #[tokio::test]
    async fn run_once_without_fail_log_is_fatal() {
        let dir = TempDir::new().unwrap();
        let options = RunOptions {
            repo_root: dir.path().to_path_buf(),
            dry_run: false,
        };

        let err = run_once(&options).await.unwrap_err();
        assert!(matches!(err, MendError::MissingInput(_)));
        // Fatal before side effects: no conversation log was written.
        assert!(!dir.path().join("conversation_log.md").exists());
    }
}
