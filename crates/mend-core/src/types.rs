//! Core type definitions for the Mend loop
//!
//! A model response is parsed into an ordered list of [`Directive`]s plus an
//! optional summary. Directives are applied strictly in order; each one
//! succeeds or fails on its own ([`ChangeResult`]), and one failure never
//! stops the rest of the batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A typed instruction extracted from a model response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    /// Write `content` to `path` and commit it on `branch`
    ///
    /// Content is stored verbatim, including leading/trailing whitespace.
    FileChange {
        branch: String,
        path: String,
        content: String,
    },
    /// Shell commands proposed by the model
    ///
    /// Never executed automatically; surfaced to the operator for review.
    RunCommand { commands: String },
}

impl Directive {
    /// Short human-readable label used in results and logs
    pub fn describe(&self) -> String {
        match self {
            Directive::FileChange { branch, path, .. } => {
                format!("file {} on branch {}", path, branch)
            }
            Directive::RunCommand { commands } => {
                let first = commands.lines().next().unwrap_or("");
                format!("run: {}", first)
            }
        }
    }
}

/// A fenced block whose header matched no known directive shape
///
/// These produce no directive, but they are surfaced so the driver can warn
/// instead of dropping them without a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedBlock {
    /// The header line of the unrecognized block
    pub header: String,
}

/// Parser output: ordered directives, one summary, skipped blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResponse {
    /// Directives in the order their blocks appear in the raw response
    pub directives: Vec<Directive>,
    /// Trimmed remainder of the first `summary=` line, or empty
    pub summary: String,
    /// Blocks that matched neither directive shape
    pub skipped: Vec<SkippedBlock>,
}

impl ParsedResponse {
    /// True if the response contained nothing actionable
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.summary.is_empty()
    }
}

/// Per-directive application outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChangeResult {
    /// The directive was fully applied (or, for run directives, queued)
    Applied { directive: String },
    /// The directive failed; the batch continues with the next one
    Failed { directive: String, reason: String },
}

impl ChangeResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, ChangeResult::Applied { .. })
    }

    /// The directive label this result belongs to
    pub fn directive(&self) -> &str {
        match self {
            ChangeResult::Applied { directive } => directive,
            ChangeResult::Failed { directive, .. } => directive,
        }
    }
}

/// Result of applying one directive batch against the working tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyReport {
    /// One result per directive, in application order
    pub results: Vec<ChangeResult>,
    /// Commands the model asked to run, queued for operator review
    pub proposed_commands: Vec<String>,
}

impl ApplyReport {
    /// Generate a summary string
    pub fn summary(&self) -> String {
        let applied = self.results.iter().filter(|r| r.is_applied()).count();
        let failed = self.results.len() - applied;

        let mut parts = Vec::new();
        if applied > 0 {
            parts.push(format!("{} applied", applied));
        }
        if failed > 0 {
            parts.push(format!("{} failed", failed));
        }
        if !self.proposed_commands.is_empty() {
            parts.push(format!("{} commands proposed", self.proposed_commands.len()));
        }

        if parts.is_empty() {
            "no directives".to_string()
        } else {
            parts.join(", ")
        }
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| !r.is_applied())
    }
}

/// Full record of one self-healing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Summary extracted from the model response
    pub summary: String,
    pub directives_parsed: usize,
    pub blocks_skipped: usize,
    pub apply: ApplyReport,
}
