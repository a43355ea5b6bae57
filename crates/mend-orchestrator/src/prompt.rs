//! Prompt construction for the self-healing run
//!
//! The system prompt tells the model what Mend is and how to answer; the
//! user prompt carries the failure evidence and the conversation so far.
//! Anything outside directive blocks is ignored except `summary=` lines, and
//! the model is told so.

use std::env;

/// Environment variable that overrides the built-in system prompt
pub const SYSTEM_PROMPT_OVERRIDE_ENV: &str = "MEND_SYSTEM_PROMPT_OVERRIDE";

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are the repair agent for an automated self-healing loop.
You receive failure logs and the conversation so far for a version-controlled
repository. Propose fixes as complete file replacements, each committed to a
branch you name, plus any shell commands the operator should consider running.
Keep changes minimal and focused on the reported failures."#;

/// System prompt, honoring the override environment variable
pub fn system_prompt() -> String {
    match env::var(SYSTEM_PROMPT_OVERRIDE_ENV) {
        Ok(prompt) if !prompt.trim().is_empty() => prompt,
        _ => DEFAULT_SYSTEM_PROMPT.to_string(),
    }
}

/// Instructions describing the directive block protocol
///
/// Included in every user prompt so the model's output stays parseable.
pub fn protocol_instructions() -> &'static str {
    r#"Respond using fenced blocks:

```branch=BRANCHNAME, path=relative/path/to/file
... the complete new file content ...
```

for every file you change (one block per file, full content, no patches), and

```run
shell commands for the operator to review
```

for commands. Commands are never run automatically; they are queued for
review. Do not nest triple-backtick fences inside a block body.

Also include exactly one line, outside any block:

summary=one line describing what you changed and why

Any other text outside blocks is ignored."#
}

/// Compose the user prompt from failure evidence and the conversation log
pub fn compose_user_prompt(fail_logs: &str, conversation: &str) -> String {
    format!(
        "Here are the current fail logs and the conversation so far.\n\n\
         [FAIL LOGS]\n{}\n\n\
         [CONVERSATION LOG so far]\n{}\n\n\
         {}\n",
        fail_logs,
        conversation,
        protocol_instructions()
    )
}
