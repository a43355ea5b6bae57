//! # mend-orchestrator
//!
//! The run driver for the Mend self-healing loop. One run:
//!
//! 1. reads the failure-evidence file and the conversation log
//! 2. asks the model for fixes (one completion request)
//! 3. parses the response into directives and a summary
//! 4. appends the summary to the conversation log
//! 5. applies the directives to the working tree, in order
//!
//! Fatal errors (missing API key, missing fail log, upstream failure) abort
//! before any side effects. Per-directive failures are recorded and never
//! abort the batch.

mod conversation;
mod prompt;
mod run;

pub use conversation::ConversationLog;
pub use prompt::{compose_user_prompt, protocol_instructions, system_prompt};
pub use run::{handle_response, run_once, RunOptions};
