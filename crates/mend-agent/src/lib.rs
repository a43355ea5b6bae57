//! # mend-agent
//!
//! Model API client and response-protocol parser for Mend.
//!
//! The model answers with free text containing triple-backtick fenced
//! directive blocks: a `branch=<name>, path=<file>` header followed by file
//! content, or a `run` header followed by shell commands, plus at most one
//! `summary=<text>` line anywhere in the response.
//!
//! [`protocol::parse_response`] recovers typed [`mend_core::Directive`]s from
//! that text. The grammar is deliberately forgiving: unrecognized blocks are
//! skipped (and reported), never fatal.

mod auth;
mod client;
pub mod protocol;
mod types;

pub use auth::get_api_key;
pub use client::AgentClient;
pub use protocol::parse_response;
pub use types::*;
