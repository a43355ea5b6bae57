//! # mend-core
//!
//! Core types for the Mend self-healing loop.
//!
//! Mend watches a repository's failure evidence, asks a language model to
//! propose multi-file, multi-branch fixes, and mechanically applies those
//! proposals to the working tree. This crate holds the pieces every other
//! crate shares:
//!
//! - the directive model (typed instructions extracted from a model response)
//! - per-directive application results and run reports
//! - the unified error type
//! - repository-level configuration

mod config;
mod error;
mod types;

pub use config::{FilesConfig, GitConfig, MendConfig, ModelConfig};
pub use error::{MendError, Result};
pub use types::*;
