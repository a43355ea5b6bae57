//! # mend-vcs
//!
//! Git integration for the Mend loop: a [`GitExecutor`] trait over
//! subprocess git (with a per-invocation deadline), and the
//! [`ChangeApplier`] that turns parsed directives into branch commits and
//! force-pushes.
//!
//! The working tree is a single shared mutable resource: one checked-out
//! branch at a time. The applier therefore owns its [`WorkTree`] handle
//! exclusively for the duration of one `apply` call and applies directives
//! strictly in order, one at a time. Failure of one directive never stops
//! the rest of the batch.

mod applier;
mod executor;

pub use applier::{validate_path, ChangeApplier, WorkTree};
pub use executor::{GitCommand, GitExecutor};
