//! Interactive shell for clusterm
//!
//! This module provides the interactive front end:
//! - Line editing with reedline
//! - Tab completion from the grammar, live resources and history
//! - Inline hints from history, or the reason a line is invalid
//! - A prompt showing the active cluster and namespace
//! - Meta commands for inspecting and editing the history
//!
//! Commands are never executed here. An accepted line is recorded in the
//! history and printed to stdout for the caller to run.

mod completer;
pub mod completion;
mod engine;
mod hinter;
mod prompt;
mod session;
mod validator;

pub use completer::ClusterCompleter;
pub use engine::ReplEngine;
pub use hinter::ClusterHinter;
pub use prompt::ClusterPrompt;
pub use session::{Outcome, Session, format_record, format_records, format_summary};
pub use validator::{CommandValidator, Validation};
