//! clusterm library
//!
//! Command assistance for a cluster-control CLI (`kubectl`) and a release
//! manager CLI (`helm`): tab completion, inline hints, validation and a
//! command history partitioned by cluster and namespace. The pieces can be
//! used without the interactive shell.
//!
//! # Modules
//!
//! - `cache`: Live resource names with background refresh
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `grammar`: Static command grammar of both tools
//! - `history`: Context-partitioned command history
//! - `repl`: Completion engine, validator and interactive shell
//!
//! # Example
//!
//! ```no_run
//! use clusterm::grammar::ToolNames;
//! use clusterm::history::ContextStore;
//! use clusterm::repl::{CommandValidator, Validation};
//!
//! let mut store = ContextStore::open("/tmp/clusterm-history.json", ToolNames::default());
//! store.set_context("prod", "web");
//!
//! let validator = CommandValidator::default();
//! let line = "kubectl get pods";
//! if validator.validate(line) == Validation::Ok {
//!     store.add(line, "list pods", &["triage"]);
//! }
//!
//! for record in store.get_frequent(5) {
//!     println!("{} ({}x)", record.text, record.usage_count);
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod grammar;
pub mod history;
pub mod repl;

// Re-export commonly used types
pub use cache::LiveResourceCache;
pub use config::Config;
pub use error::{ClustermError, Result};
pub use history::{CommandRecord, Context, ContextStore};
pub use repl::{ReplEngine, Validation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
