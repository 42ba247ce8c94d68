//! Completion system for the clusterm shell
//!
//! Completion works on whitespace-separated words and never blocks on the
//! cluster: live names come from the cache as they are right now, and a stale
//! cache only schedules a background refresh.
//!
//! # Architecture
//!
//! - **Context**: what kind of word sits under the cursor (verb, resource,
//!   flag value, ...), worked out from the word count and the grammar
//! - **Provider**: fetches candidates for a context from the grammar, the
//!   live resource cache and the command history
//! - **Engine**: orchestrates the flow and turns words into candidates with
//!   replacement offsets
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use clusterm::cache::LiveResourceCache;
//! use clusterm::config::Config;
//! use clusterm::history::ContextStore;
//! use clusterm::repl::completion::{ClusterCandidateProvider, CompletionEngine};
//!
//! let config = Config::default();
//! let tools = config.tool_names();
//! let store = ContextStore::ephemeral(tools.clone()).into_shared();
//! let cache = LiveResourceCache::offline(&config.cache);
//! let provider = Arc::new(ClusterCandidateProvider::new(
//!     tools,
//!     cache,
//!     store,
//!     config.completion.clone(),
//! ));
//! let engine = CompletionEngine::new(provider);
//!
//! // Verbs starting with "desc", replacing the four typed characters
//! for candidate in engine.complete("kubectl desc") {
//!     println!("{} ({})", candidate.replacement, candidate.start_offset);
//! }
//! ```

mod context;
mod engine;
mod provider;

pub use context::CompletionContext;
pub use engine::{CompletionCandidate, CompletionEngine};
pub use provider::{CandidateProvider, ClusterCandidateProvider};
