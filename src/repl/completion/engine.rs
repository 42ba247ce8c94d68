//! Completion engine - orchestrates the completion flow
//!
//! Ties together context detection and candidate fetching: refresh live data
//! if needed, work out what the word under the cursor is, ask the provider for
//! matching words and fall back to the history when the grammar has nothing
//! to offer.

use std::sync::Arc;

use super::context::CompletionContext;
use super::provider::CandidateProvider;

/// A suggested replacement for the text before the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    /// Text to insert
    pub replacement: String,
    /// Negative number of characters before the cursor the replacement
    /// overwrites; `0` inserts at the cursor
    pub start_offset: isize,
}

impl CompletionCandidate {
    fn new(replacement: String, replaced: &str) -> Self {
        let replaced = replaced.chars().count() as isize;
        Self {
            replacement,
            start_offset: -replaced,
        }
    }
}

/// Main completion engine
pub struct CompletionEngine {
    /// Candidate provider for fetching suggestions
    provider: Arc<dyn CandidateProvider>,
}

impl CompletionEngine {
    /// Create a new completion engine
    ///
    /// # Arguments
    /// * `provider` - Candidate provider for fetching suggestions
    pub fn new(provider: Arc<dyn CandidateProvider>) -> Self {
        Self { provider }
    }

    /// Complete the text before the cursor.
    ///
    /// Candidates come out in priority order. Different sources are not
    /// de-duplicated against each other.
    pub fn complete(&self, text_before_cursor: &str) -> impl Iterator<Item = CompletionCandidate> {
        // 1. Never waits for the cluster
        self.provider.refresh();

        // 2. Work out what is being typed
        let context = CompletionContext::analyze(text_before_cursor, &self.provider.tools());

        // 3. Ask the provider, degrading to history search
        let mut candidates = self.fetch_candidates(&context);
        let mut replaced = context.prefix();
        if candidates.is_empty() && !context.is_history() {
            candidates = self.provider.history(text_before_cursor);
            replaced = text_before_cursor;
        }

        tracing::trace!(
            "{} completion candidates for {:?}",
            candidates.len(),
            text_before_cursor
        );

        let replaced = replaced.to_string();
        candidates
            .into_iter()
            .map(move |candidate| CompletionCandidate::new(candidate, &replaced))
    }

    /// Fetch candidates based on completion context
    fn fetch_candidates(&self, context: &CompletionContext) -> Vec<String> {
        let provider = &self.provider;
        match context {
            CompletionContext::CommonCommands => provider.common_commands(),
            CompletionContext::Verbs { family, prefix } => provider.verbs(*family, prefix),
            CompletionContext::Arguments {
                family,
                verb,
                prefix,
            } => provider.arguments(*family, verb, prefix),
            CompletionContext::Resources {
                family,
                verb,
                prefix,
            } => provider.resources(*family, verb, prefix),
            CompletionContext::LiveNames { category, prefix }
            | CompletionContext::FlagValues { category, prefix }
            | CompletionContext::ArgumentValues { category, prefix } => {
                provider.names(*category, prefix)
            }
            CompletionContext::Flags {
                family,
                verb,
                prefix,
            } => provider.flags(*family, verb, prefix),
            CompletionContext::ToolsAndVerbs { prefix } => provider.tools_and_verbs(prefix),
            CompletionContext::History { query } => provider.history(query),
        }
    }
}
