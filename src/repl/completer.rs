//! Completer for reedline - provides completion suggestions

use reedline::{Completer, Span, Suggestion};

use super::completion::{CompletionCandidate, CompletionEngine};

/// Reedline completer backed by the completion engine
pub struct ClusterCompleter {
    /// Completion engine for intelligent suggestions
    completion_engine: CompletionEngine,
}

impl ClusterCompleter {
    /// Create a new completer
    ///
    /// # Arguments
    /// * `completion_engine` - Engine producing the candidates
    pub fn new(completion_engine: CompletionEngine) -> Self {
        Self { completion_engine }
    }
}

/// Byte index `chars` characters before the end of `text`
fn start_of_replacement(text: &str, chars: usize) -> usize {
    if chars == 0 {
        return text.len();
    }
    text.char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(index, _)| index)
        .unwrap_or(0)
}

/// Turn an engine candidate into a reedline suggestion for `text` (the line
/// up to the cursor).
fn to_suggestion(text: &str, candidate: CompletionCandidate) -> Suggestion {
    let replaced = candidate.start_offset.unsigned_abs();
    let start = start_of_replacement(text, replaced);

    // The engine offers the next word at offset 0; keep it from gluing onto
    // the word the cursor sits on.
    let needs_separator =
        replaced == 0 && !text.trim().is_empty() && !text.ends_with(char::is_whitespace);
    let value = if needs_separator {
        format!(" {}", candidate.replacement)
    } else {
        candidate.replacement
    };
    // selector and chart values are completed up to the '='
    let append_whitespace = !value.ends_with('=');

    Suggestion {
        value,
        span: Span::new(start, text.len()),
        append_whitespace,
        ..Default::default()
    }
}

impl Completer for ClusterCompleter {
    /// Complete the input at the given cursor position
    ///
    /// # Arguments
    /// * `line` - The input line
    /// * `pos` - Cursor position (byte index)
    ///
    /// # Returns
    /// * `Vec<Suggestion>` - List of completion suggestions
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let pos = pos.min(line.len());
        let Some(text) = line.get(..pos) else {
            return Vec::new();
        };

        self.completion_engine
            .complete(text)
            .map(|candidate| to_suggestion(text, candidate))
            .collect()
    }
}
