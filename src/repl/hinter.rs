//! Hinter for reedline - inline hints from history and the validator

use nu_ansi_term::{Color, Style};
use reedline::{Hinter, History};

use super::validator::CommandValidator;
use crate::history::SharedStore;

/// Shows the rest of a remembered command, or why the line is wrong
pub struct ClusterHinter {
    /// Command history of the active context
    store: SharedStore,
    /// Validator consulted when no remembered command matches
    validator: CommandValidator,
    /// Show validation errors at all
    validation_hints: bool,
    /// Style for history hints
    style: Style,
    /// Style for validation errors
    error_style: Style,
    /// Current hint text
    current_hint: String,
}

impl ClusterHinter {
    /// Create a new hinter
    ///
    /// # Arguments
    /// * `store` - Command history
    /// * `validator` - Validator for error hints
    /// * `validation_hints` - Whether to show validation errors
    pub fn new(store: SharedStore, validator: CommandValidator, validation_hints: bool) -> Self {
        Self {
            store,
            validator,
            validation_hints,
            style: Style::new().italic().fg(Color::DarkGray),
            error_style: Style::new().dimmed().fg(Color::Red),
            current_hint: String::new(),
        }
    }

    /// Remainder of the most recently used command extending `line`
    fn history_hint(&self, line: &str) -> Option<String> {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        let view = store.current_view();

        let mut candidates: Vec<_> = view
            .get_all()
            .iter()
            .filter(|r| r.text.len() > line.len() && r.text.starts_with(line))
            .collect();
        candidates.sort_by(|a, b| b.last_used.cmp(&a.last_used));

        candidates
            .first()
            .map(|record| record.text[line.len()..].to_string())
    }
}

impl Hinter for ClusterHinter {
    /// Provide a hint for the current line
    ///
    /// # Arguments
    /// * `line` - The current input line
    /// * `pos` - Cursor position
    /// * `_history` - Reedline's own history (unused, hints come from the store)
    /// * `use_ansi_coloring` - Whether to use ANSI colors
    /// * `_cwd` - Current working directory (unused)
    ///
    /// # Returns
    /// * `String` - Hint text to display after the cursor
    fn handle(
        &mut self,
        line: &str,
        pos: usize,
        _history: &dyn History,
        use_ansi_coloring: bool,
        _cwd: &str,
    ) -> String {
        self.current_hint.clear();

        // Only provide hints if cursor is at the end of the line
        if pos != line.len() || line.trim().is_empty() {
            return String::new();
        }

        if let Some(hint) = self.history_hint(line) {
            self.current_hint = hint;
            return if use_ansi_coloring {
                self.style.paint(&self.current_hint).to_string()
            } else {
                self.current_hint.clone()
            };
        }

        if !self.validation_hints {
            return String::new();
        }

        // Errors are shown but never accepted into the line
        match self.validator.validate(line).message() {
            Some(message) => {
                let hint = format!("  ({})", message);
                if use_ansi_coloring {
                    self.error_style.paint(hint).to_string()
                } else {
                    hint
                }
            }
            None => String::new(),
        }
    }

    /// Return the next word of the hint
    fn next_hint_token(&self) -> String {
        let trimmed = self.current_hint.trim_start();
        let leading = &self.current_hint[..self.current_hint.len() - trimmed.len()];
        let word = trimmed.split_whitespace().next().unwrap_or_default();
        format!("{}{}", leading, word)
    }

    /// Return the complete hint
    fn complete_hint(&self) -> String {
        self.current_hint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ToolNames;
    use crate::history::ContextStore;
    use reedline::FileBackedHistory;

    fn create_test_hinter() -> (ClusterHinter, SharedStore) {
        let store = ContextStore::ephemeral(ToolNames::default()).into_shared();
        let hinter = ClusterHinter::new(store.clone(), CommandValidator::default(), true);
        (hinter, store)
    }

    fn create_test_history() -> Box<dyn History> {
        Box::new(FileBackedHistory::new(10).expect("in-memory history"))
    }

    #[test]
    fn test_empty_line_no_hint() {
        let (mut hinter, _) = create_test_hinter();
        let history = create_test_history();
        assert_eq!(hinter.handle("", 0, history.as_ref(), false, "/tmp"), "");
    }

    #[test]
    fn test_cursor_not_at_end_no_hint() {
        let (mut hinter, store) = create_test_hinter();
        store.write().unwrap().add("kubectl get pods", "", &[]);
        let history = create_test_history();
        assert_eq!(hinter.handle("kubectl", 2, history.as_ref(), false, "/tmp"), "");
    }

    #[test]
    fn test_history_hint() {
        let (mut hinter, store) = create_test_hinter();
        store
            .write()
            .unwrap()
            .add("kubectl logs web-1 --follow", "", &[]);
        let history = create_test_history();

        let hint = hinter.handle("kubectl logs", 12, history.as_ref(), false, "/tmp");
        assert_eq!(hint, " web-1 --follow");
        assert_eq!(hinter.complete_hint(), " web-1 --follow");
        assert_eq!(hinter.next_hint_token(), " web-1");
    }

    #[test]
    fn test_hint_only_from_current_context() {
        let (mut hinter, store) = create_test_hinter();
        {
            let mut store = store.write().unwrap();
            store.set_context("prod", "web");
            store.add("helm status ingress", "", &[]);
            store.set_context("dev", "web");
        }
        let history = create_test_history();
        assert_eq!(hinter.handle("helm status", 11, history.as_ref(), false, "/tmp"), "");
    }

    #[test]
    fn test_validation_error_hint_is_not_accepted() {
        let (mut hinter, _) = create_test_hinter();
        let history = create_test_history();

        let hint = hinter.handle("kubectl bogus", 13, history.as_ref(), false, "/tmp");
        assert_eq!(hint, "  (Unknown kubectl subcommand: bogus)");
        assert_eq!(hinter.complete_hint(), "");
        assert_eq!(hinter.next_hint_token(), "");
    }

    #[test]
    fn test_validation_hints_disabled() {
        let store = ContextStore::ephemeral(ToolNames::default()).into_shared();
        let mut hinter = ClusterHinter::new(store, CommandValidator::default(), false);
        let history = create_test_history();
        assert_eq!(hinter.handle("kubectl get", 11, history.as_ref(), false, "/tmp"), "");
    }
}
