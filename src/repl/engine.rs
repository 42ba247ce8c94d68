use std::sync::Arc;

use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};

use crate::cache::LiveResourceCache;
use crate::config::Config;
use crate::error::{ClustermError, Result};
use crate::history::SharedStore;

use super::completer::ClusterCompleter;
use super::completion::{ClusterCandidateProvider, CompletionEngine};
use super::hinter::ClusterHinter;
use super::prompt::ClusterPrompt;
use super::session::{Outcome, Session};
use super::validator::CommandValidator;

/// Lines kept for up-arrow recall within one session
const EDITOR_HISTORY_SIZE: usize = 1000;

const COMPLETION_MENU: &str = "completion_menu";

/// REPL engine for interactive command entry
pub struct ReplEngine {
    /// Line editor for command input
    editor: Reedline,

    /// Meta commands and submission
    session: Session,

    /// Whether to use ANSI styles on stderr output
    color: bool,

    /// Whether to continue running
    running: bool,
}

impl ReplEngine {
    /// Create a new REPL engine
    ///
    /// # Arguments
    /// * `config` - Loaded configuration
    /// * `store` - Command history shared with the completer and hinter
    /// * `cache` - Live resource cache
    ///
    /// # Returns
    /// * `Result<Self>` - New REPL engine or error
    pub fn new(config: &Config, store: SharedStore, cache: LiveResourceCache) -> Result<Self> {
        let tools = config.tool_names();

        let provider = Arc::new(ClusterCandidateProvider::new(
            tools.clone(),
            cache.clone(),
            store.clone(),
            config.completion.clone(),
        ));
        let completer = ClusterCompleter::new(CompletionEngine::new(provider));
        let hinter = ClusterHinter::new(
            store.clone(),
            CommandValidator::new(tools.clone()),
            config.completion.validation_hints,
        );

        let history = FileBackedHistory::new(EDITOR_HISTORY_SIZE)
            .map_err(|e| ClustermError::Generic(format!("Failed to create line history: {}", e)))?;

        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let menu = ColumnarMenu::default().with_name(COMPLETION_MENU);

        let editor = Reedline::create()
            .with_history(Box::new(history))
            .with_completer(Box::new(completer))
            .with_hinter(Box::new(hinter))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(menu)))
            .with_edit_mode(Box::new(Emacs::new(keybindings)));

        Ok(Self {
            editor,
            session: Session::new(store, cache, tools),
            color: true,
            running: true,
        })
    }

    /// Disable ANSI styles on messages and warnings
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Read a single line of input
    ///
    /// # Returns
    /// * `Result<Option<String>>` - Input line, `Some("")` on Ctrl-C, `None` on EOF
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let prompt = {
            let store = self
                .session
                .store()
                .read()
                .unwrap_or_else(|e| e.into_inner());
            ClusterPrompt::new(store.current())
        };

        match self.editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => Ok(Some(line)),
            // Ctrl-C clears the line but keeps the shell alive
            Ok(Signal::CtrlC) => Ok(Some(String::new())),
            Ok(Signal::CtrlD) => {
                self.running = false;
                Ok(None)
            }
            #[allow(unreachable_patterns)]
            Ok(_) => Ok(Some(String::new())),
            Err(err) => Err(ClustermError::Generic(format!("Read error: {}", err))),
        }
    }

    /// Handle one submitted line
    ///
    /// Accepted commands are written to stdout, everything else to stderr.
    pub fn handle(&mut self, line: &str) {
        match self.session.handle(line) {
            Outcome::Nothing => {}
            Outcome::Message(text) => eprintln!("{}", text),
            Outcome::Emit { command, warning } => {
                if let Some(reason) = warning {
                    eprintln!("{}", self.paint(Color::Yellow.bold(), &format!("warning: {}", reason)));
                }
                println!("{}", command);
            }
            Outcome::Exit => self.running = false,
        }
    }

    /// Check if REPL is still running
    ///
    /// # Returns
    /// * `bool` - True if running
    pub fn is_running(&self) -> bool {
        self.running
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }
}
