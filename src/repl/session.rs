//! Line handling behind the prompt
//!
//! A submitted line is either a meta command (`:context`, `:history`, ...)
//! answered from the store and cache, or a tool command that is validated,
//! recorded and handed back to the caller for emission.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use crate::cache::LiveResourceCache;
use crate::grammar::ToolNames;
use crate::history::{CommandRecord, ContextStore, SharedStore};

use super::validator::CommandValidator;

const DEFAULT_LIST_LIMIT: usize = 10;

const HELP_TEXT: &str = "\
Meta commands:
  :context [cluster [namespace]]  Show or switch the active context
  :history                        List commands of the active context
  :frequent [n]                   Most used commands
  :recent [n]                     Most recently used commands
  :search <query>                 Search text, descriptions and tags
  :delete <command>               Forget a command in the active context
  :summary                        Command counts per context
  :refresh                        Refresh live resource names now
  :help                           Show this help
  exit | quit                     Leave the shell";

/// What the caller should do with a handled line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Blank line
    Nothing,
    /// Informational output for the operator
    Message(String),
    /// An accepted tool command, with the validator's complaint if any
    Emit {
        command: String,
        warning: Option<String>,
    },
    /// Leave the shell
    Exit,
}

/// Interprets submitted lines against the store and cache
#[derive(Clone)]
pub struct Session {
    store: SharedStore,
    cache: LiveResourceCache,
    validator: CommandValidator,
}

impl Session {
    pub fn new(store: SharedStore, cache: LiveResourceCache, tools: ToolNames) -> Self {
        Self {
            store,
            cache,
            validator: CommandValidator::new(tools),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn cache(&self) -> &LiveResourceCache {
        &self.cache
    }

    /// Handle one submitted line
    pub fn handle(&self, line: &str) -> Outcome {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Outcome::Nothing;
        }

        if matches!(trimmed, "exit" | "quit" | ":exit" | ":quit" | ":q") {
            return Outcome::Exit;
        }

        match trimmed.strip_prefix(':') {
            Some(meta) => self.handle_meta(meta),
            None => self.submit(trimmed),
        }
    }

    /// Validate, record and hand back a tool command
    fn submit(&self, command: &str) -> Outcome {
        let warning = self.validator.validate(command).message().map(str::to_string);
        if let Some(reason) = &warning {
            tracing::debug!("Submitting invalid command {:?}: {}", command, reason);
        }

        let description = format!("Execute {}", command);
        self.write_store().add(command, &description, &[]);

        Outcome::Emit {
            command: command.to_string(),
            warning,
        }
    }

    fn handle_meta(&self, meta: &str) -> Outcome {
        let (name, rest) = match meta.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (meta, ""),
        };

        match name {
            "context" | "ctx" => self.context_command(rest),
            "history" => {
                let store = self.read_store();
                let records: Vec<&CommandRecord> = store.get_all().iter().collect();
                Outcome::Message(format_records(&records))
            }
            "frequent" => match parse_limit(rest) {
                Ok(limit) => Outcome::Message(format_records(&self.read_store().get_frequent(limit))),
                Err(message) => Outcome::Message(message),
            },
            "recent" => match parse_limit(rest) {
                Ok(limit) => Outcome::Message(format_records(&self.read_store().get_recent(limit))),
                Err(message) => Outcome::Message(message),
            },
            "search" => {
                if rest.is_empty() {
                    return Outcome::Message("Usage: :search <query>".to_string());
                }
                Outcome::Message(format_records(&self.read_store().search(rest)))
            }
            "delete" => {
                if rest.is_empty() {
                    return Outcome::Message("Usage: :delete <command>".to_string());
                }
                if self.write_store().delete(rest) {
                    Outcome::Message(format!("Deleted: {}", rest))
                } else {
                    Outcome::Message(format!("No such command in this context: {}", rest))
                }
            }
            "summary" => Outcome::Message(format_summary(&self.read_store().context_summary())),
            "refresh" => {
                if self.cache.force_refresh() {
                    Outcome::Message("Refreshing live resource names".to_string())
                } else if self.cache.is_fetching() {
                    Outcome::Message("A refresh is already running".to_string())
                } else {
                    Outcome::Message("Live resource fetching is disabled".to_string())
                }
            }
            "help" | "h" | "?" => Outcome::Message(HELP_TEXT.to_string()),
            other => Outcome::Message(format!("Unknown meta command ':{}' (try :help)", other)),
        }
    }

    fn context_command(&self, args: &str) -> Outcome {
        let mut words = args.split_whitespace();
        let Some(cluster) = words.next() else {
            return Outcome::Message(format!("Current context: {}", self.read_store().current()));
        };

        let current = self.read_store().current().clone();
        let namespace = words.next().unwrap_or(current.namespace.as_str());

        let context = {
            let mut store = self.write_store();
            store.set_context(cluster, namespace);
            store.current().clone()
        };
        self.cache.set_namespace(&context.namespace);

        Outcome::Message(format!("Switched to {}", context))
    }

    fn read_store(&self) -> RwLockReadGuard<'_, ContextStore> {
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, ContextStore> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_limit(arg: &str) -> std::result::Result<usize, String> {
    if arg.is_empty() {
        return Ok(DEFAULT_LIST_LIMIT);
    }
    match arg.parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(format!("Expected a positive number, got '{}'", arg)),
    }
}

/// One line per record: usage count, last use and text
pub fn format_record(record: &CommandRecord) -> String {
    let last_used = record
        .last_used
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut line = format!(
        "{:>4}x  {}  {:<7}  {}",
        record.usage_count,
        last_used,
        record.family.label(),
        record.text
    );
    if !record.tags.is_empty() {
        let _ = write!(line, "  [{}]", record.tags.join(", "));
    }
    line
}

pub fn format_records(records: &[&CommandRecord]) -> String {
    if records.is_empty() {
        return "No commands".to_string();
    }
    records
        .iter()
        .map(|record| format_record(record))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render [`ContextStore::context_summary`] output
pub fn format_summary(summary: &BTreeMap<String, BTreeMap<String, usize>>) -> String {
    if summary.is_empty() {
        return "No commands".to_string();
    }

    let mut out = String::new();
    for (cluster, namespaces) in summary {
        let total: usize = namespaces.values().sum();
        let _ = writeln!(out, "{} ({} commands)", cluster, total);
        for (namespace, count) in namespaces {
            let _ = writeln!(out, "  {:<24} {}", namespace, count);
        }
    }
    out.trim_end().to_string()
}
