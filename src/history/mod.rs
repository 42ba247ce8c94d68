//! Context-partitioned command history
//!
//! Every command the operator runs is remembered under the (cluster,
//! namespace) pair that was active when it ran. Suggestions are drawn from
//! the current pair only, so commands from a production cluster never leak
//! into a scratch cluster's completions.
//!
//! The store is kept entirely in memory and written back to a JSON file after
//! every mutation. I/O problems are logged and never surface to callers: the
//! in-memory copy stays authoritative and the next mutation tries again.

mod storage;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::error::{ClustermError, StoreError};
use crate::grammar::{Family, ToolNames};

/// Store shared between the completer, hinter and command loop
pub type SharedStore = Arc<RwLock<ContextStore>>;

const DEFAULT_COMPONENT: &str = "default";

/// A (cluster, namespace) pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Context {
    pub cluster: String,
    pub namespace: String,
}

impl Context {
    /// Build a context; blank components become `default`.
    pub fn new(cluster: &str, namespace: &str) -> Self {
        let pick = |value: &str| {
            let value = value.trim();
            if value.is_empty() {
                DEFAULT_COMPONENT.to_string()
            } else {
                value.to_string()
            }
        };
        Self {
            cluster: pick(cluster),
            namespace: pick(namespace),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(DEFAULT_COMPONENT, DEFAULT_COMPONENT)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cluster, self.namespace)
    }
}

/// One remembered command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    pub text: String,
    pub family: Family,
    pub description: String,
    pub cluster: String,
    pub namespace: String,
    /// Ordered, without duplicates
    pub tags: Vec<String>,
    /// Times the command was submitted, at least one
    pub usage_count: u32,
    pub last_used: Option<DateTime<Utc>>,
}

impl CommandRecord {
    /// Context the record belongs to
    pub fn context(&self) -> Context {
        Context::new(&self.cluster, &self.namespace)
    }

    fn matches(&self, needle: &str) -> bool {
        self.text.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

/// Read-only queries over one context's records
#[derive(Debug, Clone, Copy)]
pub struct ContextView<'a> {
    records: &'a [CommandRecord],
}

impl<'a> ContextView<'a> {
    /// Every record, in insertion order
    pub fn get_all(&self) -> &'a [CommandRecord] {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most used first; ties keep insertion order
    pub fn get_frequent(&self, limit: usize) -> Vec<&'a CommandRecord> {
        let mut records: Vec<_> = self.records.iter().collect();
        records.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
        records.truncate(limit);
        records
    }

    /// Most recently used first; records never used are left out
    pub fn get_recent(&self, limit: usize) -> Vec<&'a CommandRecord> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.last_used.is_some())
            .collect();
        records.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        records.truncate(limit);
        records
    }

    /// Case-insensitive substring match on text, description or any tag
    pub fn search(&self, query: &str) -> Vec<&'a CommandRecord> {
        let needle = query.to_lowercase();
        self.records.iter().filter(|r| r.matches(&needle)).collect()
    }

    /// Case-insensitive substring match on the command text only
    pub fn matching_text(&self, query: &str) -> Vec<&'a CommandRecord> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.text.to_lowercase().contains(&needle))
            .collect()
    }

    /// Records targeting one tool
    pub fn by_family(&self, family: Family) -> Vec<&'a CommandRecord> {
        self.records.iter().filter(|r| r.family == family).collect()
    }

    /// Record with exactly this text
    pub fn find(&self, text: &str) -> Option<&'a CommandRecord> {
        self.records.iter().find(|r| r.text == text)
    }
}

/// Persistent, context-partitioned command history
#[derive(Debug)]
pub struct ContextStore {
    path: Option<PathBuf>,
    tools: ToolNames,
    current: Context,
    partitions: BTreeMap<Context, Vec<CommandRecord>>,
}

impl ContextStore {
    /// Open the history file at `path`.
    ///
    /// Never fails: a missing file is created empty and a corrupt one is moved
    /// aside. A file that cannot be read at all is left alone and the store
    /// runs without persistence. Legacy flat records are migrated and the file
    /// is rewritten in the partitioned layout.
    pub fn open(path: impl Into<PathBuf>, tools: ToolNames) -> Self {
        let path = path.into();
        let mut store = Self {
            path: Some(path.clone()),
            tools,
            current: Context::default(),
            partitions: BTreeMap::new(),
        };

        match storage::load(&path, &store.tools) {
            Ok(Some(loaded)) => {
                store.partitions = loaded.partitions;
                tracing::debug!(
                    "Loaded {} commands from {}",
                    store.total_commands(),
                    path.display()
                );
                if loaded.migrated {
                    tracing::info!("Migrated legacy command history in {}", path.display());
                    store.persist();
                }
            }
            Ok(None) => {
                tracing::debug!("Creating command history at {}", path.display());
                store.persist();
            }
            Err(e @ ClustermError::Store(StoreError::Corrupt { .. })) => {
                tracing::warn!("Failed to load command history: {}", e);
                if let Some(moved) = storage::quarantine(&path) {
                    tracing::warn!("Corrupt history moved to {}", moved.display());
                }
            }
            Err(e) => {
                tracing::warn!("Failed to load command history, not saving this session: {}", e);
                store.path = None;
            }
        }

        store
    }

    /// In-memory store without a backing file
    pub fn ephemeral(tools: ToolNames) -> Self {
        Self {
            path: None,
            tools,
            current: Context::default(),
            partitions: BTreeMap::new(),
        }
    }

    /// Wrap the store for sharing
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn tools(&self) -> &ToolNames {
        &self.tools
    }

    /// Active context
    pub fn current(&self) -> &Context {
        &self.current
    }

    /// Switch the active context. No I/O.
    pub fn set_context(&mut self, cluster: &str, namespace: &str) {
        self.current = Context::new(cluster, namespace);
        tracing::debug!("History context set to {}", self.current);
    }

    /// Record a submission in the current context
    pub fn add(&mut self, text: &str, description: &str, tags: &[&str]) {
        self.add_with_context(text, description, tags, None, None);
    }

    /// Record a submission.
    ///
    /// `cluster` and `namespace` override the current context individually.
    /// Re-adding a known command bumps its usage count and timestamp, fills
    /// in a missing description and merges tags.
    pub fn add_with_context(
        &mut self,
        text: &str,
        description: &str,
        tags: &[&str],
        cluster: Option<&str>,
        namespace: Option<&str>,
    ) {
        if text.trim().is_empty() {
            return;
        }

        // blank overrides fall back to the current context
        let cluster = cluster
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&self.current.cluster);
        let namespace = namespace
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.current.namespace);
        let context = Context::new(cluster, namespace);
        let now = Utc::now();
        let records = self.partitions.entry(context.clone()).or_default();

        match records.iter_mut().find(|r| r.text == text) {
            Some(record) => {
                record.usage_count = record.usage_count.saturating_add(1);
                record.last_used = Some(now);
                if record.description.is_empty() {
                    record.description = description.to_string();
                }
                for tag in tags {
                    if !record.tags.iter().any(|t| t == tag) {
                        record.tags.push(tag.to_string());
                    }
                }
            }
            None => {
                let mut unique_tags: Vec<String> = Vec::with_capacity(tags.len());
                for tag in tags {
                    if !unique_tags.iter().any(|t| t == tag) {
                        unique_tags.push(tag.to_string());
                    }
                }
                records.push(CommandRecord {
                    text: text.to_string(),
                    family: Family::classify(text, &self.tools),
                    description: description.to_string(),
                    cluster: context.cluster.clone(),
                    namespace: context.namespace.clone(),
                    tags: unique_tags,
                    usage_count: 1,
                    last_used: Some(now),
                });
            }
        }

        self.persist();
    }

    /// Forget a command in the current context
    pub fn delete(&mut self, text: &str) -> bool {
        let context = self.current.clone();
        self.delete_in(text, &context)
    }

    /// Forget a command in `context`; returns whether anything was removed
    pub fn delete_in(&mut self, text: &str, context: &Context) -> bool {
        let Some(records) = self.partitions.get_mut(context) else {
            return false;
        };
        let before = records.len();
        records.retain(|r| r.text != text);
        let removed = records.len() != before;
        if records.is_empty() {
            self.partitions.remove(context);
        }
        if removed {
            self.persist();
        }
        removed
    }

    /// Queries over any context
    pub fn view(&self, context: &Context) -> ContextView<'_> {
        let records = self
            .partitions
            .get(context)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        ContextView { records }
    }

    /// Queries over the current context
    pub fn current_view(&self) -> ContextView<'_> {
        self.view(&self.current)
    }

    pub fn get_all(&self) -> &[CommandRecord] {
        self.current_view().get_all()
    }

    pub fn get_frequent(&self, limit: usize) -> Vec<&CommandRecord> {
        self.current_view().get_frequent(limit)
    }

    pub fn get_recent(&self, limit: usize) -> Vec<&CommandRecord> {
        self.current_view().get_recent(limit)
    }

    pub fn search(&self, query: &str) -> Vec<&CommandRecord> {
        self.current_view().search(query)
    }

    pub fn by_family(&self, family: Family) -> Vec<&CommandRecord> {
        self.current_view().by_family(family)
    }

    pub fn matching_text(&self, query: &str) -> Vec<&CommandRecord> {
        self.current_view().matching_text(query)
    }

    /// Contexts that hold at least one command
    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.partitions.keys()
    }

    /// `cluster -> namespace -> number of commands`
    pub fn context_summary(&self) -> BTreeMap<String, BTreeMap<String, usize>> {
        let mut summary: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for (context, records) in &self.partitions {
            summary
                .entry(context.cluster.clone())
                .or_default()
                .insert(context.namespace.clone(), records.len());
        }
        summary
    }

    /// Commands across every context
    pub fn total_commands(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = storage::save(path, &self.partitions) {
            tracing::warn!("Failed to save command history: {}", e);
        }
    }
}
