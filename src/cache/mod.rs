//! Live resource cache
//!
//! Holds the names of cluster objects (pods, services, releases, ...) next to
//! the static grammar metadata the completion engine draws from. Reads never
//! block on the cluster: an expired cache schedules one background refresh on
//! the tokio runtime and keeps serving what it has.
//!
//! # Refresh cycle
//!
//! 1. The primary [`ResourceProvider`] (if any) is asked for every category.
//! 2. If it fails, the fallback provider is asked category by category and
//!    whatever succeeds replaces the previous value.
//! 3. If nothing succeeds the entries stay as they are and the cache is aged
//!    so the next attempt happens `retry_after_failure` later.

mod category;
mod provider;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::runtime::Handle;

use crate::config::CacheConfig;
use crate::grammar::ToolNames;

pub use category::{Category, Entries};
pub use provider::{CliResourceProvider, ResourceProvider};

/// Where a refresh gets its data from
#[derive(Clone, Default)]
pub struct FetchSources {
    /// Asked first for every category
    pub primary: Option<Arc<dyn ResourceProvider>>,
    /// Asked per category when the primary fails or is absent
    pub fallback: Option<Arc<dyn ResourceProvider>>,
}

impl FetchSources {
    /// No live data at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Shell out to the external tools
    pub fn cli(tools: ToolNames, timeout: Duration) -> Self {
        Self {
            primary: None,
            fallback: Some(Arc::new(CliResourceProvider::new(tools, timeout))),
        }
    }

    /// Put `provider` in front of the existing sources
    pub fn with_primary(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    fn is_empty(&self) -> bool {
        self.primary.is_none() && self.fallback.is_none()
    }
}

struct CacheInner {
    /// Replaced wholesale, never edited in place
    entries: RwLock<Arc<Entries>>,
    /// `None` means expired
    last_updated: Mutex<Option<Instant>>,
    namespace: RwLock<String>,
    /// Bumped whenever a running fetch's result becomes unwanted
    generation: AtomicU64,
    fetching: AtomicBool,
    attempts: AtomicU64,
    ttl: Duration,
    retry_after_failure: Duration,
    sources: FetchSources,
    runtime: Option<Handle>,
}

/// Clears the in-flight flag however the fetch task ends
struct InFlight(Arc<CacheInner>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetching.store(false, Ordering::Release);
    }
}

/// Time-bounded cache of resource names
#[derive(Clone)]
pub struct LiveResourceCache {
    inner: Arc<CacheInner>,
}

impl LiveResourceCache {
    /// Create a cache
    ///
    /// # Arguments
    /// * `config` - TTL and retry settings
    /// * `sources` - Providers used by refreshes
    /// * `runtime` - Runtime the refresh task is spawned on; without one the
    ///   cache only serves its seed data
    pub fn new(config: &CacheConfig, sources: FetchSources, runtime: Option<Handle>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: RwLock::new(Arc::new(category::seed_entries())),
                last_updated: Mutex::new(None),
                namespace: RwLock::new("default".to_string()),
                generation: AtomicU64::new(0),
                fetching: AtomicBool::new(false),
                attempts: AtomicU64::new(0),
                ttl: config.ttl(),
                retry_after_failure: config.retry_after_failure(),
                sources,
                runtime,
            }),
        }
    }

    /// A cache that never fetches
    pub fn offline(config: &CacheConfig) -> Self {
        Self::new(config, FetchSources::none(), None)
    }

    /// Entries for a category, scheduling a refresh if the category is live
    /// and the cache is stale
    pub fn get(&self, category: Category) -> Vec<String> {
        if category.is_live() {
            self.refresh_if_needed();
        }
        self.peek(category)
    }

    /// Entries for a category without touching the refresh machinery
    pub fn peek(&self, category: Category) -> Vec<String> {
        self.snapshot().get(&category).cloned().unwrap_or_default()
    }

    /// Current entries
    pub fn snapshot(&self) -> Arc<Entries> {
        let guard = self
            .inner
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Whether the data is older than the TTL
    pub fn is_expired(&self) -> bool {
        self.inner.is_expired()
    }

    /// Whether a refresh task is running
    pub fn is_fetching(&self) -> bool {
        self.inner.fetching.load(Ordering::Acquire)
    }

    /// Number of refresh cycles started so far
    pub fn refresh_attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::Relaxed)
    }

    /// Age of the data, `None` if it has never been refreshed or was
    /// invalidated
    pub fn age(&self) -> Option<Duration> {
        self.inner.last_updated().map(|at| at.elapsed())
    }

    /// Namespace pods, services, deployments and releases are listed in
    pub fn namespace(&self) -> String {
        self.inner
            .namespace
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Switch namespace; the namespaced categories become stale.
    pub fn set_namespace(&self, namespace: &str) {
        let namespace = if namespace.is_empty() {
            "default"
        } else {
            namespace
        };
        {
            let mut current = self
                .inner
                .namespace
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *current == namespace {
                return;
            }
            *current = namespace.to_string();
        }
        tracing::debug!("Live cache namespace set to {}", namespace);
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.set_last_updated(None);
    }

    /// Mark the cache expired and try to fetch immediately
    pub fn force_refresh(&self) -> bool {
        self.inner.set_last_updated(None);
        self.refresh_if_needed()
    }

    /// Start a background refresh if the data is stale and none is running.
    ///
    /// Returns immediately; `true` means a fetch task was spawned.
    pub fn refresh_if_needed(&self) -> bool {
        if !self.inner.is_expired() || self.inner.sources.is_empty() {
            return false;
        }
        let Some(runtime) = self.inner.runtime.as_ref() else {
            return false;
        };

        if self
            .inner
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        self.inner.attempts.fetch_add(1, Ordering::Relaxed);
        let guard = InFlight(Arc::clone(&self.inner));
        runtime.spawn(async move {
            guard.0.refresh().await;
            drop(guard);
        });
        true
    }
}

impl CacheInner {
    fn last_updated(&self) -> Option<Instant> {
        *self
            .last_updated
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_last_updated(&self, at: Option<Instant>) {
        *self
            .last_updated
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = at;
    }

    fn is_expired(&self) -> bool {
        match self.last_updated() {
            Some(at) => at.elapsed() > self.ttl,
            None => true,
        }
    }

    fn current_entries(&self) -> Arc<Entries> {
        let guard = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    async fn refresh(&self) {
        let generation = self.generation.load(Ordering::Acquire);
        let namespace = self
            .namespace
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let previous = self.current_entries();

        let mut fetched = None;
        if let Some(primary) = &self.sources.primary {
            match fetch_all(primary.as_ref(), &namespace, &previous).await {
                Ok(entries) => fetched = Some(entries),
                Err(e) => tracing::warn!("Resource provider failed, falling back: {}", e),
            }
        }
        if fetched.is_none() {
            if let Some(fallback) = &self.sources.fallback {
                fetched = fetch_each(fallback.as_ref(), &namespace, &previous).await;
            }
        }

        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!("Discarding live data fetched for namespace {}", namespace);
            return;
        }

        match fetched {
            Some(entries) => {
                *self
                    .entries
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(entries);
                self.set_last_updated(Some(Instant::now()));
                tracing::debug!("Live resource cache refreshed");
            }
            None => {
                // Leave the data alone and pretend it is almost stale again
                let aged = self.ttl.saturating_sub(self.retry_after_failure);
                let at = Instant::now().checked_sub(aged).unwrap_or_else(Instant::now);
                self.set_last_updated(Some(at));
                tracing::warn!(
                    "Live resource refresh failed, retrying in {}s",
                    self.retry_after_failure.as_secs()
                );
            }
        }
    }
}

/// Fetch every live category from one provider, all or nothing.
///
/// Release listing is optional: a failure keeps the previous release names.
async fn fetch_all(
    provider: &dyn ResourceProvider,
    namespace: &str,
    previous: &Entries,
) -> crate::error::Result<Entries> {
    let (namespaces, pods, services, deployments, nodes) = tokio::try_join!(
        provider.list_namespaces(),
        provider.list_pods(namespace),
        provider.list_services(namespace),
        provider.list_deployments(namespace),
        provider.list_nodes(),
    )?;

    let mut entries = previous.clone();
    entries.insert(Category::Namespaces, namespaces);
    entries.insert(Category::Pods, pods);
    entries.insert(Category::Services, services);
    entries.insert(Category::Deployments, deployments);
    entries.insert(Category::Nodes, nodes);

    match provider.list_releases(namespace).await {
        Ok(releases) => {
            entries.insert(Category::Releases, releases);
        }
        Err(e) => tracing::debug!("Release listing failed: {}", e),
    }

    Ok(entries)
}

/// Fetch live categories one by one, keeping old values for failures.
///
/// Returns `None` when not a single category could be fetched.
async fn fetch_each(
    provider: &dyn ResourceProvider,
    namespace: &str,
    previous: &Entries,
) -> Option<Entries> {
    let (categories, jobs): (Vec<_>, Vec<_>) = vec![
        (Category::Namespaces, provider.list_namespaces()),
        (Category::Pods, provider.list_pods(namespace)),
        (Category::Services, provider.list_services(namespace)),
        (Category::Deployments, provider.list_deployments(namespace)),
        (Category::Nodes, provider.list_nodes()),
        (Category::Releases, provider.list_releases(namespace)),
    ]
    .into_iter()
    .unzip();

    let mut entries = previous.clone();
    let mut succeeded = 0;
    for (category, result) in categories.into_iter().zip(join_all(jobs).await) {
        match result {
            Ok(names) => {
                entries.insert(category, names);
                succeeded += 1;
            }
            Err(e) => tracing::debug!("Fetching {} failed: {}", category, e),
        }
    }

    (succeeded > 0).then_some(entries)
}
