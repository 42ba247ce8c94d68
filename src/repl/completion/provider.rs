//! Candidate provider for completion suggestions
//!
//! The engine decides *what* to complete; a [`CandidateProvider`] knows
//! *where* the words come from. [`ClusterCandidateProvider`] draws on the
//! static grammar, the live resource cache and the command history.

use crate::cache::{Category, LiveResourceCache};
use crate::config::CompletionConfig;
use crate::grammar::{self, Family, ToolNames};
use crate::history::SharedStore;

/// Trait for providing completion candidates
///
/// Every method returns candidates in priority order, already filtered by
/// `prefix` where one is taken.
pub trait CandidateProvider: Send + Sync {
    /// Tool names the engine dispatches on
    fn tools(&self) -> ToolNames;

    /// Kick off a background refresh of live data if it is stale
    fn refresh(&self);

    /// Suggestions for an empty line
    fn common_commands(&self) -> Vec<String>;

    /// Verbs of a tool
    fn verbs(&self, family: Family, prefix: &str) -> Vec<String>;

    /// Word after a verb
    fn arguments(&self, family: Family, verb: &str, prefix: &str) -> Vec<String>;

    /// Resource types a verb works on
    fn resources(&self, family: Family, verb: &str, prefix: &str) -> Vec<String>;

    /// Flags of a verb
    fn flags(&self, family: Family, verb: &str, prefix: &str) -> Vec<String>;

    /// Cached names in a category
    fn names(&self, category: Category, prefix: &str) -> Vec<String>;

    /// Tool names and `tool verb` pairs starting with `prefix`
    fn tools_and_verbs(&self, prefix: &str) -> Vec<String>;

    /// Remembered commands containing `query`
    fn history(&self, query: &str) -> Vec<String>;
}

/// Keep the items starting with `prefix`, in their original order
fn filter_by_prefix<'a, I>(items: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    items
        .into_iter()
        .filter(|item| item.starts_with(prefix))
        .map(str::to_string)
        .collect()
}

/// Provider backed by the grammar tables, the live cache and the history
pub struct ClusterCandidateProvider {
    tools: ToolNames,
    cache: LiveResourceCache,
    store: SharedStore,
    config: CompletionConfig,
}

impl ClusterCandidateProvider {
    /// Create a new candidate provider
    ///
    /// # Arguments
    /// * `tools` - Names of the two external tools
    /// * `cache` - Live resource cache
    /// * `store` - Command history
    /// * `config` - Completion limits
    pub fn new(
        tools: ToolNames,
        cache: LiveResourceCache,
        store: SharedStore,
        config: CompletionConfig,
    ) -> Self {
        Self {
            tools,
            cache,
            store,
            config,
        }
    }

    fn cached(&self, category: Category, prefix: &str) -> Vec<String> {
        let names = self.cache.get(category);
        filter_by_prefix(names.iter().map(String::as_str), prefix)
    }
}

impl CandidateProvider for ClusterCandidateProvider {
    fn tools(&self) -> ToolNames {
        self.tools.clone()
    }

    fn refresh(&self) {
        self.cache.refresh_if_needed();
    }

    fn common_commands(&self) -> Vec<String> {
        let cluster = &self.tools.cluster;
        let release = &self.tools.release;
        let mut common = vec![
            format!("{cluster} get pods"),
            format!("{cluster} get services"),
            format!("{cluster} logs"),
            format!("{release} list"),
            format!("{cluster} get deployments"),
            format!("{cluster} describe pod"),
        ];

        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        for record in store.get_recent(self.config.recent_suggestions) {
            if !common.contains(&record.text) {
                common.push(record.text.clone());
            }
        }

        common.truncate(self.config.max_common);
        common
    }

    fn verbs(&self, family: Family, prefix: &str) -> Vec<String> {
        filter_by_prefix(grammar::verbs(family).iter().map(|v| v.name), prefix)
    }

    fn arguments(&self, family: Family, verb: &str, prefix: &str) -> Vec<String> {
        match grammar::verb(family, verb) {
            Some(spec) if spec.targets_releases => self.cached(Category::Releases, prefix),
            Some(spec) => filter_by_prefix(spec.arguments().iter().copied(), prefix),
            None => Vec::new(),
        }
    }

    fn resources(&self, family: Family, verb: &str, prefix: &str) -> Vec<String> {
        grammar::verb(family, verb)
            .map(|spec| filter_by_prefix(spec.resources.iter().copied(), prefix))
            .unwrap_or_default()
    }

    fn flags(&self, family: Family, verb: &str, prefix: &str) -> Vec<String> {
        grammar::verb(family, verb)
            .map(|spec| filter_by_prefix(spec.flags.iter().copied(), prefix))
            .unwrap_or_default()
    }

    fn names(&self, category: Category, prefix: &str) -> Vec<String> {
        self.cached(category, prefix)
    }

    fn tools_and_verbs(&self, prefix: &str) -> Vec<String> {
        let mut candidates = filter_by_prefix(self.tools.all(), prefix);
        for family in [Family::ClusterCli, Family::ReleaseCli] {
            let Some(tool) = self.tools.name_of(family) else {
                continue;
            };
            candidates.extend(
                grammar::verbs(family)
                    .iter()
                    .filter(|spec| spec.name.starts_with(prefix))
                    .map(|spec| format!("{} {}", tool, spec.name)),
            );
        }
        candidates
    }

    fn history(&self, query: &str) -> Vec<String> {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store
            .matching_text(query)
            .into_iter()
            .map(|record| record.text.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::history::ContextStore;

    fn create_test_provider() -> (ClusterCandidateProvider, SharedStore) {
        let store = ContextStore::ephemeral(ToolNames::default()).into_shared();
        let provider = ClusterCandidateProvider::new(
            ToolNames::default(),
            LiveResourceCache::offline(&CacheConfig::default()),
            store.clone(),
            CompletionConfig::default(),
        );
        (provider, store)
    }

    #[test]
    fn test_filter_keeps_order() {
        let items = ["status", "scale", "stop", "get"];
        assert_eq!(
            filter_by_prefix(items, "s"),
            vec!["status", "scale", "stop"]
        );
        assert_eq!(filter_by_prefix(items, "").len(), 4);
    }

    #[test]
    fn test_verbs() {
        let (provider, _) = create_test_provider();
        let verbs = provider.verbs(Family::ClusterCli, "");
        assert_eq!(verbs[0], "get");
        assert!(verbs.contains(&"port-forward".to_string()));
        assert_eq!(
            provider.verbs(Family::ReleaseCli, "un"),
            vec!["uninstall"]
        );
    }

    #[test]
    fn test_arguments() {
        let (provider, _) = create_test_provider();
        assert!(
            provider
                .arguments(Family::ClusterCli, "get", "")
                .contains(&"pods".to_string())
        );
        assert_eq!(
            provider.arguments(Family::ClusterCli, "rollout", "re"),
            vec!["resume", "restart"]
        );
        // offline cache knows no releases
        assert!(provider.arguments(Family::ReleaseCli, "status", "").is_empty());
        assert!(provider.arguments(Family::ClusterCli, "bogus", "").is_empty());
    }

    #[test]
    fn test_flags_and_values() {
        let (provider, _) = create_test_provider();
        assert_eq!(
            provider.flags(Family::ClusterCli, "get", "--o"),
            vec!["--output"]
        );
        assert_eq!(
            provider.names(Category::OutputFormats, "j"),
            vec!["json", "jsonpath=", "jsonpath-file="]
        );
        assert!(provider.names(Category::Namespaces, "kube-").len() == 3);
    }

    #[test]
    fn test_tools_and_verbs() {
        let (provider, _) = create_test_provider();
        let candidates = provider.tools_and_verbs("h");
        assert_eq!(candidates[0], "helm");
        assert!(candidates.contains(&"helm history".to_string()));

        let candidates = provider.tools_and_verbs("de");
        assert_eq!(
            candidates,
            vec!["kubectl describe", "kubectl delete", "helm dependency"]
        );
    }

    #[test]
    fn test_common_commands_include_recent_history() {
        let (provider, store) = create_test_provider();
        {
            let mut store = store.write().unwrap();
            store.add("kubectl get pods", "", &[]);
            store.add("helm status ingress", "", &[]);
        }

        let common = provider.common_commands();
        assert_eq!(common[0], "kubectl get pods");
        assert_eq!(common.iter().filter(|c| *c == "kubectl get pods").count(), 1);
        assert!(common.contains(&"helm status ingress".to_string()));
        assert!(common.len() <= 10);
    }

    #[test]
    fn test_history_is_case_insensitive() {
        let (provider, store) = create_test_provider();
        store.write().unwrap().add("kubectl logs Web-1", "", &[]);
        assert_eq!(provider.history("web"), vec!["kubectl logs Web-1"]);
        assert!(provider.history("helm").is_empty());
    }
}
