//! Static command grammar for the cluster and release tools
//!
//! The grammar knows which verbs each tool accepts, which resource types and
//! flags belong to each verb, and which flags take a value drawn from one of
//! the live resource cache categories. It also owns the single function that
//! decides which tool a command line targets.

mod tables;

use serde::{Deserialize, Serialize};

use crate::cache::Category;

pub use tables::{CLUSTER_VERBS, RELEASE_VERBS, VerbSpec};

/// Which external tool a command line targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Cluster-control CLI (kubectl)
    #[serde(rename = "kubectl")]
    ClusterCli,

    /// Package/release CLI (helm)
    #[serde(rename = "helm")]
    ReleaseCli,

    /// Anything else found in a history file
    #[serde(rename = "other", other)]
    Other,
}

/// Keywords that hint at a cluster-tool command when the tool name is absent
const CLUSTER_KEYWORDS: &[&str] = &["get pods", "get services", "describe", "logs", "exec"];

/// Keywords that hint at a release-tool command when the tool name is absent
const RELEASE_KEYWORDS: &[&str] = &["install", "upgrade", "list", "status", "uninstall"];

impl Family {
    /// Classify a command line.
    ///
    /// Ambiguous input falls back to [`Family::ClusterCli`].
    pub fn classify(text: &str, tools: &ToolNames) -> Self {
        let lowered = text.trim().to_lowercase();

        if lowered.starts_with(&tools.cluster.to_lowercase()) {
            Family::ClusterCli
        } else if lowered.starts_with(&tools.release.to_lowercase()) {
            Family::ReleaseCli
        } else if CLUSTER_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            Family::ClusterCli
        } else if RELEASE_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            Family::ReleaseCli
        } else {
            Family::ClusterCli
        }
    }

    /// Short label used in listings
    pub fn label(&self) -> &'static str {
        match self {
            Family::ClusterCli => "kubectl",
            Family::ReleaseCli => "helm",
            Family::Other => "other",
        }
    }
}

/// Names the two external tools are invoked by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNames {
    /// Cluster-control CLI
    pub cluster: String,
    /// Package/release CLI
    pub release: String,
}

impl ToolNames {
    pub fn new(cluster: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            release: release.into(),
        }
    }

    /// Family whose tool name is exactly `word`
    pub fn family_of(&self, word: &str) -> Option<Family> {
        if word == self.cluster {
            Some(Family::ClusterCli)
        } else if word == self.release {
            Some(Family::ReleaseCli)
        } else {
            None
        }
    }

    /// Tool name for a family
    pub fn name_of(&self, family: Family) -> Option<&str> {
        match family {
            Family::ClusterCli => Some(&self.cluster),
            Family::ReleaseCli => Some(&self.release),
            Family::Other => None,
        }
    }

    /// Both tool names, cluster tool first
    pub fn all(&self) -> [&str; 2] {
        [&self.cluster, &self.release]
    }
}

impl Default for ToolNames {
    fn default() -> Self {
        Self::new("kubectl", "helm")
    }
}

/// Verb table for a family
pub fn verbs(family: Family) -> &'static [VerbSpec] {
    match family {
        Family::ClusterCli => CLUSTER_VERBS,
        Family::ReleaseCli => RELEASE_VERBS,
        Family::Other => &[],
    }
}

/// Look up a verb in a family's completion table
pub fn verb(family: Family, name: &str) -> Option<&'static VerbSpec> {
    verbs(family).iter().find(|spec| spec.name == name)
}

/// Whether `name` is a verb the family's tool accepts.
///
/// This is wider than the completion table: some verbs are accepted but have
/// no completion data of their own.
pub fn is_known_verb(family: Family, name: &str) -> bool {
    let extra = match family {
        Family::ClusterCli => tables::CLUSTER_EXTRA_VERBS,
        Family::ReleaseCli => tables::RELEASE_EXTRA_VERBS,
        Family::Other => return false,
    };
    verb(family, name).is_some() || extra.contains(&name)
}

/// Cache category supplying values for a flag, if the flag takes one
pub fn value_source(family: Family, flag: &str) -> Option<Category> {
    let table = match family {
        Family::ClusterCli => tables::CLUSTER_VALUE_FLAGS,
        Family::ReleaseCli => tables::RELEASE_VALUE_FLAGS,
        Family::Other => return None,
    };
    table
        .iter()
        .find(|(flags, _)| flags.contains(&flag))
        .map(|(_, category)| *category)
}

/// Cache category for a positional word that is neither a resource nor a
/// flag value
///
/// `position` counts the words after the verb from zero and `previous` is
/// the complete word before the cursor.
pub fn argument_source(
    family: Family,
    verb: &str,
    position: usize,
    previous: &str,
) -> Option<Category> {
    if family != Family::ClusterCli {
        return None;
    }
    match verb {
        "exec" if previous == "--" => Some(Category::ContainerCommands),
        "explain" if position == 0 => Some(Category::ResourceTypes),
        "port-forward" if position == 1 => Some(Category::PortMappings),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> ToolNames {
        ToolNames::default()
    }

    #[test]
    fn test_classify_by_prefix() {
        assert_eq!(
            Family::classify("kubectl get pods", &tools()),
            Family::ClusterCli
        );
        assert_eq!(Family::classify("  helm list", &tools()), Family::ReleaseCli);
        assert_eq!(Family::classify("HELM status x", &tools()), Family::ReleaseCli);
    }

    #[test]
    fn test_classify_by_keywords() {
        assert_eq!(Family::classify("k logs web-1", &tools()), Family::ClusterCli);
        assert_eq!(
            Family::classify("h upgrade web chart", &tools()),
            Family::ReleaseCli
        );
    }

    #[test]
    fn test_classify_ambiguous_defaults_to_cluster() {
        assert_eq!(Family::classify("echo hello", &tools()), Family::ClusterCli);
        assert_eq!(Family::classify("", &tools()), Family::ClusterCli);
    }

    #[test]
    fn test_classify_custom_tool_names() {
        let tools = ToolNames::new("oc", "helm3");
        assert_eq!(Family::classify("oc get pods", &tools), Family::ClusterCli);
        assert_eq!(Family::classify("helm3 list", &tools), Family::ReleaseCli);
    }

    #[test]
    fn test_family_serde_names() {
        assert_eq!(
            serde_json::to_string(&Family::ReleaseCli).unwrap(),
            "\"helm\""
        );
        let parsed: Family = serde_json::from_str("\"kubectl\"").unwrap();
        assert_eq!(parsed, Family::ClusterCli);
        let unknown: Family = serde_json::from_str("\"oc\"").unwrap();
        assert_eq!(unknown, Family::Other);
    }

    #[test]
    fn test_known_verbs_include_extras() {
        assert!(is_known_verb(Family::ClusterCli, "get"));
        assert!(is_known_verb(Family::ClusterCli, "explain"));
        assert!(!is_known_verb(Family::ClusterCli, "bogus-verb"));
        assert!(is_known_verb(Family::ReleaseCli, "search"));
        assert!(!is_known_verb(Family::Other, "get"));
    }

    #[test]
    fn test_value_sources() {
        assert_eq!(
            value_source(Family::ClusterCli, "-o"),
            Some(Category::OutputFormats)
        );
        assert_eq!(
            value_source(Family::ReleaseCli, "--output"),
            Some(Category::ReleaseOutputFormats)
        );
        assert_eq!(
            value_source(Family::ClusterCli, "--namespace"),
            Some(Category::Namespaces)
        );
        assert_eq!(
            value_source(Family::ClusterCli, "--protocol"),
            Some(Category::Protocols)
        );
        assert_eq!(value_source(Family::ClusterCli, "--watch"), None);
    }

    #[test]
    fn test_argument_sources() {
        assert_eq!(
            argument_source(Family::ClusterCli, "exec", 2, "--"),
            Some(Category::ContainerCommands)
        );
        assert_eq!(argument_source(Family::ClusterCli, "exec", 1, "web-1"), None);
        assert_eq!(
            argument_source(Family::ClusterCli, "explain", 0, "explain"),
            Some(Category::ResourceTypes)
        );
        assert_eq!(
            argument_source(Family::ClusterCli, "port-forward", 1, "web-1"),
            Some(Category::PortMappings)
        );
        assert_eq!(argument_source(Family::ReleaseCli, "exec", 2, "--"), None);
    }

    #[test]
    fn test_tool_lookup() {
        let tools = tools();
        assert_eq!(tools.family_of("helm"), Some(Family::ReleaseCli));
        assert_eq!(tools.family_of("kube"), None);
        assert_eq!(tools.name_of(Family::ClusterCli), Some("kubectl"));
    }
}
