//! Cache categories and their seed values

use std::collections::HashMap;
use std::fmt;

/// A named list held by the live resource cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    // Fetched from the cluster
    Namespaces,
    Pods,
    Services,
    Deployments,
    Nodes,
    Releases,

    // Static grammar metadata
    ResourceTypes,
    OutputFormats,
    ReleaseOutputFormats,
    LabelSelectors,
    FieldSelectors,
    ContainerNames,
    ContainerCommands,
    ChartRepositories,
    ChartValues,
    Protocols,
    PortMappings,
}

impl Category {
    /// Categories replaced by a refresh
    pub const LIVE: [Category; 6] = [
        Category::Namespaces,
        Category::Pods,
        Category::Services,
        Category::Deployments,
        Category::Nodes,
        Category::Releases,
    ];

    /// Whether a refresh replaces this category
    pub fn is_live(&self) -> bool {
        Self::LIVE.contains(self)
    }

    /// Map a resource word as typed on the command line to its category.
    ///
    /// Singular, plural and short forms are accepted.
    pub fn from_resource(word: &str) -> Option<Self> {
        let category = match word {
            "pod" | "pods" | "po" => Category::Pods,
            "service" | "services" | "svc" => Category::Services,
            "deployment" | "deployments" | "deploy" => Category::Deployments,
            "namespace" | "namespaces" | "ns" => Category::Namespaces,
            "node" | "nodes" | "no" => Category::Nodes,
            "release" | "releases" => Category::Releases,
            _ => return None,
        };
        Some(category)
    }

    /// Key used in diagnostics
    pub fn key(&self) -> &'static str {
        match self {
            Category::Namespaces => "namespaces",
            Category::Pods => "pods",
            Category::Services => "services",
            Category::Deployments => "deployments",
            Category::Nodes => "nodes",
            Category::Releases => "helm_releases",
            Category::ResourceTypes => "kubectl_resources",
            Category::OutputFormats => "output_formats",
            Category::ReleaseOutputFormats => "helm_output_formats",
            Category::LabelSelectors => "label_selectors",
            Category::FieldSelectors => "field_selectors",
            Category::ContainerNames => "container_names",
            Category::ContainerCommands => "container_commands",
            Category::ChartRepositories => "helm_repos",
            Category::ChartValues => "helm_values",
            Category::Protocols => "protocols",
            Category::PortMappings => "common_ports",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub type Entries = HashMap<Category, Vec<String>>;

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Entries a fresh cache starts with
pub(super) fn seed_entries() -> Entries {
    let mut entries = Entries::new();

    entries.insert(
        Category::Namespaces,
        owned(&["default", "kube-system", "kube-public", "kube-node-lease"]),
    );
    for category in [
        Category::Pods,
        Category::Services,
        Category::Deployments,
        Category::Nodes,
        Category::Releases,
    ] {
        entries.insert(category, Vec::new());
    }

    entries.insert(
        Category::ResourceTypes,
        owned(&[
            "pods", "po", "services", "svc", "deployments", "deploy", "configmaps", "cm",
            "secrets", "namespaces", "ns", "nodes", "no", "persistentvolumes", "pv",
            "persistentvolumeclaims", "pvc", "ingresses", "ing", "networkpolicies", "netpol",
            "serviceaccounts", "sa", "roles", "rolebindings", "clusterroles",
            "clusterrolebindings", "events", "endpoints", "ep", "componentstatuses", "cs",
            "daemonsets", "ds", "replicasets", "rs", "statefulsets", "sts", "cronjobs", "cj",
            "jobs", "horizontalpodautoscalers", "hpa", "poddisruptionbudgets", "pdb",
            "volumeattachments", "storageclasses", "sc",
        ]),
    );
    entries.insert(
        Category::OutputFormats,
        owned(&[
            "json",
            "yaml",
            "wide",
            "name",
            "custom-columns=",
            "custom-columns-file=",
            "go-template=",
            "go-template-file=",
            "jsonpath=",
            "jsonpath-file=",
        ]),
    );
    entries.insert(
        Category::ReleaseOutputFormats,
        owned(&["table", "json", "yaml"]),
    );
    entries.insert(
        Category::LabelSelectors,
        owned(&[
            "app=",
            "version=",
            "component=",
            "tier=",
            "release=",
            "app.kubernetes.io/name=",
            "app.kubernetes.io/instance=",
            "app.kubernetes.io/version=",
            "app.kubernetes.io/component=",
            "app.kubernetes.io/part-of=",
            "app.kubernetes.io/managed-by=",
        ]),
    );
    entries.insert(
        Category::FieldSelectors,
        owned(&[
            "metadata.name=",
            "metadata.namespace=",
            "spec.nodeName=",
            "status.phase=",
            "status.podIP=",
            "spec.restartPolicy=",
            "spec.serviceAccountName=",
        ]),
    );
    entries.insert(
        Category::ContainerNames,
        owned(&["app", "web", "api", "db", "redis", "nginx", "main", "sidecar"]),
    );
    entries.insert(
        Category::ContainerCommands,
        owned(&["/bin/bash", "/bin/sh", "/bin/zsh", "bash", "sh"]),
    );
    entries.insert(
        Category::ChartRepositories,
        owned(&[
            "stable",
            "bitnami",
            "nginx",
            "prometheus-community",
            "jetstack",
            "elastic",
        ]),
    );
    entries.insert(
        Category::ChartValues,
        owned(&[
            "image.tag=",
            "image.repository=",
            "image.pullPolicy=",
            "service.type=",
            "service.port=",
            "ingress.enabled=",
            "resources.requests.cpu=",
            "resources.requests.memory=",
            "resources.limits.cpu=",
            "resources.limits.memory=",
            "replicaCount=",
            "nodeSelector=",
            "tolerations=",
            "affinity=",
        ]),
    );
    entries.insert(Category::Protocols, owned(&["TCP", "UDP", "SCTP"]));
    entries.insert(
        Category::PortMappings,
        owned(&[
            "80:8080",
            "443:8443",
            "3000:3000",
            "8080:8080",
            "5432:5432",
            "3306:3306",
            "6379:6379",
            "27017:27017",
            "9200:9200",
        ]),
    );

    entries
}
