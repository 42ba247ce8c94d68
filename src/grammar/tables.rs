//! Verb, resource and flag tables for both tools

use crate::cache::Category;

/// Completion data for one verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbSpec {
    /// Verb as typed after the tool name
    pub name: &'static str,
    /// Resource types accepted as the next word
    pub resources: &'static [&'static str],
    /// Nested subcommands (`rollout status`, `get values`)
    pub subcommands: &'static [&'static str],
    /// Flags accepted by the verb
    pub flags: &'static [&'static str],
    /// Verb operates on installed releases
    pub targets_releases: bool,
    /// Verb is meaningless without a resource type
    pub requires_resource: bool,
}

impl VerbSpec {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            resources: &[],
            subcommands: &[],
            flags: &[],
            targets_releases: false,
            requires_resource: false,
        }
    }

    const fn resources(mut self, resources: &'static [&'static str]) -> Self {
        self.resources = resources;
        self
    }

    const fn subcommands(mut self, subcommands: &'static [&'static str]) -> Self {
        self.subcommands = subcommands;
        self
    }

    const fn flags(mut self, flags: &'static [&'static str]) -> Self {
        self.flags = flags;
        self
    }

    const fn on_releases(mut self) -> Self {
        self.targets_releases = true;
        self
    }

    const fn needs_resource(mut self) -> Self {
        self.requires_resource = true;
        self
    }

    /// Candidates for the word right after the verb
    pub fn arguments(&self) -> &'static [&'static str] {
        if self.subcommands.is_empty() {
            self.resources
        } else {
            self.subcommands
        }
    }
}

pub const CLUSTER_VERBS: &[VerbSpec] = &[
    VerbSpec::new("get")
        .resources(&[
            "pods",
            "services",
            "deployments",
            "configmaps",
            "secrets",
            "namespaces",
            "nodes",
            "persistentvolumes",
            "pv",
            "persistentvolumeclaims",
            "pvc",
            "ingresses",
            "networkpolicies",
            "serviceaccounts",
            "roles",
            "rolebindings",
            "clusterroles",
            "clusterrolebindings",
            "events",
            "endpoints",
            "componentstatuses",
            "cs",
            "daemonsets",
            "ds",
            "replicasets",
            "rs",
            "statefulsets",
            "sts",
            "cronjobs",
            "jobs",
            "horizontalpodautoscalers",
            "hpa",
            "poddisruptionbudgets",
            "pdb",
        ])
        .flags(&[
            "-o",
            "--output",
            "-l",
            "--selector",
            "--field-selector",
            "-n",
            "--namespace",
            "--all-namespaces",
            "-A",
            "--show-labels",
            "--no-headers",
            "-w",
            "--watch",
        ])
        .needs_resource(),
    VerbSpec::new("describe")
        .resources(&[
            "pods",
            "services",
            "deployments",
            "nodes",
            "persistentvolumes",
            "pvc",
        ])
        .flags(&["-n", "--namespace", "--show-events", "-l", "--selector"])
        .needs_resource(),
    VerbSpec::new("logs")
        .resources(&["pods"])
        .flags(&[
            "-f",
            "--follow",
            "--previous",
            "-p",
            "--tail",
            "--since",
            "--timestamps",
            "--all-containers",
            "-c",
            "--container",
            "-n",
            "--namespace",
        ]),
    VerbSpec::new("exec")
        .resources(&["pods"])
        .flags(&["-it", "-c", "--container", "--stdin", "--tty", "-n", "--namespace"]),
    VerbSpec::new("apply").flags(&[
        "-f",
        "--filename",
        "--dry-run",
        "--validate",
        "--recursive",
        "-R",
        "-n",
        "--namespace",
    ]),
    VerbSpec::new("delete")
        .resources(&["pods", "services", "deployments", "configmaps", "secrets"])
        .flags(&[
            "-f",
            "--filename",
            "--force",
            "--grace-period",
            "--now",
            "--cascade",
            "-n",
            "--namespace",
            "-l",
            "--selector",
        ])
        .needs_resource(),
    VerbSpec::new("create")
        .resources(&["deployment", "service", "configmap", "secret", "namespace"])
        .flags(&["--dry-run", "--save-config", "-f", "--filename", "-o", "--output"]),
    VerbSpec::new("edit")
        .resources(&["pods", "services", "deployments", "configmaps"])
        .flags(&["-n", "--namespace", "-o", "--output"]),
    VerbSpec::new("scale")
        .resources(&["deployment", "replicaset", "statefulset"])
        .flags(&["--replicas", "--timeout", "-n", "--namespace"]),
    VerbSpec::new("rollout")
        .subcommands(&["status", "history", "undo", "pause", "resume", "restart"])
        .resources(&["deployment", "daemonset", "statefulset"])
        .flags(&["--revision", "--timeout", "-n", "--namespace"]),
    VerbSpec::new("port-forward")
        .resources(&["pods", "services"])
        .flags(&["--address", "-n", "--namespace"]),
    VerbSpec::new("expose")
        .resources(&["deployments", "pods", "services"])
        .flags(&[
            "--port",
            "--target-port",
            "--protocol",
            "--name",
            "--type",
            "-n",
            "--namespace",
        ]),
    VerbSpec::new("top")
        .resources(&["nodes", "pods"])
        .flags(&["--containers", "--sort-by", "-l", "--selector", "-n", "--namespace"]),
];

pub const RELEASE_VERBS: &[VerbSpec] = &[
    VerbSpec::new("install").flags(&[
        "--create-namespace",
        "-n",
        "--namespace",
        "--set",
        "--values",
        "-f",
        "--dry-run",
        "--debug",
        "--wait",
        "--timeout",
        "--version",
        "--repo",
    ]),
    VerbSpec::new("upgrade")
        .flags(&[
            "--install",
            "--create-namespace",
            "-n",
            "--namespace",
            "--set",
            "--values",
            "-f",
            "--dry-run",
            "--debug",
            "--wait",
            "--timeout",
            "--version",
            "--reset-values",
            "--reuse-values",
            "--repo",
        ])
        .on_releases(),
    VerbSpec::new("uninstall")
        .flags(&["-n", "--namespace", "--dry-run", "--keep-history", "--timeout"])
        .on_releases(),
    VerbSpec::new("list").flags(&[
        "-A",
        "--all-namespaces",
        "-n",
        "--namespace",
        "--deployed",
        "--failed",
        "--pending",
        "--superseded",
        "--uninstalled",
        "-q",
        "--short",
        "-d",
        "--date",
        "-o",
        "--output",
    ]),
    VerbSpec::new("status")
        .flags(&["-n", "--namespace", "--revision", "-o", "--output"])
        .on_releases(),
    VerbSpec::new("history")
        .flags(&["-n", "--namespace", "--max", "-o", "--output"])
        .on_releases(),
    VerbSpec::new("rollback")
        .flags(&[
            "-n",
            "--namespace",
            "--dry-run",
            "--force",
            "--no-hooks",
            "--recreate-pods",
            "--timeout",
            "--wait",
        ])
        .on_releases(),
    VerbSpec::new("test")
        .flags(&["-n", "--namespace", "--timeout", "--logs"])
        .on_releases(),
    VerbSpec::new("get")
        .subcommands(&["all", "hooks", "manifest", "notes", "values"])
        .flags(&["-n", "--namespace", "--revision", "-o", "--output"]),
    VerbSpec::new("template").flags(&[
        "--set",
        "--values",
        "-f",
        "--output-dir",
        "--debug",
        "--validate",
        "--repo",
    ]),
    VerbSpec::new("dependency")
        .subcommands(&["build", "list", "update"])
        .flags(&["--verify", "--keyring"]),
];

/// Verbs accepted by the cluster tool that have no completion data
pub(super) const CLUSTER_EXTRA_VERBS: &[&str] = &[
    "patch",
    "cp",
    "auth",
    "config",
    "cluster-info",
    "version",
    "explain",
];

/// Verbs accepted by the release tool that have no completion data
pub(super) const RELEASE_EXTRA_VERBS: &[&str] = &[
    "package", "pull", "push", "search", "show", "verify", "version", "env",
];

pub(super) const CLUSTER_VALUE_FLAGS: &[(&[&str], Category)] = &[
    (&["-o", "--output"], Category::OutputFormats),
    (&["-n", "--namespace"], Category::Namespaces),
    (&["-l", "--selector"], Category::LabelSelectors),
    (&["--field-selector"], Category::FieldSelectors),
    (&["-c", "--container"], Category::ContainerNames),
    (&["--protocol"], Category::Protocols),
];

pub(super) const RELEASE_VALUE_FLAGS: &[(&[&str], Category)] = &[
    (&["-n", "--namespace"], Category::Namespaces),
    (&["-o", "--output"], Category::ReleaseOutputFormats),
    (&["--set"], Category::ChartValues),
    (&["--repo"], Category::ChartRepositories),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_names_unique() {
        for table in [CLUSTER_VERBS, RELEASE_VERBS] {
            let mut names: Vec<_> = table.iter().map(|v| v.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), table.len());
        }
    }

    #[test]
    fn test_arguments_prefer_subcommands() {
        let rollout = CLUSTER_VERBS.iter().find(|v| v.name == "rollout").unwrap();
        assert!(rollout.arguments().contains(&"restart"));

        let get = CLUSTER_VERBS.iter().find(|v| v.name == "get").unwrap();
        assert!(get.arguments().contains(&"pods"));
        assert!(get.requires_resource);
    }

    #[test]
    fn test_release_targeting_verbs() {
        let targeting: Vec<_> = RELEASE_VERBS
            .iter()
            .filter(|v| v.targets_releases)
            .map(|v| v.name)
            .collect();
        assert_eq!(
            targeting,
            vec!["upgrade", "uninstall", "status", "history", "rollback", "test"]
        );
    }
}
