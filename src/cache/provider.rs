//! Sources of live resource names
//!
//! The cache asks a [`ResourceProvider`] for the names of cluster objects.
//! An embedding application can supply its own provider (for example one that
//! talks to the API server directly); [`CliResourceProvider`] is the fallback
//! that shells out to the two external tools.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{FetchError, Result};
use crate::grammar::ToolNames;

/// Interface the live resource cache fetches names through
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Names of all namespaces
    async fn list_namespaces(&self) -> Result<Vec<String>>;

    /// Names of pods in `namespace`
    async fn list_pods(&self, namespace: &str) -> Result<Vec<String>>;

    /// Names of services in `namespace`
    async fn list_services(&self, namespace: &str) -> Result<Vec<String>>;

    /// Names of deployments in `namespace`
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<String>>;

    /// Names of cluster nodes
    async fn list_nodes(&self) -> Result<Vec<String>>;

    /// Names of installed releases
    async fn list_releases(&self, namespace: &str) -> Result<Vec<String>>;
}

/// `kubectl get <kind> -o json` document
#[derive(Debug, Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
}

/// One element of `helm list -o json`
#[derive(Debug, Deserialize)]
struct ReleaseItem {
    #[serde(default)]
    name: String,
}

/// Provider that runs the external tools with structured output
pub struct CliResourceProvider {
    tools: ToolNames,
    timeout: Duration,
}

impl CliResourceProvider {
    /// Create a provider
    ///
    /// # Arguments
    /// * `tools` - Names of the cluster and release executables
    /// * `timeout` - Upper bound for each invocation
    pub fn new(tools: ToolNames, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    /// Run one tool and return its stdout
    async fn run(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        let command_line = format!("{} {}", program, args.join(" "));
        tracing::trace!("Running {}", command_line);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(FetchError::Spawn {
                    command: command_line,
                    source,
                }
                .into());
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    command: command_line,
                    seconds: self.timeout.as_secs(),
                }
                .into());
            }
        };

        if !output.status.success() {
            return Err(FetchError::Status {
                command: command_line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(output.stdout)
    }

    /// List names of one kind of cluster object
    async fn object_names(&self, kind: &str, namespace: Option<&str>) -> Result<Vec<String>> {
        let mut args = vec!["get", kind, "-o", "json"];
        if let Some(ns) = namespace {
            args.extend(["-n", ns]);
        }
        let stdout = self.run(&self.tools.cluster, &args).await?;
        parse_object_names(&stdout).map_err(|reason| {
            FetchError::Decode {
                command: format!("{} {}", self.tools.cluster, args.join(" ")),
                reason,
            }
            .into()
        })
    }
}

/// Extract `.items[].metadata.name` from a kubectl list document
pub(crate) fn parse_object_names(stdout: &[u8]) -> std::result::Result<Vec<String>, String> {
    let list: ObjectList = serde_json::from_slice(stdout).map_err(|e| e.to_string())?;
    Ok(list.items.into_iter().map(|item| item.metadata.name).collect())
}

/// Extract `[].name` from a helm list document
pub(crate) fn parse_release_names(stdout: &[u8]) -> std::result::Result<Vec<String>, String> {
    // helm prints nothing at all when there are no releases in some versions
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let releases: Vec<ReleaseItem> = serde_json::from_slice(stdout).map_err(|e| e.to_string())?;
    Ok(releases
        .into_iter()
        .map(|r| r.name)
        .filter(|name| !name.is_empty())
        .collect())
}

#[async_trait]
impl ResourceProvider for CliResourceProvider {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        self.object_names("namespaces", None).await
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<String>> {
        self.object_names("pods", Some(namespace)).await
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<String>> {
        self.object_names("services", Some(namespace)).await
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<String>> {
        self.object_names("deployments", Some(namespace)).await
    }

    async fn list_nodes(&self) -> Result<Vec<String>> {
        self.object_names("nodes", None).await
    }

    async fn list_releases(&self, namespace: &str) -> Result<Vec<String>> {
        let args = ["list", "-o", "json", "-n", namespace];
        let stdout = self.run(&self.tools.release, &args).await?;
        parse_release_names(&stdout).map_err(|reason| {
            FetchError::Decode {
                command: format!("{} {}", self.tools.release, args.join(" ")),
                reason,
            }
            .into()
        })
    }
}
