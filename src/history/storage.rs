//! On-disk format of the command history file
//!
//! ```json
//! {
//!   "commands_by_context": { "<cluster>": { "<namespace>": [ { "command": "...", ... } ] } },
//!   "last_updated": "2025-01-01T10:00:00+00:00"
//! }
//! ```
//!
//! Older files carry a flat `"commands"` array, possibly next to the
//! partitioned table. Those records are folded into the partition named by
//! their own `cluster`/`namespace` fields, `default` where missing.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{CommandRecord, Context};
use crate::error::{Result, StoreError};
use crate::grammar::{Family, ToolNames};

type Partitions = BTreeMap<Context, Vec<CommandRecord>>;

const MAX_QUARANTINED: usize = 100;

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    command: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    command_type: Option<Family>,

    #[serde(default)]
    cluster: Option<String>,

    #[serde(default)]
    namespace: Option<String>,

    #[serde(default)]
    tags: Vec<String>,

    #[serde(default = "default_usage_count")]
    usage_count: i64,

    #[serde(default, with = "timestamp")]
    last_used: Option<DateTime<Utc>>,
}

fn default_usage_count() -> i64 {
    1
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    commands_by_context: Option<BTreeMap<String, BTreeMap<String, Vec<StoredRecord>>>>,

    /// Flat list written by old versions
    #[serde(default, skip_serializing)]
    commands: Option<Vec<StoredRecord>>,

    #[serde(default, with = "timestamp")]
    last_updated: Option<DateTime<Utc>>,
}

/// Result of reading a history file
#[derive(Debug, Default)]
pub(super) struct Loaded {
    pub partitions: Partitions,
    /// The file still carried legacy flat records
    pub migrated: bool,
}

impl StoredRecord {
    fn into_record(self, context: &Context, tools: &ToolNames) -> Option<CommandRecord> {
        if self.command.trim().is_empty() {
            return None;
        }
        let family = self
            .command_type
            .unwrap_or_else(|| Family::classify(&self.command, tools));

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Some(CommandRecord {
            text: self.command,
            family,
            description: self.description,
            cluster: context.cluster.clone(),
            namespace: context.namespace.clone(),
            tags,
            usage_count: self.usage_count.clamp(1, u32::MAX as i64) as u32,
            last_used: self.last_used,
        })
    }

    fn from_record(record: &CommandRecord) -> Self {
        Self {
            command: record.text.clone(),
            description: record.description.clone(),
            command_type: Some(record.family),
            cluster: Some(record.cluster.clone()),
            namespace: Some(record.namespace.clone()),
            tags: record.tags.clone(),
            usage_count: i64::from(record.usage_count),
            last_used: record.last_used,
        }
    }
}

/// Add `record` to `records`, folding it into an existing record with the
/// same text.
fn merge_into(records: &mut Vec<CommandRecord>, record: CommandRecord) {
    match records.iter_mut().find(|r| r.text == record.text) {
        Some(existing) => {
            existing.usage_count = existing.usage_count.saturating_add(record.usage_count);
            existing.last_used = existing.last_used.max(record.last_used);
            if existing.description.is_empty() {
                existing.description = record.description;
            }
            for tag in record.tags {
                if !existing.tags.contains(&tag) {
                    existing.tags.push(tag);
                }
            }
        }
        None => records.push(record),
    }
}

/// Decode the history document.
pub(super) fn decode(raw: &str, tools: &ToolNames) -> std::result::Result<Loaded, String> {
    let file: HistoryFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let mut loaded = Loaded::default();

    for (cluster, namespaces) in file.commands_by_context.unwrap_or_default() {
        for (namespace, stored) in namespaces {
            let context = Context::new(&cluster, &namespace);
            let records = loaded.partitions.entry(context.clone()).or_default();
            for record in stored {
                if let Some(record) = record.into_record(&context, tools) {
                    merge_into(records, record);
                }
            }
        }
    }

    // Flat records keep their own cluster and namespace when they name one
    let legacy = file.commands.unwrap_or_default();
    loaded.migrated = !legacy.is_empty();
    for record in legacy {
        let context = Context::new(
            record.cluster.as_deref().unwrap_or_default(),
            record.namespace.as_deref().unwrap_or_default(),
        );
        if let Some(record) = record.into_record(&context, tools) {
            merge_into(loaded.partitions.entry(context).or_default(), record);
        }
    }

    loaded.partitions.retain(|_, records| !records.is_empty());
    Ok(loaded)
}

/// Encode the store as a history document.
pub(super) fn encode(partitions: &Partitions) -> Result<String> {
    let mut by_context: BTreeMap<String, BTreeMap<String, Vec<StoredRecord>>> = BTreeMap::new();
    for (context, records) in partitions {
        by_context
            .entry(context.cluster.clone())
            .or_default()
            .insert(
                context.namespace.clone(),
                records.iter().map(StoredRecord::from_record).collect(),
            );
    }

    let file = HistoryFile {
        commands_by_context: Some(by_context),
        commands: None,
        last_updated: Some(Utc::now()),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Read a history file; `Ok(None)` when it does not exist.
pub(super) fn load(path: &Path, tools: &ToolNames) -> Result<Option<Loaded>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::ReadFailed {
                path: path.display().to_string(),
                source,
            }
            .into());
        }
    };

    if raw.trim().is_empty() {
        return Ok(Some(Loaded::default()));
    }

    decode(&raw, tools).map(Some).map_err(|reason| {
        StoreError::Corrupt {
            path: path.display().to_string(),
            reason,
        }
        .into()
    })
}

/// Write the whole store, replacing the file atomically.
pub(super) fn save(path: &Path, partitions: &Partitions) -> Result<()> {
    let document = encode(partitions)?;
    let write_failed = |source| StoreError::WriteFailed {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_failed)?;
    }

    let staging = staging_path(path);
    let mut file = fs::File::create(&staging).map_err(write_failed)?;
    file.write_all(document.as_bytes()).map_err(write_failed)?;
    file.sync_all().map_err(write_failed)?;
    fs::rename(&staging, path).map_err(write_failed)?;
    Ok(())
}

/// Move a corrupt file aside so the next save does not destroy it.
///
/// Earlier quarantined copies are kept; the new one gets the first free
/// `<file>.corrupt`, `<file>.corrupt.1`, ... name.
pub(super) fn quarantine(path: &Path) -> Option<PathBuf> {
    let mut base = path.file_name()?.to_os_string();
    base.push(".corrupt");

    let target = (0..MAX_QUARANTINED)
        .map(|n| {
            let mut name = base.clone();
            if n > 0 {
                name.push(format!(".{}", n));
            }
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())?;

    fs::rename(path, &target).ok().map(|_| target)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "history".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// `Option<DateTime<Utc>>` as RFC 3339, also accepting offset-less local
/// timestamps.
mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(at) => serializer.serialize_some(&at.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub(crate) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|at| at.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> ToolNames {
        ToolNames::default()
    }

    #[test]
    fn test_decode_partitioned() {
        let raw = r#"{
            "commands_by_context": {
                "prod": {
                    "web": [
                        {"command": "kubectl get pods", "description": "list", "command_type": "kubectl",
                         "tags": ["a", "a", "b"], "usage_count": 4, "last_used": "2025-03-01T12:00:00+00:00"}
                    ]
                }
            },
            "last_updated": "2025-03-01T12:00:00+00:00"
        }"#;
        let loaded = decode(raw, &tools()).unwrap();
        assert!(!loaded.migrated);

        let records = &loaded.partitions[&Context::new("prod", "web")];
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].usage_count, 4);
        assert_eq!(records[0].tags, vec!["a", "b"]);
        assert_eq!(records[0].cluster, "prod");
        assert_eq!(
            records[0].last_used.unwrap().to_rfc3339(),
            "2025-03-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_decode_legacy_flat_file() {
        let raw = r#"{"commands": [
            {"command": "helm list", "description": "", "command_type": "helm",
             "tags": [], "usage_count": 2, "last_used": "2024-01-15T10:30:00.123456"},
            {"command": "kubectl get nodes"}
        ]}"#;
        let loaded = decode(raw, &tools()).unwrap();
        assert!(loaded.migrated);

        let records = &loaded.partitions[&Context::default()];
        assert_eq!(records.len(), 2);
        assert!(records[0].last_used.is_some());
        // missing type is classified, missing count is one
        assert_eq!(records[1].family, Family::ClusterCli);
        assert_eq!(records[1].usage_count, 1);
        assert_eq!(records[1].last_used, None);
    }

    #[test]
    fn test_decode_merges_duplicates_and_clamps() {
        let raw = r#"{"commands_by_context": {"default": {"default": [
            {"command": "kubectl get pods", "usage_count": 0, "tags": ["x"],
             "last_used": "2025-01-01T00:00:00Z"},
            {"command": "kubectl get pods", "usage_count": 3, "tags": ["y"],
             "last_used": "2025-02-01T00:00:00Z"},
            {"command": "   "}
        ]}}}"#;
        let loaded = decode(raw, &tools()).unwrap();
        let records = &loaded.partitions[&Context::default()];

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].usage_count, 4);
        assert_eq!(records[0].tags, vec!["x", "y"]);
        assert_eq!(
            records[0].last_used,
            timestamp::parse("2025-02-01T00:00:00Z")
        );
    }

    #[test]
    fn test_unknown_command_type_is_other() {
        let raw = r#"{"commands_by_context": {"c": {"n": [
            {"command": "oc get pods", "command_type": "openshift"}
        ]}}}"#;
        let loaded = decode(raw, &tools()).unwrap();
        assert_eq!(
            loaded.partitions[&Context::new("c", "n")][0].family,
            Family::Other
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("{not json", &tools()).is_err());
    }

    #[test]
    fn test_naive_timestamp_is_local_time() {
        let parsed = timestamp::parse("2024-01-15T10:30:00").unwrap();
        let expected = Local
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parsed, expected);
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let raw = r#"{"commands": [{"command": "kubectl logs web-1", "usage_count": 2}]}"#;
        let partitions = decode(raw, &tools()).unwrap().partitions;
        save(&path, &partitions).unwrap();

        let document = fs::read_to_string(&path).unwrap();
        assert!(document.contains("commands_by_context"));
        assert!(!document.contains("\"commands\""));

        let reloaded = load(&path, &tools()).unwrap().unwrap();
        assert!(!reloaded.migrated);
        assert_eq!(reloaded.partitions, partitions);
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        assert!(load(&path, &tools()).unwrap().is_none());

        fs::write(&path, "[1, 2").unwrap();
        let err = load(&path, &tools()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ClustermError::Store(StoreError::Corrupt { .. })
        ));

        let moved = quarantine(&path).unwrap();
        assert!(moved.exists());
        assert!(!path.exists());
    }

    #[test]
    fn test_quarantine_keeps_earlier_copies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        fs::write(&path, "first").unwrap();
        let first = quarantine(&path).unwrap();
        fs::write(&path, "second").unwrap();
        let second = quarantine(&path).unwrap();

        assert_ne!(first, second);
        assert_eq!(second, dir.path().join("history.json.corrupt.1"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "first");
        assert_eq!(fs::read_to_string(&second).unwrap(), "second");
    }

    #[test]
    fn test_decode_mixed_file_keeps_legacy_records() {
        let raw = r#"{
            "commands_by_context": {"prod": {"web": [{"command": "helm list"}]}},
            "commands": [
                {"command": "kubectl get pods", "usage_count": 7},
                {"command": "helm list", "cluster": "prod", "namespace": "web", "usage_count": 2}
            ]
        }"#;
        let loaded = decode(raw, &tools()).unwrap();
        assert!(loaded.migrated);

        let defaults = &loaded.partitions[&Context::default()];
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].text, "kubectl get pods");
        assert_eq!(defaults[0].usage_count, 7);

        // merged into the partitioned record of the same context
        let prod = &loaded.partitions[&Context::new("prod", "web")];
        assert_eq!(prod.len(), 1);
        assert_eq!(prod[0].usage_count, 3);
    }

    #[test]
    fn test_store_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "nope").unwrap();

        match load(&path, &tools()) {
            Err(crate::error::ClustermError::Store(StoreError::Corrupt { path: shown, .. })) => {
                assert_eq!(shown, path.display().to_string())
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
