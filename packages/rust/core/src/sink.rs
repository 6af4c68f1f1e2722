//! Output sink: writes the aggregate as pretty-printed JSON.

use std::path::Path;

use noderank_shared::{Aggregate, NodeRankError, Result};
use tracing::{debug, instrument};

/// Write `aggregate` to `path`, returning the number of bytes written.
///
/// The document is written to a temporary sibling first and renamed into
/// place, so readers never observe a half-written file. Missing parent
/// directories are created.
#[instrument(skip_all, fields(path = %path.display(), records = aggregate.data.len()))]
pub fn write_aggregate(path: &Path, aggregate: &Aggregate) -> Result<usize> {
    let json = serde_json::to_string_pretty(aggregate)
        .map_err(|e| NodeRankError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| NodeRankError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| NodeRankError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&temp, &json).map_err(|e| NodeRankError::io(&temp, e))?;
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(NodeRankError::io(path, e));
    }

    debug!(bytes = json.len(), "wrote aggregate");
    Ok(json.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use noderank_shared::EnrichedRecord;
    use uuid::Uuid;

    fn tmp_dir(prefix: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()))
    }

    fn record(public_key: &str) -> EnrichedRecord {
        EnrichedRecord {
            score: 10,
            alias: "A".into(),
            public_key: public_key.into(),
            addresses: vec!["1.2.3.4:9735".into()],
            color: "#ff0000".into(),
            capacity: 500,
            channel_count: 3,
            rank_capacity: 1,
            rank_channel_count: 2,
            rank_age: 3,
            rank_growth: 4,
            rank_availability: 5,
        }
    }

    #[test]
    fn writes_pretty_json_and_creates_parents() {
        let dir = tmp_dir("nr-sink");
        let path = dir.join("web").join("data").join("export.json");
        let aggregate = Aggregate {
            last_updated: "2024-01-02T15:04:05-0700".into(),
            data: vec![record("pk1")],
        };

        let written = write_aggregate(&path, &aggregate).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.len(), written);
        assert!(content.starts_with("{\n  \"lastUpdated\": \"2024-01-02T15:04:05-0700\""));
        assert!(content.contains("\n      \"publicKey\": \"pk1\""));

        let parsed: Aggregate = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.data, aggregate.data);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn overwrites_without_leaving_temp_files() {
        let dir = tmp_dir("nr-sink-overwrite");
        let path = dir.join("export.json");
        let first = Aggregate {
            last_updated: "t1".into(),
            data: vec![record("pk1"), record("pk2")],
        };
        let second = Aggregate {
            last_updated: "t2".into(),
            data: vec![],
        };

        write_aggregate(&path, &first).unwrap();
        write_aggregate(&path, &second).unwrap();

        let parsed: Aggregate =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.last_updated, "t2");
        assert!(parsed.data.is_empty());

        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unwritable_parent_is_io_error() {
        let dir = tmp_dir("nr-sink-blocked");
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let aggregate = Aggregate {
            last_updated: "t".into(),
            data: vec![],
        };
        let err = write_aggregate(&blocker.join("export.json"), &aggregate).unwrap_err();
        assert!(matches!(err, NodeRankError::Io { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tmp_dir("nr-sink-rename");
        // A non-empty directory at the target path cannot be replaced by a file.
        let path = dir.join("export.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let aggregate = Aggregate {
            last_updated: "t".into(),
            data: vec![record("pk1")],
        };
        let err = write_aggregate(&path, &aggregate).unwrap_err();
        assert!(matches!(err, NodeRankError::Io { .. }));
        assert!(!dir.join(".export.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
