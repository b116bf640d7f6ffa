use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    core::{
        koperasi::{KoperasiSnapshot, SNAPSHOT_SCHEMA_VERSION},
        utils::{ensure_dir, write_atomic, PathResolver},
    },
    errors::{KoperasiError, KoperasiResult},
};

use super::SnapshotStore;

const SNAPSHOT_EXTENSION: &str = "json";
const BACKUP_DIR: &str = "backups";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";
const DEFAULT_RETENTION: usize = 5;

/// Stores named snapshots as pretty JSON under `<base>/snapshots`. Replacing
/// a snapshot first copies the old file into a per-name backup directory.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    snapshots_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonSnapshotStore {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> KoperasiResult<Self> {
        let base = PathResolver::resolve_base(root);
        let snapshots_dir = PathResolver::snapshot_dir_in(&base);
        let backups_dir = snapshots_dir.join(BACKUP_DIR);
        ensure_dir(&snapshots_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            snapshots_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> KoperasiResult<Self> {
        Self::new(None, None)
    }

    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.snapshots_dir
            .join(format!("{}.{}", canonical_name(name), SNAPSHOT_EXTENSION))
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    fn backup_existing(&self, name: &str, path: &Path) -> KoperasiResult<()> {
        let previous = load_snapshot_from_path(path)?;
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let backup_name = format!(
            "{}_{}.{}",
            canonical_name(name),
            previous.taken_at.format(BACKUP_TIMESTAMP_FORMAT),
            SNAPSHOT_EXTENSION
        );
        fs::copy(path, dir.join(&backup_name))?;
        debug!(name, backup = %backup_name, "previous snapshot backed up");
        self.prune_backups(name)
    }

    fn prune_backups(&self, name: &str) -> KoperasiResult<()> {
        let backups = self.list_backups(name)?;
        for stale in backups.iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(self.backup_dir(name).join(stale)) {
                warn!(backup = %stale, %err, "failed to prune snapshot backup");
            }
        }
        Ok(())
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn save(&self, name: &str, snapshot: &KoperasiSnapshot) -> KoperasiResult<PathBuf> {
        let path = self.snapshot_path(name);
        if path.exists() {
            self.backup_existing(name, &path)?;
        }
        save_snapshot_to_path(snapshot, &path)?;
        Ok(path)
    }

    fn load(&self, name: &str) -> KoperasiResult<KoperasiSnapshot> {
        let path = self.snapshot_path(name);
        if !path.exists() {
            return Err(KoperasiError::not_found("Snapshot", name));
        }
        load_snapshot_from_path(&path)
    }

    fn list(&self) -> KoperasiResult<Vec<String>> {
        let mut names = json_file_names(&self.snapshots_dir)?
            .into_iter()
            .filter_map(|file| {
                file.strip_suffix(&format!(".{SNAPSHOT_EXTENSION}"))
                    .map(str::to_string)
            })
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    fn list_backups(&self, name: &str) -> KoperasiResult<Vec<String>> {
        let mut entries = json_file_names(&self.backup_dir(name))?;
        // Timestamps are fixed-width, so lexical order is chronological.
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries)
    }

    fn restore_backup(&self, name: &str, backup_name: &str) -> KoperasiResult<KoperasiSnapshot> {
        let backup_path = self.backup_dir(name).join(backup_name);
        if !backup_path.exists() {
            return Err(KoperasiError::Storage(format!(
                "backup `{backup_name}` not found"
            )));
        }
        let snapshot = load_snapshot_from_path(&backup_path)?;
        save_snapshot_to_path(&snapshot, &self.snapshot_path(name))?;
        Ok(snapshot)
    }
}

pub fn save_snapshot_to_path(snapshot: &KoperasiSnapshot, path: &Path) -> KoperasiResult<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    write_atomic(path, &json)
}

/// Reads a snapshot, refusing files written by a newer schema.
pub fn load_snapshot_from_path(path: &Path) -> KoperasiResult<KoperasiSnapshot> {
    let data = fs::read_to_string(path)?;
    let snapshot: KoperasiSnapshot = serde_json::from_str(&data)?;
    if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
        return Err(KoperasiError::Storage(format!(
            "snapshot `{}` is from a newer schema version ({} > {})",
            path.display(),
            snapshot.schema_version,
            SNAPSHOT_SCHEMA_VERSION
        )));
    }
    Ok(snapshot)
}

fn json_file_names(dir: &Path) -> KoperasiResult<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION)
        {
            continue;
        }
        if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
            names.push(file_name.to_string());
        }
    }
    Ok(names)
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "koperasi".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn store_with_temp_dir(retention: usize) -> (JsonSnapshotStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonSnapshotStore::new(Some(temp.path().to_path_buf()), Some(retention))
            .expect("snapshot store");
        (store, temp)
    }

    fn snapshot_at(hour: u32) -> KoperasiSnapshot {
        KoperasiSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            taken_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            accounts: crate::ledger::default_chart(),
            journal: Vec::new(),
            members: Vec::new(),
            loans: Vec::new(),
            transactions: Vec::new(),
        }
    }

    #[test]
    fn names_are_canonicalized() {
        assert_eq!(canonical_name(" Koperasi Maju! "), "koperasi_maju_");
        assert_eq!(canonical_name("***"), "koperasi");
    }

    #[test]
    fn overwrite_keeps_bounded_backups() {
        let (store, _guard) = store_with_temp_dir(2);
        for hour in 1..=4 {
            store.save("Harian", &snapshot_at(hour)).expect("save snapshot");
        }
        let backups = store.list_backups("Harian").unwrap();
        assert_eq!(
            backups,
            vec![
                "harian_20240501T030000.json".to_string(),
                "harian_20240501T020000.json".to_string()
            ]
        );
        assert_eq!(store.list().unwrap(), vec!["harian".to_string()]);

        let restored = store
            .restore_backup("Harian", &backups[1])
            .expect("restore backup");
        assert_eq!(restored.taken_at.format("%H").to_string(), "02");
        assert_eq!(store.load("harian").unwrap(), restored);
    }

    #[test]
    fn missing_snapshot_is_not_found() {
        let (store, _guard) = store_with_temp_dir(1);
        assert!(matches!(
            store.load("absent"),
            Err(KoperasiError::NotFound { kind: "Snapshot", .. })
        ));
    }
}
