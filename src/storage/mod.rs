pub mod json_backend;

use std::path::PathBuf;

use crate::core::koperasi::KoperasiSnapshot;
use crate::errors::KoperasiResult;

/// Persistence backends able to keep named koperasi snapshots and their backups.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, name: &str, snapshot: &KoperasiSnapshot) -> KoperasiResult<PathBuf>;
    fn load(&self, name: &str) -> KoperasiResult<KoperasiSnapshot>;
    fn list(&self) -> KoperasiResult<Vec<String>>;
    /// Backup file names for `name`, newest first.
    fn list_backups(&self, name: &str) -> KoperasiResult<Vec<String>>;
    fn restore_backup(&self, name: &str, backup_name: &str) -> KoperasiResult<KoperasiSnapshot>;
}

pub use json_backend::{load_snapshot_from_path, save_snapshot_to_path, JsonSnapshotStore};
