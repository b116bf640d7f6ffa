use dirs::home_dir;
use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::KoperasiResult;

const DEFAULT_DIR_NAME: &str = ".koperasi_core";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const SNAPSHOT_DIR: &str = "snapshots";
const TMP_SUFFIX: &str = "tmp";

/// Resolves the on-disk layout used by configuration and snapshots.
pub struct PathResolver;

impl PathResolver {
    /// Application data directory: `KOPERASI_CORE_HOME`, else `~/.koperasi_core`.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os("KOPERASI_CORE_HOME") {
            return PathBuf::from(custom);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn resolve_base(root: Option<PathBuf>) -> PathBuf {
        root.unwrap_or_else(Self::base_dir)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        base.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    pub fn snapshot_dir_in(base: &Path) -> PathBuf {
        base.join(SNAPSHOT_DIR)
    }
}

pub fn ensure_dir(path: &Path) -> KoperasiResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Stages `data` next to `path` and renames it into place.
pub fn write_atomic(path: &Path, data: &str) -> KoperasiResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data.as_bytes())?;
        file.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_leaves_no_temp_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("state.json");
        write_atomic(&path, "{}").expect("write succeeds");
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!tmp_path(&path).exists());
    }
}
