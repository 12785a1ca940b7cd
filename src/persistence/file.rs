//! File-backed slot storage for native builds.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::SlotStorage;
use crate::error::DataError;

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default state directory (`<data_dir>/mapa-tiana`).
    pub fn default_dir() -> Option<PathBuf> {
        if let Some(data_dir) = dirs::data_dir() {
            Some(data_dir.join("mapa-tiana"))
        } else {
            dirs::home_dir().map(|home| home.join(".local").join("share").join("mapa-tiana"))
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `key`. The key must be a single plain file name so that no
    /// slot lands outside the state directory.
    fn path_for(&self, key: &str) -> Result<PathBuf, DataError> {
        let mut components = Path::new(key).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.dir.join(format!("{}.json", key))),
            _ => Err(DataError::Storage(format!("invalid slot key '{}'", key))),
        }
    }
}

impl SlotStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, DataError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), DataError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves a half-written slot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), DataError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
