//! Catalog source reading a local checkout of the static data (native only).

use std::path::{Component, Path, PathBuf};

use super::CatalogSource;
use crate::error::DataError;

/// Reads catalog documents from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, DataError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(DataError::network(path, "path escapes the data directory"));
        }
        Ok(self.root.join(relative))
    }
}

impl CatalogSource for DirectorySource {
    async fn fetch_text(&self, path: &str) -> Result<String, DataError> {
        let full = self.resolve(path)?;
        std::fs::read_to_string(&full).map_err(|e| DataError::network(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogLoader;
    use pollster::block_on;

    #[test]
    fn test_rejects_escaping_paths() {
        let source = DirectorySource::new("/tmp/data");
        assert!(source.resolve("../secret.json").is_err());
        assert!(source.resolve("/etc/passwd").is_err());
        assert_eq!(
            source.resolve("a.json").unwrap(),
            PathBuf::from("/tmp/data/a.json")
        );
    }

    #[test]
    fn test_loads_from_directory() {
        let dir = std::env::temp_dir().join(format!("mapa-tiana-dir-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.json"), r#"{"files":["x.json"]}"#).unwrap();
        std::fs::write(
            dir.join("x.json"),
            r##"{"id":"x","nom":"X","abreviacio":"X","color":"#101010","poligon":[]}"##,
        )
        .unwrap();

        let list = block_on(CatalogLoader::new(DirectorySource::new(&dir)).load_catalog()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "x");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
