//! Loading the published association catalog.
//!
//! The published data lives as static JSON documents:
//!
//! - `index.json`: `{ "files": [...] }`, names of per-association documents
//! - one document per association, named in the index
//! - `associacions.json`: legacy combined document `{ "associacions": [...] }`
//!
//! The loader tries the index first and fetches every listed document as one
//! all-or-nothing set. Any failure on that path discards the partial result
//! and falls back to the legacy combined document.
//!
//! Where the documents come from is a [`CatalogSource`]:
//!
//! - **`HttpSource`**: `fetch` relative to a base URL (wasm32 only)
//! - **`DirectorySource`**: files in a local checkout (native only)
//! - **`MemorySource`**: in-process documents (tests, embedded data)

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod directory;

#[cfg(target_arch = "wasm32")]
mod http;

pub use memory::MemorySource;

#[cfg(not(target_arch = "wasm32"))]
pub use directory::DirectorySource;

#[cfg(target_arch = "wasm32")]
pub use http::HttpSource;

use std::collections::HashSet;

use crate::constants::{CATALOG_INDEX_FILE, LEGACY_COMBINED_FILE};
use crate::error::DataError;
use crate::model::{Association, AssociationsDocument, CatalogIndex};

/// Read-only access to the static data documents.
pub trait CatalogSource {
    /// Fetch one document by its path relative to the data location.
    ///
    /// A missing document or a non-success status is a `DataError::Network`.
    fn fetch_text(&self, path: &str) -> impl Future<Output = Result<String, DataError>>;

    /// Fetch several documents, preserving order.
    ///
    /// Fails as a whole if any single fetch fails. The default fetches one
    /// after another; network sources override it to issue them concurrently.
    fn fetch_all(&self, paths: &[String]) -> impl Future<Output = Result<Vec<String>, DataError>> {
        async move {
            let mut bodies = Vec::with_capacity(paths.len());
            for path in paths {
                bodies.push(self.fetch_text(path).await?);
            }
            Ok(bodies)
        }
    }
}

/// Loads the published collection with the index-then-legacy fallback.
#[derive(Debug, Clone)]
pub struct CatalogLoader<C> {
    source: C,
}

impl<C: CatalogSource> CatalogLoader<C> {
    pub fn new(source: C) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    /// Load the published collection.
    ///
    /// Errors only when both the index path and the legacy document fail; the
    /// caller decides whether an empty collection is acceptable.
    pub async fn load_catalog(&self) -> Result<Vec<Association>, DataError> {
        let associations = match self.load_from_index().await {
            Ok(associations) => associations,
            Err(e) => {
                log::info!(
                    "Catalog index unavailable ({}), loading {} instead",
                    e,
                    LEGACY_COMBINED_FILE
                );
                self.load_legacy().await?
            }
        };

        let associations = dedupe_ids(associations);
        log::debug!("Loaded catalog with {} associations", associations.len());
        Ok(associations)
    }

    async fn load_from_index(&self) -> Result<Vec<Association>, DataError> {
        let index: CatalogIndex =
            serde_json::from_str(&self.source.fetch_text(CATALOG_INDEX_FILE).await?)?;

        let bodies = self.source.fetch_all(&index.files).await?;
        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(DataError::from))
            .collect()
    }

    async fn load_legacy(&self) -> Result<Vec<Association>, DataError> {
        let document: AssociationsDocument =
            serde_json::from_str(&self.source.fetch_text(LEGACY_COMBINED_FILE).await?)?;
        Ok(document.associacions)
    }
}

/// Keep the first association for every id, dropping later repeats.
pub(crate) fn dedupe_ids(associations: Vec<Association>) -> Vec<Association> {
    let mut seen = HashSet::new();
    associations
        .into_iter()
        .filter(|a| {
            let first = seen.insert(a.id.clone());
            if !first {
                log::warn!("Dropping duplicate association id '{}'", a.id);
            }
            first
        })
        .collect()
}
