//! In-memory catalog source.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::CatalogSource;
use crate::error::DataError;

/// Documents held in memory, keyed by path.
///
/// A path with no document behaves like an HTTP 404. Clones share the same
/// documents, so tests can change the published data after handing the
/// source to a store.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: Rc<RefCell<HashMap<String, String>>>,
    fetches: Rc<Cell<usize>>,
    stall_after: Rc<Cell<Option<usize>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document.
    pub fn with_document(self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(path, body);
        self
    }

    /// Add or replace a document.
    pub fn insert(&self, path: impl Into<String>, body: impl Into<String>) {
        self.documents.borrow_mut().insert(path.into(), body.into());
    }

    /// Remove a document so that fetching it fails.
    pub fn remove(&self, path: &str) {
        self.documents.borrow_mut().remove(path);
    }

    /// Let the first `fetches` fetches through and leave every later one
    /// pending forever, like a request that never gets an answer.
    pub fn stall_after(&self, fetches: usize) {
        self.stall_after.set(Some(fetches));
    }

    /// Number of fetches served or refused so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl CatalogSource for MemorySource {
    async fn fetch_text(&self, path: &str) -> Result<String, DataError> {
        let count = self.fetches.get() + 1;
        self.fetches.set(count);
        if self.stall_after.get().is_some_and(|limit| count > limit) {
            log::trace!("Stalling fetch of '{}'", path);
            std::future::pending::<()>().await;
        }
        self.documents
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| DataError::network(path, "HTTP 404"))
    }
}
