//! The association store: working copy, published baseline and dirty state.
//!
//! The store holds two collections:
//!
//! - the **working copy**, restored from the durable slot when a previous
//!   session left unsaved edits there, otherwise loaded from the catalog
//! - the **baseline**, the published catalog loaded on its own and never
//!   written, used only to work out which associations changed
//!
//! Every mutation updates the working copy, writes the whole collection to
//! the durable slot and sets the dirty flag before returning. Load failures
//! never escape: they leave an empty collection and a logged warning.

use std::collections::HashMap;

use crate::catalog::{CatalogLoader, CatalogSource, dedupe_ids};
use crate::config::AppConfig;
use crate::error::DataError;
use crate::model::{Association, AssociationId, AssociationPatch, ExportDocument};
use crate::persistence::{Persistence, SlotStorage};


/// How the store loads its data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Public viewer mode: never read the durable slot and skip the baseline.
    pub ignore_local_storage: bool,
}

impl StoreOptions {
    /// Options for the editor.
    pub fn editor() -> Self {
        Self::default()
    }

    /// Options for the read-only viewer.
    pub fn viewer() -> Self {
        Self {
            ignore_local_storage: true,
        }
    }
}

/// In-memory association collection with local persistence and change tracking.
#[derive(Debug)]
pub struct AssociationStore<S, C> {
    persistence: Persistence<S>,
    loader: CatalogLoader<C>,
    options: StoreOptions,
    working: Vec<Association>,
    baseline: Vec<Association>,
    dirty: bool,
    loading: bool,
    /// Last failed write to the durable slot, cleared by the next success.
    persistence_error: Option<String>,
}

impl<S: SlotStorage, C: CatalogSource> AssociationStore<S, C> {
    /// Create an empty store. Call [`initialize`](Self::initialize) to load data.
    pub fn new(persistence: Persistence<S>, loader: CatalogLoader<C>, options: StoreOptions) -> Self {
        Self {
            persistence,
            loader,
            options,
            working: Vec::new(),
            baseline: Vec::new(),
            dirty: false,
            loading: true,
            persistence_error: None,
        }
    }

    /// Create a store using the slot key and mode from the configuration.
    pub fn from_config(storage: S, source: C, config: &AppConfig) -> Self {
        let options = StoreOptions {
            ignore_local_storage: config.ignore_local_storage,
        };
        Self::new(
            Persistence::new(storage, config.storage_key.clone()),
            CatalogLoader::new(source),
            options,
        )
    }

    /// Load the working copy.
    ///
    /// Restores unsaved edits from the durable slot when there are any,
    /// otherwise loads the published catalog. `is_loading()` is false once
    /// this returns. The baseline is not touched: it loads on its own through
    /// [`fetch_baseline`](Self::fetch_baseline), so a slow catalog never holds
    /// up editing.
    pub async fn initialize(&mut self) {
        self.loading = true;
        let (working, dirty) = self.fetch_working().await;
        self.working = working;
        self.dirty = dirty;
        self.loading = false;
    }

    /// Working copy and its dirty flag.
    async fn fetch_working(&self) -> (Vec<Association>, bool) {
        if !self.options.ignore_local_storage {
            match self.persistence.load() {
                Ok(Some(saved)) => {
                    log::info!(
                        "Restored {} associations with unsaved changes",
                        saved.len()
                    );
                    return (dedupe_ids(saved), true);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Ignoring unreadable saved session: {}", e);
                }
            }
        }

        match self.loader.load_catalog().await {
            Ok(associations) => (associations, false),
            Err(e) => {
                log::warn!("Failed to load associations: {}", e);
                (Vec::new(), false)
            }
        }
    }

    /// Fetch the published baseline without holding a borrow of the store.
    ///
    /// The future owns its own handle on the catalog source, so the store can
    /// be edited while it is pending (the browser spawns it). Hand the result
    /// to [`set_baseline`](Self::set_baseline). A failed load yields an empty
    /// baseline, so every association then counts as new. In viewer mode it
    /// resolves to an empty list without fetching anything.
    pub fn fetch_baseline(&self) -> impl Future<Output = Vec<Association>> + use<S, C>
    where
        C: Clone,
    {
        let loader = (!self.options.ignore_local_storage).then(|| self.loader.clone());
        async move {
            let Some(loader) = loader else {
                return Vec::new();
            };
            match loader.load_catalog().await {
                Ok(associations) => associations,
                Err(e) => {
                    log::warn!("Failed to load published associations: {}", e);
                    Vec::new()
                }
            }
        }
    }

    /// Replace the published baseline used by [`diff`](Self::diff).
    pub fn set_baseline(&mut self, baseline: Vec<Association>) {
        log::debug!("Baseline has {} published associations", baseline.len());
        self.baseline = baseline;
    }

    /// Fetch the baseline and install it, keeping the store borrowed meanwhile.
    pub async fn load_baseline(&mut self)
    where
        C: Clone,
    {
        let baseline = self.fetch_baseline().await;
        self.set_baseline(baseline);
    }

    /// Working copy first, then the baseline. For callers with nothing else
    /// to do in the meantime, like the CLI.
    pub async fn load_all(&mut self)
    where
        C: Clone,
    {
        self.initialize().await;
        self.load_baseline().await;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The working collection, in insertion order.
    pub fn associations(&self) -> &[Association] {
        &self.working
    }

    /// The published baseline.
    pub fn baseline(&self) -> &[Association] {
        &self.baseline
    }

    /// Look up an association in the working copy.
    pub fn get(&self, id: &str) -> Option<&Association> {
        self.working.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// There are local edits that have not been published.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The working copy has not finished loading.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Description of the last failed durable write, if the latest write failed.
    pub fn persistence_error(&self) -> Option<&str> {
        self.persistence_error.as_deref()
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Ids of working associations that are new or differ from the baseline,
    /// in working-copy order.
    ///
    /// Comparison is structural, so key order in the source documents does
    /// not matter.
    pub fn diff(&self) -> Vec<AssociationId> {
        let published: HashMap<&str, &Association> =
            self.baseline.iter().map(|a| (a.id.as_str(), a)).collect();

        self.working
            .iter()
            .filter(|a| {
                published
                    .get(a.id.as_str())
                    .is_none_or(|published| *published != *a)
            })
            .map(|a| a.id.clone())
            .collect()
    }

    /// Whether a single working association is new or modified.
    pub fn is_modified(&self, id: &str) -> bool {
        match (self.get(id), self.baseline.iter().find(|a| a.id == id)) {
            (Some(current), Some(published)) => current != published,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new association.
    ///
    /// The caller generates the id; an id already in the working copy is
    /// rejected so ids stay unique.
    pub fn create(&mut self, association: Association) -> Result<(), DataError> {
        if self.contains(&association.id) {
            return Err(DataError::DuplicateId {
                id: association.id,
            });
        }

        log::debug!("Creating association '{}'", association.id);
        self.working.push(association);
        self.commit();
        Ok(())
    }

    /// Shallow-merge `patch` over the association with `id`.
    ///
    /// Returns `false`, changing nothing, when the id is unknown (a delete may
    /// have won the race). An empty patch changes nothing and writes nothing.
    pub fn update(&mut self, id: &str, patch: &AssociationPatch) -> bool {
        let Some(target) = self.working.iter_mut().find(|a| a.id == id) else {
            log::debug!("Ignoring update of unknown association '{}'", id);
            return false;
        };

        if patch.is_empty() {
            return true;
        }

        patch.apply_to(target);
        log::debug!("Updated association '{}'", id);
        self.commit();
        true
    }

    /// Remove the association with `id`, returning it.
    pub fn delete(&mut self, id: &str) -> Result<Association, DataError> {
        let index = self
            .working
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| DataError::not_found(id))?;

        let removed = self.working.remove(index);
        log::debug!("Deleted association '{}'", id);
        self.commit();
        Ok(removed)
    }

    /// Drop all local edits and reload the working copy from the published
    /// data. The baseline is left as is; refresh it with
    /// [`load_baseline`](Self::load_baseline) if the catalog may have changed.
    pub async fn discard(&mut self) {
        if let Err(e) = self.persistence.clear() {
            log::error!("Failed to clear saved session: {}", e);
        }
        self.dirty = false;
        self.persistence_error = None;
        log::info!("Discarded local changes");
        self.initialize().await;
    }

    /// Export one association (`Some(id)`) or the whole working collection.
    pub fn export_entity(&self, id: Option<&str>) -> Result<ExportDocument, DataError> {
        match id {
            Some(id) => {
                let association = self.get(id).ok_or_else(|| DataError::not_found(id))?;
                ExportDocument::single(association)
            }
            None => ExportDocument::collection(&self.working),
        }
    }

    /// Persist the working copy and mark it dirty.
    ///
    /// A failed write keeps the in-memory copy authoritative for the session.
    fn commit(&mut self) {
        match self.persistence.save(&self.working) {
            Ok(()) => self.persistence_error = None,
            Err(e) => {
                log::error!(
                    "Failed to save working copy to '{}': {}",
                    self.persistence.key(),
                    e
                );
                self.persistence_error = Some(e.to_string());
            }
        }
        self.dirty = true;
    }
}
