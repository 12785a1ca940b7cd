//! Durable local storage of the unsaved working copy.
//!
//! The working collection is kept in a single named slot of a key-value
//! store. The store itself is a capability injected into
//! [`AssociationStore`](crate::store::AssociationStore):
//!
//! - **`LocalStorage`**: browser `localStorage` (wasm32 only)
//! - **`FileStorage`**: one JSON file per key in a state directory (native only)
//! - **`MemoryStorage`**: in-process map, shared between clones (tests, viewer)
//!
//! Writes are synchronous: when `save` returns the data is as durable as the
//! backing store makes it.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local_storage;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorage;

use crate::error::DataError;
use crate::model::Association;

/// A durable string key-value store.
pub trait SlotStorage {
    /// Read the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>, DataError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), DataError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), DataError>;
}

/// Reads and writes the working collection in one fixed slot.
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    storage: S,
    key: String,
}

impl<S: SlotStorage> Persistence<S> {
    /// Bind a storage backend to a slot key.
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Slot key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Serialize the whole collection (unwrapped JSON array) into the slot.
    pub fn save(&self, associations: &[Association]) -> Result<(), DataError> {
        let json = serde_json::to_string(associations)?;
        self.storage.set_item(&self.key, &json)?;
        log::trace!(
            "Persisted {} associations to '{}'",
            associations.len(),
            self.key
        );
        Ok(())
    }

    /// Load the saved collection.
    ///
    /// Returns `Ok(None)` when the slot is empty and `Err(DataError::Parse)`
    /// when it holds something that is not a serialized collection.
    pub fn load(&self) -> Result<Option<Vec<Association>>, DataError> {
        match self.storage.get_item(&self.key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Drop the saved collection.
    pub fn clear(&self) -> Result<(), DataError> {
        self.storage.remove_item(&self.key)?;
        log::debug!("Cleared persisted slot '{}'", self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let persistence = Persistence::new(MemoryStorage::new(), "slot");
        assert!(persistence.load().unwrap().is_none());

        let list = vec![Association::new("a1", "A", "A", "#000000")];
        persistence.save(&list).unwrap();
        assert_eq!(persistence.load().unwrap(), Some(list));

        persistence.clear().unwrap();
        assert!(persistence.load().unwrap().is_none());
    }

    #[test]
    fn test_slot_holds_unwrapped_array() {
        let storage = MemoryStorage::new();
        let persistence = Persistence::new(storage.clone(), "slot");
        persistence
            .save(&[Association::new("a1", "A", "A", "#000000")])
            .unwrap();

        let raw = storage.get_item("slot").unwrap().unwrap();
        assert!(raw.starts_with('['));
    }

    #[test]
    fn test_corrupt_slot_is_parse_error() {
        let storage = MemoryStorage::new();
        storage.set_item("slot", "{not json").unwrap();
        let persistence = Persistence::new(storage, "slot");
        assert!(matches!(persistence.load(), Err(DataError::Parse(_))));
    }
}
