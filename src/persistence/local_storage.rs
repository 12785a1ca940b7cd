//! Browser `localStorage` slot storage (WASM only).

use super::SlotStorage;
use crate::error::DataError;

/// Slot storage backed by `window.localStorage`.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Result<web_sys::Storage, DataError> {
        let window = web_sys::window()
            .ok_or_else(|| DataError::Storage("No window object available".to_string()))?;

        window
            .local_storage()
            .map_err(|e| DataError::Storage(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| DataError::Storage("localStorage not available".to_string()))
    }
}

impl SlotStorage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, DataError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| DataError::Storage(format!("Failed to read from localStorage: {:?}", e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), DataError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| DataError::Storage(format!("Failed to save to localStorage: {:?}", e)))
    }

    fn remove_item(&self, key: &str) -> Result<(), DataError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| DataError::Storage(format!("Failed to clear localStorage: {:?}", e)))
    }
}
