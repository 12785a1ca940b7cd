//! Error types for loading, persisting and editing association data.

use thiserror::Error;

/// Errors that can occur while loading, storing or editing associations.
#[derive(Error, Debug)]
pub enum DataError {
    /// Fetch failed or returned a non-success status
    #[error("Network error fetching '{path}': {message}")]
    Network {
        /// Path or URL that was requested
        path: String,
        /// Description of the failure
        message: String,
    },

    /// Malformed JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Operation referenced an id absent from the working collection
    #[error("Association not found: {id}")]
    NotFound {
        /// The missing id
        id: String,
    },

    /// An association with the same id already exists
    #[error("Duplicate association id: {id}")]
    DuplicateId {
        /// The colliding id
        id: String,
    },

    /// Vertex list rejected at the drawing-surface boundary
    #[error("Invalid coordinates: {message}")]
    InvalidCoordinates {
        /// Description of the coordinate error
        message: String,
    },

    /// Color is not a `#rrggbb` string
    #[error("Invalid color '{color}'")]
    InvalidColor {
        /// The rejected value
        color: String,
    },

    /// Durable key-value storage refused the operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error on native file-backed adapters
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Create a network error for a path.
    pub fn network(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an invalid coordinates error.
    pub fn invalid_coordinates(message: impl Into<String>) -> Self {
        Self::InvalidCoordinates {
            message: message.into(),
        }
    }

    /// Create an invalid color error.
    pub fn invalid_color(color: impl Into<String>) -> Self {
        Self::InvalidColor {
            color: color.into(),
        }
    }

    /// Whether this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
