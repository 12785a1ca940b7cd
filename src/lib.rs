//! Mapa Tiana - neighborhood association map editor
//!
//! Core of the association map: loading the published catalog, keeping a
//! locally persisted working copy with change tracking, and the polygon
//! editing session. Runs in the browser (WASM) and natively as a CLI.

pub mod catalog;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod model;
pub mod persistence;
pub mod session;
pub mod store;
pub mod viewer;

pub use catalog::{CatalogLoader, CatalogSource};
pub use config::{AppConfig, LogLevel};
pub use error::DataError;
pub use geometry::{LatLng, Polygon};
pub use model::{Association, AssociationId, AssociationPatch, ExportDocument};
pub use persistence::{Persistence, SlotStorage};
pub use session::{DrawingSurface, EditingSession, FieldEdit, SessionMode, ShapeEvent};
pub use store::{AssociationStore, StoreOptions};
pub use viewer::{MapLabel, ViewerState};

/// Install the logger for the current target at `level`.
///
/// Native builds use `env_logger`, where `RUST_LOG` overrides the level.
/// Calling this twice is harmless; the second call is ignored.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: LogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .try_init();
}

/// Install the logger for the current target at `level`.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: LogLevel) {
    let _ = console_log::init_with_level(level.to_level());
}

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
