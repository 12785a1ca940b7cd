//! Data models for the association map.

mod association;
mod document;

pub use association::{Association, AssociationId, AssociationPatch, generate_id};
pub use document::{AssociationsDocument, CatalogIndex, ExportDocument};
