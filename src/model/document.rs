//! Published and exported JSON documents.

use serde::{Deserialize, Serialize};

use crate::constants::LEGACY_COMBINED_FILE;
use crate::error::DataError;
use crate::model::Association;

/// Catalog index: names of sibling documents, one association each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogIndex {
    pub files: Vec<String>,
}

/// Legacy combined document, also the full-collection export format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationsDocument {
    #[serde(default)]
    pub associacions: Vec<Association>,
}

/// A standalone document ready to be saved or downloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    /// Suggested file name (`{id}.json` or `associacions.json`)
    pub filename: String,
    /// Pretty-printed JSON
    pub contents: String,
}

impl ExportDocument {
    /// Document holding a single association, named after its id.
    pub fn single(association: &Association) -> Result<Self, DataError> {
        Ok(Self {
            filename: format!("{}.json", association.id),
            contents: serde_json::to_string_pretty(association)?,
        })
    }

    /// Document wrapping a whole collection.
    pub fn collection(associations: &[Association]) -> Result<Self, DataError> {
        let document = AssociationsDocument {
            associacions: associations.to_vec(),
        };
        Ok(Self {
            filename: LEGACY_COMBINED_FILE.to_string(),
            contents: serde_json::to_string_pretty(&document)?,
        })
    }

    /// MIME type for downloads.
    pub fn mime_type(&self) -> &'static str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_document_without_key_is_empty() {
        let doc: AssociationsDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.associacions.is_empty());
    }

    #[test]
    fn test_index_requires_files() {
        assert!(serde_json::from_str::<CatalogIndex>("{}").is_err());
        let index: CatalogIndex = serde_json::from_str(r#"{"files":["a.json","b.json"]}"#).unwrap();
        assert_eq!(index.files, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_single_export() {
        let a = Association::new("assoc-1", "Nom", "N", "#abcdef");
        let doc = ExportDocument::single(&a).unwrap();
        assert_eq!(doc.filename, "assoc-1.json");
        assert!(doc.contents.contains("\n  \"nom\": \"Nom\""));

        let parsed: Association = serde_json::from_str(&doc.contents).unwrap();
        assert_eq!(parsed, a);
    }

    #[test]
    fn test_collection_export() {
        let list = vec![
            Association::new("a", "A", "A", "#000000"),
            Association::new("b", "B", "B", "#ffffff"),
        ];
        let doc = ExportDocument::collection(&list).unwrap();
        assert_eq!(doc.filename, "associacions.json");

        let parsed: AssociationsDocument = serde_json::from_str(&doc.contents).unwrap();
        assert_eq!(parsed.associacions, list);
    }
}
