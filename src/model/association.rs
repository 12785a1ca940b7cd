//! Association data model.

use rand::Rng;
use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::color_utils::random_association_color;
use crate::constants::{
    ASSOCIATION_ID_PREFIX, ASSOCIATION_ID_SUFFIX_LEN, NEW_ASSOCIATION_LABEL, NEW_ASSOCIATION_NAME,
};
use crate::geometry::Polygon;

/// Opaque, stable association identifier.
pub type AssociationId = String;

const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A neighbourhood association with its area on the map.
///
/// Field names match the published JSON documents. Fields this version does
/// not know about are kept in `extra` so that exporting a loaded document
/// does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    /// Immutable after creation
    pub id: AssociationId,
    /// Display name
    pub nom: String,
    /// Short label shown on the map
    pub abreviacio: String,
    /// `#rrggbb`, used for fill and stroke
    pub color: String,
    /// Area outline; empty until drawn
    #[serde(default)]
    pub poligon: Polygon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Association {
    /// Create an association with the given id, name, label and color and no area.
    pub fn new(
        id: impl Into<AssociationId>,
        nom: impl Into<String>,
        abreviacio: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            nom: nom.into(),
            abreviacio: abreviacio.into(),
            color: color.into(),
            poligon: Polygon::new(),
            descripcio: None,
            contacte: None,
            email: None,
            telefon: None,
            url: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the polygon.
    pub fn with_polygon(mut self, poligon: Polygon) -> Self {
        self.poligon = poligon;
        self
    }

    /// A freshly created association with placeholder texts, empty contact
    /// fields, no area and a generated id and color.
    pub fn placeholder<R: Rng>(rng: &mut R) -> Self {
        let id = generate_id(rng, now_millis());
        let color = random_association_color(rng);
        let mut association = Self::new(id, NEW_ASSOCIATION_NAME, NEW_ASSOCIATION_LABEL, color);
        association.descripcio = Some(String::new());
        association.contacte = Some(String::new());
        association.email = Some(String::new());
        association.telefon = Some(String::new());
        association.url = Some(String::new());
        association
    }

    /// Whether the area can be drawn on the map.
    pub fn has_area(&self) -> bool {
        self.poligon.is_renderable()
    }
}

/// Generate an id of the form `assoc-<millis>-<9 base-36 chars>`.
pub fn generate_id<R: Rng>(rng: &mut R, millis: u128) -> AssociationId {
    let suffix: String = (0..ASSOCIATION_ID_SUFFIX_LEN)
        .map(|_| BASE36_DIGITS[rng.random_range(0..BASE36_DIGITS.len())] as char)
        .collect();
    format!("{}{}-{}", ASSOCIATION_ID_PREFIX, millis, suffix)
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// A partial update, shallow-merged over an existing association.
///
/// `None` leaves the field untouched. The id is never patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationPatch {
    pub nom: Option<String>,
    pub abreviacio: Option<String>,
    pub color: Option<String>,
    pub poligon: Option<Polygon>,
    pub descripcio: Option<String>,
    pub contacte: Option<String>,
    pub email: Option<String>,
    pub telefon: Option<String>,
    pub url: Option<String>,
}

impl AssociationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that replaces only the polygon.
    pub fn polygon(poligon: Polygon) -> Self {
        Self {
            poligon: Some(poligon),
            ..Self::default()
        }
    }

    /// Patch that rewrites every editable field from a full association.
    pub fn from_association(association: &Association) -> Self {
        Self {
            nom: Some(association.nom.clone()),
            abreviacio: Some(association.abreviacio.clone()),
            color: Some(association.color.clone()),
            poligon: Some(association.poligon.clone()),
            descripcio: association.descripcio.clone(),
            contacte: association.contacte.clone(),
            email: association.email.clone(),
            telefon: association.telefon.clone(),
            url: association.url.clone(),
        }
    }

    /// Set the display name.
    pub fn with_nom(mut self, nom: impl Into<String>) -> Self {
        self.nom = Some(nom.into());
        self
    }

    /// Set the color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields over `target`.
    pub fn apply_to(&self, target: &mut Association) {
        fn merge<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        fn merge_optional(slot: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        merge(&mut target.nom, &self.nom);
        merge(&mut target.abreviacio, &self.abreviacio);
        merge(&mut target.color, &self.color);
        merge(&mut target.poligon, &self.poligon);
        merge_optional(&mut target.descripcio, &self.descripcio);
        merge_optional(&mut target.contacte, &self.contacte);
        merge_optional(&mut target.email, &self.email);
        merge_optional(&mut target.telefon, &self.telefon);
        merge_optional(&mut target.url, &self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_utils::is_valid_hex;

    #[test]
    fn test_parse_published_entity() {
        let json = r##"{
            "id": "a1",
            "nom": "Test",
            "abreviacio": "T",
            "color": "#ff0000",
            "poligon": [[41.49, 2.26], [41.50, 2.26], [41.50, 2.27]],
            "email": "info@example.org"
        }"##;
        let a: Association = serde_json::from_str(json).unwrap();
        assert_eq!(a.id, "a1");
        assert_eq!(a.poligon.len(), 3);
        assert!(a.has_area());
        assert_eq!(a.email.as_deref(), Some("info@example.org"));
        assert!(a.telefon.is_none());
        assert!(a.extra.is_empty());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r##"{"id":"a1","nom":"N","abreviacio":"A","color":"#000000","poligon":[],"instagram":"@a1"}"##;
        let a: Association = serde_json::from_str(json).unwrap();
        assert_eq!(a.extra.get("instagram").and_then(|v| v.as_str()), Some("@a1"));

        let out = serde_json::to_string(&a).unwrap();
        assert!(out.contains("\"instagram\":\"@a1\""));
    }

    #[test]
    fn test_missing_polygon_defaults_to_empty() {
        let a: Association =
            serde_json::from_str(r##"{"id":"x","nom":"N","abreviacio":"A","color":"#123456"}"##)
                .unwrap();
        assert!(a.poligon.is_empty());
        assert!(!a.has_area());
    }

    #[test]
    fn test_generate_id_format() {
        let mut rng = rand::rng();
        let id = generate_id(&mut rng, 1_700_000_000_000);
        let suffix = id.strip_prefix("assoc-1700000000000-").expect("prefix and timestamp");
        assert_eq!(suffix.len(), 9);
        assert!(suffix.bytes().all(|b| BASE36_DIGITS.contains(&b)));
    }

    #[test]
    fn test_placeholder() {
        let mut rng = rand::rng();
        let a = Association::placeholder(&mut rng);
        let b = Association::placeholder(&mut rng);
        assert_ne!(a.id, b.id);
        assert_eq!(a.nom, NEW_ASSOCIATION_NAME);
        assert_eq!(a.abreviacio, NEW_ASSOCIATION_LABEL);
        assert!(is_valid_hex(&a.color));
        assert!(a.poligon.is_empty());
        assert_eq!(a.email.as_deref(), Some(""));
    }

    #[test]
    fn test_patch_merges_only_set_fields() {
        let mut a = Association::new("a1", "Old", "O", "#111111");
        a.email = Some("old@example.org".to_string());

        AssociationPatch::new().with_nom("New").apply_to(&mut a);
        assert_eq!(a.nom, "New");
        assert_eq!(a.abreviacio, "O");
        assert_eq!(a.email.as_deref(), Some("old@example.org"));
    }

    #[test]
    fn test_empty_patch() {
        assert!(AssociationPatch::new().is_empty());
        assert!(!AssociationPatch::new().with_color("#000000").is_empty());

        let before = Association::new("a1", "N", "A", "#111111");
        let mut after = before.clone();
        AssociationPatch::new().apply_to(&mut after);
        assert_eq!(before, after);
    }

    #[test]
    fn test_full_patch_reproduces_association() {
        let mut source = Association::new("a1", "N", "A", "#111111").with_polygon(
            Polygon::from_coords(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap(),
        );
        source.url = Some("https://example.org".to_string());

        let mut target = Association::new("a1", "", "", "#000000");
        AssociationPatch::from_association(&source).apply_to(&mut target);
        assert_eq!(source, target);
    }
}
