//! Interactive editing of one association at a time.
//!
//! The session is a small state machine:
//!
//! ```text
//!            begin_edit(id)                 close / delete
//! Viewing ------------------> Editing(id) ------------------> Viewing
//!    |       begin_create                        ^
//!    +----------------------> Creating(id) ------+
//! ```
//!
//! While editing, field changes are buffered in a draft copy and only reach
//! the store on `close`. The drawing surface (the map widget's polygon editor)
//! owns the live geometry: `close` reads the shape back from it rather than
//! trusting the last event, since vertices may still be mid-drag.
//!
//! Opening a second association while one is active closes (and commits) the
//! first, so at most one polygon is ever in progress.

use crate::catalog::CatalogSource;
use crate::color_utils::parse_hex;
use crate::error::DataError;
use crate::geometry::Polygon;
use crate::model::{Association, AssociationId, AssociationPatch, ExportDocument};
use crate::persistence::SlotStorage;
use crate::store::AssociationStore;

/// The polygon editor on the map.
pub trait DrawingSurface {
    /// Show `polygon` as the editable shape (or nothing to draw yet), painted with `color`.
    fn load_shape(&mut self, polygon: Option<&Polygon>, color: &str);

    /// Repaint the editable shape for a live color preview.
    fn set_shape_color(&mut self, color: &str);

    /// The shape as it currently stands on the surface, if there is one.
    fn current_shape(&self) -> Option<Polygon>;

    /// Remove the editable shape.
    fn clear_shape(&mut self);
}

/// Notification from the drawing surface. Both kinds replace the draft polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeEvent {
    /// A brand-new polygon was drawn.
    Finalized(Polygon),
    /// Vertices of the existing polygon were moved.
    Reshaped(Polygon),
}

impl ShapeEvent {
    /// Validate a raw vertex list from the surface.
    pub fn finalized(coords: Vec<[f64; 2]>) -> Result<Self, DataError> {
        Polygon::from_coords(coords).map(Self::Finalized)
    }

    /// Validate a raw vertex list from the surface.
    pub fn reshaped(coords: Vec<[f64; 2]>) -> Result<Self, DataError> {
        Polygon::from_coords(coords).map(Self::Reshaped)
    }

    pub fn into_polygon(self) -> Polygon {
        match self {
            Self::Finalized(polygon) | Self::Reshaped(polygon) => polygon,
        }
    }
}

/// A buffered change to one field of the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Nom(String),
    Abreviacio(String),
    /// Must be `#rrggbb`; previewed on the surface immediately
    Color(String),
    Descripcio(String),
    Contacte(String),
    Email(String),
    Telefon(String),
    Url(String),
}

impl FieldEdit {
    /// Build an edit from a form field name (the JSON key of the field).
    pub fn from_name(name: &str, value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        Some(match name {
            "nom" => Self::Nom(value),
            "abreviacio" => Self::Abreviacio(value),
            "color" => Self::Color(value),
            "descripcio" => Self::Descripcio(value),
            "contacte" => Self::Contacte(value),
            "email" => Self::Email(value),
            "telefon" => Self::Telefon(value),
            "url" => Self::Url(value),
            _ => return None,
        })
    }
}

/// Which state the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Viewing,
    Editing,
    Creating,
}

#[derive(Debug, Clone)]
enum SessionState {
    Viewing,
    Editing(Association),
    Creating(Association),
}

/// Coordinates one drawing surface with the store's edit buffer.
#[derive(Debug)]
pub struct EditingSession<D> {
    surface: D,
    state: SessionState,
}

impl<D: DrawingSurface> EditingSession<D> {
    pub fn new(surface: D) -> Self {
        Self {
            surface,
            state: SessionState::Viewing,
        }
    }

    pub fn mode(&self) -> SessionMode {
        match self.state {
            SessionState::Viewing => SessionMode::Viewing,
            SessionState::Editing(_) => SessionMode::Editing,
            SessionState::Creating(_) => SessionMode::Creating,
        }
    }

    pub fn is_active(&self) -> bool {
        self.draft().is_some()
    }

    /// The buffered copy of the association being edited.
    pub fn draft(&self) -> Option<&Association> {
        match &self.state {
            SessionState::Viewing => None,
            SessionState::Editing(draft) | SessionState::Creating(draft) => Some(draft),
        }
    }

    fn draft_mut(&mut self) -> Option<&mut Association> {
        match &mut self.state {
            SessionState::Viewing => None,
            SessionState::Editing(draft) | SessionState::Creating(draft) => Some(draft),
        }
    }

    /// Id of the association being edited.
    pub fn active_id(&self) -> Option<&str> {
        self.draft().map(|d| d.id.as_str())
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut D {
        &mut self.surface
    }

    /// Start editing an existing association.
    ///
    /// Any association already open is closed and committed first.
    pub fn begin_edit<S: SlotStorage, C: CatalogSource>(
        &mut self,
        store: &mut AssociationStore<S, C>,
        id: &str,
    ) -> Result<(), DataError> {
        self.close(store);

        let draft = store.get(id).cloned().ok_or_else(|| DataError::not_found(id))?;
        self.open(SessionState::Editing(draft));
        Ok(())
    }

    /// Create a placeholder association, store it straight away and start
    /// editing it. Returns the new id.
    pub fn begin_create<S: SlotStorage, C: CatalogSource>(
        &mut self,
        store: &mut AssociationStore<S, C>,
    ) -> Result<AssociationId, DataError> {
        let association = Association::placeholder(&mut rand::rng());
        self.begin_create_from(store, association)
    }

    /// Like [`begin_create`](Self::begin_create) with a caller-built association.
    pub fn begin_create_from<S: SlotStorage, C: CatalogSource>(
        &mut self,
        store: &mut AssociationStore<S, C>,
        association: Association,
    ) -> Result<AssociationId, DataError> {
        self.close(store);

        let id = association.id.clone();
        store.create(association.clone())?;
        self.open(SessionState::Creating(association));
        Ok(id)
    }

    fn open(&mut self, state: SessionState) {
        self.state = state;
        if let SessionState::Editing(draft) | SessionState::Creating(draft) = &self.state {
            let polygon = (!draft.poligon.is_empty()).then_some(&draft.poligon);
            self.surface.load_shape(polygon, &draft.color);
            log::debug!("Editing association '{}'", draft.id);
        }
    }

    /// Buffer a field change. Returns `false` when nothing is being edited.
    pub fn edit_field(&mut self, edit: FieldEdit) -> Result<bool, DataError> {
        if let FieldEdit::Color(color) = &edit {
            parse_hex(color)?;
        }

        let Some(draft) = self.draft_mut() else {
            return Ok(false);
        };

        match edit {
            FieldEdit::Nom(v) => draft.nom = v,
            FieldEdit::Abreviacio(v) => draft.abreviacio = v,
            FieldEdit::Color(v) => {
                draft.color = v;
                let color = draft.color.clone();
                self.surface.set_shape_color(&color);
            }
            FieldEdit::Descripcio(v) => draft.descripcio = Some(v),
            FieldEdit::Contacte(v) => draft.contacte = Some(v),
            FieldEdit::Email(v) => draft.email = Some(v),
            FieldEdit::Telefon(v) => draft.telefon = Some(v),
            FieldEdit::Url(v) => draft.url = Some(v),
        }
        Ok(true)
    }

    /// Take a finalized or reshaped polygon from the surface into the draft.
    pub fn handle_shape_event(&mut self, event: ShapeEvent) {
        match self.draft_mut() {
            Some(draft) => {
                let polygon = event.into_polygon();
                log::trace!(
                    "Shape for '{}' now has {} vertices",
                    draft.id,
                    polygon.len()
                );
                draft.poligon = polygon;
            }
            None => log::debug!("Ignoring shape event while not editing"),
        }
    }

    /// The draft with the surface's live geometry merged in.
    fn draft_with_live_shape(&self) -> Option<Association> {
        let mut draft = self.draft()?.clone();
        if let Some(live) = self.surface.current_shape().filter(|p| !p.is_empty()) {
            draft.poligon = live;
        }
        Some(draft)
    }

    /// Commit the draft (with live geometry) to the store and return to viewing.
    ///
    /// Returns the id that was committed, or `None` if nothing was open.
    pub fn close<S: SlotStorage, C: CatalogSource>(
        &mut self,
        store: &mut AssociationStore<S, C>,
    ) -> Option<AssociationId> {
        let merged = self.draft_with_live_shape()?;

        store.update(&merged.id, &AssociationPatch::from_association(&merged));
        self.surface.clear_shape();
        self.state = SessionState::Viewing;
        log::debug!("Closed editor for '{}'", merged.id);
        Some(merged.id)
    }

    /// Drop the draft without committing it, e.g. when the store underneath
    /// is being reloaded. An association created by `begin_create` stays in
    /// the store as created.
    pub fn cancel(&mut self) {
        if let Some(id) = self.active_id().map(str::to_owned) {
            log::debug!("Abandoned draft of '{}'", id);
            self.surface.clear_shape();
        }
        self.state = SessionState::Viewing;
    }

    /// Delete the association being edited and return to viewing without
    /// committing the draft.
    pub fn delete<S: SlotStorage, C: CatalogSource>(
        &mut self,
        store: &mut AssociationStore<S, C>,
    ) -> Result<Association, DataError> {
        let id = self
            .active_id()
            .map(str::to_owned)
            .ok_or_else(|| DataError::not_found(""))?;

        self.surface.clear_shape();
        self.state = SessionState::Viewing;
        store.delete(&id)
    }

    /// Export the draft as it stands, live geometry included, without
    /// committing it. `None` when nothing is being edited.
    pub fn export_current(&self) -> Result<Option<ExportDocument>, DataError> {
        self.draft_with_live_shape()
            .map(|draft| ExportDocument::single(&draft))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use pollster::block_on;

    use super::*;
    use crate::catalog::{CatalogLoader, MemorySource};
    use crate::persistence::{MemoryStorage, Persistence};
    use crate::store::StoreOptions;

    /// Drawing surface that records what it was asked to show.
    #[derive(Debug, Default)]
    struct RecordingSurface {
        shape: Option<Polygon>,
        color: Option<String>,
        loads: usize,
        clears: usize,
    }

    impl RecordingSurface {
        /// Simulate the user dragging vertices without an event reaching us yet.
        fn drag_to(&mut self, coords: Vec<[f64; 2]>) {
            self.shape = Some(Polygon::from_coords(coords).unwrap());
        }
    }

    impl DrawingSurface for RecordingSurface {
        fn load_shape(&mut self, polygon: Option<&Polygon>, color: &str) {
            self.shape = polygon.cloned();
            self.color = Some(color.to_string());
            self.loads += 1;
        }

        fn set_shape_color(&mut self, color: &str) {
            self.color = Some(color.to_string());
        }

        fn current_shape(&self) -> Option<Polygon> {
            self.shape.clone()
        }

        fn clear_shape(&mut self) {
            self.shape = None;
            self.clears += 1;
        }
    }

    type TestStore = AssociationStore<MemoryStorage, MemorySource>;

    fn store() -> TestStore {
        let source = MemorySource::new().with_document(
            "associacions.json",
            r##"{"associacions":[
                {"id":"a1","nom":"Test","abreviacio":"T","color":"#ff0000","poligon":[[41.49,2.26],[41.50,2.26],[41.50,2.27]]},
                {"id":"a2","nom":"Other","abreviacio":"O","color":"#00ff00","poligon":[]}
            ]}"##,
        );
        let mut store = AssociationStore::new(
            Persistence::new(MemoryStorage::new(), "slot"),
            CatalogLoader::new(source),
            StoreOptions::editor(),
        );
        block_on(store.load_all());
        store
    }

    fn square() -> Vec<[f64; 2]> {
        vec![[41.49, 2.26], [41.50, 2.26], [41.50, 2.27], [41.49, 2.27]]
    }

    #[test]
    fn test_begin_edit_loads_surface() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        assert_eq!(session.mode(), SessionMode::Viewing);

        session.begin_edit(&mut store, "a1").unwrap();
        assert_eq!(session.mode(), SessionMode::Editing);
        assert_eq!(session.active_id(), Some("a1"));
        assert_eq!(session.surface().shape.as_ref().map(Polygon::len), Some(3));
        assert_eq!(session.surface().color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_begin_edit_without_polygon_shows_nothing() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        session.begin_edit(&mut store, "a2").unwrap();
        assert!(session.surface().shape.is_none());
        assert_eq!(session.surface().loads, 1);
    }

    #[test]
    fn test_begin_edit_unknown_id() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        let err = session.begin_edit(&mut store, "missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(session.mode(), SessionMode::Viewing);
    }

    #[test]
    fn test_reshape_then_close_commits_exact_vertices() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        session.begin_edit(&mut store, "a1").unwrap();

        session.surface_mut().drag_to(square());
        session.handle_shape_event(ShapeEvent::reshaped(square()).unwrap());

        assert_eq!(session.close(&mut store), Some("a1".to_string()));
        assert_eq!(session.mode(), SessionMode::Viewing);
        assert_eq!(store.get("a1").unwrap().poligon.to_coords(), square());
        assert!(store.is_dirty());
        assert_eq!(session.surface().clears, 1);
    }

    #[test]
    fn test_close_prefers_live_surface_geometry() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        session.begin_edit(&mut store, "a1").unwrap();

        // Last event says one thing, the surface has moved on since
        session.handle_shape_event(ShapeEvent::reshaped(square()).unwrap());
        let live = vec![[1.0, 1.0], [1.0, 2.0], [2.0, 2.0]];
        session.surface_mut().drag_to(live.clone());

        session.close(&mut store);
        assert_eq!(store.get("a1").unwrap().poligon.to_coords(), live);
    }

    #[test]
    fn test_close_without_surface_shape_keeps_polygon() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        session.begin_edit(&mut store, "a1").unwrap();
        session.surface_mut().shape = None;
        session
            .edit_field(FieldEdit::Nom("Renamed".to_string()))
            .unwrap();

        session.close(&mut store);
        let a1 = store.get("a1").unwrap();
        assert_eq!(a1.nom, "Renamed");
        assert_eq!(a1.poligon.len(), 3);
    }

    #[test]
    fn test_field_edits_are_buffered_until_close() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        session.begin_edit(&mut store, "a1").unwrap();

        assert!(session.edit_field(FieldEdit::Abreviacio("TT".to_string())).unwrap());
        assert!(session.edit_field(FieldEdit::Email("t@example.org".to_string())).unwrap());
        assert_eq!(store.get("a1").unwrap().abreviacio, "T");
        assert!(!store.is_dirty());

        session.close(&mut store);
        let a1 = store.get("a1").unwrap();
        assert_eq!(a1.abreviacio, "TT");
        assert_eq!(a1.email.as_deref(), Some("t@example.org"));
    }

    #[test]
    fn test_color_edit_previews_on_surface() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        session.begin_edit(&mut store, "a1").unwrap();

        session
            .edit_field(FieldEdit::Color("#123abc".to_string()))
            .unwrap();
        assert_eq!(session.surface().color.as_deref(), Some("#123abc"));
        assert_eq!(store.get("a1").unwrap().color, "#ff0000");

        let err = session
            .edit_field(FieldEdit::Color("blue".to_string()))
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidColor { .. }));
        assert_eq!(session.draft().unwrap().color, "#123abc");
    }

    #[test]
    fn test_edit_field_while_viewing() {
        let mut session = EditingSession::new(RecordingSurface::default());
        assert!(!session.edit_field(FieldEdit::Nom("x".to_string())).unwrap());
    }

    #[test]
    fn test_begin_create_stores_placeholder_immediately() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());

        let id = session.begin_create(&mut store).unwrap();
        assert_eq!(session.mode(), SessionMode::Creating);
        assert!(store.contains(&id));
        assert!(store.is_dirty());
        assert!(session.surface().shape.is_none());

        // Closing without drawing leaves the incomplete association behind
        session.close(&mut store);
        let created = store.get(&id).unwrap();
        assert!(created.poligon.is_empty());
        assert_eq!(store.diff(), vec![id]);
    }

    #[test]
    fn test_create_draw_close() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        let id = session.begin_create(&mut store).unwrap();

        let triangle = vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        session.surface_mut().drag_to(triangle.clone());
        session.handle_shape_event(ShapeEvent::finalized(triangle.clone()).unwrap());
        session.close(&mut store);

        let poligon = &store.get(&id).unwrap().poligon;
        assert_eq!(poligon.to_coords(), triangle);
        assert!(poligon.centroid().is_some());
    }

    #[test]
    fn test_opening_second_entity_commits_first() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        session.begin_edit(&mut store, "a1").unwrap();
        session.surface_mut().drag_to(square());

        session.begin_edit(&mut store, "a2").unwrap();
        assert_eq!(session.active_id(), Some("a2"));
        assert_eq!(store.get("a1").unwrap().poligon.len(), 4);
        // a2 has no polygon, so the surface was cleared and reloaded empty
        assert!(session.surface().shape.is_none());
    }

    #[test]
    fn test_delete_skips_merge() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        session.begin_edit(&mut store, "a1").unwrap();
        session
            .edit_field(FieldEdit::Nom("Never saved".to_string()))
            .unwrap();

        let removed = session.delete(&mut store).unwrap();
        assert_eq!(removed.nom, "Test");
        assert!(!store.contains("a1"));
        assert_eq!(session.mode(), SessionMode::Viewing);
    }

    #[test]
    fn test_delete_while_viewing() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        assert!(session.delete(&mut store).is_err());
    }

    #[test]
    fn test_cancel_drops_draft() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        session.begin_edit(&mut store, "a1").unwrap();
        session
            .edit_field(FieldEdit::Nom("Never saved".to_string()))
            .unwrap();
        session.surface_mut().drag_to(square());

        session.cancel();
        assert_eq!(session.mode(), SessionMode::Viewing);
        assert_eq!(session.surface().clears, 1);
        assert_eq!(store.get("a1").unwrap().nom, "Test");
        assert_eq!(store.get("a1").unwrap().poligon.len(), 3);
        assert!(!store.is_dirty());

        // Nothing to clear the second time
        session.cancel();
        assert_eq!(session.surface().clears, 1);
    }

    #[test]
    fn test_field_edit_from_name() {
        assert_eq!(
            FieldEdit::from_name("abreviacio", "AB"),
            Some(FieldEdit::Abreviacio("AB".to_string()))
        );
        assert_eq!(
            FieldEdit::from_name("color", "#000000"),
            Some(FieldEdit::Color("#000000".to_string()))
        );
        assert_eq!(FieldEdit::from_name("id", "x"), None);
        assert_eq!(FieldEdit::from_name("poligon", "[]"), None);
    }

    #[test]
    fn test_shape_event_rejects_bad_coordinates() {
        assert!(ShapeEvent::reshaped(vec![[0.0, f64::NAN]]).is_err());
        assert!(ShapeEvent::finalized(Vec::new()).is_ok());
    }

    #[test]
    fn test_export_current_uses_live_shape() {
        let mut store = store();
        let mut session = EditingSession::new(RecordingSurface::default());
        assert!(session.export_current().unwrap().is_none());

        session.begin_edit(&mut store, "a1").unwrap();
        session.surface_mut().drag_to(square());

        let doc = session.export_current().unwrap().unwrap();
        assert_eq!(doc.filename, "a1.json");
        let parsed: Association = serde_json::from_str(&doc.contents).unwrap();
        assert_eq!(parsed.poligon.to_coords(), square());
        // Nothing committed
        assert_eq!(store.get("a1").unwrap().poligon.len(), 3);
    }
}
