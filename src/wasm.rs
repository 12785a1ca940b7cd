//! Browser entry point and glue.
//!
//! The page drives the editor through [`Editor`]. The map widget's polygon
//! editor is handed over as a plain JS object implementing `loadShape`,
//! `setShapeColor`, `currentShape` and `clearShape`; polygons cross the
//! boundary as `[[lat, lng], ...]` arrays. Those methods must not call back
//! into the editor synchronously.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use crate::catalog::HttpSource;
use crate::config::AppConfig;
use crate::error::DataError;
use crate::geometry::Polygon;
use crate::model::{AssociationsDocument, ExportDocument};
use crate::persistence::LocalStorage;
use crate::session::{DrawingSurface, EditingSession, FieldEdit, ShapeEvent};
use crate::store::AssociationStore;

/// Store backed by `localStorage` and the static data under `data_base_url`.
pub type BrowserStore = AssociationStore<LocalStorage, HttpSource>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let config = AppConfig::load_from_local_storage();
    crate::init_logging(config.log_level);
    log::info!("Mapa Tiana starting (data at {})", config.data_base_url);
}

/// Build an uninitialized store for the browser from `config`.
pub fn browser_store(config: &AppConfig) -> BrowserStore {
    AssociationStore::from_config(
        LocalStorage::new(),
        HttpSource::new(config.data_base_url.clone()),
        config,
    )
}

/// Offer `document` to the user as a file download.
pub fn trigger_download(document: &ExportDocument) -> Result<(), DataError> {
    let js_err = |e: JsValue| DataError::Storage(format!("download failed: {:?}", e));

    let window = web_sys::window()
        .ok_or_else(|| DataError::Storage("No window object available".to_string()))?;
    let page = window
        .document()
        .ok_or_else(|| DataError::Storage("No document available".to_string()))?;

    let parts = js_sys::Array::new();
    parts.push(&JsValue::from_str(&document.contents));
    let options = BlobPropertyBag::new();
    options.set_type(document.mime_type());
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(js_err)?;
    let url = Url::create_object_url_with_blob(&blob).map_err(js_err)?;

    let anchor: HtmlAnchorElement = page
        .create_element("a")
        .map_err(js_err)?
        .dyn_into()
        .map_err(|_| DataError::Storage("anchor element has unexpected type".to_string()))?;
    anchor.set_href(&url);
    anchor.set_download(&document.filename);
    anchor.click();
    Url::revoke_object_url(&url).map_err(js_err)?;

    log::info!("Downloaded {}", document.filename);
    Ok(())
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn collection_json(store: &BrowserStore) -> Result<String, JsValue> {
    let document = AssociationsDocument {
        associacions: store.associations().to_vec(),
    };
    serde_json::to_string(&document).map_err(to_js)
}

/// Published associations as a `{"associacions": [...]}` document, for the
/// public viewer page.
#[wasm_bindgen(js_name = loadPublishedAssociations)]
pub async fn load_published_associations() -> Result<String, JsValue> {
    let mut config = AppConfig::load_from_local_storage();
    config.ignore_local_storage = true;

    let mut store = browser_store(&config);
    store.initialize().await;
    collection_json(&store)
}

// ============================================================================
// Drawing surface
// ============================================================================

/// [`DrawingSurface`] backed by a JS object.
pub struct JsSurface {
    target: JsValue,
}

impl JsSurface {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }

    fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
        let function: js_sys::Function =
            js_sys::Reflect::get(&self.target, &JsValue::from_str(method))?.dyn_into()?;
        let args: js_sys::Array = args.iter().collect();
        function.apply(&self.target, &args)
    }

    fn call_logged(&self, method: &str, args: &[JsValue]) -> Option<JsValue> {
        match self.call(method, args) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Drawing surface {}() failed: {:?}", method, e);
                None
            }
        }
    }
}

fn polygon_to_js(polygon: &Polygon) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(polygon).map_err(to_js)?;
    js_sys::JSON::parse(&json)
}

fn polygon_from_js(value: &JsValue) -> Result<Polygon, JsValue> {
    let json: String = js_sys::JSON::stringify(value)?.into();
    let coords: Vec<[f64; 2]> = serde_json::from_str(&json).map_err(to_js)?;
    Polygon::from_coords(coords).map_err(to_js)
}

impl DrawingSurface for JsSurface {
    fn load_shape(&mut self, polygon: Option<&Polygon>, color: &str) {
        let shape = match polygon.map(polygon_to_js).transpose() {
            Ok(shape) => shape.unwrap_or(JsValue::NULL),
            Err(e) => {
                log::warn!("Cannot hand polygon to the drawing surface: {:?}", e);
                JsValue::NULL
            }
        };
        self.call_logged("loadShape", &[shape, JsValue::from_str(color)]);
    }

    fn set_shape_color(&mut self, color: &str) {
        self.call_logged("setShapeColor", &[JsValue::from_str(color)]);
    }

    fn current_shape(&self) -> Option<Polygon> {
        let value = self.call_logged("currentShape", &[])?;
        if value.is_null() || value.is_undefined() {
            return None;
        }
        match polygon_from_js(&value) {
            Ok(polygon) => Some(polygon),
            Err(e) => {
                log::warn!("Ignoring invalid shape from the drawing surface: {:?}", e);
                None
            }
        }
    }

    fn clear_shape(&mut self) {
        self.call_logged("clearShape", &[]);
    }
}

// ============================================================================
// Editor
// ============================================================================

/// Fetch the published baseline in the background and install it in
/// whichever store `store` holds when it arrives.
fn spawn_baseline(store: &Rc<RefCell<BrowserStore>>) {
    let pending = store.borrow().fetch_baseline();
    let handle = Rc::downgrade(store);
    spawn_local(async move {
        let baseline = pending.await;
        if let Some(store) = handle.upgrade() {
            store.borrow_mut().set_baseline(baseline);
        }
    });
}

/// The editor page: a store plus one editing session on the map.
#[wasm_bindgen]
pub struct Editor {
    config: AppConfig,
    store: Rc<RefCell<BrowserStore>>,
    session: RefCell<EditingSession<JsSurface>>,
}

/// Load the working copy and return an editor for it. The published
/// baseline keeps loading in the background; until it arrives every
/// association counts as modified.
#[wasm_bindgen(js_name = openEditor)]
pub async fn open_editor(surface: JsValue) -> Editor {
    let config = AppConfig::load_from_local_storage();
    let mut store = browser_store(&config);
    store.initialize().await;

    let store = Rc::new(RefCell::new(store));
    spawn_baseline(&store);

    Editor {
        config,
        store,
        session: RefCell::new(EditingSession::new(JsSurface::new(surface))),
    }
}

#[wasm_bindgen]
impl Editor {
    /// The working copy as a `{"associacions": [...]}` document.
    pub fn associations(&self) -> Result<String, JsValue> {
        collection_json(&self.store.borrow())
    }

    #[wasm_bindgen(js_name = isDirty)]
    pub fn is_dirty(&self) -> bool {
        self.store.borrow().is_dirty()
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.store.borrow().is_loading()
    }

    /// Ids that differ from the published data.
    pub fn diff(&self) -> Vec<String> {
        self.store.borrow().diff()
    }

    /// Last failed write to localStorage, if it has not succeeded since.
    #[wasm_bindgen(js_name = persistenceError)]
    pub fn persistence_error(&self) -> Option<String> {
        self.store.borrow().persistence_error().map(str::to_owned)
    }

    #[wasm_bindgen(js_name = activeId)]
    pub fn active_id(&self) -> Option<String> {
        self.session.borrow().active_id().map(str::to_owned)
    }

    #[wasm_bindgen(js_name = beginEdit)]
    pub fn begin_edit(&self, id: &str) -> Result<(), JsValue> {
        let mut store = self.store.borrow_mut();
        self.session
            .borrow_mut()
            .begin_edit(&mut *store, id)
            .map_err(to_js)
    }

    /// Store a placeholder association and start editing it. Returns its id.
    #[wasm_bindgen(js_name = beginCreate)]
    pub fn begin_create(&self) -> Result<String, JsValue> {
        let mut store = self.store.borrow_mut();
        self.session
            .borrow_mut()
            .begin_create(&mut *store)
            .map_err(to_js)
    }

    /// Buffer a form change. `name` is the field's JSON key.
    #[wasm_bindgen(js_name = editField)]
    pub fn edit_field(&self, name: &str, value: String) -> Result<bool, JsValue> {
        let edit = FieldEdit::from_name(name, value)
            .ok_or_else(|| JsValue::from_str(&format!("unknown field '{}'", name)))?;
        self.session.borrow_mut().edit_field(edit).map_err(to_js)
    }

    /// A new polygon was drawn, as a JSON `[[lat, lng], ...]` array.
    #[wasm_bindgen(js_name = shapeDrawn)]
    pub fn shape_drawn(&self, coords: &str) -> Result<(), JsValue> {
        let coords = serde_json::from_str(coords).map_err(to_js)?;
        let event = ShapeEvent::finalized(coords).map_err(to_js)?;
        self.session.borrow_mut().handle_shape_event(event);
        Ok(())
    }

    /// Vertices of the current polygon moved, as a JSON `[[lat, lng], ...]` array.
    #[wasm_bindgen(js_name = shapeChanged)]
    pub fn shape_changed(&self, coords: &str) -> Result<(), JsValue> {
        let coords = serde_json::from_str(coords).map_err(to_js)?;
        let event = ShapeEvent::reshaped(coords).map_err(to_js)?;
        self.session.borrow_mut().handle_shape_event(event);
        Ok(())
    }

    /// Commit the open association. Returns its id, if one was open.
    pub fn close(&self) -> Option<String> {
        let mut store = self.store.borrow_mut();
        self.session.borrow_mut().close(&mut *store)
    }

    /// Delete the open association. Returns its id.
    #[wasm_bindgen(js_name = deleteCurrent)]
    pub fn delete_current(&self) -> Result<String, JsValue> {
        let mut store = self.store.borrow_mut();
        let removed = self.session.borrow_mut().delete(&mut *store).map_err(to_js)?;
        Ok(removed.id)
    }

    /// Download one association, or the whole working copy when `id` is absent.
    pub fn download(&self, id: Option<String>) -> Result<(), JsValue> {
        let document = self
            .store
            .borrow()
            .export_entity(id.as_deref())
            .map_err(to_js)?;
        trigger_download(&document).map_err(to_js)
    }

    /// Download the open association as it stands on the map, without
    /// committing it. Returns `false` when nothing is open.
    #[wasm_bindgen(js_name = downloadCurrent)]
    pub fn download_current(&self) -> Result<bool, JsValue> {
        let Some(document) = self.session.borrow().export_current().map_err(to_js)? else {
            return Ok(false);
        };
        trigger_download(&document).map_err(to_js)?;
        Ok(true)
    }

    /// Drop every unsaved edit, the open draft included, and reload the
    /// published data. Resolves once the working copy is back.
    pub fn discard(&self) -> js_sys::Promise {
        self.session.borrow_mut().cancel();

        let store = Rc::clone(&self.store);
        let config = self.config.clone();
        future_to_promise(async move {
            let mut fresh = browser_store(&config);
            fresh.discard().await;
            fresh.set_baseline(store.borrow().baseline().to_vec());

            *store.borrow_mut() = fresh;
            spawn_baseline(&store);
            Ok(JsValue::UNDEFINED)
        })
    }
}
