//! Editor facade: the operations the user interface calls.
//!
//! Wires the layer store, scene adapter, selection coordinator and session
//! together. Every mutation of the store is followed by a reconciliation
//! pass, so the canvas always reflects the list.

use crate::api::{ApiError, ExportService, SegmentationService, UploadService};
use crate::color::SerializableColor;
use crate::config::EditorConfig;
use crate::export::{ExportArtifact, ExportError, ExportFormat, export_document};
use crate::import::{ImportError, ImportReport, SegmentationImporter};
use crate::layer::{Layer, LayerId, LayerPatch};
use crate::scene::{ImageLoader, ImageSource, Placement, SceneAdapter, SceneError};
use crate::selection::{SelectionCoordinator, SelectionInput};
use crate::session::Session;
use crate::store::{LayerStore, StoreError};
use kurbo::{Point, Rect};
use thiserror::Error;

/// Editor errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("No image loaded")]
    NoImage,
    #[error("Unsupported image file: {0}")]
    UnsupportedImage(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Result of an operation that is accepted but has no effect yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubOutcome {
    AcceptedNoOp,
}

/// One open document and its canvas.
pub struct Editor {
    config: EditorConfig,
    store: LayerStore,
    scene: Option<SceneAdapter>,
    selection: SelectionCoordinator,
    session: Session,
    importer: SegmentationImporter,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let importer = SegmentationImporter::new(config.segment_opacity);
        Self {
            config,
            store: LayerStore::new(),
            scene: None,
            selection: SelectionCoordinator::new(),
            session: Session::new(),
            importer,
        }
    }

    /// Upload an image, mount a fresh canvas for it and seed the base layer.
    ///
    /// On failure the current document is left as it was.
    pub async fn open_image(
        &mut self,
        source: ImageSource,
        uploader: &dyn UploadService,
        loader: &dyn ImageLoader,
    ) -> Result<Placement, EditorError> {
        if source.format().is_none() {
            return Err(EditorError::UnsupportedImage(source.name));
        }
        if source.len() > self.config.soft_upload_limit {
            log::warn!(
                "{} is {} bytes, above the {} byte upload limit",
                source.name,
                source.len(),
                self.config.soft_upload_limit
            );
        }

        let upload = uploader.upload(&source.name, source.bytes.clone()).await?;
        let mut scene = SceneAdapter::mount(self.config.surface_size).with_fit_ratio(self.config.fit_ratio);
        let placement = scene.load_image(loader, &source).await?;

        if let Some(old) = self.scene.replace(scene) {
            old.dispose();
        }
        self.store.clear();
        self.selection.reset();
        self.session.begin(&upload);
        self.store.add_or_replace(Layer::base_image(upload.url))?;
        self.sync();
        Ok(placement)
    }

    /// Drop the current document and canvas.
    pub fn new_upload(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.dispose();
        }
        self.store.clear();
        self.selection.reset();
        self.session.reset();
    }

    /// Apply a partial update to a layer and reconcile.
    ///
    /// A color in the patch must be hex; it is stored in lowercase
    /// `#rrggbb`/`#rrggbbaa` form.
    pub fn update_layer(&mut self, id: &str, patch: &LayerPatch) -> Result<(), EditorError> {
        let mut patch = patch.clone();
        if let Some(Some(color)) = &patch.color {
            let parsed = SerializableColor::from_hex(color)
                .ok_or_else(|| EditorError::InvalidColor(color.clone()))?;
            patch.color = Some(Some(parsed.to_hex()));
        }
        self.store.update(id, &patch)?;
        self.sync();
        Ok(())
    }

    /// Flip visibility. Returns the new value.
    pub fn toggle_visibility(&mut self, id: &str) -> Result<bool, EditorError> {
        let visible = !self.layer(id)?.visible;
        self.update_layer(id, &LayerPatch::new().visible(visible))?;
        Ok(visible)
    }

    /// Flip the lock. Returns the new value.
    pub fn toggle_lock(&mut self, id: &str) -> Result<bool, EditorError> {
        let locked = !self.layer(id)?.locked;
        self.update_layer(id, &LayerPatch::new().locked(locked))?;
        Ok(locked)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<(), EditorError> {
        self.update_layer(id, &LayerPatch::new().name(name))
    }

    pub fn set_opacity(&mut self, id: &str, opacity: f64) -> Result<(), EditorError> {
        self.update_layer(id, &LayerPatch::new().opacity(opacity))
    }

    /// Set the fill of a layer from a hex color.
    pub fn set_color(&mut self, id: &str, color: &str) -> Result<(), EditorError> {
        self.update_layer(id, &LayerPatch::new().color(Some(color.to_string())))
    }

    /// Select a layer from the list.
    pub fn select_layer(&mut self, id: &str) -> bool {
        self.selection.apply(
            SelectionInput::ListClicked(id.to_string()),
            &mut self.store,
            self.scene.as_mut(),
        )
    }

    /// Forward a pointer press on the canvas. Returns the selected layer id.
    pub fn pointer_down(&mut self, point: Point) -> Result<Option<&str>, EditorError> {
        let scene = self.scene.as_mut().ok_or(EditorError::NoImage)?;
        let event = scene.pointer_down(point);
        self.selection.apply(event.into(), &mut self.store, Some(scene));
        Ok(self.store.selected())
    }

    /// The canvas lost its active object.
    pub fn clear_canvas_selection(&mut self) {
        self.selection
            .apply(SelectionInput::PointerCleared, &mut self.store, self.scene.as_mut());
    }

    /// Copy a layer and its canvas object. Returns the new id.
    pub fn duplicate_layer(&mut self, id: &str) -> Result<LayerId, EditorError> {
        let new_id = self.store.duplicate(id)?;
        if let Some(scene) = self.scene.as_mut() {
            if let Err(err) = scene.clone_object(id, &new_id) {
                self.store.remove(&new_id);
                return Err(err.into());
            }
        }
        self.sync();
        Ok(new_id)
    }

    /// Remove a layer and its canvas object.
    pub fn delete_layer(&mut self, id: &str) -> Result<Layer, EditorError> {
        let layer = self
            .store
            .remove(id)
            .ok_or_else(|| StoreError::LayerNotFound(id.to_string()))?;
        if let Some(scene) = self.scene.as_mut() {
            scene.remove_object(id);
        }
        self.selection.apply(
            SelectionInput::LayerDeleted(id.to_string()),
            &mut self.store,
            self.scene.as_mut(),
        );
        self.sync();
        Ok(layer)
    }

    pub fn move_layer_up(&mut self, id: &str) -> bool {
        let moved = self.store.move_up(id);
        if moved {
            self.sync();
        }
        moved
    }

    pub fn move_layer_down(&mut self, id: &str) -> bool {
        let moved = self.store.move_down(id);
        if moved {
            self.sync();
        }
        moved
    }

    /// Fetch segments for the current image and add them as mask layers.
    pub async fn import_segments(
        &mut self,
        service: &dyn SegmentationService,
    ) -> Result<ImportReport, EditorError> {
        let Some(scene) = self.scene.as_mut() else {
            return Err(ImportError::NoImage.into());
        };
        let report = self
            .importer
            .import_segments(&self.session, service, &mut self.store, scene)
            .await?;
        self.sync();
        Ok(report)
    }

    /// Export the current layer list.
    pub async fn export(
        &self,
        format: ExportFormat,
        service: &dyn ExportService,
    ) -> Result<ExportArtifact, EditorError> {
        Ok(export_document(&self.session, self.store.list(), format, service).await?)
    }

    pub fn undo(&mut self) -> StubOutcome {
        log::debug!("Undo requested; history is not kept");
        StubOutcome::AcceptedNoOp
    }

    pub fn redo(&mut self) -> StubOutcome {
        log::debug!("Redo requested; history is not kept");
        StubOutcome::AcceptedNoOp
    }

    /// Position and size fields of the layer panel.
    pub fn set_transform(&mut self, id: &str, bounds: Rect) -> StubOutcome {
        log::debug!("Transform of {} to {:?} accepted without effect", id, bounds);
        StubOutcome::AcceptedNoOp
    }

    /// Reconcile the canvas with the store and re-project the selection.
    pub fn sync(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            scene.reconcile(self.store.list());
        }
        self.selection.resync(&mut self.store, self.scene.as_mut());
    }

    pub fn layers(&self) -> &[Layer] {
        self.store.list()
    }

    pub fn layer(&self, id: &str) -> Result<&Layer, EditorError> {
        self.store
            .get(id)
            .ok_or_else(|| StoreError::LayerNotFound(id.to_string()).into())
    }

    /// Selected layer id, as shown in the list.
    pub fn selected_id(&self) -> Option<&str> {
        self.store.selected()
    }

    /// Active object on the canvas, if any.
    pub fn canvas_selected_id(&self) -> Option<&str> {
        self.scene.as_ref().and_then(SceneAdapter::active)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn scene(&self) -> Option<&SceneAdapter> {
        self.scene.as_ref()
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
