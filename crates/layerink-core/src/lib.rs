//! LayerInk Core Library
//!
//! Keeps an ordered list of layer records in step with the scene graph drawn on
//! the editing surface, mediates the single layer selection shared by the layer
//! list and the canvas, and imports machine-generated segments as mask layers.

pub mod api;
pub mod color;
pub mod config;
pub mod editor;
pub mod export;
pub mod import;
pub mod layer;
pub mod scene;
pub mod selection;
pub mod session;
pub mod store;

pub use api::{
    ApiError, BoxFuture, ExportService, HttpClient, MemoryService, SegmentationService, UploadService,
};
pub use color::SerializableColor;
pub use config::EditorConfig;
pub use editor::{Editor, EditorError, StubOutcome};
pub use export::{ExportArtifact, ExportError, ExportFormat, export_document};
pub use import::{ImportError, ImportReport, SegmentationImporter};
pub use layer::{BASE_LAYER_ID, Layer, LayerId, LayerKind, LayerPatch, LayerPayload, SegmentDescriptor};
pub use scene::{
    DecodingLoader, ImageLoader, ImageSource, Placement, SceneAdapter, SceneError, SceneEvent, SceneObject,
};
pub use selection::{Selection, SelectionCoordinator, SelectionInput};
pub use session::{ImageHandle, Session};
pub use store::{LayerStore, StoreError};
