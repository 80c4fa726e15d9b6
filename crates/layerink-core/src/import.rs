//! Segment import: turn segmentation results into mask layers.

use crate::api::{ApiError, SegmentationService};
use crate::layer::{Layer, LayerId, SegmentDescriptor};
use crate::scene::{SceneAdapter, SceneError};
use crate::session::Session;
use crate::store::{LayerStore, StoreError};
use thiserror::Error;

/// Opacity given to freshly imported masks.
pub const DEFAULT_SEGMENT_OPACITY: f64 = 0.7;

/// Import errors. Raised before anything is added.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("No image loaded")]
    NoImage,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Why a segment was left out of an import.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("a layer with this id already exists")]
    AlreadyPresent,
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSegment {
    pub id: String,
    pub reason: SkipReason,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Ids of the layers added, in arrival order.
    pub imported: Vec<LayerId>,
    pub skipped: Vec<SkippedSegment>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Requests segments for the session image and materializes them.
#[derive(Debug, Clone, Copy)]
pub struct SegmentationImporter {
    opacity: f64,
}

impl Default for SegmentationImporter {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_SEGMENT_OPACITY,
        }
    }
}

impl SegmentationImporter {
    pub fn new(opacity: f64) -> Self {
        Self { opacity }
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Fetch segments for the session image and add one mask layer per segment.
    ///
    /// Without an image handle nothing is requested. A transport failure
    /// adds nothing.
    pub async fn import_segments(
        &self,
        session: &Session,
        service: &dyn SegmentationService,
        store: &mut LayerStore,
        scene: &mut SceneAdapter,
    ) -> Result<ImportReport, ImportError> {
        let handle = session.image_handle().ok_or(ImportError::NoImage)?;
        log::info!("Requesting segments for {}", handle);
        let response = service.segments(handle.as_str()).await?;
        log::info!(
            "Received {} segments in {:.2}s",
            response.segments.len(),
            response.processing_time
        );
        Ok(self.apply_segments(response.segments, store, scene))
    }

    /// Materialize descriptors in arrival order, then repaint once.
    ///
    /// A segment whose object cannot be built is skipped; the store record is
    /// only added after its object exists.
    pub fn apply_segments(
        &self,
        segments: Vec<SegmentDescriptor>,
        store: &mut LayerStore,
        scene: &mut SceneAdapter,
    ) -> ImportReport {
        let mut report = ImportReport::default();

        for segment in segments {
            if store.contains(&segment.id) || scene.contains(&segment.id) {
                log::warn!("Skipping segment {}: already present", segment.id);
                report.skipped.push(SkippedSegment {
                    id: segment.id,
                    reason: SkipReason::AlreadyPresent,
                });
                continue;
            }
            if let Err(err) = scene.materialize_segment(&segment, self.opacity) {
                log::warn!("Skipping segment {}: {}", segment.id, err);
                report.skipped.push(SkippedSegment {
                    id: segment.id,
                    reason: err.into(),
                });
                continue;
            }

            let id = segment.id.clone();
            match store.add_or_replace(Layer::from_segment(segment, self.opacity)) {
                Ok(_) => report.imported.push(id),
                Err(err) => {
                    // Keep the index 1:1 with the store.
                    log::warn!("Skipping segment {}: {}", id, err);
                    scene.detach_object(&id);
                    report.skipped.push(SkippedSegment {
                        id,
                        reason: err.into(),
                    });
                }
            }
        }

        scene.request_repaint();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Dimensions, MemoryService, UploadResponse};
    use crate::layer::{BASE_LAYER_ID, LayerKind, LayerPayload};
    use kurbo::Size;

    fn segment(id: &str, path: &str) -> SegmentDescriptor {
        SegmentDescriptor {
            id: id.to_string(),
            name: format!("Segment {}", id),
            path: path.to_string(),
            color: "#ff6b6b".to_string(),
            bbox: None,
            confidence: Some(0.9),
        }
    }

    fn three_segments() -> Vec<SegmentDescriptor> {
        vec![
            segment("segment-1", "M 0 0 L 10 0 L 10 10 Z"),
            segment("segment-2", "M 5 5 L 50 5 L 50 50 Z"),
            segment("segment-3", "M 1 1 L 2 1 L 2 2 Z"),
        ]
    }

    fn active_session() -> Session {
        let mut session = Session::new();
        session.begin(&UploadResponse {
            image_id: "img".to_string(),
            url: "/uploads/img.png".to_string(),
            filename: "img.png".to_string(),
            size: 1,
            dimensions: Dimensions { width: 100, height: 100 },
        });
        session
    }

    fn document() -> (LayerStore, SceneAdapter) {
        let mut store = LayerStore::new();
        let mut scene = SceneAdapter::mount(Size::new(800.0, 600.0));
        scene.place_base_image(100, 100).unwrap();
        store.add_or_replace(Layer::base_image("/uploads/img.png")).unwrap();
        (store, scene)
    }

    #[test]
    fn test_import_adds_masks_in_order() {
        let service = MemoryService::with_segments(three_segments());
        let (mut store, mut scene) = document();
        let frames = scene.frames();

        let report = pollster::block_on(SegmentationImporter::default().import_segments(
            &active_session(),
            &service,
            &mut store,
            &mut scene,
        ))
        .unwrap();

        assert_eq!(report.imported, vec!["segment-1", "segment-2", "segment-3"]);
        assert!(report.is_clean());
        let ids: Vec<&str> = store.list().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec![BASE_LAYER_ID, "segment-1", "segment-2", "segment-3"]);
        for layer in &store.list()[1..] {
            assert_eq!(layer.kind, LayerKind::Mask);
            assert!(layer.visible);
            assert!(!layer.locked);
            assert_eq!(layer.opacity, 0.7);
            assert!(matches!(layer.data, LayerPayload::Mask(_)));
            assert_eq!(scene.object(&layer.id).unwrap().opacity, 0.7);
        }
        assert_eq!(scene.frames(), frames + 1);
    }

    #[test]
    fn test_no_image_sends_no_request() {
        let service = MemoryService::with_segments(three_segments());
        let (mut store, mut scene) = document();
        let result = pollster::block_on(SegmentationImporter::default().import_segments(
            &Session::new(),
            &service,
            &mut store,
            &mut scene,
        ));
        assert_eq!(result, Err(ImportError::NoImage));
        assert_eq!(service.segment_calls(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_transport_failure_adds_nothing() {
        let service = MemoryService::with_segments(three_segments());
        service.fail_with(Some(ApiError::Transport("offline".to_string())));
        let (mut store, mut scene) = document();
        let result = pollster::block_on(SegmentationImporter::default().import_segments(
            &active_session(),
            &service,
            &mut store,
            &mut scene,
        ));
        assert!(matches!(result, Err(ImportError::Api(ApiError::Transport(_)))));
        assert_eq!(store.len(), 1);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_bad_segment_is_skipped() {
        let mut segments = three_segments();
        segments[1].path = "not a path".to_string();
        let (mut store, mut scene) = document();

        let report = SegmentationImporter::default().apply_segments(segments, &mut store, &mut scene);
        assert_eq!(report.imported, vec!["segment-1", "segment-3"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].id, "segment-2");
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::Scene(SceneError::InvalidPath { .. })
        ));
        assert!(!scene.contains("segment-2"));
        assert_eq!(store.len(), scene.len());
    }

    #[test]
    fn test_skipped_segments_repaint_once() {
        let mut segments = three_segments();
        segments[0].color = "tomato".to_string();
        segments.push(segment(BASE_LAYER_ID, "M 0 0 L 1 0 L 1 1 Z"));
        let (mut store, mut scene) = document();
        let frames = scene.frames();

        let report = SegmentationImporter::default().apply_segments(segments, &mut store, &mut scene);
        assert_eq!(report.imported, vec!["segment-2", "segment-3"]);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(skipped, vec!["segment-1", BASE_LAYER_ID]);
        assert_eq!(scene.frames(), frames + 1);
        assert_eq!(store.len(), scene.len());
    }

    #[test]
    fn test_store_rejection_is_a_skip_reason() {
        let reason = SkipReason::from(StoreError::SecondImageLayer("segment-9".to_string()));
        assert_eq!(
            reason.to_string(),
            "Document already has an image layer: segment-9"
        );
    }

    #[test]
    fn test_reimport_skips_existing() {
        let (mut store, mut scene) = document();
        let importer = SegmentationImporter::default();
        importer.apply_segments(three_segments(), &mut store, &mut scene);
        let report = importer.apply_segments(three_segments(), &mut store, &mut scene);

        assert!(report.imported.is_empty());
        assert_eq!(report.skipped.len(), 3);
        assert!(report.skipped.iter().all(|s| s.reason == SkipReason::AlreadyPresent));
        assert_eq!(store.len(), 4);
        assert_eq!(scene.len(), 4);
    }
}
