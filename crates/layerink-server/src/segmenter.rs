//! Segmentation backends.

use crate::state::StoredImage;
use layerink_core::layer::{BoundingBox, SegmentDescriptor};

/// Produces segment descriptors for an uploaded image.
///
/// Paths are in image pixel coordinates.
pub trait Segmenter: Send + Sync {
    fn segment(&self, image: &StoredImage) -> Vec<SegmentDescriptor>;
}

/// Deterministic segmentation used when no model is attached: a person
/// rectangle, the full-frame background and a lens-shaped object, scaled to
/// the image.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderSegmenter;

impl Segmenter for PlaceholderSegmenter {
    fn segment(&self, image: &StoredImage) -> Vec<SegmentDescriptor> {
        let w = image.dimensions.width as f64;
        let h = image.dimensions.height as f64;
        let p = |x: f64, y: f64| format!("{} {}", coord(x), coord(y));

        vec![
            SegmentDescriptor {
                id: "segment-1".to_string(),
                name: "Person".to_string(),
                path: format!(
                    "M {} L {} L {} L {} Z",
                    p(w * 0.2, h * 0.3),
                    p(w * 0.4, h * 0.3),
                    p(w * 0.4, h * 0.8),
                    p(w * 0.2, h * 0.8)
                ),
                color: "#ff6b6b".to_string(),
                bbox: Some(bbox(w * 0.2, h * 0.3, w * 0.2, h * 0.5)),
                confidence: Some(0.95),
            },
            SegmentDescriptor {
                id: "segment-2".to_string(),
                name: "Background".to_string(),
                path: format!("M 0 0 L {} L {} L {} Z", p(w, 0.0), p(w, h), p(0.0, h)),
                color: "#4ecdc4".to_string(),
                bbox: Some(bbox(0.0, 0.0, w, h)),
                confidence: Some(0.88),
            },
            SegmentDescriptor {
                id: "segment-3".to_string(),
                name: "Object".to_string(),
                path: format!(
                    "M {} Q {} {} Q {} {} Z",
                    p(w * 0.6, h * 0.4),
                    p(w * 0.7, h * 0.3),
                    p(w * 0.8, h * 0.4),
                    p(w * 0.7, h * 0.5),
                    p(w * 0.6, h * 0.4)
                ),
                color: "#45b7d1".to_string(),
                bbox: Some(bbox(w * 0.6, h * 0.3, w * 0.2, h * 0.2)),
                confidence: Some(0.82),
            },
        ]
    }
}

/// Round to two decimals.
fn coord(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn bbox(x: f64, y: f64, width: f64, height: f64) -> BoundingBox {
    BoundingBox {
        x: coord(x),
        y: coord(y),
        width: coord(width),
        height: coord(height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{BezPath, Shape};
    use layerink_core::api::Dimensions;

    fn image(width: u32, height: u32) -> StoredImage {
        StoredImage {
            image_id: "img".to_string(),
            path: "uploads/img.png".into(),
            filename: "img.png".to_string(),
            size: 0,
            dimensions: Dimensions { width, height },
        }
    }

    #[test]
    fn test_placeholder_segments_scale_with_image() {
        let segments = PlaceholderSegmenter.segment(&image(400, 300));
        let names: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Person", "Background", "Object"]);
        assert_eq!(segments[0].path, "M 80 90 L 160 90 L 160 240 L 80 240 Z");

        let background = BezPath::from_svg(&segments[1].path).unwrap();
        assert_eq!(background.bounding_box(), kurbo::Rect::new(0.0, 0.0, 400.0, 300.0));
    }

    #[test]
    fn test_placeholder_paths_parse() {
        for segment in PlaceholderSegmenter.segment(&image(333, 517)) {
            assert!(BezPath::from_svg(&segment.path).is_ok(), "{}", segment.path);
        }
    }
}
