//! Export rendering: SVG documents and flattened PSD files.

use html_escape::encode_double_quoted_attribute as attr;
use image::RgbaImage;
use kurbo::{BezPath, Point, Rect, Shape};
use layerink_core::color::SerializableColor;
use layerink_core::layer::{Layer, LayerKind};
use thiserror::Error;
use tracing::warn;

/// Largest side a version 1 PSD file can hold.
pub const PSD_MAX_SIDE: u32 = 30_000;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("image too large for PSD: {width}x{height}")]
    TooLarge { width: u32, height: u32 },
}

/// Mask layers that end up in an export: visible, with path data.
fn exported_masks(layers: &[Layer]) -> impl Iterator<Item = (&Layer, &str)> {
    layers
        .iter()
        .filter(|layer| layer.visible && layer.kind == LayerKind::Mask)
        .filter_map(|layer| layer.data.path().map(|path| (layer, path)))
}

/// SVG document with the source image faded underneath the mask paths.
pub fn svg_document(image_href: &str, width: u32, height: u32, layers: &[Layer]) -> String {
    let mut svg = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <svg width=\"{width}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
         \x20   <defs>\n\
         \x20       <style>\n\
         \x20           .layer {{ opacity: 1; }}\n\
         \x20       </style>\n\
         \x20   </defs>\n\
         \x20   <image href=\"{href}\" width=\"{width}\" height=\"{height}\" opacity=\"0.3\"/>\n",
        href = attr(image_href),
    );

    for (layer, path) in exported_masks(layers) {
        let color = layer.color.as_deref().unwrap_or("#ffffff");
        svg.push_str(&format!(
            "    <path d=\"{}\" fill=\"{}\" opacity=\"{}\" class=\"layer\" id=\"{}\"/>\n",
            attr(path),
            attr(color),
            layer.opacity,
            attr(&layer.id)
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Paint every visible mask onto a copy of `base`.
///
/// Masks are filled with their color at their opacity, in list order.
/// Paths that fail to parse are skipped.
pub fn flatten(base: &RgbaImage, layers: &[Layer]) -> RgbaImage {
    let mut canvas = base.clone();
    let frame = Rect::new(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);

    for (layer, data) in exported_masks(layers) {
        let path = match BezPath::from_svg(data) {
            Ok(path) => path,
            Err(err) => {
                warn!("Skipping layer {} in export: {}", layer.id, err);
                continue;
            }
        };
        let fill = layer
            .color
            .as_deref()
            .and_then(SerializableColor::from_hex)
            .unwrap_or_else(SerializableColor::white);
        let alpha = fill.a as f64 / 255.0 * layer.opacity;
        if alpha <= 0.0 {
            continue;
        }

        let area = path.bounding_box().intersect(frame).expand();
        if area.is_zero_area() {
            continue;
        }
        for y in area.y0 as u32..area.y1 as u32 {
            for x in area.x0 as u32..area.x1 as u32 {
                if !path.contains(Point::new(x as f64 + 0.5, y as f64 + 0.5)) {
                    continue;
                }
                let pixel = canvas.get_pixel_mut(x, y);
                let dst_alpha = pixel[3] as f64 / 255.0;
                for (channel, src) in [fill.r, fill.g, fill.b].into_iter().enumerate() {
                    let blended = src as f64 * alpha + pixel[channel] as f64 * (1.0 - alpha);
                    pixel[channel] = blended.round() as u8;
                }
                pixel[3] = ((alpha + dst_alpha * (1.0 - alpha)) * 255.0).round() as u8;
            }
        }
    }

    canvas
}

/// Encode an RGBA image as a single-layer 8-bit RGB PSD with an alpha channel.
pub fn psd_bytes(image: &RgbaImage) -> Result<Vec<u8>, ComposeError> {
    let (width, height) = image.dimensions();
    if width > PSD_MAX_SIDE || height > PSD_MAX_SIDE {
        return Err(ComposeError::TooLarge { width, height });
    }

    let plane = width as usize * height as usize;
    let mut out = Vec::with_capacity(26 + 4 * 3 + 2 + plane * 4);

    // File header
    out.extend_from_slice(b"8BPS");
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&[0; 6]);
    out.extend_from_slice(&4u16.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&8u16.to_be_bytes());
    out.extend_from_slice(&3u16.to_be_bytes()); // RGB

    // Color mode data, image resources, layer and mask info: all empty
    for _ in 0..3 {
        out.extend_from_slice(&0u32.to_be_bytes());
    }

    // Image data, raw, planar
    out.extend_from_slice(&0u16.to_be_bytes());
    for channel in 0..4 {
        out.extend(image.pixels().map(|pixel| pixel[channel]));
    }

    Ok(out)
}
