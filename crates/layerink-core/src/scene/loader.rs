//! Image sources and asynchronous decoding.

use super::SceneError;
use crate::api::BoxFuture;
use std::io::Cursor;
use std::path::Path;

/// Raw bytes of an image the user picked, with its file name.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read an image file from disk.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self { name, bytes })
    }

    /// Size of the image data in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Detect the image format from magic bytes.
    pub fn format(&self) -> Option<image::ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }
}

/// Natural size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
}

/// Decodes image sources for the scene.
pub trait ImageLoader {
    /// Decode `source` far enough to know its natural size.
    fn load<'a>(&'a self, source: &'a ImageSource) -> BoxFuture<'a, Result<DecodedImage, SceneError>>;
}

/// Loader backed by the `image` crate. Reads the header only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodingLoader;

impl ImageLoader for DecodingLoader {
    fn load<'a>(&'a self, source: &'a ImageSource) -> BoxFuture<'a, Result<DecodedImage, SceneError>> {
        Box::pin(async move {
            let reader = image::ImageReader::new(Cursor::new(source.bytes.as_slice()))
                .with_guessed_format()
                .map_err(|e| SceneError::ImageDecode(e.to_string()))?;
            let (width, height) = reader
                .into_dimensions()
                .map_err(|e| SceneError::ImageDecode(format!("{}: {}", source.name, e)))?;
            Ok(DecodedImage { width, height })
        })
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
