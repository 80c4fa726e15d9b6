//! Export requests and the files they produce.

use crate::api::{ApiError, ExportRequest, ExportService};
use crate::layer::Layer;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Export errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("No image loaded")]
    NoImage,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// File formats the export service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Psd,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Svg, ExportFormat::Psd];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Psd => "psd",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Psd => "image/vnd.adobe.photoshop",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported export format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(ExportFormat::Svg),
            "psd" => Ok(ExportFormat::Psd),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// A file handed back by the export service, ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("export.{}", format.extension()),
            format,
            bytes,
        }
    }

    /// Write the artifact into `dir` under its file name.
    pub fn save_in(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Send the layer list to the export service and collect the file.
///
/// Without an image handle nothing is requested.
pub async fn export_document(
    session: &Session,
    layers: &[Layer],
    format: ExportFormat,
    service: &dyn ExportService,
) -> Result<ExportArtifact, ExportError> {
    let handle = session.image_handle().ok_or(ExportError::NoImage)?;
    let request = ExportRequest {
        image_id: handle.as_str().to_string(),
        layers: layers.to_vec(),
        format: format.extension().to_string(),
        filename: None,
    };

    log::info!("Exporting {} layers of {} as {}", layers.len(), handle, format);
    let bytes = service.export(&request).await?;
    log::info!("Export finished: {} bytes", bytes.len());
    Ok(ExportArtifact::new(format, bytes))
}
