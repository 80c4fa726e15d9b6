//! Service configuration, read from `LAYERINK_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Largest accepted upload, in bytes.
pub const DEFAULT_MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub export_dir: PathBuf,
    pub max_file_size: usize,
    /// Lowercase extensions with the leading dot.
    pub allowed_extensions: Vec<String>,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            upload_dir: PathBuf::from("uploads"),
            processed_dir: PathBuf::from("processed"),
            export_dir: PathBuf::from("exports"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: [".jpg", ".jpeg", ".png", ".bmp", ".tiff"]
                .map(String::from)
                .to_vec(),
            cors_origins: ["http://localhost:8080", "http://127.0.0.1:8080"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from a key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("LAYERINK_BIND") {
            config.bind = value.parse().map_err(|_| ConfigError::Invalid {
                key: "LAYERINK_BIND",
                value,
            })?;
        }
        if let Some(value) = lookup("LAYERINK_UPLOAD_DIR") {
            config.upload_dir = value.into();
        }
        if let Some(value) = lookup("LAYERINK_PROCESSED_DIR") {
            config.processed_dir = value.into();
        }
        if let Some(value) = lookup("LAYERINK_EXPORT_DIR") {
            config.export_dir = value.into();
        }
        if let Some(value) = lookup("LAYERINK_MAX_FILE_SIZE") {
            config.max_file_size = value.parse().map_err(|_| ConfigError::Invalid {
                key: "LAYERINK_MAX_FILE_SIZE",
                value,
            })?;
        }
        if let Some(value) = lookup("LAYERINK_ALLOWED_EXTENSIONS") {
            config.allowed_extensions = split_list(&value)
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    if ext.starts_with('.') { ext } else { format!(".{}", ext) }
                })
                .collect();
        }
        if let Some(value) = lookup("LAYERINK_CORS_ORIGINS") {
            config.cors_origins = split_list(&value).map(String::from).collect();
        }

        Ok(config)
    }

    /// Create the storage directories if they are missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.upload_dir, &self.processed_dir, &self.export_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn max_file_size_mb(&self) -> f64 {
        self.max_file_size as f64 / (1024.0 * 1024.0)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}
