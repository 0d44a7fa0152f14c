//! Document import
//!
//! Loads a preset or a user-picked Word file and turns it into HTML through
//! a [`Converter`]. The remote endpoint is tried first; when it is unset or
//! unreachable the file is converted locally.

pub mod converter;
pub mod local;
pub mod preset;
pub mod upload;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use converter::{Converter, FallbackConverter, RemoteConverter};
pub use local::LocalConverter;
pub use preset::{AssetSource, Preset};
pub use upload::validate_docx;

use crate::document::DocumentSource;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Import failures
#[derive(Debug, Error)]
pub enum ImportError {
    /// Shown to the user as-is
    #[error("Please upload a valid Word file.")]
    UnsupportedFile { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Conversion failed ({status}): {message}")]
    Conversion { status: u16, message: String },

    #[error("Unexpected conversion response: {0}")]
    BadResponse(String),

    #[error("Local conversion failed: {0}")]
    Local(String),
}

impl ImportError {
    /// Whether the failure should be raised as a blocking alert
    pub fn is_rejection(&self) -> bool {
        matches!(self, ImportError::UnsupportedFile { .. })
    }
}

/// Converted document ready to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedDocument {
    pub html: String,
    pub source: DocumentSource,
}

pub struct Importer<C> {
    converter: C,
    assets: AssetSource,
    client: reqwest::Client,
}

impl<C: Converter> Importer<C> {
    pub fn new(converter: C, assets: AssetSource, client: reqwest::Client) -> Self {
        Self {
            converter,
            assets,
            client,
        }
    }

    /// Fetch a preset asset and convert it
    pub async fn load_preset(&self, preset: Preset) -> Result<ImportedDocument, ImportError> {
        let file_name = preset.file_name();
        let bytes = self.fetch_asset(&file_name).await?;
        log::info!("Loaded preset {} ({} bytes)", preset.name(), bytes.len());

        let html = self.converter.convert(&file_name, bytes).await?;
        Ok(ImportedDocument {
            html,
            source: DocumentSource::Preset(preset.label().to_string()),
        })
    }

    /// Validate a local Word file and convert it
    pub async fn load_upload(&self, path: &Path) -> Result<ImportedDocument, ImportError> {
        let bytes = upload::read_upload(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.docx".to_string());
        log::info!("Uploading {} ({} bytes)", file_name, bytes.len());

        let html = self.converter.convert(&file_name, bytes).await?;
        Ok(ImportedDocument {
            html,
            source: DocumentSource::Upload(file_name),
        })
    }

    async fn fetch_asset(&self, file_name: &str) -> Result<Vec<u8>, ImportError> {
        match &self.assets {
            AssetSource::Dir(dir) => {
                let path = dir.join(file_name);
                std::fs::read(&path).map_err(|source| ImportError::Read { path, source })
            }
            AssetSource::Remote(base) => {
                let url = base
                    .join(file_name)
                    .map_err(|e| ImportError::Network(e.to_string()))?;
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| ImportError::Network(e.to_string()))?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ImportError::Network(e.to_string()))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod import_tests;
