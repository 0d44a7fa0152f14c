//! Document export to PDF, Word and a printable page

pub mod images;
pub mod pdf;
pub mod print;
pub mod word;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ExportConfig;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Editor is empty. Please enter some text to {0}.")]
    Empty(&'static str),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Word,
    /// Standalone HTML page for the browser's print dialog
    Print,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "doc",
            ExportFormat::Print => "html",
        }
    }

    /// Verb used in the empty-document alert
    pub fn verb(self) -> &'static str {
        match self {
            ExportFormat::Print => "print",
            _ => "export",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Pdf => write!(f, "PDF"),
            ExportFormat::Word => write!(f, "Word"),
            ExportFormat::Print => write!(f, "print page"),
        }
    }
}

pub struct Exporter {
    output_dir: PathBuf,
    file_stem: String,
    client: reqwest::Client,
}

impl Exporter {
    pub fn new(config: &ExportConfig, client: reqwest::Client) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output_dir),
            file_stem: config.file_stem.clone(),
            client,
        }
    }

    pub fn output_path(&self, format: ExportFormat) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.file_stem, format.extension()))
    }

    /// Write the document in `format`, replacing any earlier export
    pub async fn export(&self, format: ExportFormat, html: &str) -> Result<PathBuf, ExportError> {
        if crate::html::plain_text(html).trim().is_empty() && !html.contains("<img") {
            return Err(ExportError::Empty(format.verb()));
        }

        let contents = match format {
            ExportFormat::Print => print::print_envelope(html).into_bytes(),
            ExportFormat::Word => {
                let inlined = images::embed_remote_images(&self.client, html).await;
                word::word_envelope(&inlined).into_bytes()
            }
            ExportFormat::Pdf => {
                let inlined = images::embed_remote_images(&self.client, html).await;
                pdf::render_pdf(&self.file_stem, &inlined)?
            }
        };

        let path = self.output_path(format);
        write_file(&path, &contents)?;
        log::info!("Exported {} to {}", format, path.display());
        Ok(path)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let to_error = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_error)?;
    }
    std::fs::write(path, contents).map_err(to_error)
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod export_tests;
