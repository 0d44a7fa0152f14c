//! Offline docx to HTML conversion
//!
//! Produces plain paragraphs and tables. Character formatting, headings and
//! images are not carried over; the remote converter does that.

use std::io::Write;

use super::{Converter, ImportError};
use crate::html::escape_text;

/// Converter that reads the Word file on this machine
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalConverter;

impl Converter for LocalConverter {
    async fn convert(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ImportError> {
        log::info!("Converting {} locally", file_name);
        tokio::task::spawn_blocking(move || convert_bytes(&bytes))
            .await
            .map_err(|e| ImportError::Local(e.to_string()))?
    }
}

fn convert_bytes(bytes: &[u8]) -> Result<String, ImportError> {
    let local_error = |e: &dyn std::fmt::Display| ImportError::Local(e.to_string());

    // docx_lite reads from a path
    let mut file = tempfile::Builder::new()
        .suffix(".docx")
        .tempfile()
        .map_err(|e| local_error(&e))?;
    file.write_all(bytes).map_err(|e| local_error(&e))?;
    file.flush().map_err(|e| local_error(&e))?;

    let doc = docx_lite::parse_document_from_path(file.path()).map_err(|e| local_error(&e))?;

    let paragraphs: Vec<String> = doc.paragraphs.iter().map(|p| p.to_text()).collect();
    let tables: Vec<Table> = doc
        .tables
        .iter()
        .map(|t| {
            t.rows
                .iter()
                .map(|row| {
                    row.cells
                        .iter()
                        .map(|cell| cell.paragraphs.iter().map(|p| p.to_text()).collect())
                        .collect()
                })
                .collect()
        })
        .collect();

    Ok(render_html(&paragraphs, &tables))
}

/// Rows of cells, each cell a list of paragraphs
pub type Table = Vec<Vec<Vec<String>>>;

/// Build editor HTML from extracted paragraphs and tables
///
/// Blank paragraphs are dropped. Tables follow the body text.
pub fn render_html(paragraphs: &[String], tables: &[Table]) -> String {
    let mut html = String::new();

    for text in paragraphs.iter().filter(|t| !t.trim().is_empty()) {
        html.push_str("<p>");
        html.push_str(&escape_text(text));
        html.push_str("</p>");
    }

    for table in tables {
        html.push_str("<table>");
        for row in table {
            html.push_str("<tr>");
            for cell in row {
                let lines: Vec<String> = cell.iter().map(|p| escape_text(p)).collect();
                html.push_str("<td>");
                html.push_str(&lines.join("<br>"));
                html.push_str("</td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");
    }

    html
}
