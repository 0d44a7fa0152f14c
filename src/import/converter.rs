//! docx to HTML conversion

use std::future::Future;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{DOCX_MIME, ImportError, LocalConverter};
use crate::config::ConvertConfig;

/// Turns a Word document into HTML
pub trait Converter {
    fn convert(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String, ImportError>> + Send;
}

/// Converter backed by a remote multipart endpoint
#[derive(Debug, Clone)]
pub struct RemoteConverter {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    html: String,
}

impl RemoteConverter {
    pub fn new(client: reqwest::Client, config: &ConvertConfig) -> Self {
        Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        }
    }
}

impl Converter for RemoteConverter {
    async fn convert(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ImportError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(DOCX_MIME)
            .map_err(|e| ImportError::Network(e.to_string()))?;
        let form = Form::new().part("file", part);

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        log::info!("Converting {} via {}", file_name, self.url);
        let response = request
            .send()
            .await
            .map_err(|e| ImportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ImportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ImportError::Conversion {
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }

        parse_convert_response(&body)
    }
}

/// Tries `primary` and converts with `fallback` when it cannot be reached
///
/// HTTP and response errors from a reachable endpoint are returned as-is.
#[derive(Debug, Clone)]
pub struct FallbackConverter<P, F> {
    primary: Option<P>,
    fallback: F,
}

impl<P, F> FallbackConverter<P, F> {
    pub fn new(primary: Option<P>, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl FallbackConverter<RemoteConverter, LocalConverter> {
    /// Remote conversion when `convert.url` is set, local otherwise
    pub fn from_config(client: reqwest::Client, config: &ConvertConfig) -> Self {
        let remote = (!config.url.trim().is_empty()).then(|| RemoteConverter::new(client, config));
        Self::new(remote, LocalConverter)
    }
}

impl<P, F> Converter for FallbackConverter<P, F>
where
    P: Converter + Sync,
    F: Converter + Sync,
{
    async fn convert(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ImportError> {
        let Some(primary) = &self.primary else {
            return self.fallback.convert(file_name, bytes).await;
        };
        match primary.convert(file_name, bytes.clone()).await {
            Err(ImportError::Network(e)) => {
                log::warn!("Conversion endpoint unreachable ({}), converting locally", e);
                self.fallback.convert(file_name, bytes).await
            }
            result => result,
        }
    }
}

/// Extract the `html` field from a conversion reply
pub fn parse_convert_response(body: &str) -> Result<String, ImportError> {
    serde_json::from_str::<ConvertResponse>(body)
        .map(|reply| reply.html)
        .map_err(|e| ImportError::BadResponse(e.to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
