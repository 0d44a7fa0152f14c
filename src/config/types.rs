// Configuration type definitions

use serde::Deserialize;

/// Default websocket endpoint of the suggestion service
pub const DEFAULT_SUGGEST_URL: &str = "wss://smart-suggest.azurewebsites.net/ws/rag/stream/1/kesimpta";

/// Default docx to HTML conversion endpoint
pub const DEFAULT_CONVERT_URL: &str = "https://importdocx.converter.tiny.cloud/v2/convert/docx-html";

/// Suggestion service section
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_suggest_url")]
    pub url: String,
    /// Quiet period after the last selection change before a request is sent
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// How long a sent selection may wait for its correction
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        SuggestConfig {
            enabled: true,
            url: default_suggest_url(),
            debounce_ms: default_debounce_ms(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Conversion service section
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    #[serde(default = "default_convert_url")]
    pub url: String,
    /// Sent as a bearer token when present
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            url: default_convert_url(),
            api_key: None,
        }
    }
}

/// Preset document location
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            assets_dir: default_assets_dir(),
        }
    }
}

/// Export destination
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_file_stem")]
    pub file_stem: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            output_dir: default_output_dir(),
            file_stem: default_file_stem(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub suggest: SuggestConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

fn default_true() -> bool {
    true
}

fn default_suggest_url() -> String {
    DEFAULT_SUGGEST_URL.to_string()
}

fn default_debounce_ms() -> u64 {
    3000
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_convert_url() -> String {
    DEFAULT_CONVERT_URL.to_string()
}

fn default_assets_dir() -> String {
    "files".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_file_stem() -> String {
    "document".to_string()
}
