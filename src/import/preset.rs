use std::path::PathBuf;

use url::Url;

/// Built-in documents offered in the picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    Protocol,
    Sample,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Protocol, Preset::Sample];

    /// Asset name without extension
    pub fn name(self) -> &'static str {
        match self {
            Preset::Protocol => "protocol",
            Preset::Sample => "sample",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Preset::Protocol => "Protocol Document",
            Preset::Sample => "Sample Document",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.docx", self.name())
    }
}

/// Where preset assets live: a local directory or a base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Dir(PathBuf),
    Remote(Url),
}

impl AssetSource {
    /// Interpret the configured location; http(s) values are base URLs
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let with_slash = if location.ends_with('/') {
                location.to_string()
            } else {
                format!("{}/", location)
            };
            if let Ok(url) = Url::parse(&with_slash) {
                return AssetSource::Remote(url);
            }
            log::warn!("Invalid assets URL '{}', treating it as a path", location);
        }
        AssetSource::Dir(PathBuf::from(location))
    }
}
