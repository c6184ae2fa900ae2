//! Error types for quarto-citation-client

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings {}: {message}", path.display())]
    SettingsParse { path: PathBuf, message: String },

    #[error("Failed to parse document snapshot {}: {message}", path.display())]
    DocumentParse { path: PathBuf, message: String },

    #[error("No settings location: set QUARTO_CITE_SETTINGS, XDG_CONFIG_HOME or HOME")]
    NoSettingsLocation,

    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error(transparent)]
    Sync(#[from] quarto_citation_sync::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
