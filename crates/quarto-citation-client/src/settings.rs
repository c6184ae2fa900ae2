//! Client settings
//!
//! The only persisted setting that matters is the base address of the
//! citation service. Settings live in a small JSON file; the resolved value
//! is handed to [`crate::HttpTransport`] explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Service address used until the user configures another one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Request timeout used when the settings file does not give one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable naming the settings file.
pub const SETTINGS_ENV: &str = "QUARTO_CITE_SETTINGS";

const SETTINGS_DIR: &str = "quarto-cite";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientSettings {
    /// The configured address, validated and without a trailing slash.
    pub fn base_url(&self) -> Result<String> {
        normalize_server_url(&self.server_url)
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Validate a service address and strip trailing slashes.
pub fn normalize_server_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let invalid = |reason: String| Error::InvalidServerUrl {
        url: raw.to_string(),
        reason,
    };

    let parsed = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Where settings are read from and written to.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the settings file: explicit path, then `QUARTO_CITE_SETTINGS`,
    /// then `$XDG_CONFIG_HOME/quarto-cite/settings.json`, then
    /// `$HOME/.config/quarto-cite/settings.json`.
    pub fn locate(explicit: Option<PathBuf>) -> Result<Self> {
        settings_path(explicit, |key| std::env::var(key).ok())
            .map(Self::new)
            .ok_or(Error::NoSettingsLocation)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields the defaults.
    pub fn load(&self) -> Result<ClientSettings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No settings file, using defaults");
            return Ok(ClientSettings::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| Error::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| Error::SettingsParse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, settings: &ClientSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings).map_err(|e| Error::SettingsParse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(&self.path, &content)?;
        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }

    /// Validate and persist a new service address.
    pub fn set_server_url(&self, url: &str) -> Result<ClientSettings> {
        let mut settings = self.load()?;
        settings.server_url = normalize_server_url(url)?;
        self.save(&settings)?;
        Ok(settings)
    }
}

fn settings_path<F>(explicit: Option<PathBuf>, env: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());

    explicit
        .or_else(|| non_empty(SETTINGS_ENV).map(PathBuf::from))
        .or_else(|| {
            non_empty("XDG_CONFIG_HOME")
                .map(|dir| PathBuf::from(dir).join(SETTINGS_DIR).join(SETTINGS_FILE))
        })
        .or_else(|| {
            non_empty("HOME").map(|home| {
                PathBuf::from(home)
                    .join(".config")
                    .join(SETTINGS_DIR)
                    .join(SETTINGS_FILE)
            })
        })
}

/// Write to a temp file next to `path`, then rename over it.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    std::fs::write(&temp, content).map_err(write_err)?;
    std::fs::rename(&temp, path).map_err(write_err)?;
    Ok(())
}
