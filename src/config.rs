use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::DataSource;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "sales_explorer.json";

/// User-tunable settings. Every field has a default, so a partial file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Dataset loaded at startup: a file path or an `http(s)://` URL.
    pub source: String,
    /// Timeout for URL sources, in seconds.
    pub fetch_timeout_secs: u64,
    /// Suggested file name in the export dialog.
    pub export_file_name: String,
    /// Rows shown by "Show Dataset Preview".
    pub preview_rows: usize,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            source: "data/Superstore.csv".to_string(),
            fetch_timeout_secs: 30,
            export_file_name: "filtered_superstore_data.csv".to_string(),
            preview_rows: 5,
            window_width: 1280.0,
            window_height: 900.0,
        }
    }
}

impl ExplorerConfig {
    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load `path` if it exists; otherwise, or when it is invalid, use defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No {} found, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("Ignoring invalid config: {e:#}");
                Self::default()
            }
        }
    }

    pub fn data_source(&self) -> DataSource {
        DataSource::parse(&self.source)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
