use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::FieldNames;
use crate::data::filter::FilterLimits;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "PAINEL_CONFIG";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PAINEL_DATA_DIR";
/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "painel.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Everything the dashboard needs to know that is not in the spreadsheet.
///
/// Every field has a default, so a partial JSON file only overrides what it
/// mentions:
///
/// ```json
/// { "data_dir": "/srv/painel", "fields": { "category": "Portfolio" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory scanned for the source spreadsheet.
    pub data_dir: PathBuf,
    /// Extensions accepted as source files, without the dot.
    pub extensions: Vec<String>,
    /// Designated column names.
    pub fields: FieldNames,
    /// Categorical columns with fewer / more distinct values get no filter.
    pub min_filter_values: usize,
    pub max_filter_values: usize,
    /// Histogram bins for negative and non-negative returns.
    pub negative_bins: usize,
    pub non_negative_bins: usize,
    /// Seconds between rescans of the data directory.
    pub rescan_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let limits = FilterLimits::default();
        Self {
            data_dir: PathBuf::from("."),
            extensions: ["xlsx", "xlsm", "xls", "ods", "csv", "parquet"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            fields: FieldNames::default(),
            min_filter_values: limits.min_distinct,
            max_filter_values: limits.max_distinct,
            negative_bins: 20,
            non_negative_bins: 30,
            rescan_secs: 1,
        }
    }
}

impl DashboardConfig {
    /// Resolve the configuration from the environment.
    ///
    /// `PAINEL_CONFIG` names a JSON file (an error if it cannot be read);
    /// otherwise `painel.json` is used when present, else the defaults.
    /// `PAINEL_DATA_DIR` overrides `data_dir` in every case.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        log::info!("data directory: {}", config.data_dir.display());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn filter_limits(&self) -> FilterLimits {
        FilterLimits {
            min_distinct: self.min_filter_values,
            max_distinct: self.max_filter_values,
        }
    }
}
