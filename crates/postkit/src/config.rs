//! Configuration for conversion runs
//!
//! Keys keep the names used by existing config files, so a file written for
//! the scraping pipeline (which also carries browser settings) can be passed
//! as-is. Unknown keys are ignored and missing keys take their defaults.

use crate::error::ConfigError;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Default line interval between progress callbacks
pub const DEFAULT_PROGRESS_UPDATE_FREQUENCY: usize = 10;

/// Default byte ceiling before a file is skipped (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default worker pool width
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Rendering used for the batch report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportFormat {
    /// Structured text report
    #[default]
    Markdown,
    /// Markup report
    Html,
}

impl ReportFormat {
    /// Resolve a format name; anything other than "html" renders as Markdown
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("html") {
            ReportFormat::Html
        } else {
            ReportFormat::Markdown
        }
    }

    /// File extension of the rendered report
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Html => "html",
        }
    }
}

impl From<String> for ReportFormat {
    fn from(name: String) -> Self {
        ReportFormat::from_name(&name)
    }
}

impl From<ReportFormat> for String {
    fn from(format: ReportFormat) -> Self {
        format.to_string()
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Markdown => write!(f, "markdown"),
            ReportFormat::Html => write!(f, "html"),
        }
    }
}

/// Options consumed read-only by the converter, batch processor and reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Line interval for the progress callback
    #[serde(rename = "PROGRESS_UPDATE_FREQUENCY")]
    pub progress_update_frequency: usize,

    /// Byte ceiling before a file is skipped
    #[serde(rename = "MAX_FILE_SIZE")]
    pub max_file_size: u64,

    /// Allow-listed file extensions, including the leading dot
    #[serde(rename = "SUPPORTED_FILE_TYPES")]
    pub supported_file_types: Vec<String>,

    /// Worker pool width
    #[serde(rename = "MAX_WORKERS")]
    pub max_workers: usize,

    /// Report rendering: "markdown" or "html"
    #[schemars(with = "String")]
    pub report_format: ReportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            progress_update_frequency: DEFAULT_PROGRESS_UPDATE_FREQUENCY,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            supported_file_types: vec![".txt".to_string()],
            max_workers: DEFAULT_MAX_WORKERS,
            report_format: ReportFormat::Markdown,
        }
    }
}

impl Config {
    /// Load and validate a JSON config file
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        let is_json = config_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            return Err(ConfigError::UnsupportedFormat(config_path.to_path_buf()));
        }

        let content =
            std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults when it cannot be used
    pub fn load_or_default<P: AsRef<Path>>(config_path: P) -> Self {
        match Self::load(config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_WORKERS",
                reason: "must be at least 1",
            });
        }
        if self.progress_update_frequency == 0 {
            return Err(ConfigError::Invalid {
                key: "PROGRESS_UPDATE_FREQUENCY",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Returns true if the file's extension is allow-listed
    ///
    /// Matching is case-sensitive and compares the extension with its leading
    /// dot, so `.txt` accepts `notes.txt` but not `notes.TXT`.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let suffix = format!(".{ext}");
        self.supported_file_types.iter().any(|t| *t == suffix)
    }

    /// JSON schema of the config file
    pub fn json_schema() -> serde_json::Value {
        let schema = schema_for!(Config);
        serde_json::to_value(schema).unwrap_or_default()
    }
}
