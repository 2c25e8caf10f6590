//! Error types for PostKit

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting documents
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input path is missing or not a directory
    #[error("Input directory does not exist: {}", .0.display())]
    InvalidInput(PathBuf),

    /// File exceeds the configured size ceiling
    #[error("File too large (>{limit} bytes)")]
    FileTooLarge {
        /// Configured byte ceiling
        limit: u64,
    },

    /// Reading the input or writing the output failed
    #[error("{0}")]
    ReadWrite(#[from] std::io::Error),

    /// Unexpected failure while processing lines
    #[error("Conversion failed: {0}")]
    Conversion(String),
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file at {}: {source}", config_path.display())]
    Read {
        config_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the config model
    #[error("Failed to parse config file at {}: {source}", config_path.display())]
    Parse {
        config_path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Config file extension is not supported
    #[error("Unsupported config file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A value is outside its allowed range
    #[error("Invalid config value for {key}: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}

/// Errors that can occur while extracting links
#[derive(Debug, Error)]
pub enum LinkError {
    /// Page URL could not be parsed
    #[error("Invalid page URL: {0}")]
    InvalidPageUrl(#[source] url::ParseError),

    /// Page URL has no host to compare links against
    #[error("Page URL has no host: {0}")]
    MissingHost(String),
}
