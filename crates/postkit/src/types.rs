//! Core types for PostKit

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Result of processing one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Input file path
    pub path: PathBuf,
    /// Error message, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    /// Successful conversion
    pub fn success(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            error: None,
        }
    }

    /// Failed conversion
    pub fn failure(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            error: Some(error.into()),
        }
    }

    /// Check if the file converted successfully
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Context handed to each worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// Input file path
    pub path: PathBuf,
    /// Zero-based position in the batch
    pub index: usize,
    /// Number of eligible files in the batch
    pub total_files: usize,
}

impl FileTask {
    /// Create a task context
    pub fn new(path: impl Into<PathBuf>, index: usize, total_files: usize) -> Self {
        Self {
            path: path.into(),
            index,
            total_files,
        }
    }

    /// Build a progress update for this file
    pub fn progress(&self, line: usize, total_lines: usize) -> BatchProgress {
        BatchProgress {
            file: self.path.clone(),
            file_index: self.index,
            total_files: self.total_files,
            line,
            total_lines,
        }
    }
}

/// Progress update emitted while a batch runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// File being converted
    pub file: PathBuf,
    /// Zero-based position of the file in the batch
    pub file_index: usize,
    /// Number of eligible files in the batch
    pub total_files: usize,
    /// Lines processed so far in this file
    pub line: usize,
    /// Lines in this file
    pub total_lines: usize,
}

impl BatchProgress {
    /// Estimated batch completion in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total_files == 0 {
            return 1.0;
        }
        let within_file = if self.total_lines == 0 {
            1.0
        } else {
            self.line as f64 / self.total_lines as f64
        };
        ((self.file_index as f64 + within_file) / self.total_files as f64).min(1.0)
    }

    /// File name for display
    pub fn file_name(&self) -> String {
        display_name(&self.file)
    }
}

/// Outcome of a directory conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// No eligible files were found; nothing was written
    NoSupportedFiles,
    /// All eligible files were attempted and a report was written
    Completed {
        /// Path of the written report
        report_path: PathBuf,
        /// Eligible files attempted
        total: usize,
        /// Files converted
        succeeded: usize,
        /// Files skipped or failed
        failed: usize,
    },
}

impl BatchOutcome {
    /// User-facing status message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Report path, when one was written
    pub fn report_path(&self) -> Option<&Path> {
        match self {
            BatchOutcome::NoSupportedFiles => None,
            BatchOutcome::Completed { report_path, .. } => Some(report_path),
        }
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::NoSupportedFiles => {
                write!(f, "No supported files found in the input directory.")
            }
            BatchOutcome::Completed { report_path, .. } => write!(
                f,
                "Conversion completed. Report saved to {}",
                report_path.display()
            ),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
