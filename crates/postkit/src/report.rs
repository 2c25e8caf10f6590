//! Conversion reporting
//!
//! [`ConversionReporter`] accumulates per-file outcomes from concurrent
//! workers behind a mutex. Once every worker has finished, [`finish`] stamps
//! the end time and yields a [`ConversionReport`] that renders as Markdown or
//! HTML.
//!
//! [`finish`]: ConversionReporter::finish

use crate::config::ReportFormat;
use crate::types::FileOutcome;
use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Base name of the report file written next to converted output
pub const REPORT_FILE_STEM: &str = "conversion_report";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug)]
struct ReporterState {
    start_time: DateTime<Local>,
    end_time: Option<DateTime<Local>>,
    successes: BTreeSet<PathBuf>,
    failures: BTreeMap<PathBuf, String>,
}

/// Thread-safe accumulator of conversion outcomes for one batch run
#[derive(Debug)]
pub struct ConversionReporter {
    state: Mutex<ReporterState>,
}

impl Default for ConversionReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionReporter {
    /// Start a report now
    pub fn new() -> Self {
        Self::started_at(Local::now())
    }

    /// Start a report at a given time
    pub fn started_at(start_time: DateTime<Local>) -> Self {
        Self {
            state: Mutex::new(ReporterState {
                start_time,
                end_time: None,
                successes: BTreeSet::new(),
                failures: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a converted file
    pub fn log_success(&self, path: impl Into<PathBuf>) {
        self.lock().successes.insert(path.into());
    }

    /// Record a failed file
    pub fn log_failure(&self, path: impl Into<PathBuf>, error: impl Into<String>) {
        self.lock().failures.insert(path.into(), error.into());
    }

    /// Record a worker outcome
    pub fn record(&self, outcome: FileOutcome) {
        match outcome.error {
            None => self.log_success(outcome.path),
            Some(error) => self.log_failure(outcome.path, error),
        }
    }

    /// Number of outcomes recorded so far
    pub fn recorded(&self) -> usize {
        let state = self.lock();
        state.successes.len() + state.failures.len()
    }

    /// Stamp the end time now and return the finished report
    pub fn finish(&self) -> ConversionReport {
        self.finish_at(Local::now())
    }

    /// Stamp a given end time and return the finished report
    pub fn finish_at(&self, end_time: DateTime<Local>) -> ConversionReport {
        let mut state = self.lock();
        state.end_time = Some(end_time);
        ConversionReport {
            start_time: state.start_time,
            end_time,
            successes: state.successes.iter().cloned().collect(),
            failures: state.failures.clone(),
        }
    }

    /// Finish the report and render it
    pub fn generate_report(&self, format: ReportFormat) -> String {
        self.finish().render(format)
    }
}

/// Finished report of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    /// Converted files, sorted by path
    pub successes: Vec<PathBuf>,
    /// Failed files and their errors, sorted by path
    pub failures: BTreeMap<PathBuf, String>,
}

impl ConversionReport {
    /// Files attempted
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Wall-clock time between start and end, never negative
    pub fn duration(&self) -> Duration {
        (self.end_time - self.start_time).max(Duration::zero())
    }

    /// Report file name for a format, e.g. `conversion_report.md`
    pub fn file_name(format: ReportFormat) -> String {
        format!("{}.{}", REPORT_FILE_STEM, format.extension())
    }

    /// Render in the given format
    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Markdown => self.render_markdown(),
            ReportFormat::Html => self.render_html(),
        }
    }

    fn summary_fields(&self) -> [(&'static str, String); 6] {
        [
            ("Start Time", self.start_time.format(TIMESTAMP_FORMAT).to_string()),
            ("End Time", self.end_time.format(TIMESTAMP_FORMAT).to_string()),
            ("Duration", format_duration(self.duration())),
            ("Total Files Processed", self.total().to_string()),
            ("Successful Conversions", self.successes.len().to_string()),
            ("Failed Conversions", self.failures.len().to_string()),
        ]
    }

    /// Render as structured Markdown text
    pub fn render_markdown(&self) -> String {
        let mut out = String::from("# Conversion Report\n");
        for (label, value) in self.summary_fields() {
            let _ = writeln!(out, "**{label}:** {value}");
        }

        if !self.successes.is_empty() {
            out.push_str("\n## Successfully Converted Files\n");
            for path in &self.successes {
                let _ = writeln!(out, "- {}", path.display());
            }
        }

        if !self.failures.is_empty() {
            out.push_str("\n## Failed Files\n");
            for (path, error) in &self.failures {
                let _ = writeln!(out, "- {}: {}", path.display(), error);
            }
        }

        out
    }

    /// Render as HTML
    pub fn render_html(&self) -> String {
        let mut out = String::from("<h1>Conversion Report</h1>\n");
        for (label, value) in self.summary_fields() {
            let _ = writeln!(
                out,
                "<p><strong>{label}:</strong> {}</p>",
                html_escape::encode_text(&value)
            );
        }

        if !self.successes.is_empty() {
            out.push_str("<h2>Successfully Converted Files</h2>\n<ul>\n");
            for path in &self.successes {
                let _ = writeln!(out, "<li>{}</li>", escape_path(path));
            }
            out.push_str("</ul>\n");
        }

        if !self.failures.is_empty() {
            out.push_str("<h2>Failed Files</h2>\n<ul>\n");
            for (path, error) in &self.failures {
                let _ = writeln!(
                    out,
                    "<li>{}: {}</li>",
                    escape_path(path),
                    html_escape::encode_text(error)
                );
            }
            out.push_str("</ul>\n");
        }

        out
    }
}

fn escape_path(path: &Path) -> String {
    html_escape::encode_text(&path.display().to_string()).into_owned()
}

/// Format as `H:MM:SS[.ffffff]`
fn format_duration(duration: Duration) -> String {
    let micros = duration.num_microseconds().unwrap_or(i64::MAX).max(0);
    let secs = micros / 1_000_000;
    let frac = micros % 1_000_000;
    let base = format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60);
    if frac == 0 {
        base
    } else {
        format!("{base}.{frac:06}")
    }
}
