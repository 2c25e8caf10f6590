//! PostKit - post-processing for scraped web content
//!
//! This crate turns plain-text documents into Markdown and runs that
//! conversion over whole directories, reporting what succeeded and what
//! failed.
//!
//! ## Conversion
//!
//! [`MarkdownConverter`] walks a document line by line. Each line is
//! classified by [`classify_line`]; lines that already look like Markdown are
//! kept verbatim, shell-prompt lines are grouped into fenced code blocks, and
//! everything else becomes a paragraph.
//!
//! ## Batches
//!
//! [`BatchProcessor`] scans a directory for eligible files, converts them on
//! a bounded worker pool and writes a [`ConversionReport`] next to the
//! output.
//!
//! ```no_run
//! use postkit::{BatchProcessor, Config};
//!
//! # async fn run() -> Result<(), postkit::ConvertError> {
//! let processor = BatchProcessor::new(Config::default());
//! let outcome = processor.convert_directory("data/output", "data/markdown").await?;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! ## HTML helpers
//!
//! [`clean_html`] and [`extract_internal_links`] work on pages that were
//! already fetched; no network access happens in this crate.

pub mod batch;
pub mod classify;
mod config;
pub mod convert;
mod error;
pub mod html;
mod report;
mod types;
pub mod urls;

pub use batch::{output_path, BatchProcessor, ProgressCallback};
pub use classify::{classify_line, is_existing_markdown, LineCategory};
pub use config::{
    Config, ReportFormat, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_WORKERS,
    DEFAULT_PROGRESS_UPDATE_FREQUENCY,
};
pub use convert::{text_to_markdown, MarkdownConverter};
pub use error::{ConfigError, ConvertError, LinkError};
pub use html::{clean_html, contains_javascript_wall, extract_internal_links};
pub use report::{ConversionReport, ConversionReporter, REPORT_FILE_STEM};
pub use types::{BatchOutcome, BatchProgress, FileOutcome, FileTask};
pub use urls::{
    links_file_name, page_file_path, page_file_stem, page_folder_name, parse_url_list,
    read_url_list, save_links, save_page_text,
};
