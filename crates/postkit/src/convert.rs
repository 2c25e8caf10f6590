//! Plain text to Markdown conversion
//!
//! A line-by-line transducer: each input line is classified and rendered to
//! exactly one output fragment. The only state carried between lines is
//! whether a fenced code block is open and the indent of the last list item.

use crate::classify::{classify_line, LineCategory};
use crate::config::{Config, DEFAULT_PROGRESS_UPDATE_FREQUENCY};
use std::borrow::Cow;

/// Opens a fenced code block
pub const FENCE_OPEN: &str = "```\n";

/// Closes a fenced code block and separates it from what follows
pub const FENCE_CLOSE: &str = "```\n\n";

/// Fence emitted when a document ends inside a code block
const FENCE_EOF: &str = "```\n";

/// Converts plain-text documents to Markdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownConverter {
    progress_update_frequency: usize,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_UPDATE_FREQUENCY)
    }
}

/// Per-document conversion state
#[derive(Debug, Default)]
struct ConversionState {
    inside_code_block: bool,
    current_indent_level: usize,
    output: String,
}

impl ConversionState {
    fn close_code_block(&mut self) {
        if self.inside_code_block {
            self.output.push_str(FENCE_CLOSE);
            self.inside_code_block = false;
        }
    }

    fn push_line(&mut self, line: &str, category: LineCategory) {
        match category {
            LineCategory::Blank => self.output.push('\n'),
            LineCategory::CodeLine => {
                if !self.inside_code_block {
                    self.output.push_str(FENCE_OPEN);
                    self.inside_code_block = true;
                }
                self.output.push_str(line.trim());
                self.output.push('\n');
            }
            LineCategory::ExistingMarkdown => {
                self.close_code_block();
                self.output.push_str(line);
                self.output.push('\n');
            }
            LineCategory::Bullet { indent } => {
                self.close_code_block();
                self.current_indent_level = indent / 2;
                self.output
                    .push_str(&render_list_item(line, self.current_indent_level, false));
            }
            LineCategory::NumberedItem { indent } => {
                self.close_code_block();
                self.current_indent_level = indent / 2;
                self.output
                    .push_str(&render_list_item(line, self.current_indent_level, true));
            }
            LineCategory::Prose => {
                self.close_code_block();
                self.output.push_str(line.trim());
                self.output.push_str("\n\n");
            }
        }
    }

    fn finish(mut self) -> String {
        if self.inside_code_block {
            self.output.push_str(FENCE_EOF);
        }
        self.output
    }
}

impl MarkdownConverter {
    /// Create a converter reporting progress every `progress_update_frequency` lines
    ///
    /// A frequency of zero is treated as one.
    pub fn new(progress_update_frequency: usize) -> Self {
        Self {
            progress_update_frequency: progress_update_frequency.max(1),
        }
    }

    /// Create a converter from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.progress_update_frequency)
    }

    /// Line interval between progress callbacks
    pub fn progress_update_frequency(&self) -> usize {
        self.progress_update_frequency
    }

    /// Convert a document, reporting progress as `(lines_done, total_lines)`
    ///
    /// The callback fires after each line whose zero-based index is a
    /// multiple of the progress frequency. A code block still open at the
    /// end of the document is closed.
    pub fn convert<F>(&self, text: &str, mut on_progress: F) -> String
    where
        F: FnMut(usize, usize),
    {
        let normalized = normalize_line_breaks(text);
        let lines: Vec<&str> = normalized.lines().collect();
        let total_lines = lines.len();
        let mut state = ConversionState {
            output: String::with_capacity(text.len() + text.len() / 4),
            ..Default::default()
        };

        for (idx, line) in lines.iter().enumerate() {
            state.push_line(line, classify_line(line));

            if idx % self.progress_update_frequency == 0 {
                on_progress(idx + 1, total_lines);
            }
        }

        state.finish()
    }
}

/// Treat a lone `\r` as a line break, as old Mac files use it
fn normalize_line_breaks(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Convert a document with default settings and no progress reporting
pub fn text_to_markdown(text: &str) -> String {
    MarkdownConverter::default().convert(text, |_, _| {})
}

/// Render a list item nested `indent_level` levels deep
///
/// Numbered items keep their own numbering; bullets are normalized to `- `.
pub fn render_list_item(line: &str, indent_level: usize, numbered: bool) -> String {
    let indent = "  ".repeat(indent_level);
    let trimmed = line.trim();
    if numbered {
        format!("{indent}{trimmed}\n")
    } else {
        let mut chars = trimmed.chars();
        chars.next();
        format!("{indent}- {}\n", chars.as_str().trim_start())
    }
}
