//! Line classification
//!
//! Maps a single line of text to its structural category. Patterns are
//! checked in a fixed order and the first match wins; a line that already
//! looks like Markdown is never reclassified.

use std::sync::LazyLock;

use regex::Regex;

/// Markdown constructs that are preserved verbatim: headings, bullets,
/// numbered items, blockquotes, fences, inline code, links, bold, italic.
const EXISTING_MARKDOWN: &str = concat!(
    r"^\s*(?:",
    r"#+\s",
    r"|[-*+]\s",
    r"|\d+\.\s",
    r"|>",
    r"|```",
    r"|`[^`]+`",
    r"|\[.*\]\(.*\)",
    r"|\*\*[^*]+\*\*",
    r"|\*[^*]+\*",
    r")"
);

static EXISTING_MARKDOWN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EXISTING_MARKDOWN).unwrap());
static SHELL_PROMPT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\$").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\.\s+").unwrap());

/// Structural category of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCategory {
    /// Empty or whitespace-only
    Blank,
    /// Already valid Markdown, kept as-is
    ExistingMarkdown,
    /// Shell-prompt style line (`$ ...`)
    CodeLine,
    /// Bullet list item; `indent` counts leading whitespace characters
    Bullet { indent: usize },
    /// Numbered list item; `indent` counts leading whitespace characters
    NumberedItem { indent: usize },
    /// Plain paragraph text
    Prose,
}

/// Classify a line using the full precedence order
pub fn classify_line(line: &str) -> LineCategory {
    if line.trim().is_empty() {
        return LineCategory::Blank;
    }
    if is_existing_markdown(line) {
        return LineCategory::ExistingMarkdown;
    }
    classify_structure(line)
}

/// Classify a non-blank line by its plain-text structure only
///
/// Skips the existing-Markdown check, so list markers come back as
/// [`LineCategory::Bullet`] or [`LineCategory::NumberedItem`].
pub fn classify_structure(line: &str) -> LineCategory {
    if SHELL_PROMPT_RE.is_match(line) {
        LineCategory::CodeLine
    } else if BULLET_RE.is_match(line) {
        LineCategory::Bullet {
            indent: leading_whitespace(line),
        }
    } else if NUMBERED_RE.is_match(line) {
        LineCategory::NumberedItem {
            indent: leading_whitespace(line),
        }
    } else {
        LineCategory::Prose
    }
}

/// Returns true if the line already matches a Markdown construct
pub fn is_existing_markdown(line: &str) -> bool {
    EXISTING_MARKDOWN_RE.is_match(line)
}

/// Number of leading whitespace characters
pub fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}
