//! HTML helpers for already-fetched pages
//!
//! Both helpers use the same forgiving tag scanner: tags are read from `<`
//! to `>`, comments are skipped, and unknown tags are ignored. There is no
//! DOM; nesting is tracked only for the elements whose content is dropped.

use crate::error::LinkError;
use std::iter::Peekable;
use std::str::Chars;
use url::Url;

/// Elements whose content never reaches the cleaned text
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "nav", "header", "footer", "aside",
];

/// Elements that break the text into separate lines
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th", "ul", "ol",
    "section", "article", "main", "blockquote", "pre", "hr", "table", "dt", "dd",
];

/// Marker text served by pages that require JavaScript to render
pub const JAVASCRIPT_WALL: &str = "Please turn JavaScript on and reload the page.";

/// A scanned tag
struct Tag {
    raw: String,
    name: String,
    is_closing: bool,
    self_closing: bool,
}

/// Read a tag body after `<`, returning `None` for comments and declarations
fn read_tag(chars: &mut Peekable<Chars<'_>>) -> Option<Tag> {
    let mut raw = String::new();
    while let Some(&next) = chars.peek() {
        if next == '>' {
            chars.next();
            break;
        }
        raw.push(next);
        chars.next();
        if raw == "!--" {
            skip_comment(chars);
            return None;
        }
    }

    if raw.starts_with('!') || raw.starts_with('?') {
        return None;
    }

    let lower = raw.to_ascii_lowercase();
    let is_closing = lower.starts_with('/');
    let body = if is_closing { &lower[1..] } else { &lower[..] };
    let name = body
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_string();
    let self_closing = raw.ends_with('/');

    Some(Tag {
        raw,
        name,
        is_closing,
        self_closing,
    })
}

fn skip_comment(chars: &mut Peekable<Chars<'_>>) {
    let mut tail = [' ', ' '];
    for c in chars.by_ref() {
        if c == '>' && tail == ['-', '-'] {
            return;
        }
        tail = [tail[1], c];
    }
}

/// Extract the readable main text of a page
///
/// Navigation, headers, footers, asides, scripts and styles are dropped.
/// The content of the first `<main>`, `<article>` or `<div class="content">`
/// is used when the page has one, checked in that order. Each output line is
/// trimmed and blank lines are removed.
pub fn clean_html(html: &str) -> String {
    let scope = element_content(html, "main")
        .or_else(|| element_content(html, "article"))
        .or_else(|| div_with_class(html, "content"))
        .unwrap_or(html);

    let mut output = String::new();
    let mut skip_stack: Vec<String> = Vec::new();
    let mut chars = scope.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let Some(tag) = read_tag(&mut chars) else {
                continue;
            };

            if SKIP_TAGS.contains(&tag.name.as_str()) {
                if tag.is_closing {
                    if let Some(pos) = skip_stack.iter().rposition(|t| *t == tag.name) {
                        skip_stack.truncate(pos);
                    }
                } else if !tag.self_closing {
                    skip_stack.push(tag.name);
                }
                continue;
            }

            if skip_stack.is_empty() && BLOCK_TAGS.contains(&tag.name.as_str()) {
                output.push('\n');
            }
        } else if skip_stack.is_empty() {
            output.push(decode_entity(c, &mut chars));
        }
    }

    output
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns true if the text is a "turn JavaScript on" placeholder
pub fn contains_javascript_wall(text: &str) -> bool {
    text.contains(JAVASCRIPT_WALL)
}

/// Content between the first `<name ...>` and its last `</name>`
fn element_content<'a>(html: &'a str, name: &str) -> Option<&'a str> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{name}");
    let close = format!("</{name}>");

    let mut search_from = 0;
    let start = loop {
        let pos = search_from + lower[search_from..].find(&open)?;
        let after = pos + open.len();
        match lower[after..].chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => break after,
            _ => search_from = after,
        }
    };
    let content_start = start + lower[start..].find('>')? + 1;
    let end = lower.rfind(&close)?;
    (end >= content_start).then(|| &html[content_start..end])
}

/// Content of the first `<div>` carrying `class` among its classes
///
/// Nested `<div>` elements are counted so the matching close tag is found.
fn div_with_class<'a>(html: &'a str, class: &str) -> Option<&'a str> {
    let lower = html.to_ascii_lowercase();

    let mut search_from = 0;
    let content_start = loop {
        let pos = search_from + lower[search_from..].find("<div")?;
        let after = pos + "<div".len();
        let tag_end = after + lower[after..].find('>')?;
        search_from = tag_end;

        let body = &html[pos + 1..tag_end];
        if !lower[after..].starts_with(|c: char| c == '>' || c.is_whitespace()) {
            continue;
        }
        let has_class = extract_attribute(body, "class")
            .is_some_and(|value| value.split_whitespace().any(|c| c == class));
        if has_class {
            break tag_end + 1;
        }
    };

    let mut depth = 1;
    let mut cursor = content_start;
    loop {
        let next_open = lower[cursor..].find("<div").map(|i| cursor + i);
        let next_close = lower[cursor..].find("</div").map(|i| cursor + i);
        match (next_open, next_close) {
            (Some(open), Some(close)) if open < close => {
                depth += 1;
                cursor = open + "<div".len();
            }
            (_, Some(close)) => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[content_start..close]);
                }
                cursor = close + "</div".len();
            }
            // Unclosed: take the rest of the document
            (_, None) => return Some(&html[content_start..]),
        }
    }
}

/// Collect links to pages on the same host as `page_url`
///
/// Every `<a href>` is resolved against the page origin, so a relative
/// `contact` on `/docs/index.html` becomes `/contact`. Links whose host and
/// port match the page are returned in document order; duplicates are kept.
pub fn extract_internal_links(html: &str, page_url: &str) -> Result<Vec<Url>, LinkError> {
    let page = Url::parse(page_url).map_err(LinkError::InvalidPageUrl)?;
    let host = page
        .host_str()
        .ok_or_else(|| LinkError::MissingHost(page_url.to_string()))?;
    let base = Url::parse(&format!("{}/", page.origin().ascii_serialization()))
        .map_err(LinkError::InvalidPageUrl)?;

    let mut links = Vec::new();
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '<' {
            continue;
        }
        let Some(tag) = read_tag(&mut chars) else {
            continue;
        };
        if tag.is_closing || tag.name != "a" {
            continue;
        }
        let Some(href) = extract_attribute(&tag.raw, "href") else {
            continue;
        };
        let href = decode_entities(href.trim());
        let Ok(link) = base.join(&href) else {
            tracing::debug!(href = %href, "Skipping unresolvable link");
            continue;
        };
        let same_origin = link.host_str() == Some(host)
            && link.port_or_known_default() == page.port_or_known_default();
        if same_origin {
            links.push(link);
        }
    }

    Ok(links)
}

/// Extract attribute value from a raw tag body
fn extract_attribute(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!("{}=", attr);
    let tag_lower = tag.to_ascii_lowercase();

    let mut search_from = 0;
    let start = loop {
        let pos = search_from + tag_lower[search_from..].find(&pattern)?;
        let preceded_by_space = tag_lower[..pos]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        if preceded_by_space {
            break pos;
        }
        search_from = pos + pattern.len();
    };

    let rest = tag[start + pattern.len()..].trim_start();
    if let Some(rest) = rest.strip_prefix('"') {
        rest.find('"').map(|end| rest[..end].to_string())
    } else if let Some(rest) = rest.strip_prefix('\'') {
        rest.find('\'').map(|end| rest[..end].to_string())
    } else {
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(rest.len());
        Some(rest[..end].to_string())
    }
}

fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(decode_entity(c, &mut chars));
    }
    out
}

/// Decode an HTML entity starting at `&`
fn decode_entity(c: char, chars: &mut Peekable<Chars<'_>>) -> char {
    if c != '&' {
        return c;
    }

    // Look ahead without consuming so a bare `&` leaves the text intact
    let mut lookahead = chars.clone();
    let mut entity = String::new();
    let mut terminated = false;
    for next in lookahead.by_ref() {
        if next == ';' {
            terminated = true;
            break;
        }
        if next.is_whitespace() || entity.len() > 10 {
            break;
        }
        entity.push(next);
    }
    if !terminated {
        return '&';
    }

    let decoded = match entity.as_str() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        _ => entity.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };

    match decoded {
        Some(ch) => {
            *chars = lookahead;
            ch
        }
        None => '&',
    }
}
