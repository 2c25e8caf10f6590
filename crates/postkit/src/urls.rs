//! URL list files and scraped-page file layout
//!
//! URL lists hold one URL per line. They feed the scraper and are written by
//! link extraction. Scraped page text lands under
//! `<root>/<host>/<page stem>.txt`, which is the tree the batch processor
//! converts.

use md5::{Digest, Md5};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").unwrap());

/// Parse a URL list, skipping blank lines and lines that are not absolute URLs
pub fn parse_url_list(text: &str) -> Vec<Url> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| Url::parse(line).ok())
        .collect()
}

/// Read and parse a URL list file
pub fn read_url_list<P: AsRef<Path>>(path: P) -> io::Result<Vec<Url>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_url_list(&text))
}

/// File name for links extracted from a page, e.g. `example.com_links.txt`
pub fn links_file_name(page_url: &Url) -> String {
    let host = page_url.host_str().unwrap_or("unknown");
    match page_url.port() {
        Some(port) => format!("{host}_{port}_links.txt"),
        None => format!("{host}_links.txt"),
    }
}

/// Write links to `<dir>/<host>_links.txt`, creating `dir` if needed
pub fn save_links(dir: &Path, page_url: &Url, links: &[Url]) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(links_file_name(page_url));
    let mut content = String::new();
    for link in links {
        content.push_str(link.as_str());
        content.push('\n');
    }
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), count = links.len(), "Saved links");
    Ok(path)
}

/// File stem for a scraped page
///
/// The path without its outer slashes, with every character outside
/// `[a-zA-Z0-9_-]` replaced by `_`; `index` for the site root. A query adds
/// `_` and the hex MD5 of the query string.
pub fn page_file_stem(url: &Url) -> String {
    let path = url.path().trim_matches('/');
    let mut stem = UNSAFE_FILE_CHARS.replace_all(path, "_").into_owned();
    if stem.is_empty() {
        stem.push_str("index");
    }
    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        stem.push('_');
        stem.push_str(&hex::encode(Md5::digest(query.as_bytes())));
    }
    stem
}

/// Folder for a scraped site: host (and port) with `www.` removed
pub fn page_folder_name(url: &Url) -> String {
    let host = url.host_str().unwrap_or("unknown");
    let netloc = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    netloc.replace("www.", "")
}

/// Where a scraped page's text is saved: `<root>/<folder>/<stem>.txt`
pub fn page_file_path(root: &Path, url: &Url) -> PathBuf {
    root.join(page_folder_name(url))
        .join(format!("{}.txt", page_file_stem(url)))
}

/// Save a page's text at its [`page_file_path`], creating folders as needed
pub fn save_page_text(root: &Path, url: &Url, text: &str) -> io::Result<PathBuf> {
    let path = page_file_path(root, url);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, text)?;
    tracing::info!(url = %url, path = %path.display(), "Saved page text");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list() {
        let text = "https://example.com/a\n\n  https://example.com/b  \nnot a url\n/relative\nftp://files.example.com/x\n";
        let urls = parse_url_list(text);
        let urls: Vec<&str> = urls.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "ftp://files.example.com/x",
            ]
        );
    }

    #[test]
    fn test_links_file_name() {
        let url = Url::parse("https://example.com/page").unwrap();
        assert_eq!(links_file_name(&url), "example.com_links.txt");

        let url = Url::parse("http://localhost:8080/").unwrap();
        assert_eq!(links_file_name(&url), "localhost_8080_links.txt");
    }

    #[test]
    fn test_save_and_read_links() {
        let dir = tempfile::tempdir().unwrap();
        let page = Url::parse("https://example.com/").unwrap();
        let links = vec![
            Url::parse("https://example.com/a").unwrap(),
            Url::parse("https://example.com/b").unwrap(),
        ];

        let path = save_links(&dir.path().join("input"), &page, &links).unwrap();
        assert!(path.ends_with("input/example.com_links.txt"));
        assert_eq!(read_url_list(&path).unwrap(), links);
    }

    #[test]
    fn test_page_file_stem() {
        let stem = |u: &str| page_file_stem(&Url::parse(u).unwrap());
        assert_eq!(stem("https://example.com/"), "index");
        assert_eq!(stem("https://example.com"), "index");
        assert_eq!(stem("https://example.com/about/"), "about");
        assert_eq!(
            stem("https://example.com/docs/getting-started/intro.html"),
            "docs_getting-started_intro_html"
        );
        assert_eq!(
            stem("https://example.com/blog?page=2"),
            "blog_46589c7afd19c01453073936936c2a84"
        );
        assert_eq!(
            stem("https://example.com/?q=rust&lang=en"),
            "index_84fa5a52460b2958a9ad009be0dfb0b7"
        );
        assert_eq!(stem("https://example.com/blog?"), "blog");
    }

    #[test]
    fn test_page_folder_name() {
        let folder = |u: &str| page_folder_name(&Url::parse(u).unwrap());
        assert_eq!(folder("https://www.example.com/a"), "example.com");
        assert_eq!(folder("https://docs.example.com/a"), "docs.example.com");
        assert_eq!(folder("http://localhost:8080/"), "localhost:8080");
    }

    #[test]
    fn test_page_file_path() {
        let url = Url::parse("https://www.example.com/team/people").unwrap();
        assert_eq!(
            page_file_path(Path::new("data/output"), &url),
            PathBuf::from("data/output/example.com/team_people.txt")
        );
    }

    #[test]
    fn test_save_page_text() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse("https://example.com/").unwrap();

        let path = save_page_text(dir.path(), &url, "Hello").unwrap();
        assert_eq!(path, dir.path().join("example.com/index.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Hello");
    }
}
