//! PostKit CLI - Command-line interface for text-to-Markdown post-processing

use clap::{Parser, Subcommand, ValueEnum};
use postkit::{
    clean_html, contains_javascript_wall, extract_internal_links, page_file_path,
    read_url_list, save_links, save_page_text, BatchOutcome, BatchProcessor, Config,
    MarkdownConverter, ReportFormat,
};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Report format override
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportArg {
    Markdown,
    Html,
}

impl From<ReportArg> for ReportFormat {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Markdown => ReportFormat::Markdown,
            ReportArg::Html => ReportFormat::Html,
        }
    }
}

/// PostKit - convert scraped text to Markdown
#[derive(Parser, Debug)]
#[command(name = "postkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file (PROGRESS_UPDATE_FREQUENCY, MAX_FILE_SIZE, ...)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert every supported file in a directory and write a report
    Convert {
        /// Directory of text files (scanned recursively)
        input_dir: PathBuf,

        /// Directory for Markdown files and the report
        output_dir: PathBuf,

        /// Worker pool width
        #[arg(long, short)]
        workers: Option<usize>,

        /// Report format
        #[arg(long)]
        report_format: Option<ReportArg>,

        /// Output format
        #[arg(long, short, default_value = "text")]
        output: OutputFormat,
    },
    /// Convert one text file (or stdin) to Markdown on stdout
    Markdown {
        /// Text file to convert; reads stdin when omitted
        file: Option<PathBuf>,
    },
    /// Print the readable main text of a saved HTML page
    Clean {
        /// HTML file
        file: PathBuf,

        /// URL the page was fetched from
        #[arg(long)]
        url: Option<String>,

        /// Also save the text to <DIR>/<host>/<page>.txt
        #[arg(long, requires = "url")]
        save: Option<PathBuf>,
    },
    /// Print the internal links of a saved HTML page
    Links {
        /// HTML file
        file: PathBuf,

        /// URL the page was fetched from
        #[arg(long)]
        url: String,

        /// Also save the links to <DIR>/<host>_links.txt
        #[arg(long)]
        save: Option<PathBuf>,

        /// Output format
        #[arg(long, short, default_value = "text")]
        output: OutputFormat,
    },
    /// Check a URL list and show where each page's text would be saved
    Urls {
        /// File with one URL per line
        file: PathBuf,

        /// Root of the scraped text tree
        #[arg(long, default_value = "data/output")]
        root: PathBuf,

        /// Output format
        #[arg(long, short, default_value = "text")]
        output: OutputFormat,
    },
    /// Print the JSON schema of the config file
    ConfigSchema,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Convert {
            input_dir,
            output_dir,
            workers,
            report_format,
            output,
        } => {
            let config = apply_overrides(config, workers, report_format);
            run_convert(config, &input_dir, &output_dir, output).await;
        }
        Commands::Markdown { file } => run_markdown(&config, file.as_deref()),
        Commands::Clean { file, url, save } => run_clean(&file, url.as_deref(), save.as_deref()),
        Commands::Links {
            file,
            url,
            save,
            output,
        } => run_links(&file, &url, save.as_deref(), output),
        Commands::Urls { file, root, output } => run_urls(&file, &root, output),
        Commands::ConfigSchema => {
            let json = serde_json::to_string_pretty(&Config::json_schema())
                .unwrap_or_else(|e| fail(format!("Error serializing schema: {}", e)));
            writeln_safe(&json);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Load the config file if one was given, falling back to defaults
fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => Config::load_or_default(path),
        None => Config::default(),
    }
}

fn apply_overrides(
    mut config: Config,
    workers: Option<usize>,
    report_format: Option<ReportArg>,
) -> Config {
    if let Some(workers) = workers {
        config.max_workers = workers;
    }
    if let Some(format) = report_format {
        config.report_format = format.into();
    }
    config
}

async fn run_convert(config: Config, input_dir: &Path, output_dir: &Path, output: OutputFormat) {
    if let Err(e) = config.validate() {
        fail(e);
    }

    let processor = BatchProcessor::new(config);
    match processor.convert_directory(input_dir, output_dir).await {
        Ok(outcome) => match output {
            OutputFormat::Text => writeln_safe(&format_outcome(&outcome)),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&outcome)
                    .unwrap_or_else(|e| fail(format!("Error serializing outcome: {}", e)));
                writeln_safe(&json);
            }
        },
        Err(e) => fail(e),
    }
}

/// Status message followed by counts when files were converted
fn format_outcome(outcome: &BatchOutcome) -> String {
    match outcome {
        BatchOutcome::NoSupportedFiles => outcome.message(),
        BatchOutcome::Completed {
            total,
            succeeded,
            failed,
            ..
        } => format!(
            "{}\n{} files: {} converted, {} failed",
            outcome.message(),
            total,
            succeeded,
            failed
        ),
    }
}

fn run_markdown(config: &Config, file: Option<&Path>) {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path.display(), e))),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .unwrap_or_else(|e| fail(format!("Failed to read stdin: {}", e)));
            buf
        }
    };

    let markdown = MarkdownConverter::from_config(config).convert(&text, |_, _| {});
    write_safe(&markdown);
}

fn run_clean(file: &Path, page_url: Option<&str>, save: Option<&Path>) {
    let html = std::fs::read_to_string(file)
        .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", file.display(), e)));
    let text = clean_html(&html);
    if contains_javascript_wall(&text) {
        warn!(file = %file.display(), "Page requires JavaScript; content is a placeholder");
    }

    if let (Some(root), Some(page_url)) = (save, page_url) {
        let page = Url::parse(page_url).unwrap_or_else(|e| fail(e));
        save_page_text(root, &page, &text)
            .unwrap_or_else(|e| fail(format!("Failed to save text: {}", e)));
    }
    writeln_safe(&text);
}

/// One entry of a checked URL list
#[derive(Debug, Serialize)]
struct UrlEntry {
    url: String,
    path: PathBuf,
}

fn run_urls(file: &Path, root: &Path, output: OutputFormat) {
    let urls = read_url_list(file)
        .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", file.display(), e)));
    let entries: Vec<UrlEntry> = urls
        .iter()
        .map(|url| UrlEntry {
            url: url.to_string(),
            path: page_file_path(root, url),
        })
        .collect();

    match output {
        OutputFormat::Text => writeln_safe(&format_urls(&entries)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&entries)
                .unwrap_or_else(|e| fail(format!("Error serializing URLs: {}", e)));
            writeln_safe(&json);
        }
    }
}

fn format_urls(entries: &[UrlEntry]) -> String {
    if entries.is_empty() {
        return "No valid URLs found.".to_string();
    }
    entries
        .iter()
        .map(|e| format!("{} -> {}", e.url, e.path.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Links extracted from one page
#[derive(Debug, Serialize)]
struct LinksOutput {
    url: String,
    count: usize,
    links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_to: Option<PathBuf>,
}

fn run_links(file: &Path, page_url: &str, save: Option<&Path>, output: OutputFormat) {
    let html = std::fs::read_to_string(file)
        .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", file.display(), e)));
    let links = extract_internal_links(&html, page_url).unwrap_or_else(|e| fail(e));

    let saved_to = match save {
        Some(dir) if !links.is_empty() => {
            let page = Url::parse(page_url).unwrap_or_else(|e| fail(e));
            let path = save_links(dir, &page, &links)
                .unwrap_or_else(|e| fail(format!("Failed to save links: {}", e)));
            Some(path)
        }
        _ => None,
    };

    let result = LinksOutput {
        url: page_url.to_string(),
        count: links.len(),
        links: links.iter().map(|l| l.to_string()).collect(),
        saved_to,
    };

    match output {
        OutputFormat::Text => writeln_safe(&format_links(&result)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .unwrap_or_else(|e| fail(format!("Error serializing links: {}", e)));
            writeln_safe(&json);
        }
    }
}

fn format_links(result: &LinksOutput) -> String {
    if result.links.is_empty() {
        return "No internal links found.".to_string();
    }
    let mut output = result.links.join("\n");
    if let Some(ref path) = result.saved_to {
        output.push_str(&format!(
            "\n\nSaved {} internal links to {}",
            result.count,
            path.display()
        ));
    }
    output
}

/// Print an error and exit with status 1
fn fail(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

/// Write a line to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    write_safe(&format!("{}\n", s));
}

/// Write to stdout, exit silently on broken pipe
fn write_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = handle.write_all(s.as_bytes()).and_then(|_| handle.flush()) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
