//! Directory batch conversion
//!
//! [`BatchProcessor::convert_directory`] scans a directory tree for eligible
//! files, converts each one on a bounded pool of blocking workers, and writes
//! a report once every worker has finished.
//!
//! Workers never share mutable state. Their outcomes are drained by a single
//! consumer loop that feeds the [`ConversionReporter`], so each file is
//! recorded exactly once whatever order the workers finish in.

use crate::config::Config;
use crate::convert::MarkdownConverter;
use crate::error::ConvertError;
use crate::report::{ConversionReport, ConversionReporter};
use crate::types::{BatchOutcome, BatchProgress, FileOutcome, FileTask};
use futures::stream::{self, StreamExt};
use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Observer for per-line progress; called from worker threads
pub type ProgressCallback = Arc<dyn Fn(BatchProgress) + Send + Sync>;

/// Converts every eligible file in a directory tree
#[derive(Clone)]
pub struct BatchProcessor {
    config: Config,
    converter: MarkdownConverter,
    on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("config", &self.config)
            .field("converter", &self.converter)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl BatchProcessor {
    /// Create a processor for the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            converter: MarkdownConverter::from_config(&config),
            config,
            on_progress: None,
        }
    }

    /// Observe conversion progress
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(BatchProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert all eligible files under `input_dir` into `output_dir`
    ///
    /// Fails only for directory-level problems: a missing input directory,
    /// an output directory that cannot be created, an unreadable tree, or a
    /// report that cannot be written. Per-file problems are recorded in the
    /// report and never stop the batch.
    pub async fn convert_directory(
        &self,
        input_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<BatchOutcome, ConvertError> {
        let input_dir = input_dir.as_ref().to_path_buf();
        let output_dir = output_dir.as_ref().to_path_buf();

        let scanner = self.clone();
        let (scan_input, scan_output) = (input_dir.clone(), output_dir.clone());
        let files = run_blocking(move || {
            if !scan_input.is_dir() {
                return Err(ConvertError::InvalidInput(scan_input));
            }
            std::fs::create_dir_all(&scan_output)?;
            scanner.collect_files(&scan_input)
        })
        .await?;

        if files.is_empty() {
            info!(input = %input_dir.display(), "No supported files found");
            return Ok(BatchOutcome::NoSupportedFiles);
        }

        let total_files = files.len();
        info!(
            input = %input_dir.display(),
            output = %output_dir.display(),
            files = total_files,
            workers = self.config.max_workers,
            "Starting batch conversion"
        );

        let reporter = ConversionReporter::new();
        let worker = FileWorker {
            output_dir: output_dir.clone(),
            max_file_size: self.config.max_file_size,
            converter: self.converter,
            on_progress: self.on_progress.clone(),
        };

        let tasks = files
            .into_iter()
            .enumerate()
            .map(|(index, path)| FileTask::new(path, index, total_files));

        let mut outcomes = stream::iter(tasks)
            .map(|task| {
                let worker = worker.clone();
                async move {
                    let path = task.path.clone();
                    match tokio::task::spawn_blocking(move || worker.run(&task)).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            let err = ConvertError::Conversion(e.to_string());
                            error!(file = %path.display(), error = %err, "Worker failed");
                            FileOutcome::failure(path, err.to_string())
                        }
                    }
                }
            })
            .buffer_unordered(self.config.max_workers.max(1));

        while let Some(outcome) = outcomes.next().await {
            reporter.record(outcome);
        }

        let report = reporter.finish();
        let format = self.config.report_format;
        let report_path = output_dir.join(ConversionReport::file_name(format));
        let rendered = report.render(format);
        let target = report_path.clone();
        run_blocking(move || std::fs::write(&target, rendered).map_err(ConvertError::from))
            .await?;

        info!(
            report = %report_path.display(),
            total = report.total(),
            succeeded = report.successes.len(),
            failed = report.failures.len(),
            "Batch conversion finished"
        );

        Ok(BatchOutcome::Completed {
            report_path,
            total: report.total(),
            succeeded: report.successes.len(),
            failed: report.failures.len(),
        })
    }

    /// Eligible files under `input_dir`, recursively, sorted by path
    ///
    /// Only a failure to read `input_dir` itself is an error. Subdirectories
    /// that cannot be read are logged and skipped.
    pub fn collect_files(&self, input_dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
        let mut files = Vec::new();
        let mut pending = Vec::new();
        self.scan_dir(input_dir, &mut files, &mut pending)?;

        while let Some(dir) = pending.pop() {
            if let Err(e) = self.scan_dir(&dir, &mut files, &mut pending) {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
            }
        }

        files.sort();
        for (kept, shadowed) in output_collisions(&files) {
            warn!(
                file = %shadowed.display(),
                other = %kept.display(),
                "Files share an output name; only one Markdown file will remain"
            );
        }
        Ok(files)
    }

    fn scan_dir(
        &self,
        dir: &Path,
        files: &mut Vec<PathBuf>,
        pending: &mut Vec<PathBuf>,
    ) -> io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                pending.push(path);
            } else if path.is_file() && self.config.accepts(&path) {
                files.push(path);
            }
        }
        Ok(())
    }
}

/// Run filesystem work off the async runtime threads
async fn run_blocking<T, F>(work: F) -> Result<T, ConvertError>
where
    F: FnOnce() -> Result<T, ConvertError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ConvertError::Conversion(e.to_string()))?
}

/// Pairs of files that map to the same output file, `(first, later)`
fn output_collisions(files: &[PathBuf]) -> Vec<(&Path, &Path)> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    let mut collisions = Vec::new();
    for file in files {
        match seen.entry(output_path(Path::new(""), file)) {
            Entry::Occupied(first) => collisions.push((*first.get(), file.as_path())),
            Entry::Vacant(slot) => {
                slot.insert(file);
            }
        }
    }
    collisions
}

/// Everything a worker needs, owned so it can move onto a blocking thread
#[derive(Clone)]
struct FileWorker {
    output_dir: PathBuf,
    max_file_size: u64,
    converter: MarkdownConverter,
    on_progress: Option<ProgressCallback>,
}

impl FileWorker {
    fn run(&self, task: &FileTask) -> FileOutcome {
        match self.convert_file(task) {
            Ok(output) => {
                info!(
                    file = %task.path.display(),
                    output = %output.display(),
                    "Markdown file created"
                );
                FileOutcome::success(&task.path)
            }
            Err(e @ ConvertError::FileTooLarge { .. }) => {
                warn!(file = %task.path.display(), "Skipping file: {}", e);
                FileOutcome::failure(&task.path, e.to_string())
            }
            Err(e) => {
                error!(file = %task.path.display(), error = %e, "Error processing file");
                FileOutcome::failure(&task.path, e.to_string())
            }
        }
    }

    fn convert_file(&self, task: &FileTask) -> Result<PathBuf, ConvertError> {
        let size = std::fs::metadata(&task.path)?.len();
        if size > self.max_file_size {
            return Err(ConvertError::FileTooLarge {
                limit: self.max_file_size,
            });
        }

        debug!(file = %task.path.display(), "Processing file");
        let text = std::fs::read_to_string(&task.path)?;

        let markdown = self.converter.convert(&text, |line, total_lines| {
            let progress = task.progress(line, total_lines);
            debug!(
                file = %progress.file_name(),
                line,
                total_lines,
                fraction = progress.fraction(),
                "Progress"
            );
            if let Some(callback) = &self.on_progress {
                callback(progress);
            }
        });

        let output = output_path(&self.output_dir, &task.path);
        std::fs::write(&output, markdown)?;
        Ok(output)
    }
}

/// Output location for an input file: its base name with a `.md` extension
pub fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let name = input.file_name().map(Path::new).unwrap_or(input);
    output_dir.join(name.with_extension("md"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_output_path() {
        let out = Path::new("/out");
        assert_eq!(
            output_path(out, Path::new("/in/deep/notes.txt")),
            PathBuf::from("/out/notes.md")
        );
        assert_eq!(
            output_path(out, Path::new("a.b.txt")),
            PathBuf::from("/out/a.b.md")
        );
    }

    #[test]
    fn test_collect_files_recursive_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::create_dir_all(dir.path().join("folder.txt")).unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("skip.md"), "x").unwrap();
        fs::write(dir.path().join("sub/deeper/c.txt"), "c").unwrap();

        let files = BatchProcessor::default()
            .collect_files(dir.path())
            .unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("a.txt"),
                dir.path().join("b.txt"),
                dir.path().join("sub/deeper/c.txt"),
            ]
        );
    }

    #[test]
    fn test_output_collisions() {
        let files = vec![
            PathBuf::from("in/a/notes.txt"),
            PathBuf::from("in/b/notes.txt"),
            PathBuf::from("in/b/other.txt"),
        ];
        assert_eq!(
            output_collisions(&files),
            vec![(Path::new("in/a/notes.txt"), Path::new("in/b/notes.txt"))]
        );
        assert!(output_collisions(&files[1..]).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_files_skips_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), "x").unwrap();
        fs::write(dir.path().join("good.txt"), "ok").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let files = BatchProcessor::default().collect_files(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(files.unwrap(), vec![dir.path().join("good.txt")]);
    }

    #[test]
    fn test_collect_files_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = BatchProcessor::default().collect_files(&dir.path().join("gone"));
        assert!(matches!(result, Err(ConvertError::ReadWrite(_))));
    }

    #[test]
    fn test_worker_records_size_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("big.txt");
        fs::write(&input, "0123456789").unwrap();

        let worker = FileWorker {
            output_dir: dir.path().to_path_buf(),
            max_file_size: 5,
            converter: MarkdownConverter::default(),
            on_progress: None,
        };
        let outcome = worker.run(&FileTask::new(&input, 0, 1));
        assert_eq!(outcome.error.as_deref(), Some("File too large (>5 bytes)"));
        assert!(!dir.path().join("big.md").exists());
    }

    #[test]
    fn test_worker_reports_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("binary.txt");
        fs::write(&input, [0xffu8, 0xfe, 0x00]).unwrap();

        let worker = FileWorker {
            output_dir: dir.path().to_path_buf(),
            max_file_size: 1024,
            converter: MarkdownConverter::default(),
            on_progress: None,
        };
        let outcome = worker.run(&FileTask::new(&input, 0, 1));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_debug_hides_callback() {
        let processor = BatchProcessor::default().with_progress(|_| {});
        let debug = format!("{processor:?}");
        assert!(debug.contains("on_progress: true"));
    }
}
