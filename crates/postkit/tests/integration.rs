//! Integration tests for batch conversion

use postkit::{BatchOutcome, BatchProcessor, Config, ConvertError, ReportFormat};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write_file(root: &TempDir, relative: &str, content: impl AsRef<[u8]>) {
    let path = root.path().join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_convert_directory() {
    init_tracing();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_file(&input, "intro.txt", "Hello world\n");
    write_file(&input, "nested/list.txt", "- item one\n- item two\n");
    write_file(&input, "nested/ignored.md", "# not picked up\n");

    let out_dir = output.path().join("markdown/out");
    let outcome = BatchProcessor::default()
        .convert_directory(input.path(), &out_dir)
        .await
        .unwrap();

    let report_path = out_dir.join("conversion_report.md");
    assert_eq!(
        outcome,
        BatchOutcome::Completed {
            report_path: report_path.clone(),
            total: 2,
            succeeded: 2,
            failed: 0,
        }
    );
    assert_eq!(
        outcome.message(),
        format!("Conversion completed. Report saved to {}", report_path.display())
    );

    assert_eq!(read(out_dir.join("intro.md")), "Hello world\n\n");
    assert_eq!(read(out_dir.join("list.md")), "- item one\n- item two\n");
    assert!(!out_dir.join("ignored.md").exists());

    let report = read(&report_path);
    assert!(report.starts_with("# Conversion Report\n"));
    assert!(report.contains("**Total Files Processed:** 2\n"));
    assert!(report.contains("**Successful Conversions:** 2\n"));
    assert!(report.contains("**Failed Conversions:** 0\n"));
    assert!(report.contains("intro.txt"));
    assert!(!report.contains("## Failed Files"));
}

#[tokio::test]
async fn test_oversized_file_is_recorded_and_skipped() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_file(&input, "huge.txt", vec![b'a'; 11 * 1024 * 1024]);
    write_file(&input, "small.txt", "fine\n");

    let outcome = BatchProcessor::default()
        .convert_directory(input.path(), output.path())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        BatchOutcome::Completed {
            total: 2,
            succeeded: 1,
            failed: 1,
            ..
        }
    ));
    assert!(!output.path().join("huge.md").exists());
    assert!(output.path().join("small.md").exists());

    let report = read(output.path().join("conversion_report.md"));
    assert!(report.contains("huge.txt: File too large (>10485760 bytes)"));
}

#[tokio::test]
async fn test_no_supported_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_file(&input, "page.html", "<p>hi</p>");

    let outcome = BatchProcessor::default()
        .convert_directory(input.path(), output.path())
        .await
        .unwrap();

    assert_eq!(outcome, BatchOutcome::NoSupportedFiles);
    assert!(outcome
        .message()
        .starts_with("No supported files found"));
    assert!(!output.path().join("conversion_report.md").exists());
}

#[tokio::test]
async fn test_missing_input_directory() {
    let output = tempfile::tempdir().unwrap();
    let missing = output.path().join("does-not-exist");

    let result = BatchProcessor::default()
        .convert_directory(&missing, output.path())
        .await;

    assert!(matches!(result, Err(ConvertError::InvalidInput(path)) if path == missing));
}

#[tokio::test]
async fn test_input_file_is_not_a_directory() {
    let input = tempfile::tempdir().unwrap();
    write_file(&input, "file.txt", "x");

    let result = BatchProcessor::default()
        .convert_directory(input.path().join("file.txt"), input.path().join("out"))
        .await;

    assert!(matches!(result, Err(ConvertError::InvalidInput(_))));
    assert!(!input.path().join("out").exists());
}

#[tokio::test]
async fn test_unreadable_file_does_not_abort_batch() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_file(&input, "binary.txt", [0xffu8, 0xfe, 0xfd]);
    write_file(&input, "good.txt", "$ echo ok\n");

    let outcome = BatchProcessor::default()
        .convert_directory(input.path(), output.path())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        BatchOutcome::Completed {
            succeeded: 1,
            failed: 1,
            ..
        }
    ));
    assert_eq!(read(output.path().join("good.md")), "```\n$ echo ok\n```\n");
    let report = read(output.path().join("conversion_report.md"));
    assert!(report.contains("## Failed Files\n"));
    assert!(report.contains("binary.txt: "));
}

#[tokio::test]
async fn test_html_report_format() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_file(&input, "a.txt", "text");

    let config = Config {
        report_format: ReportFormat::Html,
        ..Default::default()
    };
    let outcome = BatchProcessor::new(config)
        .convert_directory(input.path(), output.path())
        .await
        .unwrap();

    let report_path = output.path().join("conversion_report.html");
    assert_eq!(outcome.report_path(), Some(report_path.as_path()));
    let html = read(&report_path);
    assert!(html.starts_with("<h1>Conversion Report</h1>"));
    assert!(html.contains("<p><strong>Successful Conversions:</strong> 1</p>"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_file_recorded_once() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    for i in 0..40 {
        let content = if i % 10 == 0 {
            vec![0xffu8; 4]
        } else {
            format!("Document {i}\n$ run {i}\n- point\n").into_bytes()
        };
        write_file(&input, &format!("dir{}/doc{i:02}.txt", i % 3), content);
    }

    for workers in [1, 3, 8] {
        let config = Config {
            max_workers: workers,
            ..Default::default()
        };
        let outcome = BatchProcessor::new(config)
            .convert_directory(input.path(), output.path())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            BatchOutcome::Completed {
                report_path: output.path().join("conversion_report.md"),
                total: 40,
                succeeded: 36,
                failed: 4,
            },
            "workers = {workers}"
        );
    }
}

#[tokio::test]
async fn test_rerun_produces_identical_output() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_file(
        &input,
        "guide.txt",
        "Install\n$ make\n$ make install\n\n# Usage\nRun it.\n  - nested\n",
    );

    let processor = BatchProcessor::default();
    processor
        .convert_directory(input.path(), output.path())
        .await
        .unwrap();
    let first = read(output.path().join("guide.md"));

    processor
        .convert_directory(input.path(), output.path())
        .await
        .unwrap();
    let second = read(output.path().join("guide.md"));

    assert_eq!(first, second);
    assert_eq!(
        first,
        "Install\n\n```\n$ make\n$ make install\n\n```\n\n# Usage\nRun it.\n\n  - nested\n"
    );
}

#[tokio::test]
async fn test_progress_reports_file_context() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let body: String = (0..15).map(|i| format!("line {i}\n")).collect();
    write_file(&input, "a.txt", &body);
    write_file(&input, "b.txt", &body);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let processor = BatchProcessor::default().with_progress(move |progress| {
        sink.lock().unwrap().push(progress);
    });

    processor
        .convert_directory(input.path(), output.path())
        .await
        .unwrap();

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_by(|a, b| (a.file_index, a.line).cmp(&(b.file_index, b.line)));
    let summary: Vec<(String, usize, usize, usize, usize)> = seen
        .iter()
        .map(|p| (p.file_name(), p.file_index, p.total_files, p.line, p.total_lines))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a.txt".to_string(), 0, 2, 1, 15),
            ("a.txt".to_string(), 0, 2, 11, 15),
            ("b.txt".to_string(), 1, 2, 1, 15),
            ("b.txt".to_string(), 1, 2, 11, 15),
        ]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_subdirectory_does_not_abort_batch() {
    use std::os::unix::fs::PermissionsExt;

    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_file(&input, "good.txt", "Still converted\n");
    write_file(&input, "locked/secret.txt", "unreachable\n");
    let locked = input.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not apply to root
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = BatchProcessor::default()
        .convert_directory(input.path(), output.path())
        .await;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(
        result.unwrap(),
        BatchOutcome::Completed {
            total: 1,
            succeeded: 1,
            failed: 0,
            ..
        }
    ));
    assert_eq!(read(output.path().join("good.md")), "Still converted\n\n");
    assert!(output.path().join("conversion_report.md").exists());
}

#[tokio::test]
async fn test_carriage_return_file() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_file(&input, "mac.txt", "Title line\r$ ls\rafter");

    BatchProcessor::default()
        .convert_directory(input.path(), output.path())
        .await
        .unwrap();

    assert_eq!(
        read(output.path().join("mac.md")),
        "Title line\n\n```\n$ ls\n```\n\nafter\n\n"
    );
}
