//! Example: Convert sample documents and display the Markdown
//!
//! Run with: cargo run -p postkit --example convert_samples
//!
//! This example walks a few typical scraped-text shapes through the converter.

use postkit::{classify_line, MarkdownConverter};

/// Sample definition
struct Sample {
    description: &'static str,
    text: &'static str,
    expect_contains: &'static str,
}

/// Define samples here
const SAMPLES: &[Sample] = &[
    Sample {
        description: "Plain paragraphs",
        text: "Welcome to the docs.\nThis page explains setup.",
        expect_contains: "Welcome to the docs.\n\nThis page explains setup.\n\n",
    },
    Sample {
        description: "Existing Markdown is preserved",
        text: "# Setup\n- install\n- configure\n> note",
        expect_contains: "# Setup\n- install\n- configure\n> note\n",
    },
    Sample {
        description: "Shell session becomes a code block",
        text: "Run:\n$ cargo build\n$ cargo test\nThen deploy.",
        expect_contains: "```\n$ cargo build\n$ cargo test\n```\n\nThen deploy.",
    },
    Sample {
        description: "Unterminated shell session is closed",
        text: "$ make install",
        expect_contains: "```\n$ make install\n```\n",
    },
];

fn main() {
    println!("PostKit Conversion Examples");
    println!("===========================\n");

    let converter = MarkdownConverter::new(1);
    let mut passed = 0;
    let mut failed = 0;

    for (i, sample) in SAMPLES.iter().enumerate() {
        println!("{}. {}", i + 1, sample.description);
        for line in sample.text.lines() {
            println!("   {:<24} {:?}", line, classify_line(line));
        }

        let markdown = converter.convert(sample.text, |done, total| {
            println!("   progress {}/{}", done, total);
        });
        println!("   Output: {:?}", markdown);

        if markdown.contains(sample.expect_contains) {
            println!("   ✓ PASS\n");
            passed += 1;
        } else {
            println!("   Expected output to contain {:?}", sample.expect_contains);
            println!("   ✗ FAIL\n");
            failed += 1;
        }
    }

    println!("===========================");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}
