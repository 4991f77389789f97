//! CLI output formatting for builds and cleans.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Cleaned 12 entries (kept 3)
//! Posts: 2
//! Rendered
//! 001 about/index.md → about/index.html
//! 002 index.html
//! Copied
//! 001 css/site.css
//! Failed
//! 001 broken.html
//!     Error: failed to render content: ...
//!
//! Built 2 pages, 1 copied, 1 failed
//! ```
//!
//! ## Clean
//!
//! ```text
//! Removed 12 entries, kept 3
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::clean::CleanReport;
use crate::generate::BuildReport;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// A rendered file line. The arrow only appears when the output path differs.
fn rendered_line(index: usize, source: &Path, output: &Path) -> String {
    if source == output {
        format!("{} {}", format_index(index), display(source))
    } else {
        format!(
            "{} {} \u{2192} {}",
            format_index(index),
            display(source),
            display(output)
        )
    }
}

/// Format build output: clean summary, rendered/copied/failed sections, totals.
///
/// Empty sections are omitted.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    if report.clean.removed > 0 || report.clean.kept > 0 {
        lines.push(format!(
            "Cleaned {} (kept {})",
            plural(report.clean.removed, "entry", "entries"),
            report.clean.kept
        ));
    }
    if report.posts > 0 {
        lines.push(format!("Posts: {}", report.posts));
    }

    if !report.rendered.is_empty() {
        lines.push("Rendered".to_string());
        for (i, (source, output)) in report.rendered.iter().enumerate() {
            lines.push(rendered_line(i + 1, source, output));
        }
    }

    if !report.copied.is_empty() {
        lines.push("Copied".to_string());
        for (i, path) in report.copied.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), display(path)));
        }
    }

    if !report.failed.is_empty() {
        lines.push("Failed".to_string());
        for (i, failed) in report.failed.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), display(&failed.relative)));
            lines.push(format!("    Error: {}", failed.error));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Built {}, {} copied, {} failed",
        plural(report.rendered.len(), "page", "pages"),
        report.copied.len(),
        report.failed.len()
    ));

    lines
}

/// Print build output to stdout.
pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

pub fn format_clean_report(report: &CleanReport) -> Vec<String> {
    vec![format!(
        "Removed {}, kept {}",
        plural(report.removed, "entry", "entries"),
        report.kept
    )]
}

/// Print clean output to stdout.
pub fn print_clean_report(report: &CleanReport) {
    for line in format_clean_report(report) {
        println!("{}", line);
    }
}
