//! Site generation.
//!
//! Drives the per-file pipeline over every enumerated source file:
//!
//! ```text
//! read ─→ front matter? ──no──→ copy bytes to destination
//!              │ yes
//!              ▼
//!         partition ─→ markdown → HTML (markdown_ext files) ─→ globals ─→ render
//!
//! then, once every file is prepared:
//!
//! output path unique? ──no──→ failed (all sources sharing it)
//!        │ yes
//!        ▼
//!      write
//! ```
//!
//! ## Ordering
//!
//! Posts are collected into the shared [`Site`] before the first file is
//! touched; after that, files are independent and are processed in parallel
//! with rayon. The [`Config`] and [`Site`] are shared read-only.
//!
//! ## Failures
//!
//! Config, scan and clean errors abort the build. Anything that goes wrong
//! with one file (bad front matter, render error, shared output path, write
//! error) is recorded
//! in [`BuildReport::failed`], nothing is written for that file, and the
//! build carries on.

use crate::clean::{self, CleanError, CleanReport};
use crate::config::Config;
use crate::front_matter::{self, FrontMatterError};
use crate::globals::{GlobalsBuilder, Site};
use crate::partition::partition;
use crate::render::{RenderError, TemplateRenderer};
use crate::scan::{self, ScanError, SourceFile};
use crate::templating::markdown_to_html;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Clean error: {0}")]
    Clean(#[from] CleanError),
    #[error("Render setup error: {0}")]
    Render(#[from] RenderError),
}

/// Why a single file was dropped from the output.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("output {} is also produced by {}", .output.display(), display_paths(.others))]
    DuplicateOutput { output: PathBuf, others: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug)]
pub struct FailedFile {
    pub relative: PathBuf,
    pub error: FileError,
}

/// What a build produced, by source-relative path.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub clean: CleanReport,
    /// `(source, output)` pairs of rendered files.
    pub rendered: Vec<(PathBuf, PathBuf)>,
    /// Files copied through unchanged.
    pub copied: Vec<PathBuf>,
    pub failed: Vec<FailedFile>,
    pub posts: usize,
}

/// One file's output, held in memory until every output path is known.
struct Prepared {
    source: PathBuf,
    output: PathBuf,
    bytes: Vec<u8>,
    rendered: bool,
}

/// Clean the destination, then generate the site into it.
pub fn build(config: &Config) -> Result<BuildReport, GenerateError> {
    let settings = config.settings();
    let cleaned = clean::clean(&config.paths().destination, &settings.keep_files)?;
    let mut report = generate(config)?;
    report.clean = cleaned;
    Ok(report)
}

/// Generate the site without cleaning first.
///
/// Files are prepared in parallel, then checked for output collisions, then
/// written. Every source that maps to a shared output path fails and none of
/// them is written.
pub fn generate(config: &Config) -> Result<BuildReport, GenerateError> {
    info!("Generating...");
    let renderer = TemplateRenderer::new(config)?;

    // Every post must be known before any page renders.
    let posts = scan::collect_posts(config)?;
    let post_count = posts.len();
    let site = Arc::new(Site::with_posts(config, posts));
    let builder = GlobalsBuilder::new(site, config);

    let files = scan::enumerate(config)?;
    let prepared: Vec<Result<Prepared, FailedFile>> = files
        .par_iter()
        .map(|file| {
            prepare_file(file, config, &builder, &renderer)
                .map_err(|error| failed(&file.relative, error))
        })
        .collect();

    let mut report = BuildReport {
        posts: post_count,
        ..BuildReport::default()
    };
    let mut ready = Vec::new();
    for result in prepared {
        match result {
            Ok(file) => ready.push(file),
            Err(failure) => report.failed.push(failure),
        }
    }

    let (ready, collisions) = split_collisions(ready);
    report.failed.extend(collisions);

    let destination = &config.paths().destination;
    let written: Vec<Result<Prepared, FailedFile>> = ready
        .into_par_iter()
        .map(|file| match write_output(&destination.join(&file.output), &file.bytes) {
            Ok(()) => Ok(file),
            Err(error) => Err(failed(&file.source, error.into())),
        })
        .collect();

    for result in written {
        match result {
            Ok(file) if file.rendered => report.rendered.push((file.source, file.output)),
            Ok(file) => report.copied.push(file.source),
            Err(failure) => report.failed.push(failure),
        }
    }
    report.failed.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(report)
}

fn failed(relative: &Path, error: FileError) -> FailedFile {
    warn!(file = %relative.display(), %error, "Dropping file");
    FailedFile {
        relative: relative.to_path_buf(),
        error,
    }
}

/// Separate files whose output path is unique from those sharing one.
fn split_collisions(files: Vec<Prepared>) -> (Vec<Prepared>, Vec<FailedFile>) {
    let mut by_output: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in &files {
        by_output
            .entry(file.output.clone())
            .or_default()
            .push(file.source.clone());
    }

    let mut unique = Vec::new();
    let mut collisions = Vec::new();
    for file in files {
        let sources = &by_output[&file.output];
        if sources.len() == 1 {
            unique.push(file);
            continue;
        }
        let others = sources
            .iter()
            .filter(|s| **s != file.source)
            .cloned()
            .collect();
        collisions.push(failed(
            &file.source,
            FileError::DuplicateOutput {
                output: file.output,
                others,
            },
        ));
    }
    (unique, collisions)
}

fn prepare_file(
    file: &SourceFile,
    config: &Config,
    builder: &GlobalsBuilder,
    renderer: &TemplateRenderer,
) -> Result<Prepared, FileError> {
    let bytes = fs::read(&file.path)?;

    let document = match std::str::from_utf8(&bytes) {
        Ok(text) => Some(front_matter::parse(text)?),
        Err(_) => None,
    };
    let Some(document) = document.filter(|d| d.has_header) else {
        return Ok(Prepared {
            source: file.relative.clone(),
            output: file.relative.clone(),
            bytes,
            rendered: false,
        });
    };
    debug!(file = %file.relative.display(), front_matter = ?document.front_matter, "Front matter found");

    let split = partition(&document.front_matter, config);
    let (body, output) = if config.is_markdown(&file.path) {
        (
            markdown_to_html(&document.body),
            file.relative.with_extension("html"),
        )
    } else {
        (document.body, file.relative.clone())
    };

    let globals = builder.build(&body, split);
    debug!(file = %file.relative.display(), page = ?globals.page, "Page variables");
    let html = renderer.render(&globals)?;

    Ok(Prepared {
        source: file.relative.clone(),
        output,
        bytes: html,
        rendered: true,
    })
}

fn write_output(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
