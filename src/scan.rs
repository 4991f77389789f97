//! Source enumeration and post collection.
//!
//! ## Which Files Are Processed
//!
//! Everything under `source`, walked in file-name order, except:
//!
//! - the user config file and the `plugins`, `layouts`, `_includes`, `_sass`,
//!   `_posts`, `_drafts` and `destination` directories (always, recursively);
//! - paths matching an `exclude` glob (a pattern `p` also covers `p/**`);
//! - hidden entries (name starts with `.`), unless an `include` glob matches.
//!
//! Globs are relative to the root. Exclusion beats inclusion.
//!
//! ```text
//! site/
//! ├── _config.yml        # skipped (config)
//! ├── _layouts/          # skipped (layouts)
//! ├── _posts/            # skipped, but read by collect_posts
//! ├── _site/             # skipped (destination)
//! ├── .htaccess          # processed only if listed in `include`
//! ├── index.md           # processed
//! └── assets/logo.png    # processed (copied through)
//! ```
//!
//! ## Posts
//!
//! [`collect_posts`] reads `_posts/YYYY-MM-DD-slug.ext` files into plain
//! values for `site.posts`. It runs before any page renders.

use crate::config::{Config, Map};
use crate::front_matter;
use crate::naming::parse_post_name;
use crate::partition::partition;
use crate::templating::markdown_to_html;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("invalid glob pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// One file to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to `source`; also the output path under `destination`.
    pub relative: PathBuf,
}

/// Build a glob set where each pattern `p` also matches `p/**`.
fn glob_set(patterns: &[String], root: &Path) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for raw in patterns {
        let pattern = normalize_pattern(raw, root);
        if pattern.is_empty() {
            continue;
        }
        for candidate in [pattern.clone(), format!("{pattern}/**")] {
            let glob = Glob::new(&candidate).map_err(|source| ScanError::Pattern {
                pattern: raw.clone(),
                source,
            })?;
            builder.add(glob);
        }
    }
    builder.build().map_err(|source| ScanError::Pattern {
        pattern: patterns.join(", "),
        source,
    })
}

/// Make a pattern root-relative with no `./` prefix or trailing slash.
fn normalize_pattern(raw: &str, root: &Path) -> String {
    let relative = Path::new(raw)
        .strip_prefix(root)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let mut pattern = relative.replace('\\', "/");
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest.to_string();
    }
    pattern.trim_end_matches('/').to_string()
}

/// List the files to process, in walk order.
pub fn enumerate(config: &Config) -> Result<Vec<SourceFile>, ScanError> {
    let paths = config.paths();
    let settings = config.settings();
    let excluded = glob_set(&settings.exclude, &paths.root)?;
    let included = glob_set(&settings.include, &paths.root)?;
    let forced = paths.force_excluded();

    let skip = |path: &Path| {
        if forced.iter().any(|f| path.starts_with(f)) {
            return true;
        }
        let rel = path.strip_prefix(&paths.root).unwrap_or(path);
        if excluded.is_match(rel) {
            return true;
        }
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        hidden && !included.is_match(rel)
    };

    let mut files = Vec::new();
    let walker = WalkDir::new(&paths.source)
        .sort_by_file_name()
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !skip(entry.path()));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let relative = path
            .strip_prefix(&paths.source)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        files.push(SourceFile { path, relative });
    }
    debug!(count = files.len(), "Enumerated source files");
    Ok(files)
}

/// Read every post under `_posts` into a value for `site.posts`.
///
/// Each post holds its page variables plus `date`, `slug`, `url`, `id` and
/// `content`. Posts with `published: false` are skipped. Posts that are not
/// UTF-8 text or have invalid front matter are logged and skipped.
pub fn collect_posts(config: &Config) -> Result<Vec<Value>, ScanError> {
    let dir = &config.paths().posts;
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut posts = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name().min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(name) = parse_post_name(&stem) else {
            debug!(path = %path.display(), "Not a dated post, skipping");
            continue;
        };

        let bytes = fs::read(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let Ok(raw) = String::from_utf8(bytes) else {
            warn!(path = %path.display(), "Skipping post that is not UTF-8 text");
            continue;
        };
        let document = match front_matter::parse(&raw) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping post with invalid front matter");
                continue;
            }
        };

        let split = partition(&document.front_matter, config);
        if split.internals.get("published") == Some(&Value::Bool(false)) {
            debug!(path = %path.display(), "Unpublished post, skipping");
            continue;
        }

        let content = if config.is_markdown(path) {
            markdown_to_html(&document.body)
        } else {
            document.body
        };

        let mut post: Map = split.page;
        post.entry("date")
            .or_insert_with(|| Value::String(name.date.format("%Y-%m-%d").to_string()));
        post.entry("title")
            .or_insert_with(|| Value::String(name.display_title.clone()));
        let url = match split.internals.get("permalink").and_then(Value::as_str) {
            Some(permalink) if permalink.starts_with('/') => permalink.to_string(),
            _ => name.url(),
        };
        post.insert("slug".into(), Value::String(name.slug.clone()));
        post.insert("id".into(), Value::String(url.trim_end_matches(".html").to_string()));
        post.insert("url".into(), Value::String(url));
        post.insert("content".into(), Value::String(content));
        posts.push(Value::Object(post));
    }
    debug!(count = posts.len(), "Collected posts");
    Ok(posts)
}
