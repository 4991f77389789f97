//! Destination cleaning.
//!
//! Removes everything under `destination` except the paths listed in
//! `keep_files` (destination-relative) and whatever lives beneath them.
//! Directories that still hold kept paths survive; other directories are
//! removed once emptied. A missing destination is nothing to clean.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Files and directories deleted.
    pub removed: usize,
    /// Entries spared because they are, or live under, a kept path.
    pub kept: usize,
}

/// Delete the contents of `destination`, sparing `keep_files`.
pub fn clean(destination: &Path, keep_files: &[String]) -> Result<CleanReport, CleanError> {
    if !destination.is_dir() {
        return Ok(CleanReport::default());
    }

    let keep: Vec<PathBuf> = keep_files
        .iter()
        .map(|k| k.trim_start_matches("./").trim_end_matches('/'))
        .filter(|k| !k.is_empty())
        .map(|k| destination.join(k))
        .collect();

    let mut report = CleanReport::default();
    // contents_first: children are removed before their directory
    for entry in WalkDir::new(destination).min_depth(1).contents_first(true) {
        let entry = entry?;
        let path = entry.path();
        if keep.iter().any(|k| path.starts_with(k)) {
            report.kept += 1;
            continue;
        }
        let result = if entry.file_type().is_dir() {
            if keep.iter().any(|k| k.starts_with(path)) {
                continue;
            }
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|source| CleanError::Remove {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Removed");
        report.removed += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn keeps_listed_file_and_removes_siblings() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path();
        write(dest, "a.html");
        write(dest, "b.html");
        write(dest, "blog/post.html");

        let report = clean(dest, &["a.html".to_string()]).unwrap();
        assert!(dest.join("a.html").exists());
        assert!(!dest.join("b.html").exists());
        assert!(!dest.join("blog").exists());
        assert_eq!(report, CleanReport { removed: 3, kept: 1 });
    }

    #[test]
    fn keeps_directories_recursively() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path();
        write(dest, ".git/HEAD");
        write(dest, ".git/refs/heads/main");
        write(dest, "index.html");

        clean(dest, &[".git".to_string()]).unwrap();
        assert!(dest.join(".git/HEAD").exists());
        assert!(dest.join(".git/refs/heads/main").exists());
        assert!(!dest.join("index.html").exists());
    }

    #[test]
    fn keeps_ancestors_of_nested_keep_paths() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path();
        write(dest, "assets/keep/logo.png");
        write(dest, "assets/old.css");

        clean(dest, &["./assets/keep/".to_string()]).unwrap();
        assert!(dest.join("assets/keep/logo.png").exists());
        assert!(!dest.join("assets/old.css").exists());
    }

    #[test]
    fn missing_destination_is_noop() {
        let tmp = TempDir::new().unwrap();
        let report = clean(&tmp.path().join("_site"), &[]).unwrap();
        assert_eq!(report, CleanReport::default());
    }

    #[test]
    fn destination_itself_survives() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("_site");
        write(&dest, "x/y/z.html");
        clean(&dest, &[]).unwrap();
        assert!(dest.is_dir());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }
}
