//! Shared test utilities for the markheim test suite.
//!
//! Two ways to get a [`Config`]:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! // No filesystem: builtin layers + a user layer, rooted at /site
//! let config = test_config("layout: default\n");
//!
//! // A real site directory in a temp dir
//! let site = SiteFixture::new("title: Blog\n");
//! site.write("_layouts/post.html", "{{ content }}");
//! site.write("index.md", "---\nlayout: post\n---\n# Hi\n");
//! let config = site.config();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{Config, ConfigResolver, merge_values, parse_layer};

/// Builtin layers plus `user_yaml`, without touching the filesystem.
pub fn test_config(user_yaml: &str) -> Config {
    let builtin = ConfigResolver::new().builtin().unwrap();
    let user = parse_layer(user_yaml, Path::new("_config.yml")).unwrap();
    Config::from_value(Path::new("/site"), merge_values(builtin, user)).unwrap()
}

/// A site root in a temp directory, with `_config.yml` already written.
pub struct SiteFixture {
    tmp: TempDir,
}

impl SiteFixture {
    pub fn new(config_yaml: &str) -> Self {
        let fixture = Self {
            tmp: TempDir::new().unwrap(),
        };
        fixture.write("_config.yml", config_yaml);
        fixture
    }

    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.tmp.path().join(rel)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    /// Read a file as text. Panics with the path on failure.
    pub fn read(&self, rel: &str) -> String {
        let path = self.join(rel);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.join(rel).exists()
    }

    /// Resolve the site's configuration with the embedded defaults.
    pub fn config(&self) -> Config {
        ConfigResolver::new().resolve(self.path()).unwrap()
    }
}

/// Relative paths as forward-slash strings, for order-sensitive assertions.
pub fn rel_strings(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect()
}
