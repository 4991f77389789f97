//! Configuration cascade.
//!
//! A build is driven by one configuration value assembled from four layers,
//! always merged in the same order:
//!
//! ```text
//! 1. defaults/system.yml                 ← system defaults (names the generator)
//! 2. defaults/generators/<generator>.yml ← Markheim conventions for that generator
//! 3. defaults/native/<generator>.yml     ← the generator's own defaults
//! 4. <root>/<config>                     ← user file, path taken from the `config` key
//! ```
//!
//! Layers 1–3 ship inside the binary ([`Defaults::Embedded`]) or can be read
//! from a directory with the same layout ([`Defaults::Directory`]).
//!
//! ## Merge Rule
//!
//! Mappings merge key-by-key, recursively. Anything else (scalars, sequences,
//! or mismatched types) is replaced wholesale by the later layer. Sequences
//! are never concatenated:
//!
//! ```yaml
//! # layer 1                # layer 4              # result
//! exclude: [a]             exclude: [b]           exclude: [b]
//! template:                template:              template:
//!   language: jinja          extension: htm         language: jinja
//!                                                   extension: htm
//! ```
//!
//! ## Formats
//!
//! Layers are YAML. A layer whose file name ends in `.toml` is parsed as TOML.
//! Both are normalised into [`serde_json::Value`] so the rest of the pipeline
//! (and the template context) sees a single value model.
//!
//! The resolved [`Config`] is immutable. Later stages receive `&Config` and
//! never write back into it.

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// A string-keyed mapping, the shape of every config layer and of front matter.
pub type Map = serde_json::Map<String, Value>;

const SYSTEM_DEFAULTS: &str = include_str!("../defaults/system.yml");
const JEKYLL_GENERATOR: &str = include_str!("../defaults/generators/jekyll.yml");
const JEKYLL_NATIVE: &str = include_str!("../defaults/native/jekyll.yml");

/// Conventional directories, always relative to the root.
const INCLUDES_DIR: &str = "_includes";
const SASS_DIR: &str = "_sass";
const POSTS_DIR: &str = "_posts";
const DRAFTS_DIR: &str = "_drafts";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML parse error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config {0} must be a mapping at the top level")]
    NotAMapping(PathBuf),
    #[error("unknown generator: {0:?}")]
    UnknownGenerator(String),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Where layers 1–3 come from.
#[derive(Debug, Clone, Default)]
pub enum Defaults {
    /// The layers compiled into the binary.
    #[default]
    Embedded,
    /// `system.yml`, `generators/<name>.yml` and `native/<name>.yml` under a directory.
    Directory(PathBuf),
}

impl Defaults {
    fn system(&self) -> Result<Value, ConfigError> {
        match self {
            Defaults::Embedded => parse_layer(SYSTEM_DEFAULTS, &builtin_path("system.yml")),
            Defaults::Directory(dir) => load_layer(&dir.join("system.yml")),
        }
    }

    fn generator(&self, name: &str) -> Result<Value, ConfigError> {
        check_generator_name(name)?;
        match self {
            Defaults::Embedded => match name {
                "jekyll" => parse_layer(
                    JEKYLL_GENERATOR,
                    &builtin_path(&format!("generators/{name}.yml")),
                ),
                _ => Err(ConfigError::UnknownGenerator(name.to_string())),
            },
            Defaults::Directory(dir) => {
                let path = dir.join("generators").join(format!("{name}.yml"));
                if !path.is_file() {
                    return Err(ConfigError::UnknownGenerator(name.to_string()));
                }
                load_layer(&path)
            }
        }
    }

    fn native(&self, name: &str) -> Result<Value, ConfigError> {
        check_generator_name(name)?;
        match self {
            Defaults::Embedded => match name {
                "jekyll" => parse_layer(JEKYLL_NATIVE, &builtin_path(&format!("native/{name}.yml"))),
                _ => Err(ConfigError::UnknownGenerator(name.to_string())),
            },
            Defaults::Directory(dir) => load_layer(&dir.join("native").join(format!("{name}.yml"))),
        }
    }
}

fn builtin_path(name: &str) -> PathBuf {
    Path::new("<builtin>").join(name)
}

/// Generator names select files; they must be plain names.
fn check_generator_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(ConfigError::UnknownGenerator(name.to_string()));
    }
    Ok(())
}

// =============================================================================
// Typed settings
// =============================================================================

/// The keys of the merged configuration that the pipeline itself reads.
///
/// Everything else in the merged value is kept verbatim in [`Config::values`]
/// and reaches templates as `site.*`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Generator whose conventions apply (selects layers 2 and 3).
    pub generator: String,
    /// User config file, relative to the root.
    pub config: String,
    pub source: String,
    pub destination: String,
    pub plugins: String,
    pub layouts: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Destination-relative paths a clean must leave alone.
    #[serde(default)]
    pub keep_files: Vec<String>,
    #[serde(default)]
    pub verbose: bool,
    /// Comma-separated extensions treated as markdown, e.g. `"md,markdown"`.
    #[serde(default)]
    pub markdown_ext: Option<String>,
    pub template: TemplateSettings,
    pub front_matter: FrontMatterRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSettings {
    /// Engine name, e.g. `jinja`.
    pub language: String,
    /// Layout file extension (no dot).
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Filter set; the generator name is used when absent.
    #[serde(default)]
    pub filters: Option<String>,
}

fn default_extension() -> String {
    "html".to_string()
}

/// How front-matter keys are classified.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontMatterRules {
    #[serde(default)]
    pub merge: Vec<MergePair>,
    #[serde(default)]
    pub internals: Vec<String>,
    #[serde(default)]
    pub page: Vec<String>,
}

/// `[into, from]`: `from` is folded into `into` and then removed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergePair(pub String, pub String);

/// Absolute paths derived from the settings and the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub root: PathBuf,
    /// The user config file (layer 4).
    pub config_file: PathBuf,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub plugins: PathBuf,
    pub layouts: PathBuf,
    pub includes: PathBuf,
    pub sass: PathBuf,
    pub posts: PathBuf,
    pub drafts: PathBuf,
}

impl Paths {
    fn derive(root: &Path, settings: &Settings) -> Self {
        Self {
            root: root.to_path_buf(),
            config_file: join_clean(root, &settings.config),
            source: join_clean(root, &settings.source),
            destination: join_clean(root, &settings.destination),
            plugins: join_clean(root, &settings.plugins),
            layouts: join_clean(root, &settings.layouts),
            includes: join_clean(root, INCLUDES_DIR),
            sass: join_clean(root, SASS_DIR),
            posts: join_clean(root, POSTS_DIR),
            drafts: join_clean(root, DRAFTS_DIR),
        }
    }

    /// Paths never enumerated as source files, whatever the user config says.
    pub fn force_excluded(&self) -> [&Path; 8] {
        [
            &self.config_file,
            &self.plugins,
            &self.layouts,
            &self.includes,
            &self.sass,
            &self.posts,
            &self.drafts,
            &self.destination,
        ]
    }
}

/// Make `root` absolute against the working directory, without touching the
/// filesystem otherwise.
pub fn absolute_root(root: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(root).map_err(|source| ConfigError::Io {
        path: root.to_path_buf(),
        source,
    })
}

/// Join `rel` onto `root`, dropping `.` components and folding `..` lexically.
///
/// A result with no components left is `.`, never an empty path.
pub fn join_clean(root: &Path, rel: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in root.join(rel).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(Component::CurDir);
    }
    out
}

// =============================================================================
// Resolved config
// =============================================================================

/// The fully merged configuration for one build. Read-only once built.
#[derive(Debug, Clone)]
pub struct Config {
    values: Map,
    settings: Settings,
    paths: Paths,
    markdown_exts: Vec<String>,
}

impl Config {
    /// Build a config from an already merged value.
    ///
    /// A relative `root` is taken against the working directory, so every
    /// derived path is absolute.
    pub fn from_value(root: &Path, merged: Value) -> Result<Self, ConfigError> {
        let root = absolute_root(root)?;
        let values = match merged {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(ConfigError::NotAMapping(root.to_path_buf())),
        };
        let settings: Settings = serde_json::from_value(Value::Object(values.clone()))?;
        let paths = Paths::derive(&root, &settings);
        let markdown_exts = parse_markdown_ext(settings.markdown_ext.as_deref());
        Ok(Self {
            values,
            settings,
            paths,
            markdown_exts,
        })
    }

    /// Look up a top-level config value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The whole merged mapping, as exposed to templates.
    pub fn values(&self) -> &Map {
        &self.values
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn generator(&self) -> &str {
        &self.settings.generator
    }

    pub fn front_matter(&self) -> &FrontMatterRules {
        &self.settings.front_matter
    }

    /// Filter set name: `template.filters`, else the generator name.
    pub fn filters(&self) -> &str {
        self.settings
            .template
            .filters
            .as_deref()
            .unwrap_or(&self.settings.generator)
    }

    /// Lower-cased extensions (no dot) whose bodies are markdown.
    pub fn markdown_extensions(&self) -> &[String] {
        &self.markdown_exts
    }

    /// Whether a file should be converted from markdown before rendering.
    pub fn is_markdown(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.markdown_exts.contains(&ext))
    }
}

fn parse_markdown_ext(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Recursively merge `overlay` on top of `base`.
///
/// - Mappings are merged key-by-key (overlay keys override base keys).
/// - Any other overlay value replaces the base value entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => merge_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Read and parse one config layer from disk.
pub fn load_layer(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layer(&content, path)
}

/// Parse layer text. `path` picks the format and labels errors.
///
/// An empty document is an empty mapping.
pub fn parse_layer(content: &str, path: &Path) -> Result<Value, ConfigError> {
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let value = if is_toml {
        let table: toml::Value = toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_value(table)?
    } else {
        serde_yaml::from_str::<Value>(content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };
    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}

/// Builds a [`Config`] from the four layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    defaults: Defaults,
}

impl ConfigResolver {
    /// A resolver using the embedded default layers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: Defaults) -> Self {
        Self { defaults }
    }

    /// Layers 1–3 merged, before any user config.
    ///
    /// The generator is read from the system layer and selects both
    /// generator layers.
    pub fn builtin(&self) -> Result<Value, ConfigError> {
        let system = self.defaults.system()?;
        let generator = system
            .get("generator")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::UnknownGenerator(String::new()))?
            .to_string();
        let merged = merge_values(system, self.defaults.generator(&generator)?);
        Ok(merge_values(merged, self.defaults.native(&generator)?))
    }

    /// Resolve the full configuration for a build rooted at `root`.
    ///
    /// Any failing layer aborts resolution; no partial config is returned.
    pub fn resolve(&self, root: &Path) -> Result<Config, ConfigError> {
        let root = absolute_root(root)?;
        let builtin = self.builtin()?;
        let user_rel = builtin
            .get("config")
            .and_then(Value::as_str)
            .unwrap_or("_config.yml")
            .to_string();
        let user_file = join_clean(&root, &user_rel);
        info!(path = %user_file.display(), "Configuration file");

        let merged = merge_values(builtin, load_layer(&user_file)?);
        let config = Config::from_value(&root, merged)?;

        info!(path = %config.paths.source.display(), "Source");
        info!(path = %config.paths.destination.display(), "Destination");
        Ok(config)
    }
}

/// The documented system defaults, as printed by `markheim gen-config`.
pub fn stock_config() -> &'static str {
    SYSTEM_DEFAULTS
}
