//! # Markheim
//!
//! A static site builder that follows Jekyll's conventions: files with front
//! matter are rendered through a template engine (optionally wrapped in a
//! layout), everything else is copied, and the destination is cleaned first
//! while a configurable set of paths survives.
//!
//! # Architecture: One Config, Four Per-File Stages
//!
//! ```text
//! ConfigResolver   system → generator → native → _config.yml   (once per build)
//!        │
//!        ▼
//! partition        front matter → { internals, page }           (per file)
//!        │
//!        ▼
//! GlobalsBuilder   { site, page, post, content, paginator }     (per file)
//!        │
//!        ▼
//! TemplateRenderer layout file or direct content render → bytes (per file)
//! ```
//!
//! The resolved [`config::Config`] is read-only after resolution. Every front
//! matter key ends up in exactly one of `internals` (seen by the renderer
//! only) or `page` (seen by templates).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered YAML/TOML config resolution and deep merge |
//! | [`front_matter`] | Splits a `---` YAML header from the document body |
//! | [`partition`] | Classifies front matter into internals and page variables |
//! | [`globals`] | The shared `site` view and per-file render context |
//! | [`render`] | Layout selection and the render state machine |
//! | [`templating`] | Template engine trait, minijinja adapter, filter sets |
//! | [`naming`] | `YYYY-MM-DD-slug` post filename parser |
//! | [`scan`] | Source enumeration and post collection |
//! | [`clean`] | Destination cleanup honouring `keep_files` |
//! | [`generate`] | The build driver: clean, collect posts, render, copy |
//! | [`output`] | CLI output formatting for build and clean reports |
//!
//! # Design Decisions
//!
//! ## Config Values Stay Dynamic
//!
//! Every layer is normalised to a `serde_json::Value` tree before merging, so
//! YAML and TOML layers merge identically and unknown user keys reach
//! templates as `site.*` untouched. The handful of keys the pipeline itself
//! needs are deserialized once into [`config::Settings`].
//!
//! ## Posts Before Pages
//!
//! Pages can list posts (`site.posts`), so every post is parsed, partitioned
//! and sorted newest-first before the first page renders. After that the
//! files are independent and rendered in parallel.
//!
//! ## File-Scoped Failures
//!
//! A file with bad front matter or a failing template is dropped and
//! reported; the rest of the site still builds. Config, scan and clean errors
//! abort the build.

pub mod clean;
pub mod config;
pub mod front_matter;
pub mod generate;
pub mod globals;
pub mod naming;
pub mod output;
pub mod partition;
pub mod render;
pub mod scan;
pub mod templating;

#[cfg(test)]
pub(crate) mod test_helpers;
