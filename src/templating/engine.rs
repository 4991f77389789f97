//! Template engine trait and engine selection.
//!
//! The renderer only ever talks to a [`TemplateEngine`]. Which implementation
//! it gets is decided once, from `template.language`, via [`EngineKind`].

use super::filters::FilterSet;
use super::jinja::JinjaEngine;
use crate::globals::Globals;
use std::path::Path;

/// Error type engines report; the renderer wraps it with context.
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

/// What an engine gets for every render.
#[derive(Debug, Clone, Copy)]
pub struct RenderParams<'a> {
    pub locals: &'a Globals,
    /// Root for `{% include %}` lookups.
    pub include_dir: &'a Path,
}

/// The capability set every engine adapter must offer.
///
/// `Sync` so one engine can be shared across rayon workers when an
/// implementation chooses to.
pub trait TemplateEngine: Sync {
    /// Render the template stored at `path`.
    fn render_file(&self, path: &Path, params: &RenderParams<'_>) -> Result<String, EngineError>;

    /// Render `source` as a template.
    fn render(&self, source: &str, params: &RenderParams<'_>) -> Result<String, EngineError>;
}

/// Engines known by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Jinja,
}

impl EngineKind {
    /// Look up an engine by its `template.language` name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jinja" | "jinja2" | "minijinja" | "nunjucks" | "swig" => Some(EngineKind::Jinja),
            _ => None,
        }
    }

    /// A fresh engine instance with `filters` registered.
    pub fn instantiate(self, filters: FilterSet) -> Box<dyn TemplateEngine + Send> {
        match self {
            EngineKind::Jinja => Box::new(JinjaEngine::new(filters)),
        }
    }
}
