//! Template rendering.
//!
//! Rendering one file is a small state machine:
//!
//! ```text
//! select layout ──┬── internals.layout set ──→ layout render (render_file <layouts>/<layout>.<ext>)
//!                 └── no layout ─────────────→ direct render (render globals.content)
//!                                                   │
//!                               Ok → bytes ◄────────┴────────→ Err → RenderError
//! ```
//!
//! Both paths get the same parameters: the full [`Globals`] as locals and the
//! includes directory as the include root. A failed render produces no
//! output; the caller drops the file and moves on.

use crate::config::Config;
use crate::globals::Globals;
use crate::templating::{EngineError, EngineKind, FilterSet, RenderParams, TemplateEngine};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("unknown template language: {0:?}")]
    UnknownEngine(String),
    #[error("invalid layout name: {0:?}")]
    InvalidLayout(String),
    #[error("failed to render layout {path}: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("failed to render content: {source}")]
    Content {
        #[source]
        source: EngineError,
    },
}

/// Which render path a file takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Layout(PathBuf),
    Direct,
}

/// Renders files with the engine named in `template.language`.
///
/// Engine and filter set are resolved once, at construction. Each call to
/// [`render`](Self::render) gets its own engine instance.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    kind: EngineKind,
    filters: FilterSet,
    layouts_dir: PathBuf,
    include_dir: PathBuf,
    extension: String,
}

impl TemplateRenderer {
    pub fn new(config: &Config) -> Result<Self, RenderError> {
        let settings = config.settings();
        let language = &settings.template.language;
        let kind = EngineKind::from_name(language)
            .ok_or_else(|| RenderError::UnknownEngine(language.clone()))?;
        let filters = FilterSet::from_name(config.filters());

        if settings.verbose {
            info!(engine = %language, "Template engine set");
            info!(filters = config.filters(), "Filters set");
        } else {
            debug!(engine = %language, filters = config.filters(), "Template engine set");
        }

        Ok(Self {
            kind,
            filters,
            layouts_dir: config.paths().layouts.clone(),
            include_dir: config.paths().includes.clone(),
            extension: settings.template.extension.trim_start_matches('.').to_string(),
        })
    }

    /// Path of the layout file for `layout`.
    ///
    /// Layout names are plain file stems: no separators, no `..`.
    pub fn layout_path(&self, layout: &str) -> Result<PathBuf, RenderError> {
        if layout.contains(['/', '\\']) || layout.starts_with('.') {
            return Err(RenderError::InvalidLayout(layout.to_string()));
        }
        Ok(self.layouts_dir.join(format!("{layout}.{}", self.extension)))
    }

    /// Decide between layout and direct rendering.
    pub fn select(&self, globals: &Globals) -> Result<Selection, RenderError> {
        match globals.internals.layout() {
            Some(layout) => self.layout_path(layout).map(Selection::Layout),
            None => Ok(Selection::Direct),
        }
    }

    /// Render with a fresh instance of the configured engine.
    pub fn render(&self, globals: &Globals) -> Result<Vec<u8>, RenderError> {
        let engine = self.kind.instantiate(self.filters);
        self.render_with(engine.as_ref(), globals)
    }

    /// Render with a caller-supplied engine.
    pub fn render_with(
        &self,
        engine: &dyn TemplateEngine,
        globals: &Globals,
    ) -> Result<Vec<u8>, RenderError> {
        let params = RenderParams {
            locals: globals,
            include_dir: &self.include_dir,
        };
        let html = match self.select(globals)? {
            Selection::Layout(path) => engine
                .render_file(&path, &params)
                .map_err(|source| RenderError::Layout { path, source })?,
            Selection::Direct => {
                let content = globals.content.as_deref().unwrap_or_default();
                engine
                    .render(content, &params)
                    .map_err(|source| RenderError::Content { source })?
            }
        };
        Ok(html.into_bytes())
    }
}
