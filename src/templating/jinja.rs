//! The built-in engine, backed by `minijinja`.
//!
//! Each render builds a fresh [`Environment`] whose loader is rooted at the
//! include directory, so `{% include "header.html" %}` resolves to
//! `<includes>/header.html`. Output is never auto-escaped: `content` is
//! already HTML by the time a layout sees it.

use super::engine::{EngineError, RenderParams, TemplateEngine};
use super::filters::FilterSet;
use minijinja::{AutoEscape, Environment, path_loader};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct JinjaEngine {
    filters: FilterSet,
}

impl JinjaEngine {
    pub fn new(filters: FilterSet) -> Self {
        Self { filters }
    }

    fn environment(&self, include_dir: &Path) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_loader(path_loader(include_dir));
        env.set_auto_escape_callback(|_| AutoEscape::None);
        self.filters.register(&mut env);
        env
    }
}

impl TemplateEngine for JinjaEngine {
    fn render_file(&self, path: &Path, params: &RenderParams<'_>) -> Result<String, EngineError> {
        let source = fs::read_to_string(path)?;
        let name = path.to_string_lossy();
        let env = self.environment(params.include_dir);
        Ok(env.render_named_str(&name, &source, params.locals)?)
    }

    fn render(&self, source: &str, params: &RenderParams<'_>) -> Result<String, EngineError> {
        let env = self.environment(params.include_dir);
        Ok(env.render_str(source, params.locals)?)
    }
}
