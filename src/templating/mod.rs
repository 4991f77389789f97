//! Template engines.
//!
//! | Piece | Role |
//! |---|---|
//! | [`TemplateEngine`] | the two capabilities every engine offers: render a file, render a string |
//! | [`EngineKind`] | engine names accepted in `template.language` |
//! | [`JinjaEngine`] | the built-in engine, backed by `minijinja` |
//! | [`FilterSet`] | generator-flavoured filters registered on each engine |
//!
//! Engines are cheap to build and are instantiated once per file, so no
//! engine-local state is ever shared between files.

pub mod engine;
pub mod filters;
pub mod jinja;

pub use engine::{EngineError, EngineKind, RenderParams, TemplateEngine};
pub use filters::{FilterSet, markdown_to_html};
pub use jinja::JinjaEngine;
