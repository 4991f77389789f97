//! Generator-flavoured template filters.
//!
//! `template.filters` (falling back to the generator name) picks a
//! [`FilterSet`]. The `jekyll` set mirrors the Liquid filters Jekyll themes
//! lean on most:
//!
//! | Filter | Output |
//! |--------|--------|
//! | `markdownify` | markdown rendered to HTML |
//! | `slugify` | `"Hello, World!"` → `hello-world` |
//! | `xml_escape` | `&`, `<`, `>`, `"`, `'` escaped |
//! | `jsonify` | the value as JSON |
//! | `number_of_words` | whitespace-separated word count |
//! | `date_to_string` | `2021-03-04` → `04 Mar 2021` |
//! | `date_to_xmlschema` | `2021-03-04` → `2021-03-04T00:00:00+00:00` |
//!
//! Any other name gets minijinja's built-in filters only.

use crate::globals::parse_date;
use minijinja::{Environment, Error, ErrorKind, Value};
use pulldown_cmark::{Options, Parser, html as md_html};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSet {
    Jekyll,
    Builtin,
}

impl FilterSet {
    pub fn from_name(name: &str) -> Self {
        match name {
            "jekyll" => FilterSet::Jekyll,
            other => {
                debug!(filters = other, "No filter set by that name, using builtins only");
                FilterSet::Builtin
            }
        }
    }

    pub fn register(self, env: &mut Environment<'_>) {
        if self == FilterSet::Builtin {
            return;
        }
        env.add_filter("markdownify", markdownify);
        env.add_filter("slugify", slugify);
        env.add_filter("xml_escape", xml_escape);
        env.add_filter("jsonify", jsonify);
        env.add_filter("number_of_words", number_of_words);
        env.add_filter("date_to_string", date_to_string);
        env.add_filter("date_to_xmlschema", date_to_xmlschema);
    }
}

/// Render markdown to HTML with tables, footnotes and strikethrough enabled.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

fn text(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None if value.is_undefined() || value.is_none() => String::new(),
        None => value.to_string(),
    }
}

fn markdownify(value: Value) -> Value {
    Value::from_safe_string(markdown_to_html(&text(&value)))
}

fn slugify(value: Value) -> String {
    let mut slug = String::new();
    for c in text(&value).chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn xml_escape(value: Value) -> String {
    let source = text(&value);
    let mut escaped = String::with_capacity(source.len());
    for c in source.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn jsonify(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("jsonify: {e}")))
}

fn number_of_words(value: Value) -> usize {
    text(&value).split_whitespace().count()
}

fn date_filter(value: &Value, format: &str) -> Result<String, Error> {
    let raw = text(value);
    parse_date(&raw)
        .map(|date| date.format(format).to_string())
        .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, format!("not a date: {raw:?}")))
}

fn date_to_string(value: Value) -> Result<String, Error> {
    date_filter(&value, "%d %b %Y")
}

fn date_to_xmlschema(value: Value) -> Result<String, Error> {
    date_filter(&value, "%Y-%m-%dT%H:%M:%S+00:00")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> String {
        let mut env = Environment::new();
        FilterSet::Jekyll.register(&mut env);
        env.render_str(source, minijinja::context! {}).unwrap()
    }

    #[test]
    fn markdown_to_html_renders_tables() {
        let html = markdown_to_html("| a |\n|---|\n| 1 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn markdownify_is_not_escaped() {
        assert_eq!(render("{{ '*hi*' | markdownify }}"), "<p><em>hi</em></p>\n");
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(render("{{ 'Hello, World!' | slugify }}"), "hello-world");
        assert_eq!(render("{{ '  --Rust  2024-- ' | slugify }}"), "rust-2024");
    }

    #[test]
    fn xml_escape_escapes_markup() {
        assert_eq!(
            render("{{ '<a href=\"x\">Tom & Jerry</a>' | xml_escape }}"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/a&gt;"
        );
    }

    #[test]
    fn jsonify_serialises_values() {
        assert_eq!(render("{{ [1, 'a'] | jsonify }}"), "[1,\"a\"]");
    }

    #[test]
    fn number_of_words_counts() {
        assert_eq!(render("{{ 'one two  three' | number_of_words }}"), "3");
    }

    #[test]
    fn date_filters() {
        assert_eq!(render("{{ '2021-03-04' | date_to_string }}"), "04 Mar 2021");
        assert_eq!(
            render("{{ '2021-03-04' | date_to_xmlschema }}"),
            "2021-03-04T00:00:00+00:00"
        );
    }

    #[test]
    fn date_filter_rejects_garbage() {
        let mut env = Environment::new();
        FilterSet::Jekyll.register(&mut env);
        let result = env.render_str("{{ 'soon' | date_to_string }}", minijinja::context! {});
        assert!(result.is_err());
    }

    #[test]
    fn builtin_set_has_no_extra_filters() {
        let mut env = Environment::new();
        FilterSet::from_name("plain").register(&mut env);
        assert!(env.render_str("{{ 'x' | slugify }}", minijinja::context! {}).is_err());
        assert_eq!(FilterSet::from_name("jekyll"), FilterSet::Jekyll);
    }
}
