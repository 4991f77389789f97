//! Front-matter extraction.
//!
//! A content file may open with a YAML header fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! tags: [rust]
//! ---
//! Body text starts here.
//! ```
//!
//! The closing fence may also be `...`. An empty header (`---` immediately
//! followed by `---`) is valid and yields an empty mapping. Files without a
//! header are not an error: they come back with an empty mapping, the
//! original text as body, and [`Document::has_header`] unset, which tells the
//! build to copy them through untouched.

use crate::config::Map;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping")]
    NotAMapping,
}

/// A content file split into its metadata and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub front_matter: Map,
    pub body: String,
    pub has_header: bool,
}

/// Split raw file text into front matter and body.
pub fn parse(raw: &str) -> Result<Document, FrontMatterError> {
    let Some((header, body)) = split(raw) else {
        return Ok(Document {
            front_matter: Map::new(),
            body: raw.to_string(),
            has_header: false,
        });
    };

    let front_matter = match serde_yaml::from_str::<Value>(header)? {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        _ => return Err(FrontMatterError::NotAMapping),
    };

    Ok(Document {
        front_matter,
        body: body.to_string(),
        has_header: true,
    })
}

/// Return `(header, body)` if `raw` starts with a fenced header.
fn split(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let rest = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let fence = line.trim_end_matches(['\n', '\r']);
        if fence == "---" || fence == "..." {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}
