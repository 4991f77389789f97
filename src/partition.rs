//! Front-matter partitioning.
//!
//! Every front-matter key of a file ends up in exactly one place: folded into
//! another key by a merge pair, in `internals` (build-time only), or in `page`
//! (visible to templates). The split runs as four named passes, in this order:
//!
//! 1. **merge**: for each `[a, b]` in `front_matter.merge`, `a` and `b` are
//!    coerced to sequences, `b`'s elements are appended to `a` (skipping ones
//!    already present), and `b` is removed.
//! 2. **internals**: each name in `front_matter.internals` takes the front
//!    matter value, falling back to the same-named config value. The key is
//!    removed from front matter either way.
//! 3. **page**: each name in `front_matter.page` is moved into `page`.
//! 4. **residual**: whatever is left is custom metadata and is merged into `page`.
//!
//! Order matters. A name listed under both `internals` and `page` is consumed
//! by the internals pass, so `page` never sees it. A merge pair runs before
//! both, so they see the merged value under `a` and nothing under `b`.
//!
//! Each pass consumes the working mapping and hands back a new one; the
//! caller's front matter and the config are never modified.

use crate::config::{Config, Map, MergePair, merge_values};
use serde::Serialize;
use serde_json::Value;

/// Front matter as extracted from a file header, not yet classified.
pub type FrontMatter = Map;

/// The classified front matter of one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Partition {
    /// Build-time variables, never exposed to templates.
    pub internals: Map,
    /// Page variables, including custom keys.
    pub page: Map,
}

/// Classify `front_matter` using the rules in `config.front_matter`.
pub fn partition(front_matter: &FrontMatter, config: &Config) -> Partition {
    let rules = config.front_matter();

    let working = merge_pass(front_matter.clone(), &rules.merge);
    let (internals, working) = internals_pass(working, &rules.internals, config);
    let (page, working) = page_pass(working, &rules.page);
    let page = residual_pass(page, working);

    Partition { internals, page }
}

fn merge_pass(mut working: Map, pairs: &[MergePair]) -> Map {
    for MergePair(into, from) in pairs {
        let first = working.remove(into);
        let second = working.remove(from);
        if first.is_none() && second.is_none() {
            continue;
        }
        let merged = union(into_sequence(first), into_sequence(second));
        working.insert(into.clone(), Value::Array(merged));
    }
    working
}

fn into_sequence(value: Option<Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    }
}

/// Append the items of `extra` that `base` does not already hold.
fn union(mut base: Vec<Value>, extra: Vec<Value>) -> Vec<Value> {
    for item in extra {
        if !base.contains(&item) {
            base.push(item);
        }
    }
    base
}

fn internals_pass(mut working: Map, names: &[String], config: &Config) -> (Map, Map) {
    let mut internals = Map::new();
    for name in names {
        let value = match working.remove(name) {
            Some(Value::Null) | None => config.get(name).cloned(),
            found => found,
        };
        if let Some(value) = value {
            internals.insert(name.clone(), value);
        }
    }
    (internals, working)
}

fn page_pass(mut working: Map, names: &[String]) -> (Map, Map) {
    let mut page = Map::new();
    for name in names {
        if let Some(value) = working.remove(name) {
            page.insert(name.clone(), value);
        }
    }
    (page, working)
}

fn residual_pass(mut page: Map, rest: Map) -> Map {
    for (key, value) in rest {
        let merged = match page.remove(&key) {
            Some(existing) => merge_values(existing, value),
            None => value,
        };
        page.insert(key, merged);
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_config;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn front_matter(value: Value) -> FrontMatter {
        match value {
            Value::Object(map) => map,
            _ => panic!("front matter must be an object"),
        }
    }

    #[test]
    fn merge_pair_combines_and_removes_source() {
        let config = test_config("front_matter:\n  merge: [[tags, categories]]\n");
        let fm = front_matter(json!({"tags": "a", "categories": "b"}));
        let result = partition(&fm, &config);

        assert_eq!(result.page["tags"], json!(["a", "b"]));
        assert!(!result.page.contains_key("categories"));
        assert!(!result.internals.contains_key("categories"));
    }

    #[test]
    fn merge_pair_keeps_sequences_and_skips_duplicates() {
        let config = test_config("front_matter:\n  merge: [[tags, tag]]\n");
        let fm = front_matter(json!({"tags": ["rust", "web"], "tag": ["web", "cli"]}));
        let result = partition(&fm, &config);
        assert_eq!(result.page["tags"], json!(["rust", "web", "cli"]));
    }

    #[test]
    fn merge_pair_with_only_source_present() {
        let config = test_config("front_matter:\n  merge: [[tags, tag]]\n");
        let fm = front_matter(json!({"tag": "solo"}));
        let result = partition(&fm, &config);
        assert_eq!(result.page["tags"], json!(["solo"]));
        assert!(!result.page.contains_key("tag"));
    }

    #[test]
    fn merge_pair_with_neither_present_adds_nothing() {
        let config = test_config("front_matter:\n  merge: [[tags, tag]]\n");
        let fm = front_matter(json!({"title": "T"}));
        let result = partition(&fm, &config);
        assert!(!result.page.contains_key("tags"));
    }

    #[test]
    fn internals_fall_back_to_config() {
        let config = test_config("layout: default\n");
        let fm = front_matter(json!({"title": "No layout here"}));
        let result = partition(&fm, &config);
        assert_eq!(result.internals["layout"], json!("default"));
        assert!(!result.page.contains_key("layout"));
    }

    #[test]
    fn internals_prefer_front_matter() {
        let config = test_config("layout: default\n");
        let fm = front_matter(json!({"layout": "post"}));
        let result = partition(&fm, &config);
        assert_eq!(result.internals["layout"], json!("post"));
    }

    #[test]
    fn null_internal_falls_back_to_config() {
        let config = test_config("layout: default\n");
        let fm = front_matter(json!({"layout": null}));
        let result = partition(&fm, &config);
        assert_eq!(result.internals["layout"], json!("default"));
    }

    #[test]
    fn missing_internal_without_config_value_is_absent() {
        let config = test_config("");
        let fm = front_matter(json!({}));
        let result = partition(&fm, &config);
        assert!(!result.internals.contains_key("permalink"));
    }

    #[test]
    fn page_and_custom_keys_land_in_page() {
        let config = test_config("");
        let fm = front_matter(json!({
            "title": "Hello",
            "date": "2021-01-01",
            "author": {"name": "Sam"},
        }));
        let result = partition(&fm, &config);
        assert_eq!(result.page["title"], json!("Hello"));
        assert_eq!(result.page["date"], json!("2021-01-01"));
        assert_eq!(result.page["author"], json!({"name": "Sam"}));
    }

    #[test]
    fn internals_win_when_lists_overlap() {
        let config = test_config(
            "front_matter:\n  merge: []\n  internals: [layout, title]\n  page: [title]\n",
        );
        let fm = front_matter(json!({"title": "Claimed", "layout": "post"}));
        let result = partition(&fm, &config);
        assert_eq!(result.internals["title"], json!("Claimed"));
        assert!(!result.page.contains_key("title"));
    }

    #[test]
    fn merged_value_is_what_internals_see() {
        let config = test_config(
            "front_matter:\n  merge: [[flags, flag]]\n  internals: [flags]\n  page: []\n",
        );
        let fm = front_matter(json!({"flags": "a", "flag": "b"}));
        let result = partition(&fm, &config);
        assert_eq!(result.internals["flags"], json!(["a", "b"]));
        assert!(result.page.is_empty());
    }

    #[test]
    fn every_key_lands_in_exactly_one_place() {
        let config = test_config("");
        let fm = front_matter(json!({
            "title": "T",
            "layout": "post",
            "permalink": "/x/",
            "tags": "a",
            "tag": "b",
            "categories": ["c"],
            "category": "d",
            "custom": 1,
            "another": [1, 2],
        }));
        let result = partition(&fm, &config);

        let internal_keys: BTreeSet<_> = result.internals.keys().cloned().collect();
        let page_keys: BTreeSet<_> = result.page.keys().cloned().collect();
        assert!(internal_keys.is_disjoint(&page_keys));

        let merged_away: BTreeSet<_> = ["tag", "category"].map(String::from).into();
        for key in fm.keys() {
            let homes = [
                internal_keys.contains(key),
                page_keys.contains(key),
                merged_away.contains(key),
            ];
            assert_eq!(
                homes.iter().filter(|h| **h).count(),
                1,
                "key {key} should have exactly one home"
            );
        }
    }

    #[test]
    fn caller_front_matter_is_untouched() {
        let config = test_config("");
        let fm = front_matter(json!({"title": "T", "layout": "post", "tag": "x"}));
        let before = fm.clone();
        let _ = partition(&fm, &config);
        assert_eq!(fm, before);
    }
}
