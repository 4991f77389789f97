//! Per-file render context.
//!
//! Templates see five top-level names:
//!
//! | Name | Value |
//! |------|-------|
//! | `site` | the resolved config, plus `posts` sorted newest first |
//! | `page` | the file's page variables |
//! | `post` | a copy of `page`, for layouts written against the post convention |
//! | `content` | the file body (markdown already converted) |
//! | `paginator` | reserved, always null |
//!
//! [`Globals::internals`] rides along for the renderer (layout selection) and
//! is never serialised into the template context.
//!
//! The [`Site`] is built once per build, after posts are collected, and shared
//! behind an `Arc`. Templates get a serialised view of it, so nothing they do
//! can leak into the next file.

use crate::config::{Config, Map};
use crate::partition::Partition;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Reverse;
use std::sync::Arc;

/// The `site` variable: config values plus the post list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Site(Map);

impl Site {
    /// Site view of the config alone. A `posts` list defined in config is
    /// still normalised.
    pub fn new(config: &Config) -> Self {
        let mut values = config.values().clone();
        if let Some(Value::Array(posts)) = values.get_mut("posts") {
            sort_posts(posts);
        }
        Self(values)
    }

    /// Site view with collected posts installed as `site.posts`.
    ///
    /// Collected posts replace a `posts` list from config; with none
    /// collected, the config list is kept.
    pub fn with_posts(config: &Config, mut posts: Vec<Value>) -> Self {
        if posts.is_empty() {
            return Self::new(config);
        }
        sort_posts(&mut posts);
        let mut values = config.values().clone();
        values.insert("posts".to_string(), Value::Array(posts));
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn posts(&self) -> &[Value] {
        match self.0.get("posts") {
            Some(Value::Array(posts)) => posts.as_slice(),
            _ => &[],
        }
    }
}

/// Sort posts newest first. The sort is stable; posts without a usable
/// `date` sort as the oldest.
pub fn sort_posts(posts: &mut [Value]) {
    posts.sort_by_key(|post| Reverse(post.get("date").and_then(date_value)));
}

fn date_value(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(text) => parse_date(text),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

/// Parse the date formats that show up in front matter.
///
/// Offsets are normalised to UTC; dates without a time are midnight.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Build-time variables of one file, keyed by generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Internals {
    pub generator: String,
    pub values: Map,
}

impl Internals {
    /// The layout to wrap the page in, if a non-empty name is set.
    pub fn layout(&self) -> Option<&str> {
        self.values
            .get("layout")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|layout| !layout.is_empty())
    }
}

/// The render context of one file.
#[derive(Debug, Clone, Serialize)]
pub struct Globals {
    pub site: Arc<Site>,
    pub page: Map,
    pub post: Map,
    pub content: Option<String>,
    pub paginator: Option<Value>,
    #[serde(skip)]
    pub internals: Internals,
}

/// Assembles [`Globals`] for each file from one shared [`Site`].
#[derive(Debug, Clone)]
pub struct GlobalsBuilder {
    site: Arc<Site>,
    generator: String,
}

impl GlobalsBuilder {
    pub fn new(site: Arc<Site>, config: &Config) -> Self {
        Self {
            site,
            generator: config.generator().to_string(),
        }
    }

    pub fn site(&self) -> &Arc<Site> {
        &self.site
    }

    pub fn build(&self, body: &str, partition: Partition) -> Globals {
        let Partition { internals, page } = partition;
        Globals {
            site: Arc::clone(&self.site),
            post: page.clone(),
            page,
            content: Some(body.to_string()),
            paginator: None,
            internals: Internals {
                generator: self.generator.clone(),
                values: internals,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_config;
    use serde_json::json;

    fn dates(site: &Site) -> Vec<Value> {
        site.posts().iter().map(|p| p["date"].clone()).collect()
    }

    #[test]
    fn posts_in_config_sorted_newest_first() {
        let config = test_config(
            "posts:\n  - {date: \"2020-01-01\"}\n  - {date: \"2021-01-01\"}\n",
        );
        let builder = GlobalsBuilder::new(Arc::new(Site::new(&config)), &config);
        let globals = builder.build("", Partition::default());
        assert_eq!(dates(&globals.site), vec![json!("2021-01-01"), json!("2020-01-01")]);
    }

    #[test]
    fn collected_posts_replace_config_posts() {
        let config = test_config("posts: [{date: \"1999-01-01\"}]\n");
        let posts = vec![
            json!({"date": "2019-05-01 10:00:00"}),
            json!({"date": "2019-05-01T12:00:00Z"}),
            json!({"date": "2018-01-01"}),
        ];
        let site = Site::with_posts(&config, posts);
        assert_eq!(
            dates(&site),
            vec![
                json!("2019-05-01T12:00:00Z"),
                json!("2019-05-01 10:00:00"),
                json!("2018-01-01"),
            ]
        );
    }

    #[test]
    fn no_collected_posts_keeps_config_posts_sorted() {
        let config = test_config(
            "posts:\n  - {date: \"2020-01-01\", t: old}\n  - {date: \"2021-01-01\", t: new}\n",
        );
        let site = Site::with_posts(&config, Vec::new());
        assert_eq!(dates(&site), vec![json!("2021-01-01"), json!("2020-01-01")]);
    }

    #[test]
    fn no_posts_anywhere_leaves_site_posts_unset() {
        let config = test_config("");
        let site = Site::with_posts(&config, Vec::new());
        assert_eq!(site.get("posts"), None);
        assert!(site.posts().is_empty());
    }

    #[test]
    fn undated_posts_sort_last_and_keep_order() {
        let config = test_config("");
        let posts = vec![
            json!({"id": "a"}),
            json!({"id": "b", "date": "2020-01-01"}),
            json!({"id": "c", "date": "not a date"}),
            json!({"id": "d"}),
        ];
        let site = Site::with_posts(&config, posts);
        let ids: Vec<_> = site.posts().iter().map(|p| p["id"].clone()).collect();
        assert_eq!(ids, vec![json!("b"), json!("a"), json!("c"), json!("d")]);
    }

    #[test]
    fn site_exposes_config_values() {
        let config = test_config("title: Blog\n");
        let site = Site::new(&config);
        assert_eq!(site.get("title"), Some(&json!("Blog")));
        assert!(site.posts().is_empty());
    }

    #[test]
    fn build_fills_page_content_and_internals() {
        let config = test_config("");
        let builder = GlobalsBuilder::new(Arc::new(Site::new(&config)), &config);
        let mut partition = Partition::default();
        partition.page.insert("title".into(), json!("Hi"));
        partition.internals.insert("layout".into(), json!("post"));

        let globals = builder.build("<p>body</p>", partition);
        assert_eq!(globals.page["title"], json!("Hi"));
        assert_eq!(globals.post, globals.page);
        assert_eq!(globals.content.as_deref(), Some("<p>body</p>"));
        assert_eq!(globals.paginator, None);
        assert_eq!(globals.internals.generator, "jekyll");
        assert_eq!(globals.internals.layout(), Some("post"));
    }

    #[test]
    fn internals_are_not_serialised() {
        let config = test_config("");
        let builder = GlobalsBuilder::new(Arc::new(Site::new(&config)), &config);
        let mut partition = Partition::default();
        partition.internals.insert("layout".into(), json!("post"));

        let value = serde_json::to_value(builder.build("", partition)).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["content", "page", "paginator", "post", "site"]);
        assert!(value["page"].get("layout").is_none());
    }

    #[test]
    fn blank_layout_is_no_layout() {
        let mut internals = Internals::default();
        internals.values.insert("layout".into(), json!("  "));
        assert_eq!(internals.layout(), None);
        internals.values.insert("layout".into(), json!(false));
        assert_eq!(internals.layout(), None);
    }

    #[test]
    fn parse_date_formats() {
        let midnight = NaiveDate::from_ymd_opt(2021, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2021-01-02"), Some(midnight));
        assert_eq!(parse_date("2021-01-02 00:00:00"), Some(midnight));
        assert_eq!(parse_date("2021-01-02 01:00:00 +0100"), Some(midnight));
        assert_eq!(parse_date("2021-01-02T00:00:00Z"), Some(midnight));
        assert_eq!(parse_date("yesterday"), None);
    }
}
