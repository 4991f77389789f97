//! Post filename parsing for the `YYYY-MM-DD-slug` convention.
//!
//! Posts carry their publication date in the file name:
//! - `2021-03-04-hello-world.md` → date 2021-03-04, slug `hello-world`
//! - `2021-3-4-hello.md` → not a post (date parts must be zero-padded)
//! - `notes.md` → not a post
//!
//! Display titles follow the same dash-to-space rule everywhere:
//! `hello-world` → "hello world".

use chrono::NaiveDate;

/// Result of parsing a post file stem like `2021-03-04-hello-world`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostName {
    pub date: NaiveDate,
    /// Everything after the date, dashes preserved.
    pub slug: String,
    /// Slug with dashes converted to spaces.
    pub display_title: String,
}

impl PostName {
    /// Permalink in the `/YYYY/MM/DD/slug.html` style.
    pub fn url(&self) -> String {
        format!("/{}/{}.html", self.date.format("%Y/%m/%d"), self.slug)
    }
}

/// Parse a post file stem. Returns `None` unless it is `YYYY-MM-DD-slug`
/// with a valid calendar date and a non-empty slug.
pub fn parse_post_name(stem: &str) -> Option<PostName> {
    let bytes = stem.as_bytes();
    if bytes.len() < 12 || bytes[4] != b'-' || bytes[7] != b'-' || bytes[10] != b'-' {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    if !(digits(0..4) && digits(5..7) && digits(8..10)) {
        return None;
    }

    let date = NaiveDate::parse_from_str(&stem[..10], "%Y-%m-%d").ok()?;
    let slug = &stem[11..];
    if slug.is_empty() {
        return None;
    }
    Some(PostName {
        date,
        slug: slug.to_string(),
        display_title: slug.replace('-', " "),
    })
}
