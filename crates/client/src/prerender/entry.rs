//! Content entries: the published articles listed in the content JSON.

use std::path::Path;
use std::sync::LazyLock;

use nai_core::Error;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// Slugs become file names, so only a conservative character set is allowed.
static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("invalid slug pattern"));

/// Placeholder used in logs when an entry has no usable slug.
pub const MISSING_SLUG: &str = "<missing slug>";

/// One published article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub seo_keywords: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Site-relative path or absolute URL.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Article body, used only for the word count.
    #[serde(default)]
    pub content: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn non_empty_list(value: &Option<Vec<String>>) -> Option<Vec<String>> {
    let list: Vec<String> = value
        .as_deref()?
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if list.is_empty() { None } else { Some(list) }
}

impl ContentEntry {
    /// Decode and validate one element of the content array.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let slug = slug_hint(&value);
        let entry: ContentEntry =
            serde_json::from_value(value).map_err(|e| Error::InvalidEntry { slug, reason: e.to_string() })?;
        entry.validate()?;
        Ok(entry)
    }

    /// Check the fields the injector relies on.
    pub fn validate(&self) -> Result<(), Error> {
        if !SLUG_PATTERN.is_match(&self.slug) {
            return Err(Error::InvalidEntry {
                slug: self.slug.clone(),
                reason: "slug must match [A-Za-z0-9][A-Za-z0-9._-]*".into(),
            });
        }
        if self.title.trim().is_empty() {
            return Err(Error::InvalidEntry { slug: self.slug.clone(), reason: "title must not be empty".into() });
        }
        Ok(())
    }

    /// First non-empty of `excerpt` and `seoDescription`.
    pub fn description(&self) -> &str {
        non_empty(&self.excerpt)
            .or_else(|| non_empty(&self.seo_description))
            .unwrap_or_default()
    }

    /// Individual keywords, from `keywords`, then `tags`, then the comma-separated `seoKeywords`.
    pub fn keyword_list(&self) -> Vec<String> {
        non_empty_list(&self.keywords)
            .or_else(|| non_empty_list(&self.tags))
            .unwrap_or_else(|| {
                non_empty(&self.seo_keywords)
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|k| !k.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default()
            })
    }

    /// Keyword string for the `keywords` meta tag: `seoKeywords` verbatim, else the list joined.
    pub fn keywords_text(&self) -> String {
        match non_empty(&self.seo_keywords) {
            Some(text) => text.to_string(),
            None => self.keyword_list().join(", "),
        }
    }

    /// Number of whitespace-separated words in the body, if one is present.
    pub fn word_count(&self) -> Option<usize> {
        non_empty(&self.content).map(|body| body.split_whitespace().count())
    }
}

/// Best-effort slug for log lines, available even when decoding fails.
pub fn slug_hint(value: &Value) -> String {
    value
        .get("slug")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING_SLUG)
        .to_string()
}

/// Read the content file and return its elements undecoded.
///
/// Only a missing file, invalid JSON, or a non-array top level is an error
/// here; each element is decoded separately so a bad entry stays isolated.
pub fn load_entries(path: &Path) -> Result<Vec<Value>, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let value: Value =
        serde_json::from_str(&text).map_err(|e| Error::ContentLoad(format!("{}: {e}", path.display())))?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(Error::ContentLoad(format!("{}: expected a JSON array of entries", path.display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_minimal() {
        let entry = ContentEntry::from_value(json!({"slug": "a", "title": "Alpha"})).unwrap();
        assert_eq!(entry.slug, "a");
        assert_eq!(entry.title, "Alpha");
        assert_eq!(entry.description(), "");
        assert_eq!(entry.keywords_text(), "");
        assert!(entry.word_count().is_none());
    }

    #[test]
    fn test_from_value_missing_title() {
        let err = ContentEntry::from_value(json!({"slug": "b"})).unwrap_err();
        match err {
            Error::InvalidEntry { slug, reason } => {
                assert_eq!(slug, "b");
                assert!(reason.contains("title"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_value_missing_slug_uses_placeholder() {
        let err = ContentEntry::from_value(json!({"title": "No slug"})).unwrap_err();
        assert!(matches!(err, Error::InvalidEntry { slug, .. } if slug == MISSING_SLUG));
    }

    #[test]
    fn test_blank_title_rejected() {
        let err = ContentEntry::from_value(json!({"slug": "c", "title": "   "})).unwrap_err();
        assert!(matches!(err, Error::InvalidEntry { reason, .. } if reason.contains("title")));
    }

    #[test]
    fn test_unsafe_slugs_rejected() {
        for slug in ["../etc", "a/b", "a\\b", ".hidden", "with space", ""] {
            let result = ContentEntry::from_value(json!({"slug": slug, "title": "T"}));
            assert!(result.is_err(), "slug {slug:?} should be rejected");
        }
    }

    #[test]
    fn test_description_prefers_excerpt() {
        let entry = ContentEntry::from_value(json!({
            "slug": "a", "title": "A", "excerpt": "Short", "seoDescription": "Long"
        }))
        .unwrap();
        assert_eq!(entry.description(), "Short");

        let entry = ContentEntry::from_value(json!({
            "slug": "a", "title": "A", "excerpt": "", "seoDescription": "Long"
        }))
        .unwrap();
        assert_eq!(entry.description(), "Long");
    }

    #[test]
    fn test_keywords_sources() {
        let entry = ContentEntry::from_value(json!({
            "slug": "a", "title": "A", "seoKeywords": "NCLEX, OSCE", "keywords": ["ignored"]
        }))
        .unwrap();
        assert_eq!(entry.keywords_text(), "NCLEX, OSCE");
        assert_eq!(entry.keyword_list(), vec!["ignored"]);

        let entry = ContentEntry::from_value(json!({
            "slug": "a", "title": "A", "keywords": ["NCLEX", " ", "AHPRA"]
        }))
        .unwrap();
        assert_eq!(entry.keywords_text(), "NCLEX, AHPRA");

        let entry = ContentEntry::from_value(json!({"slug": "a", "title": "A", "tags": ["OBA"]})).unwrap();
        assert_eq!(entry.keyword_list(), vec!["OBA"]);

        let entry = ContentEntry::from_value(json!({"slug": "a", "title": "A", "seoKeywords": "x, y"})).unwrap();
        assert_eq!(entry.keyword_list(), vec!["x", "y"]);
    }

    #[test]
    fn test_null_keywords_accepted() {
        let entry = ContentEntry::from_value(json!({"slug": "a", "title": "A", "keywords": null})).unwrap();
        assert!(entry.keyword_list().is_empty());
    }

    #[test]
    fn test_word_count() {
        let entry =
            ContentEntry::from_value(json!({"slug": "a", "title": "A", "content": "one two\nthree"})).unwrap();
        assert_eq!(entry.word_count(), Some(3));
    }

    #[test]
    fn test_load_entries_requires_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        std::fs::write(&path, r#"{"slug": "a"}"#).unwrap();
        assert!(matches!(load_entries(&path), Err(Error::ContentLoad(_))));

        std::fs::write(&path, r#"[{"slug": "a", "title": "Alpha"}, {"slug": "b"}]"#).unwrap();
        assert_eq!(load_entries(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_load_entries_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_entries(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
