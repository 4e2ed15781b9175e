//! Values computed once per entry and shared by every injected tag.

use nai_core::PrerenderConfig;
use url::Url;

use super::entry::ContentEntry;

/// Metadata for one derived document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    /// Raw entry title, used as the JSON-LD headline.
    pub headline: String,
    /// `"{title} | {site name}"`.
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub keyword_list: Vec<String>,
    /// Canonical URL of the derived page.
    pub url: String,
    pub image: String,
    pub author: String,
    pub section: String,
    pub date: Option<String>,
    pub word_count: Option<usize>,
}

impl PageMeta {
    pub fn derive(entry: &ContentEntry, config: &PrerenderConfig) -> Self {
        let image = entry
            .image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&config.default_image);

        Self {
            headline: entry.title.clone(),
            title: format!("{} | {}", entry.title, config.site_name),
            description: entry.description().to_string(),
            keywords: entry.keywords_text(),
            keyword_list: entry.keyword_list(),
            url: page_url(config, &entry.slug),
            image: absolute_url(config.site_url(), image),
            author: non_blank(entry.author.as_deref()).unwrap_or(&config.default_author).to_string(),
            section: non_blank(entry.category.as_deref()).unwrap_or(&config.default_section).to_string(),
            date: non_blank(entry.date.as_deref()).map(str::to_string),
            word_count: entry.word_count(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// `{site}/{route}/{slug}`, or `{site}/{slug}` when the route is empty.
pub fn page_url(config: &PrerenderConfig, slug: &str) -> String {
    format!("{}/{slug}", listing_url(config))
}

/// URL of the listing page that owns the content route.
pub fn listing_url(config: &PrerenderConfig) -> String {
    let route = config.route();
    if route.is_empty() {
        config.site_url().to_string()
    } else {
        format!("{}/{route}", config.site_url())
    }
}

/// Keep `http(s)` URLs, resolve everything else against the site URL.
///
/// Protocol-relative references (`//cdn.example.net/a.png`) keep their own
/// host. A site URL that does not parse leaves the reference untouched.
pub fn absolute_url(site_url: &str, path: &str) -> String {
    if path.starts_with("https://") || path.starts_with("http://") {
        return path.to_string();
    }
    match Url::parse(&format!("{site_url}/")).and_then(|base| base.join(path)) {
        Ok(url) => url.into(),
        Err(e) => {
            tracing::warn!("cannot resolve {path} against {site_url}: {e}");
            path.to_string()
        }
    }
}
