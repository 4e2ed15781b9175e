//! Metadata injection into one edit session of the base document.

use nai_core::{Error, PrerenderConfig};

use super::jsonld::{BlogPosting, BreadcrumbList, script_text};
use super::metadata::PageMeta;
use crate::html::{BaseDocument, EditableDocument, NewElement};

/// Which attribute names a meta tag: `name` for SEO and Twitter, `property` for Open Graph.
#[derive(Debug, Clone, Copy)]
enum Key {
    Name,
    Property,
}

impl Key {
    fn attr(self) -> &'static str {
        match self {
            Key::Name => "name",
            Key::Property => "property",
        }
    }
}

fn meta_selector(key: Key, value: &str) -> String {
    format!(r#"meta[{}="{value}"]"#, key.attr())
}

fn meta_tag(key: Key, value: &str, content: &str) -> NewElement {
    NewElement::new("meta").attr(key.attr(), value).attr("content", content)
}

/// Tag placement and overwrite helpers over one edit session.
struct Injector<'d, 'a> {
    doc: &'d mut EditableDocument<'a>,
    head: ego_tree::NodeId,
}

impl Injector<'_, '_> {
    /// Set `content` on every matching tag. Returns false when none exist.
    fn update_all(&mut self, key: Key, value: &str, content: &str) -> Result<bool, Error> {
        let ids = self.doc.select(&meta_selector(key, value))?;
        for id in &ids {
            self.doc.set_attr(*id, "content", content);
        }
        Ok(!ids.is_empty())
    }

    /// Update every matching tag, or append one to `<head>`.
    fn upsert(&mut self, key: Key, value: &str, content: &str) -> Result<(), Error> {
        if !self.update_all(key, value, content)? {
            self.doc.append_child(self.head, meta_tag(key, value, content));
        }
        Ok(())
    }

    fn remove_all(&mut self, key: Key, value: &str) -> Result<(), Error> {
        for id in self.doc.select(&meta_selector(key, value))? {
            self.doc.remove(id);
        }
        Ok(())
    }

    fn title(&mut self, title: &str) -> Result<(), Error> {
        match self.doc.select_first("head title")? {
            Some(id) => self.doc.set_text(id, title),
            None => self.doc.append_child(self.head, NewElement::new("title").text(title)),
        }
        Ok(())
    }

    /// Description first, keywords directly after the existing description tag if there is one.
    fn seo(&mut self, meta: &PageMeta) -> Result<(), Error> {
        let description = self.doc.select_first(&meta_selector(Key::Name, "description"))?;
        self.upsert(Key::Name, "description", &meta.description)?;

        if self.update_all(Key::Name, "keywords", &meta.keywords)? {
            return Ok(());
        }
        let tag = meta_tag(Key::Name, "keywords", &meta.keywords);
        match description {
            Some(id) => self.doc.insert_after(id, tag),
            None => self.doc.append_child(self.head, tag),
        }
        Ok(())
    }

    fn open_graph(&mut self, meta: &PageMeta) -> Result<(), Error> {
        self.upsert(Key::Property, "og:title", &meta.title)?;
        self.upsert(Key::Property, "og:description", &meta.description)?;
        self.upsert(Key::Property, "og:url", &meta.url)?;
        self.upsert(Key::Property, "og:image", &meta.image)?;
        self.update_all(Key::Property, "og:image:secure_url", &meta.image)?;
        self.upsert(Key::Property, "og:type", "article")?;
        Ok(())
    }

    fn twitter(&mut self, meta: &PageMeta) -> Result<(), Error> {
        self.upsert(Key::Name, "twitter:title", &meta.title)?;
        self.upsert(Key::Name, "twitter:description", &meta.description)?;
        self.update_all(Key::Name, "twitter:url", &meta.url)?;
        self.upsert(Key::Name, "twitter:image", &meta.image)?;
        Ok(())
    }

    fn canonical(&mut self, url: &str) -> Result<(), Error> {
        let links = self.doc.select(r#"link[rel="canonical"]"#)?;
        if links.is_empty() {
            self.doc
                .append_child(self.head, NewElement::new("link").attr("rel", "canonical").attr("href", url));
        }
        for id in links {
            self.doc.set_attr(id, "href", url);
        }
        Ok(())
    }

    fn article(&mut self, meta: &PageMeta) -> Result<(), Error> {
        match &meta.date {
            Some(date) => {
                self.upsert(Key::Property, "article:published_time", date)?;
                self.upsert(Key::Property, "article:modified_time", date)?;
            }
            None => {
                self.remove_all(Key::Property, "article:published_time")?;
                self.remove_all(Key::Property, "article:modified_time")?;
            }
        }
        self.upsert(Key::Property, "article:section", &meta.section)?;

        self.remove_all(Key::Property, "article:tag")?;
        for keyword in &meta.keyword_list {
            self.doc.append_child(self.head, meta_tag(Key::Property, "article:tag", keyword));
        }
        Ok(())
    }

    fn structured_data(&mut self, meta: &PageMeta, config: &PrerenderConfig) -> Result<(), Error> {
        let breadcrumbs = script_text(&BreadcrumbList::new(meta, config))?;
        let posting = script_text(&BlogPosting::new(meta, config))?;
        for text in [breadcrumbs, posting] {
            self.doc
                .append_child(self.head, NewElement::new("script").attr("type", "application/ld+json").text(text));
        }
        Ok(())
    }
}

/// Produce the derived document for one entry.
///
/// The base document is only borrowed; every call starts from the same
/// unmodified tree.
pub fn render(base: &BaseDocument, meta: &PageMeta, config: &PrerenderConfig) -> Result<String, Error> {
    let mut doc = base.edit();
    let head = doc.head()?;
    let mut injector = Injector { doc: &mut doc, head };

    injector.title(&meta.title)?;
    injector.seo(meta)?;
    injector.open_graph(meta)?;
    injector.twitter(meta)?;
    injector.canonical(&meta.url)?;
    injector.article(meta)?;
    injector.structured_data(meta, config)?;

    Ok(doc.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prerender::entry::ContentEntry;
    use serde_json::{Value, json};

    const BASE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Placeholder</title>
<meta name="description" content="Base description">
<meta property="og:title" content="Base">
<meta property="og:description" content="Base">
<meta property="og:url" content="https://example.com">
<meta property="og:image" content="https://example.com/og-image.png">
<meta property="og:image" content="https://example.com/og-image-2.png">
<meta property="og:image:secure_url" content="https://example.com/og-image.png">
<meta property="og:type" content="website">
<meta name="twitter:title" content="Base">
<meta name="twitter:description" content="Base">
<meta name="twitter:url" content="https://example.com">
<meta name="twitter:image" content="https://example.com/og-image.png">
<meta property="article:tag" content="stale">
<script type="module" src="/assets/js/index.js"></script>
</head>
<body><div id="root"></div></body>
</html>"#;

    fn config() -> PrerenderConfig {
        PrerenderConfig {
            base_url: "https://example.com".into(),
            route_prefix: "news".into(),
            site_name: "Site Name".into(),
            ..Default::default()
        }
    }

    fn render_entry(base: &str, value: Value) -> String {
        let config = config();
        let entry = ContentEntry::from_value(value).unwrap();
        let meta = PageMeta::derive(&entry, &config);
        render(&BaseDocument::parse(base), &meta, &config).unwrap()
    }

    fn sample() -> Value {
        json!({
            "slug": "a",
            "title": "Alpha",
            "excerpt": "About alpha",
            "keywords": ["NCLEX", "OSCE"],
            "image": "/Images/a.webp",
            "date": "2025-01-02",
            "category": "Exams"
        })
    }

    /// `content` (or `href`) of every element matching a selector in the rendered output.
    fn values(html: &str, css: &str, attr: &str) -> Vec<String> {
        let parsed = scraper::Html::parse_document(html);
        let selector = scraper::Selector::parse(css).unwrap();
        parsed
            .select(&selector)
            .filter_map(|el| el.value().attr(attr).map(str::to_string))
            .collect()
    }

    fn content(html: &str, css: &str) -> Vec<String> {
        values(html, css, "content")
    }

    #[test]
    fn test_title_replaced() {
        let html = render_entry(BASE, sample());
        assert!(html.contains("<title>Alpha | Site Name</title>"));
        assert!(!html.contains("Placeholder"));
    }

    #[test]
    fn test_description_and_keywords() {
        let html = render_entry(BASE, sample());
        assert_eq!(content(&html, r#"meta[name="description"]"#), vec!["About alpha"]);
        assert_eq!(content(&html, r#"meta[name="keywords"]"#), vec!["NCLEX, OSCE"]);
        let description = html.find("About alpha").unwrap();
        let keywords = html.find(r#"<meta name="keywords""#).unwrap();
        let og = html.find("og:title").unwrap();
        assert!(description < keywords && keywords < og);
    }

    #[test]
    fn test_keywords_without_description() {
        let base = "<html><head><title>x</title></head><body></body></html>";
        let html = render_entry(base, sample());
        let description = html.find(r#"name="description""#).unwrap();
        let keywords = html.find(r#"name="keywords""#).unwrap();
        assert!(description < keywords);
    }

    #[test]
    fn test_existing_keywords_updated_in_place() {
        let base = r#"<html><head><meta name="keywords" content="old"><title>x</title></head></html>"#;
        let html = render_entry(base, sample());
        assert_eq!(content(&html, r#"meta[name="keywords"]"#), vec!["NCLEX, OSCE"]);
        assert!(html.find(r#"name="keywords""#).unwrap() < html.find("<title>").unwrap());
    }

    #[test]
    fn test_open_graph_tags() {
        let html = render_entry(BASE, sample());
        assert_eq!(content(&html, r#"meta[property="og:title"]"#), vec!["Alpha | Site Name"]);
        assert_eq!(content(&html, r#"meta[property="og:description"]"#), vec!["About alpha"]);
        assert_eq!(content(&html, r#"meta[property="og:url"]"#), vec!["https://example.com/news/a"]);
        assert_eq!(
            content(&html, r#"meta[property="og:image"]"#),
            vec!["https://example.com/Images/a.webp", "https://example.com/Images/a.webp"]
        );
        assert_eq!(
            content(&html, r#"meta[property="og:image:secure_url"]"#),
            vec!["https://example.com/Images/a.webp"]
        );
        assert_eq!(content(&html, r#"meta[property="og:type"]"#), vec!["article"]);
    }

    #[test]
    fn test_twitter_tags() {
        let html = render_entry(BASE, sample());
        assert_eq!(content(&html, r#"meta[name="twitter:title"]"#), vec!["Alpha | Site Name"]);
        assert_eq!(content(&html, r#"meta[name="twitter:description"]"#), vec!["About alpha"]);
        assert_eq!(content(&html, r#"meta[name="twitter:url"]"#), vec!["https://example.com/news/a"]);
        assert_eq!(content(&html, r#"meta[name="twitter:image"]"#), vec!["https://example.com/Images/a.webp"]);
    }

    #[test]
    fn test_missing_tags_inserted_except_twitter_url() {
        let base = "<html><head><title>x</title></head></html>";
        let html = render_entry(base, sample());
        assert!(content(&html, r#"meta[name="twitter:url"]"#).is_empty());
        assert_eq!(content(&html, r#"meta[name="twitter:title"]"#), vec!["Alpha | Site Name"]);
        assert_eq!(content(&html, r#"meta[property="og:image"]"#), vec!["https://example.com/Images/a.webp"]);
        assert!(content(&html, r#"meta[property="og:image:secure_url"]"#).is_empty());
    }

    #[test]
    fn test_canonical_and_article_tags() {
        let html = render_entry(BASE, sample());
        assert_eq!(values(&html, r#"link[rel="canonical"]"#, "href"), vec!["https://example.com/news/a"]);
        assert_eq!(content(&html, r#"meta[property="article:published_time"]"#), vec!["2025-01-02"]);
        assert_eq!(content(&html, r#"meta[property="article:modified_time"]"#), vec!["2025-01-02"]);
        assert_eq!(content(&html, r#"meta[property="article:section"]"#), vec!["Exams"]);
        assert_eq!(content(&html, r#"meta[property="article:tag"]"#), vec!["NCLEX", "OSCE"]);
    }

    #[test]
    fn test_stale_dates_removed_without_entry_date() {
        let base = r#"<html><head><meta property="article:published_time" content="2020-01-01"></head></html>"#;
        let html = render_entry(base, json!({"slug": "a", "title": "Alpha"}));
        assert!(content(&html, r#"meta[property="article:published_time"]"#).is_empty());
        assert!(!html.contains("2020-01-01"));
    }

    #[test]
    fn test_existing_canonical_updated() {
        let base = r#"<html><head><link rel="canonical" href="https://example.com/"></head></html>"#;
        let html = render_entry(base, sample());
        assert_eq!(values(&html, r#"link[rel="canonical"]"#, "href"), vec!["https://example.com/news/a"]);
    }

    #[test]
    fn test_json_ld_placed_last_in_head() {
        let html = render_entry(BASE, sample());
        let breadcrumbs = html.find(r#""@type":"BreadcrumbList""#).unwrap();
        let posting = html.find(r#""@type":"BlogPosting""#).unwrap();
        assert!(breadcrumbs < posting);
        let tail = &html[posting..];
        let head_end = tail.find("</head>").unwrap();
        assert!(tail.find("</script>").unwrap() < head_end);
        assert!(!tail[..head_end].contains("<meta"));
    }

    #[test]
    fn test_escaping() {
        let html = render_entry(BASE, json!({"slug": "e", "title": "Nurse's \"Guide\" & Tips <2025>"}));
        assert!(html.contains("<title>Nurse&#039;s &quot;Guide&quot; &amp; Tips &lt;2025&gt; | Site Name</title>"));
        assert!(html.contains(r#""Nurse&#039;s &quot;Guide&quot; &amp; Tips &lt;2025&gt; | Site Name""#));
        assert_eq!(
            content(&html, r#"meta[property="og:title"]"#),
            vec!["Nurse's \"Guide\" & Tips <2025> | Site Name"]
        );
        assert!(!html.contains("<2025>"));
        assert!(html.contains(r"\u003c2025>"));
    }

    #[test]
    fn test_base_untouched_between_renders() {
        let config = config();
        let base = BaseDocument::parse(BASE);
        let first = ContentEntry::from_value(json!({"slug": "a", "title": "Alpha"})).unwrap();
        let second = ContentEntry::from_value(json!({"slug": "b", "title": "Beta"})).unwrap();

        let a = render(&base, &PageMeta::derive(&first, &config), &config).unwrap();
        let b = render(&base, &PageMeta::derive(&second, &config), &config).unwrap();

        assert!(a.contains("<title>Alpha | Site Name</title>"));
        assert!(b.contains("<title>Beta | Site Name</title>"));
        assert!(!b.contains("Alpha"));
    }
}
