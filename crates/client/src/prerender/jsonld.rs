//! schema.org structured data embedded in derived documents.

use nai_core::{Error, PrerenderConfig};
use serde::Serialize;

use super::metadata::{PageMeta, absolute_url, listing_url};

const CONTEXT: &str = "https://schema.org";

#[derive(Debug, Serialize)]
struct Organization<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logo: Option<ImageObject>,
}

#[derive(Debug, Serialize)]
struct ImageObject {
    #[serde(rename = "@type")]
    kind: &'static str,
    url: String,
}

#[derive(Debug, Serialize)]
struct WebPage<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    #[serde(rename = "@id")]
    id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPosting<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    headline: &'a str,
    description: &'a str,
    image: &'a str,
    author: Organization<'a>,
    publisher: Organization<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_published: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_modified: Option<&'a str>,
    main_entity_of_page: WebPage<'a>,
    keywords: &'a str,
    article_section: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    word_count: Option<usize>,
}

impl<'a> BlogPosting<'a> {
    pub fn new(meta: &'a PageMeta, config: &'a PrerenderConfig) -> Self {
        let site_url = config.site_url();
        Self {
            context: CONTEXT,
            kind: "BlogPosting",
            headline: &meta.headline,
            description: &meta.description,
            image: &meta.image,
            author: Organization { kind: "Organization", name: &meta.author, url: Some(site_url), logo: None },
            publisher: Organization {
                kind: "Organization",
                name: &config.site_name,
                url: None,
                logo: Some(ImageObject { kind: "ImageObject", url: absolute_url(site_url, &config.publisher_logo) }),
            },
            date_published: meta.date.as_deref(),
            date_modified: meta.date.as_deref(),
            main_entity_of_page: WebPage { kind: "WebPage", id: &meta.url },
            keywords: &meta.keywords,
            article_section: &meta.section,
            word_count: meta.word_count,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListItem {
    #[serde(rename = "@type")]
    kind: &'static str,
    position: usize,
    name: String,
    item: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbList {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    item_list_element: Vec<ListItem>,
}

impl BreadcrumbList {
    /// Home, then the listing page, then the post itself.
    pub fn new(meta: &PageMeta, config: &PrerenderConfig) -> Self {
        let crumbs = [
            ("Home".to_string(), config.site_url().to_string()),
            (config.listing_name.clone(), listing_url(config)),
            (meta.headline.clone(), meta.url.clone()),
        ];
        Self {
            context: CONTEXT,
            kind: "BreadcrumbList",
            item_list_element: crumbs
                .into_iter()
                .enumerate()
                .map(|(i, (name, item))| ListItem { kind: "ListItem", position: i + 1, name, item })
                .collect(),
        }
    }
}

/// Serialize a value for a `<script type="application/ld+json">` body.
///
/// `<` is written as `\u003c` so the text can never close the script element.
pub fn script_text<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_string(value).map_err(|e| Error::HtmlRewrite(format!("json-ld: {e}")))?;
    Ok(json.replace('<', "\\u003c"))
}
