//! Editable HTML document.
//!
//! The base document is parsed once with scraper (html5ever). Each edit
//! session borrows the parsed tree, records edits against node ids, and
//! applies them while serializing, so one parse serves any number of
//! derived documents.

use std::collections::{HashMap, HashSet};

use ego_tree::NodeId;
use ego_tree::iter::Edge;
use nai_core::Error;
use scraper::node::{Doctype, Element};
use scraper::{Html, Node, Selector};

use super::escape::escape_html;

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are serialized verbatim.
const RAW_TEXT_ELEMENTS: &[&str] =
    &["script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript"];

/// Elements whose leading newline is eaten by the parser.
const NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

/// Local name of an HTML-namespace element. Foreign elements (SVG, MathML)
/// get none, so they never match the void or raw-text tables.
fn html_name(element: &Element) -> Option<&str> {
    (&*element.name.ns == HTML_NS).then(|| element.name())
}

/// Attribute name as written in markup, with its namespace prefix restored.
fn attr_name(ns: &str, local: &str) -> String {
    match ns {
        XML_NS => format!("xml:{local}"),
        XMLNS_NS if local != "xmlns" => format!("xmlns:{local}"),
        XLINK_NS => format!("xlink:{local}"),
        _ => local.to_string(),
    }
}

fn write_doctype(out: &mut String, doctype: &Doctype) {
    out.push_str("<!DOCTYPE ");
    out.push_str(doctype.name());
    let (public_id, system_id) = (doctype.public_id(), doctype.system_id());
    if !public_id.is_empty() {
        out.push_str(&format!(r#" PUBLIC "{public_id}""#));
        if !system_id.is_empty() {
            out.push_str(&format!(r#" "{system_id}""#));
        }
    } else if !system_id.is_empty() {
        out.push_str(&format!(r#" SYSTEM "{system_id}""#));
    }
    out.push('>');
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_html(value));
    out.push('"');
}

fn write_text(out: &mut String, parent: Option<&str>, text: &str) {
    if parent.is_some_and(is_raw_text) {
        out.push_str(text);
    } else {
        out.push_str(&escape_html(text));
    }
}

/// A parser drops one newline right after `<pre>`, so a text that starts
/// with one needs a second to survive a reparse.
fn write_leading_newline(out: &mut String, name: Option<&str>, text: &str) {
    if name.is_some_and(|n| NEWLINE_ELEMENTS.contains(&n)) && text.starts_with('\n') {
        out.push('\n');
    }
}

/// An element created by an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewElement {
    name: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
}

impl NewElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attrs: Vec::new(), text: None }
    }

    /// Add an attribute. Values are escaped on output.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set the text content. Escaped on output unless the element is raw text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attrs {
            write_attr(out, name, value);
        }
        out.push('>');
        if is_void(&self.name) {
            return;
        }
        if let Some(text) = &self.text {
            write_leading_newline(out, Some(self.name.as_str()), text);
            write_text(out, Some(self.name.as_str()), text);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

#[derive(Debug, Default)]
struct Edits {
    attrs: HashMap<NodeId, Vec<(String, String)>>,
    text: HashMap<NodeId, String>,
    after: HashMap<NodeId, Vec<NewElement>>,
    appended: HashMap<NodeId, Vec<NewElement>>,
    removed: HashSet<NodeId>,
}

/// A parsed document that is never mutated.
pub struct BaseDocument {
    html: Html,
}

impl BaseDocument {
    /// Parse a complete HTML document.
    pub fn parse(source: &str) -> Self {
        Self { html: Html::parse_document(source) }
    }

    /// Start an independent edit session over this document.
    pub fn edit(&self) -> EditableDocument<'_> {
        EditableDocument { html: &self.html, edits: Edits::default() }
    }
}

/// A borrowed base document plus the edits to apply when it is serialized.
pub struct EditableDocument<'a> {
    html: &'a Html,
    edits: Edits,
}

impl EditableDocument<'_> {
    /// Ids of the elements matching a CSS selector, in document order.
    ///
    /// Elements inside a removed subtree are not returned.
    pub fn select(&self, css: &str) -> Result<Vec<NodeId>, Error> {
        let selector = Selector::parse(css).map_err(|e| Error::HtmlRewrite(format!("bad selector {css}: {e}")))?;
        Ok(self
            .html
            .select(&selector)
            .map(|el| el.id())
            .filter(|id| !self.is_detached(*id))
            .collect())
    }

    fn is_detached(&self, id: NodeId) -> bool {
        let removed = &self.edits.removed;
        removed.contains(&id)
            || self
                .html
                .tree
                .get(id)
                .is_some_and(|node| node.ancestors().any(|a| removed.contains(&a.id())))
    }

    /// First element matching a CSS selector.
    pub fn select_first(&self, css: &str) -> Result<Option<NodeId>, Error> {
        Ok(self.select(css)?.into_iter().next())
    }

    /// The `<head>` element. html5ever always creates one.
    pub fn head(&self) -> Result<NodeId, Error> {
        self.select_first("head")?
            .ok_or_else(|| Error::HtmlRewrite("document has no <head>".into()))
    }

    /// Current value of an attribute, including pending edits.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        if let Some((_, value)) = self
            .edits
            .attrs
            .get(&id)
            .and_then(|attrs| attrs.iter().find(|(n, _)| n == name))
        {
            return Some(value.as_str());
        }
        self.html.tree.get(id)?.value().as_element()?.attr(name)
    }

    /// Set an attribute on an existing element, adding it if absent.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let attrs = self.edits.attrs.entry(id).or_default();
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => attrs.push((name.to_string(), value)),
        }
    }

    /// Replace every child of an element with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.edits.text.insert(id, text.into());
    }

    /// Insert a new element immediately after an existing node.
    ///
    /// Multiple insertions after the same node keep their call order.
    pub fn insert_after(&mut self, id: NodeId, element: NewElement) {
        self.edits.after.entry(id).or_default().push(element);
    }

    /// Append a new element as the last child of an existing element.
    pub fn append_child(&mut self, id: NodeId, element: NewElement) {
        self.edits.appended.entry(id).or_default().push(element);
    }

    /// Drop a node and its subtree from the output.
    pub fn remove(&mut self, id: NodeId) {
        self.edits.removed.insert(id);
    }

    /// Serialize the document with all edits applied.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        // Subtree whose descendants are not written (removed, or text replaced).
        let mut skip: Option<NodeId> = None;

        for edge in self.html.tree.root().traverse() {
            match edge {
                Edge::Open(node) => {
                    if skip.is_some() {
                        continue;
                    }
                    let id = node.id();
                    if self.edits.removed.contains(&id) {
                        skip = Some(id);
                        continue;
                    }
                    match node.value() {
                        Node::Doctype(doctype) => write_doctype(&mut out, doctype),
                        Node::Comment(comment) => {
                            out.push_str("<!--");
                            out.push_str(comment);
                            out.push_str("-->");
                        }
                        Node::Text(text) => {
                            let parent = node.parent().and_then(|p| p.value().as_element()).and_then(html_name);
                            write_text(&mut out, parent, text);
                        }
                        Node::Element(element) => {
                            self.write_start_tag(&mut out, id, element);
                            let name = html_name(element);
                            if let Some(text) = self.edits.text.get(&id) {
                                if !name.is_some_and(is_void) {
                                    write_leading_newline(&mut out, name, text);
                                    write_text(&mut out, name, text);
                                }
                                skip = Some(id);
                            } else if let Some(Node::Text(text)) = node.first_child().map(|c| c.value()) {
                                write_leading_newline(&mut out, name, text);
                            }
                        }
                        _ => {}
                    }
                }
                Edge::Close(node) => {
                    let id = node.id();
                    if let Some(skipped) = skip {
                        if skipped != id {
                            continue;
                        }
                        skip = None;
                        if self.edits.removed.contains(&id) {
                            self.write_after(&mut out, id);
                            continue;
                        }
                    }
                    if let Node::Element(element) = node.value()
                        && !html_name(element).is_some_and(is_void)
                    {
                        if let Some(children) = self.edits.appended.get(&id) {
                            for child in children {
                                child.write(&mut out);
                            }
                        }
                        out.push_str("</");
                        out.push_str(element.name());
                        out.push('>');
                    }
                    self.write_after(&mut out, id);
                }
            }
        }

        out
    }

    fn write_start_tag(&self, out: &mut String, id: NodeId, element: &Element) {
        let overrides = self.edits.attrs.get(&id);
        out.push('<');
        out.push_str(element.name());
        for (name, value) in element.attrs.iter() {
            let local: &str = &name.local;
            let value = overrides
                .filter(|_| name.ns.is_empty())
                .and_then(|o| o.iter().find(|(n, _)| n == local))
                .map_or(&**value, |(_, v)| v.as_str());
            write_attr(out, &attr_name(&name.ns, local), value);
        }
        if let Some(overrides) = overrides {
            for (name, value) in overrides {
                if element.attr(name).is_none() {
                    write_attr(out, name, value);
                }
            }
        }
        out.push('>');
    }

    fn write_after(&self, out: &mut String, id: NodeId) {
        if let Some(siblings) = self.edits.after.get(&id) {
            for sibling in siblings {
                sibling.write(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Placeholder</title>
<meta name="description" content="Base description">
<script type="module" src="/assets/js/index.js"></script>
</head>
<body><div id="root"></div></body>
</html>"#;

    #[test]
    fn test_unedited_roundtrip_keeps_structure() {
        let base = BaseDocument::parse(BASE);
        let doc = base.edit();
        let out = doc.serialize();
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains("<title>Placeholder</title>"));
        assert!(out.contains(r#"<meta charset="UTF-8">"#));
        assert!(!out.contains("</meta>"));
        assert!(out.contains(r#"<div id="root"></div>"#));
        assert!(out.contains("</head>"));
        assert!(out.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_unedited_roundtrip_is_byte_identical() {
        let source = concat!(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#,
            r#"<html lang="en"><head><meta name="viewport" content="width=device-width"><title>t</title></head>"#,
            r##"<body><svg viewBox="0 0 8 8"><use xlink:href="#icon"></use></svg>"##,
            "<pre>\n\nkeep</pre><textarea>\n\nnote</textarea></body></html>",
        );
        assert_eq!(BaseDocument::parse(source).edit().serialize(), source);
    }

    #[test]
    fn test_system_only_doctype_keeps_id() {
        let source = r#"<!DOCTYPE html SYSTEM "about:legacy-compat"><html><head></head><body></body></html>"#;
        assert_eq!(BaseDocument::parse(source).edit().serialize(), source);
    }

    #[test]
    fn test_set_text_on_pre_keeps_leading_newline() {
        let base = BaseDocument::parse("<html><head></head><body><pre>old</pre></body></html>");
        let mut doc = base.edit();
        let pre = doc.select_first("pre").unwrap().unwrap();
        doc.set_text(pre, "\nfirst");
        let out = doc.serialize();
        assert!(out.contains("<pre>\n\nfirst</pre>"));

        let reparsed = scraper::Html::parse_document(&out);
        let pre = reparsed.select(&Selector::parse("pre").unwrap()).next().unwrap();
        assert_eq!(pre.text().collect::<String>(), "\nfirst");
    }

    #[test]
    fn test_set_text_replaces_and_escapes() {
        let base = BaseDocument::parse(BASE);
        let mut doc = base.edit();
        let title = doc.select_first("title").unwrap().unwrap();
        doc.set_text(title, "A & B <c>");
        let out = doc.serialize();
        assert!(out.contains("<title>A &amp; B &lt;c&gt;</title>"));
        assert!(!out.contains("Placeholder"));
    }

    #[test]
    fn test_set_attr_overrides_existing_value() {
        let base = BaseDocument::parse(BASE);
        let mut doc = base.edit();
        let meta = doc.select_first(r#"meta[name="description"]"#).unwrap().unwrap();
        doc.set_attr(meta, "content", r#"say "hi""#);
        assert_eq!(doc.attr(meta, "content"), Some(r#"say "hi""#));
        let out = doc.serialize();
        assert!(out.contains("content=\"say &quot;hi&quot;\""));
        assert!(!out.contains("Base description"));
    }

    #[test]
    fn test_insert_after_and_append_child() {
        let base = BaseDocument::parse(BASE);
        let mut doc = base.edit();
        let meta = doc.select_first(r#"meta[name="description"]"#).unwrap().unwrap();
        let head = doc.head().unwrap();
        doc.insert_after(meta, NewElement::new("meta").attr("name", "keywords").attr("content", "nclex"));
        doc.append_child(head, NewElement::new("script").attr("type", "application/ld+json").text("{\"a\":1}"));
        let out = doc.serialize();

        let description = out.find("Base description").unwrap();
        let keywords = out.find(r#"<meta name="keywords" content="nclex">"#).unwrap();
        let json = out.find(r#"<script type="application/ld+json">{"a":1}</script>"#).unwrap();
        let head_end = out.find("</head>").unwrap();
        assert!(description < keywords);
        assert!(json < head_end);
        assert_eq!(&out[json..head_end], r#"<script type="application/ld+json">{"a":1}</script>"#);
    }

    #[test]
    fn test_remove_drops_subtree() {
        let base = BaseDocument::parse(BASE);
        let mut doc = base.edit();
        let script = doc.select_first("head script").unwrap().unwrap();
        doc.remove(script);
        assert!(doc.select("head script").unwrap().is_empty());
        assert!(!doc.serialize().contains("index.js"));
    }

    #[test]
    fn test_raw_text_is_not_escaped() {
        let base = BaseDocument::parse("<html><head><script>if (a < b && c) {}</script></head><body></body></html>");
        assert!(base.edit().serialize().contains("<script>if (a < b && c) {}</script>"));
    }

    #[test]
    fn test_edit_sessions_are_independent() {
        let base = BaseDocument::parse(BASE);
        let mut first = base.edit();
        let title = first.select_first("title").unwrap().unwrap();
        first.set_text(title, "First");
        let second = base.edit();
        assert!(first.serialize().contains("<title>First</title>"));
        assert!(second.serialize().contains("<title>Placeholder</title>"));
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let base = BaseDocument::parse(BASE);
        let mut doc = base.edit();
        let title = doc.select_first("title").unwrap().unwrap();
        doc.set_text(title, "Same");
        assert_eq!(doc.serialize(), doc.serialize());
    }

    #[test]
    fn test_bad_selector_is_an_error() {
        let base = BaseDocument::parse(BASE);
        let doc = base.edit();
        assert!(matches!(doc.select("meta[["), Err(Error::HtmlRewrite(_))));
    }
}
