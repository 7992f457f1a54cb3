// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rendered element tree.
//!
//! A [`Document`] owns the parsed markup and the style rules that apply to it.
//! Validators receive an [`Element`], a cheap borrowed handle that offers the
//! DOM queries they need. Query helpers never fail: an unparsable selector is
//! logged and matches nothing, so every check stays a total function over
//! arbitrary markup.

use crate::error::{EngineError, Result};
use crate::style::StyleSheet;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Parsed markup plus its stylesheet
pub struct Document {
    html: Html,
    stylesheet: StyleSheet,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("rules", &self.stylesheet.len())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Parse a rendered snapshot. Rules from every `<style>` element are collected.
    pub fn parse(markup: &str) -> Self {
        Self::with_stylesheet(markup, "")
    }

    /// Parse a snapshot and append caller-supplied stylesheet text after the
    /// document's own `<style>` rules.
    pub fn with_stylesheet(markup: &str, css: &str) -> Self {
        let html = Html::parse_document(markup);
        let style_sel = Selector::parse("style").expect("valid selector");

        let mut source: String = html
            .select(&style_sel)
            .map(|s| s.text().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        if !css.is_empty() {
            source.push('\n');
            source.push_str(css);
        }

        Self {
            stylesheet: StyleSheet::parse(&source),
            html,
        }
    }

    pub fn stylesheet(&self) -> &StyleSheet {
        &self.stylesheet
    }

    /// The `<html>` element
    pub fn root(&self) -> Element<'_> {
        Element::new(self, self.html.root_element())
    }

    /// First element child of `<body>`, the implicit component under test
    pub fn body_component(&self) -> Result<Element<'_>> {
        self.root()
            .query("body")
            .and_then(|body| body.children().into_iter().next())
            .ok_or_else(|| EngineError::ElementNotFound("body > *".to_string()))
    }

    /// Select the component under test. An empty selector picks the first
    /// element child of `<body>`.
    pub fn component(&self, selector: &str) -> Result<Element<'_>> {
        if selector.trim().is_empty() {
            return self.body_component();
        }
        let sel = Selector::parse(selector)
            .map_err(|_| EngineError::InvalidSelector(selector.to_string()))?;
        self.html
            .select(&sel)
            .next()
            .map(|el| Element::new(self, el))
            .ok_or_else(|| EngineError::ElementNotFound(selector.to_string()))
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Element<'_>> {
        if id.is_empty() {
            return None;
        }
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().id() == Some(id))
            .map(|el| Element::new(self, el))
    }
}

/// Compile a selector, logging and discarding invalid ones
pub(crate) fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(_) => {
            warn!("Ignoring unparsable selector: {}", selector);
            None
        }
    }
}

/// Borrowed element handle
#[derive(Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    el: ElementRef<'a>,
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}", self.tag())?;
        if let Some(id) = self.id() {
            write!(f, " id=\"{}\"", id)?;
        }
        write!(f, ">")
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Element<'_> {}

/// Stable identity of an element within its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementKey(usize);

impl<'a> Element<'a> {
    fn new(doc: &'a Document, el: ElementRef<'a>) -> Self {
        Self { doc, el }
    }

    pub fn key(&self) -> ElementKey {
        ElementKey(self.el.value() as *const scraper::node::Element as usize)
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Lowercase tag name
    pub fn tag(&self) -> &'a str {
        self.el.value().name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.el.value().attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Attribute value, trimmed, if present and non-empty
    pub fn non_empty_attr(&self, name: &str) -> Option<&'a str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn id(&self) -> Option<&'a str> {
        self.el.value().id()
    }

    pub fn classes(&self) -> Vec<&'a str> {
        self.el.value().classes().collect()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.el.value().classes().any(|c| c == class)
    }

    /// All `(name, value)` attribute pairs
    pub fn attrs(&self) -> Vec<(&'a str, &'a str)> {
        self.el.value().attrs().collect()
    }

    /// Whitespace-normalized text of the element and its descendants
    pub fn text_content(&self) -> String {
        normalize_whitespace(&self.el.text().collect::<String>())
    }

    /// Whitespace-normalized text of direct text children only
    pub fn own_text(&self) -> String {
        let own: String = self
            .el
            .children()
            .filter_map(|n| n.value().as_text().map(|t| String::from(&**t)))
            .collect();
        normalize_whitespace(&own)
    }

    /// Descendants matching `selector` in document order (self excluded)
    pub fn query_all(&self, selector: &str) -> Vec<Element<'a>> {
        let doc = self.doc;
        match compile(selector) {
            Some(sel) => self.el.select(&sel).map(|el| Element::new(doc, el)).collect(),
            None => Vec::new(),
        }
    }

    pub fn query(&self, selector: &str) -> Option<Element<'a>> {
        let sel = compile(selector)?;
        self.el.select(&sel).next().map(|el| Element::new(self.doc, el))
    }

    /// Self (if matching) followed by matching descendants
    pub fn query_all_inclusive(&self, selector: &str) -> Vec<Element<'a>> {
        let mut found = Vec::new();
        if self.matches(selector) {
            found.push(*self);
        }
        found.extend(self.query_all(selector));
        found
    }

    pub fn matches(&self, selector: &str) -> bool {
        compile(selector).is_some_and(|sel| sel.matches(&self.el))
    }

    pub(crate) fn matches_compiled(&self, selector: &Selector) -> bool {
        selector.matches(&self.el)
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, selector: &str) -> Option<Element<'a>> {
        let sel = compile(selector)?;
        let mut current = Some(*self);
        while let Some(el) = current {
            if sel.matches(&el.el) {
                return Some(el);
            }
            current = el.parent();
        }
        None
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        self.el
            .parent()
            .and_then(ElementRef::wrap)
            .map(|el| Element::new(self.doc, el))
    }

    /// Ancestors from parent up to the root
    pub fn ancestors(&self) -> Vec<Element<'a>> {
        let mut chain = Vec::new();
        let mut current = self.parent();
        while let Some(el) = current {
            chain.push(el);
            current = el.parent();
        }
        chain
    }

    /// Element children
    pub fn children(&self) -> Vec<Element<'a>> {
        let doc = self.doc;
        self.el
            .children()
            .filter_map(ElementRef::wrap)
            .map(|el| Element::new(doc, el))
            .collect()
    }

    /// Element siblings, excluding self, in document order
    pub fn siblings(&self) -> Vec<Element<'a>> {
        match self.parent() {
            Some(parent) => parent.children().into_iter().filter(|c| c != self).collect(),
            None => Vec::new(),
        }
    }

    pub fn next_element_sibling(&self) -> Option<Element<'a>> {
        self.el
            .next_siblings()
            .find_map(ElementRef::wrap)
            .map(|el| Element::new(self.doc, el))
    }

    /// Look up an element anywhere in the owning document
    pub fn get_element_by_id(&self, id: &str) -> Option<Element<'a>> {
        self.doc.get_element_by_id(id)
    }

    /// Ids from a whitespace-separated reference list (`aria-controls`,
    /// `aria-labelledby`, ...) that do not resolve in the document
    pub fn missing_references<'r>(&self, ids: &'r str) -> Vec<&'r str> {
        ids.split_whitespace()
            .filter(|id| self.doc.get_element_by_id(id).is_none())
            .collect()
    }

    /// Outer HTML, shortened for messages
    pub fn snippet(&self) -> String {
        let html = self.el.html();
        match html.char_indices().nth(80) {
            Some((idx, _)) => format!("{}...", &html[..idx]),
            None => html,
        }
    }
}

/// Collapse runs of whitespace and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP: &str = r#"<!DOCTYPE html>
<html><head><style>.card { color: #111111; }</style></head>
<body>
  <section class="card featured" id="c1">
    <h2>Title <span>inner</span></h2>
    <label for="email">Email</label>
    <input id="email" type="email">
    <ul><li><a href="/a">A</a></li><li><a href="/b">B</a></li></ul>
  </section>
</body></html>"#;

    #[test]
    fn test_body_component_is_first_child() {
        let doc = Document::parse(MARKUP);
        let component = doc.body_component().unwrap();
        assert_eq!(component.tag(), "section");
        assert!(component.has_class("featured"));
        assert_eq!(component.classes(), vec!["card", "featured"]);
    }

    #[test]
    fn test_component_selector() {
        let doc = Document::parse(MARKUP);
        assert_eq!(doc.component("#c1").unwrap().tag(), "section");
        assert!(matches!(
            doc.component("#missing"),
            Err(EngineError::ElementNotFound(_))
        ));
        assert!(matches!(
            doc.component("[[["),
            Err(EngineError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_queries_and_traversal() {
        let doc = Document::parse(MARKUP);
        let component = doc.body_component().unwrap();
        let links = component.query_all("a[href]");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].closest("ul").unwrap().tag(), "ul");
        assert_eq!(links[0].parent().unwrap().tag(), "li");
        assert_eq!(links[0].parent().unwrap().siblings().len(), 1);
        assert!(component.matches("section.card"));
        assert_eq!(component.query_all_inclusive(".card").len(), 1);
    }

    #[test]
    fn test_text_helpers() {
        let doc = Document::parse(MARKUP);
        let heading = doc.root().query("h2").unwrap();
        assert_eq!(heading.text_content(), "Title inner");
        assert_eq!(heading.own_text(), "Title");
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = Document::parse(MARKUP);
        let component = doc.body_component().unwrap();
        assert!(component.query_all("a[").is_empty());
        assert!(component.query("::::").is_none());
        assert!(!component.matches("(("));
    }

    #[test]
    fn test_missing_references() {
        let doc = Document::parse(MARKUP);
        let component = doc.body_component().unwrap();
        assert_eq!(component.missing_references("email panelX"), vec!["panelX"]);
        assert!(component.missing_references("  ").is_empty());
    }

    #[test]
    fn test_get_element_by_id() {
        let doc = Document::parse(MARKUP);
        assert_eq!(doc.get_element_by_id("email").unwrap().tag(), "input");
        assert!(doc.get_element_by_id("nope").is_none());
        assert!(doc.get_element_by_id("").is_none());
    }

    #[test]
    fn test_style_rules_collected() {
        let doc = Document::with_stylesheet(MARKUP, "a { color: red; }");
        assert_eq!(doc.stylesheet().len(), 2);
    }
}
