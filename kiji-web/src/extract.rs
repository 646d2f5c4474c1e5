//! Boilerplate-stripping text and link extraction over a parsed DOM.
//!
//! The document is parsed with `scraper` (html5ever underneath), so malformed
//! markup is repaired rather than rejected. Removal happens on the tree
//! before any text is read:
//!
//! 1. elements named in [`REMOVED_TAGS`] together with their subtrees,
//! 2. comment nodes,
//! 3. elements whose class list contains one of [`REMOVED_CLASSES`].
//!
//! What is left is walked once in document order, collecting text nodes and
//! anchor `href`s.

use kiji_common::{ExtractedDocument, RawRecord};
use scraper::node::Element;
use scraper::{Html, Node};
use tracing::debug;

pub const REMOVED_TAGS: &[&str] = &["script", "style", "footer", "header", "nav", "aside", "form"];
pub const REMOVED_CLASSES: &[&str] = &["ad", "advertisement"];

/// Separator placed between adjacent text nodes.
const TEXT_SEPARATOR: &str = " ";

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Decode a raw record's payload and extract it.
    pub fn extract(&self, raw: RawRecord) -> ExtractedDocument {
        let html = raw.decode_payload();
        let (text, links) = self.extract_html(&html);
        ExtractedDocument {
            url: raw.url,
            text,
            links,
        }
    }

    /// Visible text (text nodes joined by a single space) and every anchor
    /// `href`, in document order.
    ///
    /// ```
    /// use kiji_web::HtmlExtractor;
    ///
    /// let (text, links) = HtmlExtractor::new().extract_html(
    ///     r#"<nav><a href="/home">Home</a></nav><p>Body <a href="/next">next</a></p>"#,
    /// );
    /// assert_eq!(text.split_whitespace().collect::<Vec<_>>(), ["Body", "next"]);
    /// assert_eq!(links, ["/next"]);
    /// ```
    pub fn extract_html(&self, html: &str) -> (String, Vec<String>) {
        let mut doc = Html::parse_document(html);
        let removed = prune(&mut doc);

        let mut pieces: Vec<&str> = Vec::new();
        let mut links = Vec::new();
        for node in doc.tree.root().descendants() {
            match node.value() {
                Node::Text(text) => pieces.push(&**text),
                Node::Element(el) if el.name() == "a" => {
                    if let Some(href) = el.attr("href") {
                        links.push(href.to_string());
                    }
                }
                _ => {}
            }
        }

        debug!(removed, text_nodes = pieces.len(), links = links.len(), "web.extract.done");
        (pieces.join(TEXT_SEPARATOR), links)
    }
}

fn is_boilerplate_element(el: &Element) -> bool {
    REMOVED_TAGS.contains(&el.name()) || el.classes().any(|c| REMOVED_CLASSES.contains(&c))
}

/// Detach every boilerplate subtree and comment; returns how many roots were cut.
fn prune(doc: &mut Html) -> usize {
    let doomed: Vec<_> = doc
        .tree
        .root()
        .descendants()
        .filter(|node| match node.value() {
            Node::Comment(_) => true,
            Node::Element(el) => is_boilerplate_element(el),
            _ => false,
        })
        .map(|node| node.id())
        .collect();

    for id in &doomed {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }
    doomed.len()
}
