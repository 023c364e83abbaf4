//! HTML document parsing
//!
//! Wraps the html5ever-backed [`scraper::Html`] tree in a [`DocumentTree`]
//! exposing the handful of queries the extractors need. Parsing is lenient:
//! unclosed tags, missing doctypes, and stray markup all produce a tree.

use crate::CrawlError;
use scraper::node::{Doctype, Element};
use scraper::{ElementRef, Html, Selector};

/// Number of leading bytes inspected when deciding whether a body is binary
const SNIFF_LEN: usize = 1024;

/// A parsed document owned by a single crawl
///
/// The tree is not `Send`; it must be dropped before the crawl awaits again.
pub struct DocumentTree {
    html: Html,
}

impl DocumentTree {
    /// Parses markup into a tree; never fails
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Returns every element with the given tag name, in document order
    pub fn find_all(&self, tag: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(tag) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Counts the elements with the given tag name
    pub fn count(&self, tag: &str) -> usize {
        self.find_all(tag).len()
    }

    /// Text content of the first element with the given tag name
    pub fn first_text(&self, tag: &str) -> Option<String> {
        self.find_all(tag)
            .into_iter()
            .next()
            .map(|element| element.text().collect::<String>())
    }

    /// Values of `attr` on every `tag` element carrying it, in document order
    pub fn attribute_values(&self, tag: &str, attr: &str) -> Vec<&str> {
        self.find_all(tag)
            .into_iter()
            .filter_map(|element| element.value().attr(attr))
            .collect()
    }

    /// Returns true if some `tag` element nested inside an `ancestor` element
    /// satisfies `predicate`
    pub fn has_descendant_within<F>(&self, ancestor: &str, tag: &str, predicate: F) -> bool
    where
        F: Fn(&Element) -> bool,
    {
        self.find_all(tag).into_iter().any(|element| {
            predicate(element.value())
                && element.ancestors().any(|node| {
                    node.value()
                        .as_element()
                        .map(|parent| parent.name() == ancestor)
                        .unwrap_or(false)
                })
        })
    }

    /// Doctype declarations in depth-first, pre-order traversal order
    pub fn doctypes(&self) -> impl Iterator<Item = &Doctype> + '_ {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(|node| node.value().as_doctype())
    }
}

/// Parses a fetched body into a [`DocumentTree`]
///
/// The body is decoded as UTF-8, replacing invalid sequences. A NUL byte
/// near the start of the body marks binary content, which is rejected with
/// `CrawlError::Parse`; everything else yields a tree.
pub fn parse_document(url: &str, body: &[u8]) -> Result<DocumentTree, CrawlError> {
    let head = &body[..body.len().min(SNIFF_LEN)];
    if head.contains(&0) {
        return Err(CrawlError::Parse {
            url: url.to_string(),
            message: "response body is binary, not markup".to_string(),
        });
    }

    let markup = String::from_utf8_lossy(body);
    Ok(DocumentTree::parse(&markup))
}
