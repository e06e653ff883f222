//! Element tree for ActiveSync documents.

use crate::codepage::Codepage;
use serde::{Deserialize, Serialize};

/// A node in a document tree: a child element, inline text, or an
/// opaque byte payload (WBXML `OPAQUE` content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Text content.
    Text(String),
    /// Opaque binary content.
    Opaque(Vec<u8>),
}

/// An element in an ActiveSync document.
///
/// The codepage stands in for the XML namespace: ActiveSync maps each
/// of its namespaces onto one WBXML codepage, so an element is fully
/// identified by `(page, name)`. Decoding normalizes namespace prefixes
/// away; tag names remain queryable through the accessors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Codepage (namespace) this element belongs to.
    pub page: Codepage,
    /// Element name within the codepage.
    pub name: String,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    pub fn new(page: Codepage, name: impl Into<String>) -> Self {
        Self {
            page,
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Create an element with text content.
    pub fn text(page: Codepage, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            page,
            name: name.into(),
            children: vec![Node::Text(value.into())],
        }
    }

    /// Create an element with opaque binary content.
    pub fn opaque(page: Codepage, name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            page,
            name: name.into(),
            children: vec![Node::Opaque(data)],
        }
    }

    /// Append a child element, builder style.
    pub fn with(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append a text child element, builder style.
    pub fn with_text(self, page: Codepage, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(Element::text(page, name, value))
    }

    /// Append a child element only when `child` is `Some`.
    pub fn with_opt(mut self, child: Option<Element>) -> Self {
        if let Some(child) = child {
            self.children.push(Node::Element(child));
        }
        self
    }

    /// Append a child element in place.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// The first child element with the given name, in any codepage.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// All child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// All child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Walk a path of element names from this element.
    ///
    /// Each step takes the first matching child, so the path addresses
    /// one node even when sibling names repeat at other scopes.
    pub fn descendant(&self, path: &[&str]) -> Option<&Element> {
        let mut cur = self;
        for name in path {
            cur = cur.child(name)?;
        }
        Some(cur)
    }

    /// The concatenated text content of this element.
    pub fn value(&self) -> Option<String> {
        let mut out = String::new();
        let mut found = false;
        for node in &self.children {
            if let Node::Text(t) = node {
                out.push_str(t);
                found = true;
            }
        }
        found.then_some(out)
    }

    /// The opaque content of this element, if any.
    pub fn opaque_value(&self) -> Option<&[u8]> {
        self.children.iter().find_map(|n| match n {
            Node::Opaque(b) => Some(b.as_slice()),
            _ => None,
        })
    }

    /// The text content of the first child with the given name.
    pub fn child_value(&self, name: &str) -> Option<String> {
        self.child(name)?.value()
    }

    /// The text content of the first child with the given name, parsed.
    pub fn child_parsed<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.child_value(name)?.trim().parse().ok()
    }

    /// True when the element has no children at all.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
