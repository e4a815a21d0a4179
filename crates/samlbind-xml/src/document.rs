#![forbid(unsafe_code)]

//! Parsing XML text into the owned element tree via roxmltree.

use std::sync::Arc;

use samlbind_core::{ns, Error};

use crate::element::{Attribute, Element, Node, Origin};
use crate::namespace::NsDecl;
use crate::qname::QName;

/// A parsed document: the root element plus the text it was parsed from.
pub struct XmlDocument {
    text: Arc<str>,
    root: Element,
}

impl XmlDocument {
    /// Parse and validate XML from a string.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let text: Arc<str> = Arc::from(text);
        let root = parse_shared(&text)?;
        Ok(Self { text, root })
    }

    /// Parse and validate XML from bytes.
    pub fn parse_bytes(data: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))?;
        Self::parse(text)
    }

    /// The raw XML text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }
}

/// Parse XML text and return its root element.
pub fn parse(text: &str) -> Result<Element, Error> {
    Ok(XmlDocument::parse(text)?.into_root())
}

/// Parse XML bytes and return its root element.
pub fn parse_bytes(data: &[u8]) -> Result<Element, Error> {
    Ok(XmlDocument::parse_bytes(data)?.into_root())
}

fn parse_shared(text: &Arc<str>) -> Result<Element, Error> {
    // Document type declarations are refused outright.
    let options = crate::parsing_options();
    let doc = roxmltree::Document::parse_with_options(text, options)
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    Ok(convert(doc.root_element(), text, &[]))
}

fn convert(node: roxmltree::Node<'_, '_>, text: &Arc<str>, parent_scope: &[NsDecl]) -> Element {
    let in_scope: Vec<NsDecl> = node
        .namespaces()
        .filter(|n| n.name() != Some("xml"))
        .map(|n| NsDecl::new(n.name().unwrap_or(""), n.uri()))
        .collect();

    let mut declared: Vec<NsDecl> = in_scope
        .iter()
        .filter(|d| !parent_scope.contains(d))
        .cloned()
        .collect();
    let parent_default = parent_scope.iter().any(|d| d.prefix.is_empty());
    let own_default = in_scope.iter().any(|d| d.prefix.is_empty());
    if parent_default && !own_default {
        declared.push(NsDecl::new("", ""));
    }

    let range = node.range();
    let prefix = element_prefix(&text[range.clone()]);
    let tag = node.tag_name();
    let name = QName::prefixed(tag.namespace().unwrap_or(""), prefix.unwrap_or(""), tag.name());

    let mut element = Element::new(name);
    element.namespaces = declared;

    for attr in node.attributes() {
        let uri = attr.namespace().unwrap_or("");
        let name = if uri.is_empty() {
            QName::local(attr.name())
        } else {
            QName::prefixed(uri, attr_prefix(uri, &in_scope), attr.name())
        };
        element.attributes.push(Attribute {
            name,
            value: attr.value().to_owned(),
        });
    }

    if let Some(value) = node.attribute((ns::XSI, "type")) {
        if let (Some(p), _) = crate::qname::split_qname(value.trim()) {
            if let Some(d) = in_scope.iter().find(|d| d.prefix == p) {
                let d = d.clone();
                element.require_namespace(&d.prefix, &d.uri);
            }
        }
    }

    for child in node.children() {
        if child.is_element() {
            element.push(convert(child, text, &in_scope));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                element.push_text(t);
            }
        } else if child.is_comment() {
            if let Some(t) = child.text() {
                element.push(Node::Comment(t.to_owned()));
            }
        }
    }

    element.origin = Some(Origin {
        text: Arc::clone(text),
        range,
        in_scope,
    });
    element
}

/// The prefix of an element's qualified name, read from its start tag.
fn element_prefix(source: &str) -> Option<&str> {
    let tag = source.strip_prefix('<')?;
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(tag.len());
    tag[..end].split_once(':').map(|(p, _)| p)
}

fn attr_prefix<'a>(uri: &str, in_scope: &'a [NsDecl]) -> &'a str {
    if uri == ns::XML {
        return "xml";
    }
    in_scope
        .iter()
        .rev()
        .find(|d| d.uri == uri && !d.prefix.is_empty())
        .map(|d| d.prefix.as_str())
        .unwrap_or("")
}
