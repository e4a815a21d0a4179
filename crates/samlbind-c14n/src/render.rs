#![forbid(unsafe_code)]

//! Shared rendering utilities for C14N output.

use samlbind_xml::escape;
use samlbind_xml::{Element, NsDecl};

/// An attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// The namespace URI of the attribute ("" for no namespace).
    pub ns_uri: String,
    /// The local name.
    pub local_name: String,
    /// The qualified name (prefix:local or just local).
    pub qualified_name: String,
    /// The attribute value.
    pub value: String,
}

impl Attr {
    /// Render this attribute to a string.
    pub fn render(&self) -> String {
        format!(
            " {}=\"{}\"",
            self.qualified_name,
            escape::escape_attr(&self.value)
        )
    }
}

impl Ord for Attr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Attributes with no namespace come before those with a namespace.
        // Among those with namespaces, sort by (ns_uri, local_name).
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(&other.local_name),
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(&other.ns_uri)
                .then(self.local_name.cmp(&other.local_name)),
        }
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// The element's attributes in canonical order.
pub fn sorted_attrs(element: &Element) -> Vec<Attr> {
    let mut attrs: Vec<Attr> = element
        .attributes
        .iter()
        .map(|a| Attr {
            ns_uri: a.name.namespace().to_owned(),
            local_name: a.name.local_name().to_owned(),
            qualified_name: a.name.qualified(),
            value: a.value.clone(),
        })
        .collect();
    attrs.sort();
    attrs
}

/// Write a start tag: name, then sorted namespace declarations, then
/// sorted attributes.
pub fn start_tag(output: &mut Vec<u8>, qname: &str, ns_decls: &[NsDecl], attrs: &[Attr]) {
    output.push(b'<');
    output.extend_from_slice(qname.as_bytes());
    for ns_decl in ns_decls {
        output.extend_from_slice(ns_decl.render().as_bytes());
    }
    for attr in attrs {
        output.extend_from_slice(attr.render().as_bytes());
    }
    output.push(b'>');
}

pub fn end_tag(output: &mut Vec<u8>, qname: &str) {
    output.extend_from_slice(b"</");
    output.extend_from_slice(qname.as_bytes());
    output.push(b'>');
}
