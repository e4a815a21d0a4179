#![forbid(unsafe_code)]

//! Serializing the owned element tree to XML text.
//!
//! Namespace declarations are emitted where first needed: explicit
//! declarations that are not already in effect, plus whatever prefixes the
//! element's name, attributes, QName-valued content and raw children use
//! but are not bound by an ancestor.

use crate::element::{Element, Node};
use crate::escape::{escape_attr, escape_text};
use crate::namespace::{NsDecl, Scope};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// XML writer over the owned tree.
pub struct XmlWriter {
    out: String,
    scope: Scope,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            scope: Scope::new(),
        }
    }

    /// Writer for a subtree that will be embedded where `inherited` is
    /// already in scope.
    pub fn with_scope(inherited: &[NsDecl]) -> Self {
        Self {
            out: String::new(),
            scope: Scope::with_bindings(inherited),
        }
    }

    pub fn write_declaration(&mut self) {
        self.out.push_str(DECLARATION);
    }

    pub fn write_element(&mut self, element: &Element) {
        let decls = self.scope.declarations_for(element);
        let qname = element.name.qualified();

        self.out.push('<');
        self.out.push_str(&qname);
        for d in &decls {
            self.out.push_str(&d.render());
        }
        for a in &element.attributes {
            self.out.push(' ');
            self.out.push_str(&a.name.qualified());
            self.out.push_str("=\"");
            self.out.push_str(&escape_attr(&a.value));
            self.out.push('"');
        }

        if element.children.is_empty() {
            self.out.push_str("/>");
            return;
        }
        self.out.push('>');

        self.scope.push(&decls);
        for child in &element.children {
            self.write_node(child);
        }
        self.scope.pop();

        self.out.push_str("</");
        self.out.push_str(&qname);
        self.out.push('>');
    }

    fn write_node(&mut self, node: &Node) {
        match node {
            Node::Element(e) => self.write_element(e),
            Node::Text(t) => self.out.push_str(&escape_text(t)),
            Node::Comment(c) => {
                self.out.push_str("<!--");
                self.out.push_str(c);
                self.out.push_str("-->");
            }
            Node::Raw(r) => {
                // Usually the parent declared everything the chunk
                // inherits; a conflicting binding goes on the chunk itself.
                let missing: Vec<NsDecl> = r
                    .inherited()
                    .iter()
                    .filter(|d| !self.scope.binds(d))
                    .cloned()
                    .collect();
                self.out.push_str(&r.with_declarations(&missing));
            }
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize an element as a standalone fragment (no XML declaration).
pub fn to_string(element: &Element) -> String {
    let mut w = XmlWriter::new();
    w.write_element(element);
    w.into_string()
}

/// Serialize a top-level node. A raw root gets its inherited bindings
/// injected into its start tag.
pub fn node_to_string(node: &Node) -> String {
    match node {
        Node::Raw(r) => r.standalone(),
        other => {
            let mut w = XmlWriter::new();
            w.write_node(other);
            w.into_string()
        }
    }
}

/// Serialize an element as a complete document with an XML declaration.
pub fn to_document_string(element: &Element) -> String {
    let mut w = XmlWriter::new();
    w.write_declaration();
    w.write_element(element);
    w.into_string()
}
