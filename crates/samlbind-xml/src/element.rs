#![forbid(unsafe_code)]

//! Owned XML element tree.
//!
//! Elements built in code and elements parsed from text share one type.
//! Parsed elements additionally remember the source text they came from and
//! the namespace bindings in scope at that point, so a subtree can be passed
//! through byte for byte or re-parsed in isolation.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

use samlbind_core::{ns, Error};

use crate::namespace::NsDecl;
use crate::qname::{split_qname, QName};

/// An attribute on an element.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// A child of an element.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    /// Serialized XML inserted verbatim.
    Raw(RawXml),
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<RawXml> for Node {
    fn from(r: RawXml) -> Self {
        Node::Raw(r)
    }
}

/// Where a parsed element came from.
#[derive(Debug, Clone)]
pub(crate) struct Origin {
    pub(crate) text: Arc<str>,
    pub(crate) range: Range<usize>,
    /// All bindings in scope at the element, its own declarations included.
    pub(crate) in_scope: Vec<NsDecl>,
}

/// An XML element.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    /// Namespace declarations written on this element.
    pub namespaces: Vec<NsDecl>,
    /// Bindings that QName-valued content of this element depends on
    /// (`xsi:type` values, status code values). They are declared on
    /// output only if not already in scope.
    pub required_namespaces: Vec<NsDecl>,
    pub children: Vec<Node>,
    pub(crate) origin: Option<Origin>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            namespaces: Vec::new(),
            required_namespaces: Vec::new(),
            children: Vec::new(),
            origin: None,
        }
    }

    /// True if this element has the given namespace and local name.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    // ── Attributes ───────────────────────────────────────────────────

    /// Value of an unqualified attribute.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attr_ns("", local)
    }

    /// Value of a namespace-qualified attribute.
    pub fn attr_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(namespace, local))
            .map(|a| a.value.as_str())
    }

    /// Set (or replace) an unqualified attribute.
    pub fn set_attr(&mut self, local: &str, value: impl Into<String>) {
        self.set_attr_ns(QName::local(local), value);
    }

    /// Set (or replace) an attribute. Namespaced names should carry a
    /// prefix; the binding is declared on output if missing.
    pub fn set_attr_ns(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(a) => {
                a.name = name;
                a.value = value;
            }
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Set an attribute whose value is a QName, recording the binding the
    /// value's prefix depends on.
    pub fn set_qname_attr(&mut self, name: QName, value: &QName) {
        let prefix = value.prefix().unwrap_or("");
        self.set_attr_ns(name, value.qualified());
        if value.has_namespace() || !prefix.is_empty() {
            self.require_namespace(prefix, value.namespace());
        }
    }

    pub fn with_attr(mut self, local: &str, value: impl Into<String>) -> Self {
        self.set_attr(local, value);
        self
    }

    pub fn remove_attr(&mut self, local: &str) {
        self.attributes.retain(|a| !a.name.is("", local));
    }

    // ── Namespaces ───────────────────────────────────────────────────

    /// Add an explicit declaration on this element.
    pub fn declare_namespace(&mut self, prefix: &str, uri: &str) {
        self.namespaces.retain(|d| d.prefix != prefix);
        self.namespaces.push(NsDecl::new(prefix, uri));
    }

    /// Record a binding this element's content depends on.
    pub fn require_namespace(&mut self, prefix: &str, uri: &str) {
        let decl = NsDecl::new(prefix, uri);
        if !self.required_namespaces.contains(&decl) {
            self.required_namespaces.push(decl);
        }
    }

    /// Resolve `prefix` ("" for the default namespace) against this
    /// element's declarations and, for parsed elements, the bindings in
    /// scope where it was parsed.
    pub fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(ns::XML);
        }
        let own = self
            .namespaces
            .iter()
            .chain(self.required_namespaces.iter())
            .find(|d| d.prefix == prefix);
        if let Some(d) = own {
            return Some(d.uri.as_str()).filter(|u| !u.is_empty());
        }
        if let Some(origin) = &self.origin {
            if let Some(d) = origin.in_scope.iter().find(|d| d.prefix == prefix) {
                return Some(d.uri.as_str()).filter(|u| !u.is_empty());
            }
        }
        if !prefix.is_empty() && self.name.prefix() == Some(prefix) {
            return Some(self.name.namespace());
        }
        None
    }

    /// Resolve a lexical QName (`prefix:local` or `local`) found in this
    /// element's content. An unbound prefix is a schema violation.
    pub fn resolve_qname(&self, value: &str) -> Result<QName, Error> {
        let value = value.trim();
        let (prefix, local) = split_qname(value);
        if local.is_empty() {
            return Err(Error::SchemaViolation(format!("empty QName '{value}'")));
        }
        match prefix {
            Some(p) => {
                let uri = self.lookup_namespace(p).ok_or_else(|| {
                    Error::SchemaViolation(format!("unbound prefix '{p}' in QName '{value}'"))
                })?;
                Ok(QName::prefixed(uri, p, local))
            }
            None => {
                let uri = self.lookup_namespace("").unwrap_or("");
                Ok(QName::new(uri, local))
            }
        }
    }

    /// All bindings in scope at this element: the parse-time scope for
    /// parsed elements, overlaid with this element's own declarations.
    pub fn in_scope_namespaces(&self) -> Vec<NsDecl> {
        let mut out: Vec<NsDecl> = match &self.origin {
            Some(o) => o.in_scope.clone(),
            None => Vec::new(),
        };
        for d in &self.namespaces {
            out.retain(|x| x.prefix != d.prefix);
            out.push(d.clone());
        }
        out
    }

    /// Bindings in scope at this element that come from its ancestors.
    pub fn inherited_namespaces(&self) -> Vec<NsDecl> {
        let own: BTreeSet<&str> = self.namespaces.iter().map(|d| d.prefix.as_str()).collect();
        match &self.origin {
            Some(o) => o
                .in_scope
                .iter()
                .filter(|d| !own.contains(d.prefix.as_str()))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Prefixes this subtree uses in element names, attribute names and
    /// QName-valued content. The default namespace is reported as "".
    pub fn used_prefixes(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_prefixes(&mut out);
        out
    }

    fn collect_prefixes(&self, out: &mut BTreeSet<String>) {
        out.insert(self.name.prefix().unwrap_or("").to_owned());
        for a in &self.attributes {
            if let Some(p) = a.name.prefix() {
                out.insert(p.to_owned());
            }
        }
        for d in &self.required_namespaces {
            out.insert(d.prefix.clone());
        }
        for child in &self.children {
            match child {
                Node::Element(e) => e.collect_prefixes(out),
                Node::Raw(r) => {
                    for d in r.inherited() {
                        out.insert(d.prefix.clone());
                    }
                }
                _ => {}
            }
        }
        out.remove("xml");
    }

    // ── Children ─────────────────────────────────────────────────────

    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Child elements with the given name.
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.child_elements().filter(move |e| e.is(namespace, local))
    }

    pub fn first_child(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is(namespace, local))
    }

    /// Concatenated text content of the direct text children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let Node::Text(t) = child {
                out.push_str(t);
            }
        }
        out
    }

    /// Name of the child at `index` if it is an element or raw element.
    pub fn child_name(&self, index: usize) -> Option<&QName> {
        match self.children.get(index)? {
            Node::Element(e) => Some(&e.name),
            Node::Raw(r) => Some(r.name()),
            _ => None,
        }
    }

    // ── Source passthrough ───────────────────────────────────────────

    /// The exact source text of a parsed element.
    pub fn raw_xml(&self) -> Option<&str> {
        self.origin.as_ref().map(|o| &o.text[o.range.clone()])
    }

    /// Forget where this element was parsed from, keeping its bindings as
    /// explicit declarations. Call after modifying a parsed element so its
    /// source text is no longer reported as its serialization.
    pub fn detach_source(&mut self) {
        if self.origin.is_some() {
            self.namespaces = self.in_scope_namespaces();
            self.origin = None;
        }
    }

    /// Capture a parsed element as a raw chunk that carries the bindings
    /// it inherited from its ancestors (only those it actually uses).
    pub fn to_raw(&self) -> Option<RawXml> {
        let text = self.raw_xml()?;
        let used = self.used_prefixes();
        let inherited = self
            .inherited_namespaces()
            .into_iter()
            .filter(|d| used.contains(&d.prefix) || self.raw_text_uses_prefix(text, &d.prefix))
            .collect();
        Some(RawXml {
            name: self.name.clone(),
            text: text.to_owned(),
            inherited,
        })
    }

    /// [`Element::to_raw`] for parsed elements; built elements are
    /// serialized in place.
    pub fn capture(&self) -> RawXml {
        self.to_raw().unwrap_or_else(|| RawXml {
            name: self.name.clone(),
            text: crate::writer::to_string(self),
            inherited: Vec::new(),
        })
    }

    /// Conservative scan for `prefix:` inside attribute values, which the
    /// parsed tree does not expose as QNames.
    fn raw_text_uses_prefix(&self, text: &str, prefix: &str) -> bool {
        if prefix.is_empty() {
            return false;
        }
        let needle = format!("\"{prefix}:");
        let needle_sq = format!("'{prefix}:");
        text.contains(&needle) || text.contains(&needle_sq) || text.contains(&format!(">{prefix}:"))
    }
}

/// A serialized element inserted verbatim, with the namespace bindings it
/// needs from the surrounding document.
#[derive(Debug, Clone)]
pub struct RawXml {
    name: QName,
    text: String,
    inherited: Vec<NsDecl>,
}

impl RawXml {
    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bindings the chunk relies on that are not declared inside it.
    pub fn inherited(&self) -> &[NsDecl] {
        &self.inherited
    }

    /// The chunk as a standalone document: inherited bindings are
    /// injected into its start tag.
    pub fn standalone(&self) -> String {
        self.with_declarations(&self.inherited)
    }

    /// The chunk with `decls` written into its start tag.
    pub fn with_declarations(&self, decls: &[NsDecl]) -> String {
        if decls.is_empty() {
            return self.text.clone();
        }
        let decls: String = decls.iter().map(NsDecl::render).collect();
        let name_end = self.text[1..]
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .map(|i| i + 1)
            .unwrap_or(self.text.len());
        let mut out = String::with_capacity(self.text.len() + decls.len());
        out.push_str(&self.text[..name_end]);
        out.push_str(&decls);
        out.push_str(&self.text[name_end..]);
        out
    }

    /// Parse the chunk back into an element.
    pub fn parse(&self) -> Result<Element, Error> {
        crate::document::parse(&self.standalone())
    }
}
