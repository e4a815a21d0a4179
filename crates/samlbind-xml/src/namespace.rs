#![forbid(unsafe_code)]

//! Namespace declarations and in-scope binding tracking.

use std::collections::BTreeMap;

use samlbind_core::ns;

use crate::element::{Element, Node};

/// A namespace declaration (`xmlns:prefix="uri"`, or `xmlns="uri"` when the
/// prefix is empty). An empty `uri` with an empty prefix undeclares the
/// default namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NsDecl {
    /// The prefix ("" for default namespace).
    pub prefix: String,
    /// The namespace URI.
    pub uri: String,
}

impl NsDecl {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }

    /// Render as an attribute string with a leading space.
    pub fn render(&self) -> String {
        if self.prefix.is_empty() {
            format!(" xmlns=\"{}\"", crate::escape::escape_attr(&self.uri))
        } else {
            format!(
                " xmlns:{}=\"{}\"",
                self.prefix,
                crate::escape::escape_attr(&self.uri)
            )
        }
    }
}

impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Default namespace (empty prefix) sorts first.
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A stack of namespace bindings, one frame per open element.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    bindings: Vec<NsDecl>,
    frames: Vec<usize>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope seeded with bindings that are already in effect.
    pub fn with_bindings(decls: &[NsDecl]) -> Self {
        let mut scope = Self::new();
        scope.bindings.extend(decls.iter().cloned());
        scope
    }

    /// Resolve a prefix ("" for the default namespace). The `xml` prefix is
    /// always bound; an undeclared default namespace resolves to `None`.
    pub fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(ns::XML);
        }
        self.bindings
            .iter()
            .rev()
            .find(|d| d.prefix == prefix)
            .map(|d| d.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Find a prefix currently bound to `uri`.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        if uri == ns::XML {
            return Some("xml");
        }
        self.bindings
            .iter()
            .rev()
            .find(|d| d.uri == uri && !d.prefix.is_empty() && self.lookup(&d.prefix) == Some(uri))
            .map(|d| d.prefix.as_str())
    }

    /// Whether `decl` is already the effective binding for its prefix.
    pub fn binds(&self, decl: &NsDecl) -> bool {
        let effective = self.lookup(&decl.prefix);
        if decl.uri.is_empty() {
            effective.is_none()
        } else {
            effective == Some(decl.uri.as_str())
        }
    }

    pub fn push(&mut self, decls: &[NsDecl]) {
        self.frames.push(self.bindings.len());
        self.bindings.extend(decls.iter().cloned());
    }

    pub fn pop(&mut self) {
        if let Some(len) = self.frames.pop() {
            self.bindings.truncate(len);
        }
    }

    /// Every binding currently in effect, keyed by prefix. An undeclared
    /// default namespace is omitted.
    pub fn bindings(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for d in &self.bindings {
            map.insert(d.prefix.clone(), d.uri.clone());
        }
        map.retain(|_, uri| !uri.is_empty());
        map
    }

    /// The declarations that must appear on `element` when it is written
    /// inside this scope.
    ///
    /// Starts from the element's explicit declarations (dropping any that are
    /// already in effect) and adds whatever the element's name, attribute
    /// names, QName-valued content and raw children need but is not bound.
    pub fn declarations_for(&self, element: &Element) -> Vec<NsDecl> {
        let mut decls: Vec<NsDecl> = Vec::new();
        for d in &element.namespaces {
            if !self.binds(d) && !decls.iter().any(|x| x.prefix == d.prefix) {
                decls.push(d.clone());
            }
        }

        let require = |prefix: &str, uri: &str, decls: &mut Vec<NsDecl>| {
            if prefix == "xml" {
                return;
            }
            let current = match decls.iter().find(|d| d.prefix == prefix) {
                Some(d) if d.uri.is_empty() => None,
                Some(d) => Some(d.uri.as_str()),
                None => self.lookup(prefix),
            };
            if uri.is_empty() {
                // Only the default namespace can be undeclared.
                if prefix.is_empty() && current.is_some() {
                    decls.retain(|d| !d.prefix.is_empty());
                    decls.push(NsDecl::new("", ""));
                }
                return;
            }
            if current == Some(uri) {
                return;
            }
            // Already declared here with another URI. A raw child that
            // needs the other binding declares it on its own start tag.
            if decls.iter().any(|d| d.prefix == prefix) {
                return;
            }
            decls.push(NsDecl::new(prefix, uri));
        };

        require(
            element.name.prefix().unwrap_or(""),
            element.name.namespace(),
            &mut decls,
        );
        for attr in &element.attributes {
            if let Some(p) = attr.name.prefix() {
                require(p, attr.name.namespace(), &mut decls);
            }
        }
        for d in &element.required_namespaces {
            require(&d.prefix, &d.uri, &mut decls);
        }
        for child in &element.children {
            if let Node::Raw(raw) = child {
                for d in raw.inherited() {
                    require(&d.prefix, &d.uri, &mut decls);
                }
            }
        }
        decls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QName;

    #[test]
    fn lookup_respects_frames() {
        let mut scope = Scope::new();
        scope.push(&[NsDecl::new("a", "urn:a")]);
        scope.push(&[NsDecl::new("a", "urn:b")]);
        assert_eq!(scope.lookup("a"), Some("urn:b"));
        scope.pop();
        assert_eq!(scope.lookup("a"), Some("urn:a"));
        assert_eq!(scope.lookup("xml"), Some(ns::XML));
        assert_eq!(scope.lookup("zzz"), None);
    }

    #[test]
    fn undeclared_default_is_unbound() {
        let mut scope = Scope::new();
        scope.push(&[NsDecl::new("", "urn:d")]);
        scope.push(&[NsDecl::new("", "")]);
        assert_eq!(scope.lookup(""), None);
        assert!(scope.bindings().is_empty());
    }

    #[test]
    fn missing_prefixes_are_declared() {
        let mut el = Element::new(QName::prefixed("urn:a", "a", "Root"));
        el.set_attr_ns(QName::prefixed("urn:b", "b", "flag"), "1");
        let scope = Scope::new();
        let decls = scope.declarations_for(&el);
        assert_eq!(
            decls,
            vec![NsDecl::new("a", "urn:a"), NsDecl::new("b", "urn:b")]
        );
    }

    #[test]
    fn bound_prefixes_are_not_redeclared() {
        let el = Element::new(QName::prefixed("urn:a", "a", "Child"));
        let scope = Scope::with_bindings(&[NsDecl::new("a", "urn:a")]);
        assert!(scope.declarations_for(&el).is_empty());
    }

    #[test]
    fn unqualified_element_undeclares_default() {
        let el = Element::new(QName::local("plain"));
        let scope = Scope::with_bindings(&[NsDecl::new("", "urn:d")]);
        assert_eq!(scope.declarations_for(&el), vec![NsDecl::new("", "")]);
    }
}
