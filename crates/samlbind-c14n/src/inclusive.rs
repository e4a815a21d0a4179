#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0 (C14N 1.0).
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! With comments: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments`
//!
//! Every namespace binding in scope is rendered on the apex element;
//! descendants render only bindings that differ from their nearest output
//! ancestor.

use std::collections::BTreeMap;

use samlbind_core::Error;
use samlbind_xml::escape;
use samlbind_xml::{Element, Node, NsDecl, Scope};

use crate::render;

/// Canonicalize `element` with `inherited` bindings from its context.
pub fn canonicalize(
    element: &Element,
    inherited: &[NsDecl],
    with_comments: bool,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let mut ctx = C14nContext {
        with_comments,
        scope: crate::apex_scope(element, inherited),
    };
    ctx.process_element(element, &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct C14nContext {
    with_comments: bool,
    scope: Scope,
}

impl C14nContext {
    fn process_node(
        &mut self,
        node: &Node,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node {
            Node::Element(e) => self.process_element(e, output, rendered_ns)?,
            Node::Text(t) => output.extend_from_slice(escape::escape_text(t).as_bytes()),
            Node::Comment(c) => {
                if self.with_comments {
                    output.extend_from_slice(b"<!--");
                    output.extend_from_slice(c.as_bytes());
                    output.extend_from_slice(b"-->");
                }
            }
            Node::Raw(r) => {
                let parsed = r.parse()?;
                self.process_element(&parsed, output, rendered_ns)?;
            }
        }
        Ok(())
    }

    fn process_element(
        &mut self,
        element: &Element,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        let decls = self.scope.declarations_for(element);
        self.scope.push(&decls);
        let inscope_ns = self.scope.bindings();

        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for (prefix, uri) in &inscope_ns {
            if rendered_ns.get(prefix) != Some(uri) {
                ns_decls.push(NsDecl::new(prefix.clone(), uri.clone()));
            }
        }
        if !inscope_ns.contains_key("") && rendered_ns.get("").is_some_and(|u| !u.is_empty()) {
            ns_decls.push(NsDecl::new("", ""));
        }
        ns_decls.sort();

        let attrs = render::sorted_attrs(element);
        let qname = element.name.qualified();
        render::start_tag(output, &qname, &ns_decls, &attrs);

        let mut child_rendered_ns = rendered_ns.clone();
        for ns_decl in &ns_decls {
            child_rendered_ns.insert(ns_decl.prefix.clone(), ns_decl.uri.clone());
        }

        for child in &element.children {
            self.process_node(child, output, &child_rendered_ns)?;
        }

        render::end_tag(output, &qname);
        self.scope.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samlbind_xml::{parse, QName};

    fn c14n(xml: &str) -> String {
        let root = parse(xml).unwrap();
        String::from_utf8(canonicalize(&root, &[], false).unwrap()).unwrap()
    }

    #[test]
    fn sorts_and_expands() {
        assert_eq!(
            c14n(r#"<r b="2" xmlns:z="urn:z" a="1" xmlns:a="urn:a"><e/></r>"#),
            r#"<r xmlns:a="urn:a" xmlns:z="urn:z" a="1" b="2"><e></e></r>"#
        );
    }

    #[test]
    fn superfluous_declarations_are_dropped() {
        assert_eq!(
            c14n(r#"<r xmlns:a="urn:a"><a:e xmlns:a="urn:a"/></r>"#),
            r#"<r xmlns:a="urn:a"><a:e></a:e></r>"#
        );
    }

    #[test]
    fn subtree_renders_inherited_bindings() {
        let root = parse(r#"<r xmlns:a="urn:a" xmlns:u="urn:u"><a:e/></r>"#).unwrap();
        let child = root.child_elements().next().unwrap();
        let out = String::from_utf8(canonicalize(child, &[], false).unwrap()).unwrap();
        assert_eq!(out, r#"<a:e xmlns:a="urn:a" xmlns:u="urn:u"></a:e>"#);
    }

    #[test]
    fn comments_follow_mode() {
        let root = parse("<r><!--c-->t</r>").unwrap();
        let without = canonicalize(&root, &[], false).unwrap();
        let with = canonicalize(&root, &[], true).unwrap();
        assert_eq!(without, b"<r>t</r>");
        assert_eq!(with, b"<r><!--c-->t</r>");
    }

    #[test]
    fn built_tree_gets_implied_declarations() {
        let mut root = Element::new(QName::prefixed("urn:a", "a", "R"));
        root.push(Element::new(QName::prefixed("urn:a", "a", "C")));
        let out = canonicalize(&root, &[], false).unwrap();
        assert_eq!(out, br#"<a:R xmlns:a="urn:a"><a:C></a:C></a:R>"#);
    }
}
