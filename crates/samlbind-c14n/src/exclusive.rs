#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! The key difference from inclusive C14N: only "visibly utilized" namespace
//! declarations are output.  A namespace is visibly utilized if:
//! 1. Its prefix is used by the element's tag name, OR
//! 2. Its prefix is used by one of the element's attributes, OR
//! 3. The prefix appears in the InclusiveNamespaces PrefixList.
//!
//! Prefixes that appear only inside attribute values or text (such as an
//! `xsi:type` value) are not visibly utilized and must be named in the
//! PrefixList to survive.

use std::collections::{BTreeMap, BTreeSet};

use samlbind_core::Error;
use samlbind_xml::escape;
use samlbind_xml::{Element, Node, NsDecl, Scope};

use crate::render;

/// Canonicalize using Exclusive C14N 1.0.
pub fn canonicalize(
    element: &Element,
    inherited: &[NsDecl],
    with_comments: bool,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let prefix_set: BTreeSet<String> = inclusive_prefixes
        .iter()
        .map(|p| if p == "#default" { String::new() } else { p.clone() })
        .collect();
    let mut output = Vec::new();
    let mut ctx = ExcC14nContext {
        with_comments,
        inclusive_prefixes: prefix_set,
        scope: crate::apex_scope(element, inherited),
    };
    ctx.process_element(element, &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct ExcC14nContext {
    with_comments: bool,
    inclusive_prefixes: BTreeSet<String>,
    scope: Scope,
}

impl ExcC14nContext {
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

        // Determine which namespace prefixes are "visibly utilized"
        let mut utilized_prefixes: BTreeSet<String> = self.inclusive_prefixes.clone();
        utilized_prefixes.insert(element.name.prefix().unwrap_or("").to_owned());
        for attr in &element.attributes {
            if let Some(prefix) = attr.name.prefix() {
                utilized_prefixes.insert(prefix.to_owned());
            }
        }

        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for prefix in &utilized_prefixes {
            if prefix == "xml" {
                continue;
            }
            if let Some(uri) = inscope_ns.get(prefix) {
                // Only output if different from what was previously rendered
                if rendered_ns.get(prefix) != Some(uri) {
                    ns_decls.push(NsDecl::new(prefix.clone(), uri.clone()));
                }
            } else if prefix.is_empty() && rendered_ns.get("").is_some_and(|u| !u.is_empty()) {
                // The default namespace was rendered non-empty above us and
                // is unbound here.
                ns_decls.push(NsDecl::new("", ""));
            }
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
