#![forbid(unsafe_code)]

//! `<saml:Advice>`: additional assertions, references and foreign content
//! the issuer attaches without making claims about them.

use samlbind_core::{ns, Error};
use samlbind_xml::{Element, Node};

use crate::assertion::Assertion;
use crate::context::SamlContext;
use crate::schema::{expect, passthrough, saml};

#[derive(Debug, Clone, Default)]
pub struct Advice {
    pub items: Vec<AdviceItem>,
}

#[derive(Debug, Clone)]
pub enum AdviceItem {
    AssertionIdReference(String),
    Assertion(Box<Assertion>),
    /// Content from another namespace, kept as parsed.
    Other(Element),
}

impl Advice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assertions carried inline, in document order.
    pub fn assertions(&self) -> impl Iterator<Item = &Assertion> {
        self.items.iter().filter_map(|item| match item {
            AdviceItem::Assertion(a) => Some(a.as_ref()),
            _ => None,
        })
    }

    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::ADVICE)?;
        let mut items = Vec::new();
        for child in element.child_elements() {
            let item = if child.is(ns::SAML, ns::node::ASSERTION_ID_REFERENCE) {
                AdviceItem::AssertionIdReference(child.text().trim().to_owned())
            } else if child.is(ns::SAML, ns::node::ASSERTION) {
                AdviceItem::Assertion(Box::new(Assertion::from_element(child, ctx)?))
            } else if child.name.namespace() == ns::SAML {
                return Err(Error::SchemaViolation(format!(
                    "unexpected {} in Advice",
                    child.name
                )));
            } else {
                AdviceItem::Other(child.clone())
            };
            items.push(item);
        }
        Ok(Self { items })
    }

    pub fn to_element(&mut self, ctx: &SamlContext) -> Result<Element, Error> {
        let mut el = saml(ns::node::ADVICE);
        for item in &mut self.items {
            let node = match item {
                AdviceItem::AssertionIdReference(id) => {
                    Node::Element(saml(ns::node::ASSERTION_ID_REFERENCE).with_text(id.clone()))
                }
                AdviceItem::Assertion(a) => a.to_node(ctx)?,
                AdviceItem::Other(other) => passthrough(other),
            };
            el.push(node);
        }
        Ok(el)
    }
}
