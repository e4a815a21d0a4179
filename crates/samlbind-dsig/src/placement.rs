#![forbid(unsafe_code)]

//! Where `<ds:Signature>` goes inside each signable root.
//!
//! A placement is an ordered list of anchors; the first anchor that finds a
//! position wins.

use samlbind_core::ns;
use samlbind_xml::Element;

/// A child element name given as `(namespace, local)`.
pub type ChildName = (&'static str, &'static str);

/// One way of locating the insertion index among a root's children.
#[derive(Debug, Clone, Copy)]
pub enum Anchor {
    /// Before the first child element whose name is not in the list.
    BeforeFirstExcept(&'static [ChildName]),
    /// Immediately after the last child element whose name is in the list.
    AfterLast(&'static [ChildName]),
    /// As the very first child.
    First,
    /// As the very last child.
    Append,
}

impl Anchor {
    fn locate(&self, root: &Element) -> Option<usize> {
        let named = |i: usize, names: &[ChildName]| {
            root.child_name(i)
                .map(|q| names.iter().any(|(n, l)| q.is(n, l)))
        };
        match self {
            Anchor::BeforeFirstExcept(names) => {
                (0..root.children.len()).find(|&i| named(i, *names) == Some(false))
            }
            Anchor::AfterLast(names) => (0..root.children.len())
                .rev()
                .find(|&i| named(i, *names) == Some(true))
                .map(|i| i + 1),
            Anchor::First => Some(0),
            Anchor::Append => Some(root.children.len()),
        }
    }
}

/// An ordered anchor list.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    anchors: &'static [Anchor],
}

impl Placement {
    pub const fn new(anchors: &'static [Anchor]) -> Self {
        Self { anchors }
    }

    /// Index at which the signature is inserted into `root.children`.
    pub fn index(&self, root: &Element) -> usize {
        self.anchors
            .iter()
            .find_map(|a| a.locate(root))
            .unwrap_or(root.children.len())
    }

    /// Insert `signature` into `root` and return the index used.
    pub fn insert(&self, root: &mut Element, signature: Element) -> usize {
        let index = self.index(root);
        root.children.insert(index, signature.into());
        index
    }
}

/// Assertion: ahead of the statements, after `Conditions` and `Advice`.
pub const ASSERTION: Placement = Placement::new(&[
    Anchor::BeforeFirstExcept(&[
        (ns::SAML, ns::node::CONDITIONS),
        (ns::SAML, ns::node::ADVICE),
    ]),
    Anchor::Append,
]);

/// Request: after the last `RespondWith`, else first.
pub const REQUEST: Placement = Placement::new(&[
    Anchor::AfterLast(&[(ns::SAMLP, ns::node::RESPOND_WITH)]),
    Anchor::First,
]);

/// Response: last child.
pub const RESPONSE: Placement = Placement::new(&[Anchor::Append]);
