#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes the `<ds:Signature>` element enveloped by the apex element.

use samlbind_core::{algorithm, ns, Error};
use samlbind_xml::Node;

use crate::pipeline::{Transform, TransformData};

/// The enveloped signature transform: drops every `<ds:Signature>` that is
/// a direct child of the apex element. Signatures nested deeper belong to
/// other signed objects and are kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopedSignatureTransform;

impl EnvelopedSignatureTransform {
    pub fn new() -> Self {
        Self
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        match input {
            TransformData::Xml {
                mut element,
                inherited,
            } => {
                element.children.retain(|child| match child {
                    Node::Element(e) => !e.is(ns::DSIG, ns::node::SIGNATURE),
                    Node::Raw(r) => !r.name().is(ns::DSIG, ns::node::SIGNATURE),
                    _ => true,
                });
                Ok(TransformData::Xml { element, inherited })
            }
            TransformData::Binary(_) => Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samlbind_xml::parse;

    #[test]
    fn only_direct_signature_is_removed() {
        let root = parse(concat!(
            r#"<r xmlns:ds="http://www.w3.org/2000/09/xmldsig#">"#,
            r#"<ds:Signature/><c><ds:Signature/></c></r>"#
        ))
        .unwrap();
        let out = EnvelopedSignatureTransform::new()
            .execute(TransformData::xml(root))
            .unwrap();
        let TransformData::Xml { element, .. } = out else {
            panic!("expected xml output");
        };
        assert_eq!(element.child_elements().count(), 1);
        let c = element.child_elements().next().unwrap();
        assert_eq!(c.child_elements().count(), 1);
    }

    #[test]
    fn binary_input_is_rejected() {
        let err = EnvelopedSignatureTransform::new()
            .execute(TransformData::Binary(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Transform(_)));
    }
}
