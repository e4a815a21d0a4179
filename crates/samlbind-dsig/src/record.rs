#![forbid(unsafe_code)]

//! Parsed `<ds:Signature>` contents and the enveloped-reference rules.

use base64::Engine;
use samlbind_core::{algorithm, ns, Error};
use samlbind_xml::{Element, QName};

use crate::context::{ds, KeyInfo};

/// One `<ds:Transform>` of a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSpec {
    pub algorithm: String,
    /// Exclusive C14N `InclusiveNamespaces/@PrefixList`, split on whitespace.
    pub inclusive_prefixes: Vec<String>,
}

impl TransformSpec {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            inclusive_prefixes: Vec::new(),
        }
    }
}

/// A `<ds:Reference>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub uri: Option<String>,
    pub transforms: Vec<TransformSpec>,
    pub digest_method: String,
    pub digest_value: Vec<u8>,
}

/// `<ds:SignedInfo>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInfo {
    pub canonicalization: String,
    pub inclusive_prefixes: Vec<String>,
    pub signature_method: String,
    pub references: Vec<Reference>,
}

/// An enveloped signature as found in (or produced for) a signable root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub signed_info: SignedInfo,
    pub signature_value: Vec<u8>,
    pub key_info: Option<KeyInfo>,
}

impl SignatureRecord {
    /// Read a `<ds:Signature>` element. Structural problems are schema
    /// violations; the reference rules are checked separately by
    /// [`SignatureRecord::validate_reference`].
    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::node::SIGNATURE)?;

        let si = required_child(element, ns::node::SIGNED_INFO)?;
        let c14n = required_child(si, ns::node::CANONICALIZATION_METHOD)?;
        let method = required_child(si, ns::node::SIGNATURE_METHOD)?;

        let mut references = Vec::new();
        for r in si.children_named(ns::DSIG, ns::node::REFERENCE) {
            references.push(parse_reference(r)?);
        }

        let value = required_child(element, ns::node::SIGNATURE_VALUE)?;
        let key_info = element
            .first_child(ns::DSIG, ns::node::KEY_INFO)
            .map(KeyInfo::from_element)
            .transpose()?;

        Ok(Self {
            signed_info: SignedInfo {
                canonicalization: required_algorithm(c14n)?,
                inclusive_prefixes: read_inclusive_prefixes(c14n),
                signature_method: required_algorithm(method)?,
                references,
            },
            signature_value: crate::decode_base64(&value.text())?,
            key_info,
        })
    }

    /// Enforce the enveloped-reference rules against the signed element's
    /// identifier: exactly one reference, whose URI is present, starts with
    /// `#` and names `id`.
    pub fn validate_reference(&self, id: Option<&str>) -> Result<&Reference, Error> {
        let refs = &self.signed_info.references;
        if refs.len() != 1 {
            return Err(Error::ReferenceCountMismatch(refs.len()));
        }
        let reference = &refs[0];
        let uri = reference.uri.as_deref().ok_or_else(|| {
            Error::ReferenceValidationFailed("reference has no URI".into())
        })?;
        let fragment = uri.strip_prefix('#').ok_or_else(|| {
            Error::ReferenceValidationFailed(format!(
                "reference URI '{uri}' is not a same-document reference"
            ))
        })?;
        match id {
            Some(id) if id == fragment => Ok(reference),
            Some(id) => Err(Error::ReferenceValidationFailed(format!(
                "reference URI '{uri}' does not name the signed element '{id}'"
            ))),
            None => Err(Error::ReferenceValidationFailed(format!(
                "reference URI '{uri}' but the signed element has no ID"
            ))),
        }
    }

    /// Every algorithm URI the signature relies on.
    pub fn algorithms(&self) -> Vec<&str> {
        let si = &self.signed_info;
        let mut out = vec![si.canonicalization.as_str(), si.signature_method.as_str()];
        for r in &si.references {
            out.push(r.digest_method.as_str());
            out.extend(r.transforms.iter().map(|t| t.algorithm.as_str()));
        }
        out
    }

    /// Build the `<ds:Signature>` element.
    pub fn to_element(&self) -> Element {
        let mut signature = Element::new(ds(ns::node::SIGNATURE));
        signature.push(self.signed_info.to_element());
        signature.push(
            Element::new(ds(ns::node::SIGNATURE_VALUE)).with_text(
                base64::engine::general_purpose::STANDARD.encode(&self.signature_value),
            ),
        );
        if let Some(key_info) = &self.key_info {
            signature.push(key_info.to_element());
        }
        signature
    }
}

impl SignedInfo {
    pub fn to_element(&self) -> Element {
        let mut si = Element::new(ds(ns::node::SIGNED_INFO));
        let mut c14n = algorithm_element(ns::node::CANONICALIZATION_METHOD, &self.canonicalization);
        if !self.inclusive_prefixes.is_empty() {
            c14n.push(inclusive_namespaces(&self.inclusive_prefixes));
        }
        si.push(c14n);
        si.push(algorithm_element(ns::node::SIGNATURE_METHOD, &self.signature_method));
        for r in &self.references {
            si.push(r.to_element());
        }
        si
    }
}

impl Reference {
    pub fn to_element(&self) -> Element {
        let mut reference = Element::new(ds(ns::node::REFERENCE));
        if let Some(uri) = &self.uri {
            reference.set_attr(ns::attr::URI, uri.clone());
        }
        if !self.transforms.is_empty() {
            let mut transforms = Element::new(ds(ns::node::TRANSFORMS));
            for t in &self.transforms {
                let mut transform = algorithm_element(ns::node::TRANSFORM, &t.algorithm);
                if !t.inclusive_prefixes.is_empty() {
                    transform.push(inclusive_namespaces(&t.inclusive_prefixes));
                }
                transforms.push(transform);
            }
            reference.push(transforms);
        }
        reference.push(algorithm_element(ns::node::DIGEST_METHOD, &self.digest_method));
        reference.push(
            Element::new(ds(ns::node::DIGEST_VALUE))
                .with_text(base64::engine::general_purpose::STANDARD.encode(&self.digest_value)),
        );
        reference
    }

    /// The PrefixList of the reference's exclusive canonicalization
    /// transform, if any.
    pub fn inclusive_prefixes(&self) -> &[String] {
        self.transforms
            .iter()
            .find(|t| {
                t.algorithm == algorithm::EXC_C14N || t.algorithm == algorithm::EXC_C14N_WITH_COMMENTS
            })
            .map(|t| t.inclusive_prefixes.as_slice())
            .unwrap_or(&[])
    }
}

fn parse_reference(element: &Element) -> Result<Reference, Error> {
    let mut transforms = Vec::new();
    if let Some(list) = element.first_child(ns::DSIG, ns::node::TRANSFORMS) {
        for t in list.children_named(ns::DSIG, ns::node::TRANSFORM) {
            transforms.push(TransformSpec {
                algorithm: required_algorithm(t)?,
                inclusive_prefixes: read_inclusive_prefixes(t),
            });
        }
    }
    let digest_method = required_child(element, ns::node::DIGEST_METHOD)?;
    let digest_value = required_child(element, ns::node::DIGEST_VALUE)?;
    Ok(Reference {
        uri: element.attr(ns::attr::URI).map(str::to_owned),
        transforms,
        digest_method: required_algorithm(digest_method)?,
        digest_value: crate::decode_base64(&digest_value.text())?,
    })
}

fn expect(element: &Element, local: &str) -> Result<(), Error> {
    if element.is(ns::DSIG, local) {
        Ok(())
    } else {
        Err(Error::SchemaViolation(format!(
            "expected ds:{local}, found {}",
            element.name
        )))
    }
}

fn required_child<'a>(element: &'a Element, local: &str) -> Result<&'a Element, Error> {
    element.first_child(ns::DSIG, local).ok_or_else(|| {
        Error::SchemaViolation(format!(
            "missing ds:{local} in {}",
            element.name.local_name()
        ))
    })
}

fn required_algorithm(element: &Element) -> Result<String, Error> {
    element
        .attr(ns::attr::ALGORITHM)
        .map(str::to_owned)
        .ok_or_else(|| {
            Error::SchemaViolation(format!(
                "missing Algorithm on ds:{}",
                element.name.local_name()
            ))
        })
}

fn read_inclusive_prefixes(element: &Element) -> Vec<String> {
    element
        .first_child(ns::EXC_C14N, ns::node::INCLUSIVE_NAMESPACES)
        .and_then(|e| e.attr(ns::attr::PREFIX_LIST))
        .map(|list| list.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

fn algorithm_element(local: &str, uri: &str) -> Element {
    Element::new(ds(local)).with_attr(ns::attr::ALGORITHM, uri)
}

fn inclusive_namespaces(prefixes: &[String]) -> Element {
    Element::new(QName::prefixed(
        ns::EXC_C14N,
        ns::prefix::EXC_C14N,
        ns::node::INCLUSIVE_NAMESPACES,
    ))
    .with_attr(ns::attr::PREFIX_LIST, prefixes.join(" "))
}
