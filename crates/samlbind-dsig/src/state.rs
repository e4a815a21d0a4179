#![forbid(unsafe_code)]

//! Signature state carried by every signable root.

use std::sync::Arc;

use samlbind_c14n::Canonicalizer;
use samlbind_core::Error;
use samlbind_xml::{Element, Node};

use crate::context::SignatureContext;
use crate::placement::Placement;
use crate::record::SignatureRecord;

/// Where a signable root is in its signature lifecycle.
#[derive(Debug, Clone, Default)]
pub enum SignatureState {
    /// No signature; serializes as a plain tree.
    #[default]
    Unsigned,
    /// `sign()` was called; the next serialization signs.
    Configured(SignatureContext),
    /// Carries a signature, either parsed or freshly produced. `original`
    /// is the signed tree exactly as it will be emitted.
    Signed {
        record: SignatureRecord,
        original: Element,
    },
}

impl SignatureState {
    /// Store a pending signature context, replacing whatever was there.
    pub fn configure(&mut self, ctx: SignatureContext) {
        *self = SignatureState::Configured(ctx);
    }

    /// Accept a signature found while parsing. Checks the enveloped
    /// reference rules against `id`; no cryptographic verification happens
    /// here.
    pub fn set_signature(
        &mut self,
        record: SignatureRecord,
        original: Element,
        id: Option<&str>,
    ) -> Result<(), Error> {
        record.validate_reference(id)?;
        *self = SignatureState::Signed { record, original };
        Ok(())
    }

    /// Drop a parsed or produced signature because the root was modified.
    /// A pending context survives.
    pub fn invalidate(&mut self) {
        if let SignatureState::Signed { .. } = self {
            tracing::debug!("root modified; dropping its signature");
            *self = SignatureState::Unsigned;
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, SignatureState::Signed { .. })
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, SignatureState::Configured(_))
    }

    pub fn record(&self) -> Option<&SignatureRecord> {
        match self {
            SignatureState::Signed { record, .. } => Some(record),
            _ => None,
        }
    }

    /// The signed tree, if any.
    pub fn signed_tree(&self) -> Option<&Element> {
        match self {
            SignatureState::Signed { original, .. } => Some(original),
            _ => None,
        }
    }

    /// Run the signing procedure with the configured context and move to
    /// `Signed`. Fails with `IllegalState` if `sign()` was never called.
    pub fn do_sign(
        &mut self,
        tree: Element,
        id: &str,
        placement: Placement,
        canonicalizer: Arc<dyn Canonicalizer>,
    ) -> Result<Element, Error> {
        let SignatureState::Configured(ctx) = self else {
            return Err(Error::IllegalState(
                "signing requested without a configured signature context".into(),
            ));
        };
        let (signed, record) = crate::sign::do_sign(tree, id, ctx, placement, canonicalizer)?;
        *self = SignatureState::Signed {
            record,
            original: signed.clone(),
        };
        Ok(signed)
    }

    /// The node a root serializes to.
    ///
    /// - `Signed`: the original tree. A parsed original is re-emitted byte
    ///   for byte (as a raw chunk carrying its inherited bindings).
    /// - `Configured`: `build()` produces the unsigned tree, which is signed,
    ///   and the state moves to `Signed`.
    /// - `Unsigned`: the tree from `build()`.
    pub fn serialize_with<F>(
        &mut self,
        id: Option<&str>,
        placement: Placement,
        canonicalizer: Arc<dyn Canonicalizer>,
        build: F,
    ) -> Result<Node, Error>
    where
        F: FnOnce() -> Result<Element, Error>,
    {
        match self {
            SignatureState::Signed { original, .. } => {
                tracing::debug!("re-emitting signed element unchanged");
                Ok(match original.to_raw() {
                    Some(raw) => Node::Raw(raw),
                    None => Node::Element(original.clone()),
                })
            }
            SignatureState::Configured(_) => {
                let id = id.ok_or_else(|| {
                    Error::ProtocolViolation("signable element has no ID".into())
                })?;
                let tree = build()?;
                Ok(Node::Element(self.do_sign(tree, id, placement, canonicalizer)?))
            }
            SignatureState::Unsigned => Ok(Node::Element(build()?)),
        }
    }
}
