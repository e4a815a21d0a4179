#![forbid(unsafe_code)]

//! Signing and verification capabilities of the signable roots.

use std::sync::Arc;

use samlbind_core::Error;
use samlbind_crypto::{SignatureVerifier, Signer};
use samlbind_dsig::{KeyInfo, Placement, SignatureContext, SignatureRecord, SignatureState};
use samlbind_xml::Element;

use crate::context::SamlContext;

/// A root that can carry an enveloped signature: `Assertion`, `Request`
/// and `Response`.
pub trait Signable {
    /// Value of the root's identifier attribute.
    fn id(&self) -> Option<&str>;

    /// Where `<ds:Signature>` goes among the root's children.
    fn placement(&self) -> Placement;

    fn signature_state(&self) -> &SignatureState;

    fn signature_state_mut(&mut self) -> &mut SignatureState;

    /// Configure a signature to be produced on the next serialization.
    ///
    /// Fails with `ProtocolViolation` if the root has no identifier and
    /// with `UnsupportedAlgorithm` if the canonicalization or the signer's
    /// algorithms are not supported. Nothing is signed yet.
    fn sign(
        &mut self,
        signer: Arc<dyn Signer>,
        canonicalization: &str,
        key_info: Option<KeyInfo>,
    ) -> Result<(), Error> {
        let id = self.id().map(str::trim).unwrap_or_default();
        if id.is_empty() {
            return Err(Error::ProtocolViolation(
                "a root must have an identifier before it can be signed".into(),
            ));
        }
        tracing::debug!(id, algorithm = signer.algorithm(), "signature configured");
        let ctx = SignatureContext::new(signer, canonicalization, key_info)?;
        self.signature_state_mut().configure(ctx);
        Ok(())
    }

    /// [`Signable::sign`] with the context's default canonicalization.
    /// Signers whose algorithms the context blacklists are refused.
    fn sign_with(&mut self, signer: Arc<dyn Signer>, ctx: &SamlContext) -> Result<(), Error> {
        let blacklisted = ctx
            .blacklisted_algorithms()
            .iter()
            .find(|b| *b == signer.algorithm() || *b == signer.digest_algorithm());
        if let Some(bad) = blacklisted {
            return Err(Error::UnsupportedAlgorithm(format!("blacklisted: {bad}")));
        }
        self.sign(signer, ctx.default_canonicalization(), None)
    }

    /// Accept an existing signature over `original`, enforcing the
    /// enveloped-reference rules. No cryptographic check is made.
    fn set_signature(&mut self, record: SignatureRecord, original: Element) -> Result<(), Error> {
        let id = self.id().map(str::to_owned);
        self.signature_state_mut()
            .set_signature(record, original, id.as_deref())
    }

    fn is_signed(&self) -> bool {
        self.signature_state().is_signed()
    }

    fn is_sign_pending(&self) -> bool {
        self.signature_state().is_configured()
    }
}

/// A root whose carried signature can be checked.
pub trait Verifiable {
    fn signature(&self) -> Option<&SignatureRecord>;

    /// The signed tree and the identifier its reference must name.
    fn signed_element(&self) -> Option<(&Element, Option<&str>)>;

    /// Verify the carried signature against `verifier`, honouring the
    /// context's algorithm blacklist.
    fn verify(&self, verifier: &dyn SignatureVerifier, ctx: &SamlContext) -> Result<(), Error> {
        let (Some(record), Some((element, id))) = (self.signature(), self.signed_element()) else {
            return Err(Error::SignatureInvalid("element carries no signature".into()));
        };
        samlbind_dsig::verify_enveloped(
            element,
            id,
            record,
            verifier,
            ctx.canonicalizer(),
            ctx.blacklisted_algorithms(),
        )
    }
}

/// Implements both capabilities for a root with `id` and `signature`
/// fields.
macro_rules! signable_root {
    ($ty:ty, $placement:expr) => {
        impl $crate::signable::Signable for $ty {
            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn placement(&self) -> samlbind_dsig::Placement {
                $placement
            }

            fn signature_state(&self) -> &samlbind_dsig::SignatureState {
                &self.signature
            }

            fn signature_state_mut(&mut self) -> &mut samlbind_dsig::SignatureState {
                &mut self.signature
            }
        }

        impl $crate::signable::Verifiable for $ty {
            fn signature(&self) -> Option<&samlbind_dsig::SignatureRecord> {
                self.signature.record()
            }

            fn signed_element(&self) -> Option<(&samlbind_xml::Element, Option<&str>)> {
                self.signature
                    .signed_tree()
                    .map(|tree| (tree, self.id.as_deref()))
            }
        }
    };
}

pub(crate) use signable_root;
