#![forbid(unsafe_code)]

//! Enveloped signature verification.
//!
//! Processing order:
//! 1. Reject blacklisted algorithms
//! 2. Enforce the single `#ID` reference rule
//! 3. Run the reference's transforms over the root and compare the digest
//! 4. Canonicalize `<ds:SignedInfo>` in its namespace context
//! 5. Check `<ds:SignatureValue>` with the caller's verifier

use std::sync::Arc;

use samlbind_c14n::Canonicalizer;
use samlbind_core::{ns, Error};
use samlbind_crypto::SignatureVerifier;
use samlbind_transforms::{TransformData, TransformPipeline};
use samlbind_xml::Element;

use crate::record::SignatureRecord;
use crate::sign::signed_info_context;

/// Verify the enveloped signature `record` carried by `root`, whose
/// identifier is `id`.
///
/// `root` is the signed element as parsed (or as produced by signing).
/// Returns `Ok(())` only when both the reference digest and the signature
/// value check out.
pub fn verify_enveloped(
    root: &Element,
    id: Option<&str>,
    record: &SignatureRecord,
    verifier: &dyn SignatureVerifier,
    canonicalizer: Arc<dyn Canonicalizer>,
    blacklist: &[String],
) -> Result<(), Error> {
    // 1. Blacklist
    if let Some(bad) = record
        .algorithms()
        .into_iter()
        .find(|uri| blacklist.iter().any(|b| b == uri))
    {
        tracing::warn!(algorithm = bad, "signature uses a blacklisted algorithm");
        return Err(Error::UnsupportedAlgorithm(format!("blacklisted: {bad}")));
    }

    // 2. Reference shape
    let reference = record.validate_reference(id)?;

    // 3. Reference digest
    let uris: Vec<&str> = reference
        .transforms
        .iter()
        .map(|t| t.algorithm.as_str())
        .collect();
    let pipeline = TransformPipeline::from_uris(
        Arc::clone(&canonicalizer),
        &uris,
        reference.inclusive_prefixes(),
    )?;
    let input = TransformData::Xml {
        element: root.clone(),
        inherited: root.inherited_namespaces(),
    };
    let canonical = pipeline.execute(input)?.to_binary()?;
    let computed = samlbind_crypto::digest::digest(&reference.digest_method, &canonical)?;
    if computed != reference.digest_value {
        let uri = reference.uri.as_deref().unwrap_or_default();
        tracing::warn!(uri, "reference digest does not match");
        return Err(Error::DigestMismatch(uri.to_owned()));
    }

    // 4. SignedInfo as it sits in the signed tree
    let signature = root
        .first_child(ns::DSIG, ns::node::SIGNATURE)
        .ok_or_else(|| Error::SchemaViolation("signed element has no ds:Signature child".into()))?;
    let signed_info = signature
        .first_child(ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::SchemaViolation("ds:Signature has no ds:SignedInfo".into()))?;
    let context = signed_info_context(root, signature);
    let si_bytes = canonicalizer.canonicalize(
        signed_info,
        &context,
        &record.signed_info.canonicalization,
        &record.signed_info.inclusive_prefixes,
    )?;

    // 5. SignatureValue
    let valid = verifier.verify(
        &record.signed_info.signature_method,
        &si_bytes,
        &record.signature_value,
    )?;
    if !valid {
        tracing::warn!(
            algorithm = record.signed_info.signature_method.as_str(),
            "signature value does not verify"
        );
        return Err(Error::SignatureInvalid(
            "signature value does not match SignedInfo".into(),
        ));
    }

    tracing::debug!(id, "enveloped signature verified");
    Ok(())
}
