#![forbid(unsafe_code)]

//! Enveloped signature creation.
//!
//! Processing order:
//! 1. Run the fixed transform chain (enveloped-signature, then the configured
//!    canonicalization) over the unsigned tree
//! 2. Digest the canonical bytes into a single `#ID` reference
//! 3. Re-parse the canonical bytes; this is the tree that gets signed
//! 4. Build `<ds:Signature>`, canonicalize `<SignedInfo>` in the namespace
//!    context of its final position and sign it
//! 5. Insert the signature per the root's placement rule

use std::collections::BTreeSet;
use std::sync::Arc;

use samlbind_c14n::{C14nMode, Canonicalizer};
use samlbind_core::{algorithm, Error};
use samlbind_transforms::{TransformData, TransformPipeline};
use samlbind_xml::{Element, Node, NsDecl, Scope};

use crate::context::SignatureContext;
use crate::placement::Placement;
use crate::record::{Reference, SignatureRecord, SignedInfo, TransformSpec};

/// Sign `tree`, whose identifier is `id`, and return the signed tree along
/// with the signature that was attached to it.
pub fn do_sign(
    tree: Element,
    id: &str,
    ctx: &SignatureContext,
    placement: Placement,
    canonicalizer: Arc<dyn Canonicalizer>,
) -> Result<(Element, SignatureRecord), Error> {
    let c14n_uri = ctx.canonicalization();
    let exclusive = C14nMode::from_uri(c14n_uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("canonicalization: {c14n_uri}")))?
        .is_exclusive();
    let prefixes = if exclusive {
        qname_content_prefixes(&tree)
    } else {
        Vec::new()
    };

    tracing::debug!(
        id,
        algorithm = ctx.signer().algorithm(),
        canonicalization = c14n_uri,
        "signing enveloped element"
    );

    // 1-2. Transform chain and reference digest.
    let pipeline =
        TransformPipeline::enveloped_with(Arc::clone(&canonicalizer), c14n_uri, prefixes.clone())?;
    let canonical = pipeline.execute(TransformData::xml(tree))?.to_binary()?;
    let digest_method = ctx.signer().digest_algorithm().to_owned();
    let digest_value = samlbind_crypto::digest::digest(&digest_method, &canonical)?;

    let reference = Reference {
        uri: Some(format!("#{id}")),
        transforms: vec![
            TransformSpec::new(algorithm::ENVELOPED_SIGNATURE),
            TransformSpec {
                algorithm: c14n_uri.to_owned(),
                inclusive_prefixes: prefixes,
            },
        ],
        digest_method,
        digest_value,
    };

    // 3. The signed tree is the canonical form, not the caller's tree.
    let mut signed = samlbind_xml::parse_bytes(&canonical)?;

    // 4. SignedInfo is canonicalized where it will finally sit.
    let signed_info = SignedInfo {
        canonicalization: c14n_uri.to_owned(),
        inclusive_prefixes: Vec::new(),
        signature_method: ctx.signer().algorithm().to_owned(),
        references: vec![reference],
    };
    let mut record = SignatureRecord {
        signed_info,
        signature_value: Vec::new(),
        key_info: ctx.key_info().cloned(),
    };
    let placeholder = record.to_element();
    let context = signed_info_context(&signed, &placeholder);
    let si_bytes = canonicalizer.canonicalize(
        &record.signed_info.to_element(),
        &context,
        c14n_uri,
        &record.signed_info.inclusive_prefixes,
    )?;
    record.signature_value = ctx.signer().sign(&si_bytes)?;

    // 5. Attach.
    signed.detach_source();
    let index = placement.insert(&mut signed, record.to_element());
    tracing::debug!(id, index, "signature attached");

    Ok((signed, record))
}

/// Bindings in scope at a `<ds:SignedInfo>` that is the first child of
/// `signature`, itself a direct child of `root`.
pub(crate) fn signed_info_context(root: &Element, signature: &Element) -> Vec<NsDecl> {
    let mut context = root.in_scope_namespaces();
    let scope = Scope::with_bindings(&context);
    for decl in scope.declarations_for(root) {
        context.retain(|d| d.prefix != decl.prefix);
        context.push(decl);
    }
    let scope = Scope::with_bindings(&context);
    for decl in scope.declarations_for(signature) {
        context.retain(|d| d.prefix != decl.prefix);
        context.push(decl);
    }
    context.retain(|d| !d.uri.is_empty());
    context
}

/// Prefixes that QName-valued content (`xsi:type` and similar) depends on.
/// Exclusive canonicalization does not treat them as visibly utilized, so
/// they go into the reference's PrefixList.
pub(crate) fn qname_content_prefixes(tree: &Element) -> Vec<String> {
    let mut out = BTreeSet::new();
    collect_qname_prefixes(tree, &mut out);
    out.into_iter()
        .map(|p| if p.is_empty() { "#default".to_owned() } else { p })
        .collect()
}

fn collect_qname_prefixes(element: &Element, out: &mut BTreeSet<String>) {
    for d in &element.required_namespaces {
        out.insert(d.prefix.clone());
    }
    for child in &element.children {
        match child {
            Node::Element(e) => collect_qname_prefixes(e, out),
            Node::Raw(r) => {
                if let Ok(parsed) = r.parse() {
                    collect_qname_prefixes(&parsed, out);
                }
            }
            _ => {}
        }
    }
}
