#![forbid(unsafe_code)]

//! Transform pipeline engine for samlbind signatures.
//!
//! Implements the transform chain model from XML-DSig: each reference
//! contains a sequence of transforms that are applied in order. SAML
//! enveloped signatures use exactly two: enveloped-signature, then a
//! canonicalization.

pub mod enveloped;
pub mod pipeline;

pub use enveloped::EnvelopedSignatureTransform;
pub use pipeline::{C14nTransform, Transform, TransformData, TransformPipeline};
