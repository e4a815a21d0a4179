#![forbid(unsafe_code)]

//! Cryptographic algorithm implementations for samlbind XML signatures.
//!
//! Provides digests (SHA-1, SHA-2), signature algorithms (RSA PKCS#1 v1.5,
//! HMAC) and the [`Signer`] / [`SignatureVerifier`] services that the
//! signature layer calls into.

pub mod digest;
pub mod sign;
pub mod signer;

pub use digest::DigestMethod;
pub use sign::{SignatureAlgorithm, SigningKey};
pub use signer::{KeySigner, SignatureVerifier, Signer};
