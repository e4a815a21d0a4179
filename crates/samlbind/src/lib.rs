#![forbid(unsafe_code)]

//! SAML 1.1 data binding with an enveloped XML signature lifecycle.
//!
//! ```no_run
//! use std::sync::Arc;
//! use samlbind::{algorithm, Assertion, KeySigner, SamlContext, Signable, SigningKey, Verifiable};
//!
//! # fn main() -> Result<(), samlbind::Error> {
//! let ctx = SamlContext::new();
//! let mut assertion = Assertion::parse(&std::fs::read_to_string("assertion.xml").unwrap(), &ctx)?;
//! let key = KeySigner::new(SigningKey::Hmac(b"secret".to_vec()), algorithm::HMAC_SHA256)?;
//! assertion.verify(&key, &ctx)?;
//!
//! assertion.set_id(samlbind::saml::id::generate());
//! assertion.sign_with(Arc::new(key), &ctx)?;
//! let signed = assertion.to_xml(&ctx)?;
//! # let _ = signed;
//! # Ok(())
//! # }
//! ```

pub use samlbind_c14n as c14n;
pub use samlbind_core as core;
pub use samlbind_crypto as crypto;
pub use samlbind_dsig as dsig;
pub use samlbind_saml as saml;
pub use samlbind_transforms as transforms;
pub use samlbind_xml as xml;

pub use samlbind_core::{algorithm, ns, Error};
pub use samlbind_crypto::{KeySigner, SignatureVerifier, Signer, SigningKey};
pub use samlbind_dsig::KeyInfo;
pub use samlbind_saml::{
    Assertion, Extension, ExtensionKind, ExtensionObject, ExtensionRegistry, ExtensionType,
    Request, Response, SamlConfig, SamlContext, Signable, Statement, Status, Verifiable,
};
