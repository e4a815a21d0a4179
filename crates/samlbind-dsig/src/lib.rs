#![forbid(unsafe_code)]

//! Enveloped XML-DSig signatures for SAML signable roots.
//!
//! A signable root carries a [`SignatureState`]. `sign()` stores a
//! [`SignatureContext`]; the next serialization runs [`do_sign`], and
//! [`verify_enveloped`] checks a parsed or produced signature.

pub mod context;
pub mod placement;
pub mod record;
pub mod sign;
pub mod state;
pub mod verify;

pub use context::{KeyInfo, SignatureContext};
pub use placement::{Anchor, Placement};
pub use record::{Reference, SignatureRecord, SignedInfo, TransformSpec};
pub use sign::do_sign;
pub use state::SignatureState;
pub use verify::verify_enveloped;

use base64::Engine;
use samlbind_core::Error;

/// Decode base64 element content, ignoring embedded whitespace.
pub(crate) fn decode_base64(text: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(e.to_string()))
}
