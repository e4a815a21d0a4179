#![forbid(unsafe_code)]

//! Owned XML element tree for samlbind.
//!
//! Provides a mutable, namespace-aware element tree that can be built in
//! code or parsed from text (via `roxmltree`), serialized back with
//! automatic namespace declaration, and spliced with raw XML chunks that
//! must survive byte for byte.

pub mod document;
pub mod element;
pub mod escape;
pub mod namespace;
pub mod qname;
pub mod writer;

pub use document::{parse, parse_bytes, XmlDocument};
pub use element::{Attribute, Element, Node, RawXml};
pub use namespace::{NsDecl, Scope};
pub use qname::QName;

/// Return roxmltree parsing options with document type declarations
/// disallowed.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    }
}
