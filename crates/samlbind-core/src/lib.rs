#![forbid(unsafe_code)]

//! Core definitions shared by every samlbind crate: the error type and the
//! namespace, element, attribute and algorithm constants of SAML 1.1 and
//! XML-DSig.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
