#![forbid(unsafe_code)]

//! SAML 1.1 assertion and protocol data binding.
//!
//! Parses and serializes assertions, requests and responses, resolves the
//! open extension points through a registry held in a [`SamlContext`], and
//! drives the enveloped-signature lifecycle of the three signable roots.

pub mod assertion;
pub mod context;
pub mod extension;
pub mod id;
pub mod protocol;
pub mod registry;
mod schema;
pub mod signable;
pub mod value;

pub use assertion::{Assertion, Statement};
pub use context::{Clock, FixedClock, SamlConfig, SamlContext, SamlContextBuilder, SystemClock};
pub use extension::{Extension, ExtensionKind, ExtensionObject, ExtensionType, UnknownExtension};
pub use protocol::{Request, Response, Status};
pub use registry::{Capability, ExtensionRegistry, Handler};
pub use signable::{Signable, Verifiable};
pub use value::{SamlDateTime, SamlString, SamlUri};
