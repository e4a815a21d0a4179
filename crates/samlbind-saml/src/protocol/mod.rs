#![forbid(unsafe_code)]

//! SAML 1.1 protocol messages: requests, queries and responses.

pub mod query;
pub mod request;
pub mod response;
pub mod status;

pub use query::{AttributeQuery, AuthenticationQuery, AuthorizationDecisionQuery, Query};
pub use request::{Request, RequestBody};
pub use response::Response;
pub use status::{Status, StatusCode};
