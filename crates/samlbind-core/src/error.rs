#![forbid(unsafe_code)]

/// Errors produced by the samlbind SAML 1.1 binding library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Data errors ──────────────────────────────────────────────────

    /// Structural non-conformance: wrong tag or namespace, missing required
    /// attribute or child, cardinality breach.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Structurally valid XML that breaks a SAML profile rule.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A signature reference does not point at the enveloping element.
    #[error("signature reference validation failed: {0}")]
    ReferenceValidationFailed(String),

    /// A signature carries a number of references other than one.
    #[error("signature must contain exactly one reference, found {0}")]
    ReferenceCountMismatch(usize),

    /// MajorVersion / MinorVersion are not exactly 1 / 1.
    #[error("SAML version mismatch: {0}")]
    VersionMismatch(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    // ── Programmer errors ────────────────────────────────────────────

    /// A registry entry does not have the capability the caller asked for.
    #[error("handler mismatch: {0}")]
    HandlerMismatch(String),

    /// An operation was invoked in a state that does not allow it.
    #[error("illegal state: {0}")]
    IllegalState(String),

    // ── Collaborator errors ──────────────────────────────────────────

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("digest mismatch for reference: {0}")]
    DigestMismatch(String),

    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors that indicate a bug in the calling code rather than
    /// bad input data.
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Error::HandlerMismatch(_) | Error::IllegalState(_))
    }

    /// True for errors raised because a signature is present but malformed
    /// relative to the enveloped-reference rules.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Error::ReferenceValidationFailed(_) | Error::ReferenceCountMismatch(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programmer_errors_are_distinct_from_data_errors() {
        assert!(Error::IllegalState("x".into()).is_programmer_error());
        assert!(Error::HandlerMismatch("x".into()).is_programmer_error());
        assert!(!Error::SchemaViolation("x".into()).is_programmer_error());
        assert!(!Error::ProtocolViolation("x".into()).is_programmer_error());
    }

    #[test]
    fn reference_count_message() {
        let e = Error::ReferenceCountMismatch(2);
        assert_eq!(
            e.to_string(),
            "signature must contain exactly one reference, found 2"
        );
        assert!(e.is_reference_error());
    }
}
