#![forbid(unsafe_code)]

//! Pending signature configuration and key hints.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use samlbind_core::{algorithm, ns, Error};
use samlbind_crypto::Signer;
use samlbind_xml::{Element, QName};

/// Signature settings stored by `sign()` and consumed exactly once when the
/// root is next serialized.
#[derive(Clone)]
pub struct SignatureContext {
    signer: Arc<dyn Signer>,
    canonicalization: String,
    key_info: Option<KeyInfo>,
}

impl SignatureContext {
    /// Validate and build a context. The canonicalization algorithm must be
    /// allow-listed and the digest algorithm implemented, since both run
    /// here. The signature method belongs to the signer: any absolute URI
    /// outside [`algorithm::DEFAULT_BLACKLIST`] is accepted. Failures are
    /// `UnsupportedAlgorithm`.
    pub fn new(
        signer: Arc<dyn Signer>,
        canonicalization: &str,
        key_info: Option<KeyInfo>,
    ) -> Result<Self, Error> {
        if !samlbind_c14n::is_allowed(canonicalization) {
            return Err(Error::UnsupportedAlgorithm(format!(
                "canonicalization: {canonicalization}"
            )));
        }
        let method = signer.algorithm();
        if url::Url::parse(method).is_err() || algorithm::DEFAULT_BLACKLIST.contains(&method) {
            return Err(Error::UnsupportedAlgorithm(format!(
                "signature algorithm: {method}"
            )));
        }
        samlbind_crypto::DigestMethod::from_uri(signer.digest_algorithm())?;
        Ok(Self {
            signer,
            canonicalization: canonicalization.to_owned(),
            key_info,
        })
    }

    pub fn signer(&self) -> &dyn Signer {
        self.signer.as_ref()
    }

    pub fn canonicalization(&self) -> &str {
        &self.canonicalization
    }

    pub fn key_info(&self) -> Option<&KeyInfo> {
        self.key_info.as_ref()
    }
}

impl fmt::Debug for SignatureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureContext")
            .field("algorithm", &self.signer.algorithm())
            .field("digest", &self.signer.digest_algorithm())
            .field("canonicalization", &self.canonicalization)
            .field("key_info", &self.key_info)
            .finish()
    }
}

/// The subset of `<ds:KeyInfo>` carried through: a key name and X.509
/// certificates (DER).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyInfo {
    pub key_name: Option<String>,
    pub certificates: Vec<Vec<u8>>,
}

impl KeyInfo {
    pub fn with_key_name(name: impl Into<String>) -> Self {
        Self {
            key_name: Some(name.into()),
            certificates: Vec::new(),
        }
    }

    pub fn with_certificate(der: Vec<u8>) -> Self {
        Self {
            key_name: None,
            certificates: vec![der],
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        if !element.is(ns::DSIG, ns::node::KEY_INFO) {
            return Err(Error::SchemaViolation(format!(
                "expected ds:KeyInfo, found {}",
                element.name
            )));
        }
        let key_name = element
            .first_child(ns::DSIG, ns::node::KEY_NAME)
            .map(|e| e.text().trim().to_owned());
        let mut certificates = Vec::new();
        for data in element.children_named(ns::DSIG, ns::node::X509_DATA) {
            for cert in data.children_named(ns::DSIG, ns::node::X509_CERTIFICATE) {
                certificates.push(crate::decode_base64(&cert.text())?);
            }
        }
        Ok(Self {
            key_name,
            certificates,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut key_info = Element::new(ds(ns::node::KEY_INFO));
        if let Some(name) = &self.key_name {
            key_info.push(Element::new(ds(ns::node::KEY_NAME)).with_text(name.clone()));
        }
        if !self.certificates.is_empty() {
            let mut data = Element::new(ds(ns::node::X509_DATA));
            for der in &self.certificates {
                data.push(
                    Element::new(ds(ns::node::X509_CERTIFICATE))
                        .with_text(base64::engine::general_purpose::STANDARD.encode(der)),
                );
            }
            key_info.push(data);
        }
        key_info
    }
}

pub(crate) fn ds(local: &str) -> QName {
    QName::prefixed(ns::DSIG, ns::prefix::DSIG, local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use samlbind_crypto::{KeySigner, SigningKey};

    fn hmac_signer() -> Arc<dyn Signer> {
        Arc::new(KeySigner::new(SigningKey::Hmac(b"k".to_vec()), algorithm::HMAC_SHA256).unwrap())
    }

    struct Md5Signer;

    impl Signer for Md5Signer {
        fn algorithm(&self) -> &str {
            algorithm::RSA_MD5
        }
        fn digest_algorithm(&self) -> &str {
            algorithm::MD5
        }
        fn sign(&self, _data: &[u8]) -> Result<Vec<u8>, Error> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn allowed_canonicalization_is_accepted() {
        let ctx = SignatureContext::new(hmac_signer(), algorithm::EXC_C14N, None).unwrap();
        assert_eq!(ctx.canonicalization(), algorithm::EXC_C14N);
        assert_eq!(ctx.signer().algorithm(), algorithm::HMAC_SHA256);
    }

    #[test]
    fn unknown_canonicalization_is_rejected() {
        let err = SignatureContext::new(hmac_signer(), algorithm::C14N11, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn unsupported_signer_is_rejected() {
        let err = SignatureContext::new(Arc::new(Md5Signer), algorithm::C14N, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    /// Stands in for a key held outside this process.
    struct ExternalSigner(&'static str);

    impl Signer for ExternalSigner {
        fn algorithm(&self) -> &str {
            self.0
        }
        fn digest_algorithm(&self) -> &str {
            algorithm::SHA256
        }
        fn sign(&self, _data: &[u8]) -> Result<Vec<u8>, Error> {
            Ok(vec![0; 64])
        }
    }

    #[test]
    fn external_signature_method_is_accepted() {
        let ctx =
            SignatureContext::new(Arc::new(ExternalSigner(algorithm::ECDSA_SHA256)), algorithm::C14N, None)
                .unwrap();
        assert_eq!(ctx.signer().algorithm(), algorithm::ECDSA_SHA256);
    }

    #[test]
    fn malformed_signature_method_is_rejected() {
        for method in ["", "not a uri", "ecdsa-sha256"] {
            let err = SignatureContext::new(Arc::new(ExternalSigner(method)), algorithm::C14N, None)
                .unwrap_err();
            assert!(matches!(err, Error::UnsupportedAlgorithm(_)), "{method}");
        }
    }

    #[test]
    fn key_info_round_trip_through_tree() {
        let info = KeyInfo {
            key_name: Some("idp".into()),
            certificates: vec![vec![1, 2, 3]],
        };
        let el = info.to_element();
        let text = samlbind_xml::writer::to_string(&el);
        let parsed = samlbind_xml::parse(&text).unwrap();
        assert_eq!(KeyInfo::from_element(&parsed).unwrap(), info);
    }
}
