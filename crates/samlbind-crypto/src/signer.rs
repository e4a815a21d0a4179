#![forbid(unsafe_code)]

//! Signing and verification services used by enveloped signatures.

use std::sync::Arc;

use samlbind_core::Error;

use crate::sign::{self, SigningKey};

/// Produces signature values over canonical `SignedInfo` bytes.
pub trait Signer: Send + Sync {
    /// Signature algorithm URI written to `SignatureMethod`.
    fn algorithm(&self) -> &str;
    /// Digest algorithm URI used for the reference digest.
    fn digest_algorithm(&self) -> &str;
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Checks signature values over canonical `SignedInfo` bytes.
pub trait SignatureVerifier: Send + Sync {
    /// Returns `Ok(false)` when the signature does not match; errors are
    /// reserved for unusable keys or malformed signature values.
    fn verify(&self, algorithm: &str, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// A [`Signer`] backed by in-memory key material.
#[derive(Debug, Clone)]
pub struct KeySigner {
    key: Arc<SigningKey>,
    algorithm: &'static str,
    digest: &'static str,
}

impl KeySigner {
    /// Pair `key` with the signature algorithm `algorithm`. The reference
    /// digest uses the algorithm's own hash.
    pub fn new(key: SigningKey, algorithm: &str) -> Result<Self, Error> {
        let alg = sign::from_uri(algorithm)?;
        if !sign::key_matches(&key, algorithm) {
            return Err(Error::Key(format!("key does not fit {algorithm}")));
        }
        if !key.can_sign() {
            return Err(Error::Key("a private key is required for signing".into()));
        }
        Ok(Self {
            key: Arc::new(key),
            algorithm: alg.uri(),
            digest: alg.digest_uri(),
        })
    }

    /// Use a different digest algorithm for the reference.
    pub fn with_digest(mut self, digest: &str) -> Result<Self, Error> {
        self.digest = crate::digest::DigestMethod::from_uri(digest)?.uri();
        Ok(self)
    }

    pub fn key(&self) -> &SigningKey {
        &self.key
    }
}

impl Signer for KeySigner {
    fn algorithm(&self) -> &str {
        self.algorithm
    }

    fn digest_algorithm(&self) -> &str {
        self.digest
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        sign::from_uri(self.algorithm)?.sign(&self.key, data)
    }
}

impl SignatureVerifier for KeySigner {
    fn verify(&self, algorithm: &str, data: &[u8], signature: &[u8]) -> Result<bool, Error> {
        self.key.verify(algorithm, data, signature)
    }
}

impl SignatureVerifier for SigningKey {
    fn verify(&self, algorithm: &str, data: &[u8], signature: &[u8]) -> Result<bool, Error> {
        if !sign::key_matches(self, algorithm) {
            return Err(Error::Key(format!("key does not fit {algorithm}")));
        }
        sign::from_uri(algorithm)?.verify(self, data, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samlbind_core::algorithm;

    #[test]
    fn hmac_signer_round_trip() {
        let signer = KeySigner::new(SigningKey::Hmac(b"k".to_vec()), algorithm::HMAC_SHA1).unwrap();
        assert_eq!(signer.algorithm(), algorithm::HMAC_SHA1);
        assert_eq!(signer.digest_algorithm(), algorithm::SHA1);
        let sig = signer.sign(b"payload").unwrap();
        assert!(signer.verify(algorithm::HMAC_SHA1, b"payload", &sig).unwrap());
    }

    #[test]
    fn mismatched_key_is_refused() {
        let err = KeySigner::new(SigningKey::Hmac(b"k".to_vec()), algorithm::RSA_SHA256).unwrap_err();
        assert!(matches!(err, Error::Key(_)));
    }

    #[test]
    fn unknown_algorithm_is_unsupported() {
        let err = KeySigner::new(SigningKey::Hmac(b"k".to_vec()), algorithm::HMAC_MD5).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn digest_override() {
        let signer = KeySigner::new(SigningKey::Hmac(b"k".to_vec()), algorithm::HMAC_SHA1)
            .unwrap()
            .with_digest(algorithm::SHA256)
            .unwrap();
        assert_eq!(signer.digest_algorithm(), algorithm::SHA256);
    }
}
