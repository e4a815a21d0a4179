#![forbid(unsafe_code)]

//! Signature algorithm implementations (RSA PKCS#1 v1.5, HMAC).

use samlbind_core::{algorithm, Error};
use signature::SignatureEncoding;

/// Key material for signature operations.
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    Hmac(Vec<u8>),
}

impl SigningKey {
    /// True if the key can produce signatures (not just verify them).
    pub fn can_sign(&self) -> bool {
        !matches!(self, SigningKey::RsaPublic(_))
    }

    fn family(&self) -> KeyFamily {
        match self {
            SigningKey::Rsa(_) | SigningKey::RsaPublic(_) => KeyFamily::Rsa,
            SigningKey::Hmac(_) => KeyFamily::Hmac,
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        match self {
            SigningKey::Rsa(_) => f.write_str("SigningKey::Rsa(..)"),
            SigningKey::RsaPublic(_) => f.write_str("SigningKey::RsaPublic(..)"),
            SigningKey::Hmac(_) => f.write_str("SigningKey::Hmac(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyFamily {
    Rsa,
    Hmac,
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send + Sync {
    fn uri(&self) -> &'static str;
    /// The digest algorithm conventionally paired with this signature
    /// algorithm for reference digests.
    fn digest_uri(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA1, hash: HashType::Sha1 })),
        algorithm::RSA_SHA224 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA224, hash: HashType::Sha224 })),
        algorithm::RSA_SHA256 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA256, hash: HashType::Sha256 })),
        algorithm::RSA_SHA384 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA384, hash: HashType::Sha384 })),
        algorithm::RSA_SHA512 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA512, hash: HashType::Sha512 })),

        algorithm::HMAC_SHA1 => Ok(Box::new(HmacSign { uri: algorithm::HMAC_SHA1, hash: HashType::Sha1 })),
        algorithm::HMAC_SHA224 => Ok(Box::new(HmacSign { uri: algorithm::HMAC_SHA224, hash: HashType::Sha224 })),
        algorithm::HMAC_SHA256 => Ok(Box::new(HmacSign { uri: algorithm::HMAC_SHA256, hash: HashType::Sha256 })),
        algorithm::HMAC_SHA384 => Ok(Box::new(HmacSign { uri: algorithm::HMAC_SHA384, hash: HashType::Sha384 })),
        algorithm::HMAC_SHA512 => Ok(Box::new(HmacSign { uri: algorithm::HMAC_SHA512, hash: HashType::Sha512 })),

        _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    }
}

pub(crate) fn family_of(uri: &str) -> Option<KeyFamily> {
    match uri {
        algorithm::RSA_SHA1
        | algorithm::RSA_SHA224
        | algorithm::RSA_SHA256
        | algorithm::RSA_SHA384
        | algorithm::RSA_SHA512 => Some(KeyFamily::Rsa),
        algorithm::HMAC_SHA1
        | algorithm::HMAC_SHA224
        | algorithm::HMAC_SHA256
        | algorithm::HMAC_SHA384
        | algorithm::HMAC_SHA512 => Some(KeyFamily::Hmac),
        _ => None,
    }
}

/// True if `key` is usable with the signature algorithm `uri`.
pub fn key_matches(key: &SigningKey, uri: &str) -> bool {
    family_of(uri) == Some(key.family())
}

#[derive(Debug, Clone, Copy)]
enum HashType { Sha1, Sha224, Sha256, Sha384, Sha512 }

impl HashType {
    fn digest_uri(self) -> &'static str {
        match self {
            HashType::Sha1 => algorithm::SHA1,
            HashType::Sha224 => algorithm::SHA224,
            HashType::Sha256 => algorithm::SHA256,
            HashType::Sha384 => algorithm::SHA384,
            HashType::Sha512 => algorithm::SHA512,
        }
    }
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 { uri: &'static str, hash: HashType }

impl RsaPkcs1v15 {
    fn sign_with_key(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                let sig = sk
                    .try_sign(data)
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))?;
                Ok(sig.to_vec())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha224 => do_sign!(sha2::Sha224),
            HashType::Sha256 => do_sign!(sha2::Sha256),
            HashType::Sha384 => do_sign!(sha2::Sha384),
            HashType::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify_with_key(&self, public_key: &rsa::RsaPublicKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha224 => do_verify!(sha2::Sha224),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str { self.uri }

    fn digest_uri(&self) -> &'static str { self.hash.digest_uri() }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        match key {
            SigningKey::Rsa(pk) => self.sign_with_key(pk, data),
            _ => Err(Error::Key("RSA private key required".into())),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let pubk = match key {
            SigningKey::Rsa(pk) => pk.to_public_key(),
            SigningKey::RsaPublic(pk) => pk.clone(),
            _ => return Err(Error::Key("RSA key required".into())),
        };
        self.verify_with_key(&pubk, data, sig_bytes)
    }
}

// ── HMAC ─────────────────────────────────────────────────────────────

struct HmacSign { uri: &'static str, hash: HashType }

impl SignatureAlgorithm for HmacSign {
    fn uri(&self) -> &'static str { self.uri }

    fn digest_uri(&self) -> &'static str { self.hash.digest_uri() }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        let SigningKey::Hmac(key_bytes) = key else {
            return Err(Error::Key("HMAC key required".into()));
        };
        compute_hmac(self.hash, key_bytes, data)
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let SigningKey::Hmac(key_bytes) = key else {
            return Err(Error::Key("HMAC key required".into()));
        };
        let expected = compute_hmac(self.hash, key_bytes, data)?;
        Ok(constant_time_eq(&expected, sig_bytes))
    }
}

fn compute_hmac(hash: HashType, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
    use hmac::{Hmac, Mac};
    macro_rules! hmac_compute {
        ($hasher:ty) => {{
            let mut mac = <Hmac<$hasher>>::new_from_slice(key)
                .map_err(|e| Error::Key(format!("invalid HMAC key: {e}")))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }};
    }
    match hash {
        HashType::Sha1 => hmac_compute!(sha1::Sha1),
        HashType::Sha224 => hmac_compute!(sha2::Sha224),
        HashType::Sha256 => hmac_compute!(sha2::Sha256),
        HashType::Sha384 => hmac_compute!(sha2::Sha384),
        HashType::Sha512 => hmac_compute!(sha2::Sha512),
    }
}

// Truncated HMAC output is rejected outright.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rsa_key() -> rsa::RsaPrivateKey {
        let mut rng = rand::thread_rng();
        rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap()
    }

    #[test]
    fn hmac_sign_verify() {
        let alg = from_uri(algorithm::HMAC_SHA256).unwrap();
        let key = SigningKey::Hmac(b"secret".to_vec());
        let sig = alg.sign(&key, b"data").unwrap();
        assert_eq!(sig.len(), 32);
        assert!(alg.verify(&key, b"data", &sig).unwrap());
        assert!(!alg.verify(&key, b"other", &sig).unwrap());
    }

    #[test]
    fn truncated_hmac_is_rejected() {
        let alg = from_uri(algorithm::HMAC_SHA1).unwrap();
        let key = SigningKey::Hmac(b"secret".to_vec());
        let sig = alg.sign(&key, b"data").unwrap();
        assert!(!alg.verify(&key, b"data", &sig[..10]).unwrap());
    }

    #[test]
    fn rsa_sign_verify_with_public_half() {
        let private = rsa_key();
        let public = SigningKey::RsaPublic(private.to_public_key());
        let private = SigningKey::Rsa(private);
        let alg = from_uri(algorithm::RSA_SHA256).unwrap();
        let sig = alg.sign(&private, b"data").unwrap();
        assert!(alg.verify(&public, b"data", &sig).unwrap());
        assert!(!alg.verify(&public, b"tampered", &sig).unwrap());
        assert!(matches!(alg.sign(&public, b"data"), Err(Error::Key(_))));
    }

    #[test]
    fn key_family_checks() {
        let hmac = SigningKey::Hmac(vec![1, 2, 3]);
        assert!(key_matches(&hmac, algorithm::HMAC_SHA1));
        assert!(!key_matches(&hmac, algorithm::RSA_SHA1));
        assert!(!key_matches(&hmac, algorithm::RSA_MD5));
    }

    #[test]
    fn md5_variants_are_unsupported() {
        assert!(from_uri(algorithm::RSA_MD5).is_err());
        assert!(from_uri(algorithm::HMAC_MD5).is_err());
        assert!(from_uri(algorithm::RSA_SHA1).is_ok());
    }

    #[test]
    fn digest_pairing() {
        assert_eq!(from_uri(algorithm::RSA_SHA1).unwrap().digest_uri(), algorithm::SHA1);
        assert_eq!(from_uri(algorithm::HMAC_SHA512).unwrap().digest_uri(), algorithm::SHA512);
    }
}
