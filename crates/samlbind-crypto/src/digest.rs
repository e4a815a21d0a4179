#![forbid(unsafe_code)]

//! Reference digests (`<ds:DigestMethod>`).

use digest::Digest;
use samlbind_core::{algorithm, Error};

/// A digest method a `<ds:Reference>` may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMethod {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestMethod {
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        Ok(match uri {
            algorithm::SHA1 => DigestMethod::Sha1,
            algorithm::SHA224 => DigestMethod::Sha224,
            algorithm::SHA256 => DigestMethod::Sha256,
            algorithm::SHA384 => DigestMethod::Sha384,
            algorithm::SHA512 => DigestMethod::Sha512,
            _ => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "digest algorithm: {uri}"
                )))
            }
        })
    }

    pub fn uri(self) -> &'static str {
        match self {
            DigestMethod::Sha1 => algorithm::SHA1,
            DigestMethod::Sha224 => algorithm::SHA224,
            DigestMethod::Sha256 => algorithm::SHA256,
            DigestMethod::Sha384 => algorithm::SHA384,
            DigestMethod::Sha512 => algorithm::SHA512,
        }
    }

    /// Hash canonical octets.
    pub fn compute(self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestMethod::Sha1 => sha1::Sha1::digest(data).to_vec(),
            DigestMethod::Sha224 => sha2::Sha224::digest(data).to_vec(),
            DigestMethod::Sha256 => sha2::Sha256::digest(data).to_vec(),
            DigestMethod::Sha384 => sha2::Sha384::digest(data).to_vec(),
            DigestMethod::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }
}

/// Resolve `uri` and hash `data` with it.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    Ok(DigestMethod::from_uri(uri)?.compute(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_value() {
        let hex: String = digest(algorithm::SHA256, b"hello")
            .unwrap()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        assert_eq!(
            hex,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn output_lengths() {
        assert_eq!(DigestMethod::Sha1.compute(b"x").len(), 20);
        assert_eq!(DigestMethod::Sha512.compute(b"x").len(), 64);
    }

    #[test]
    fn uri_round_trip() {
        let m = DigestMethod::from_uri(algorithm::SHA384).unwrap();
        assert_eq!(m, DigestMethod::Sha384);
        assert_eq!(m.uri(), algorithm::SHA384);
    }

    #[test]
    fn md5_is_not_implemented() {
        assert!(matches!(
            digest(algorithm::MD5, b"hello"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
