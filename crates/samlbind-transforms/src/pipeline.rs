#![forbid(unsafe_code)]

//! Transform pipeline and trait definitions.

use std::sync::Arc;

use samlbind_c14n::{C14n, C14nMode, Canonicalizer};
use samlbind_core::{algorithm, Error};
use samlbind_xml::{Element, NsDecl};

use crate::enveloped::EnvelopedSignatureTransform;

/// Data flowing through the transform pipeline.
#[derive(Debug)]
pub enum TransformData {
    /// An element subtree (for XML-aware transforms like C14N), together
    /// with bindings it inherits from outside the subtree.
    Xml {
        element: Element,
        inherited: Vec<NsDecl>,
    },
    /// Raw binary data.
    Binary(Vec<u8>),
}

impl TransformData {
    pub fn xml(element: Element) -> Self {
        TransformData::Xml {
            element,
            inherited: Vec::new(),
        }
    }

    /// Convert to binary (applying C14N if needed).
    pub fn to_binary(&self) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data.clone()),
            TransformData::Xml { element, inherited } => {
                // Default: inclusive C14N without comments
                samlbind_c14n::canonicalize(element, inherited, C14nMode::Inclusive, &[])
            }
        }
    }
}

/// Trait for individual transforms.
pub trait Transform: Send {
    /// The algorithm URI for this transform.
    fn uri(&self) -> &str;

    /// Execute the transform on the given data.
    fn execute(&self, input: TransformData) -> Result<TransformData, Error>;
}

/// A pipeline of transforms executed in sequence.
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// The chain used by enveloped SAML signatures: remove the signature,
    /// then canonicalize.
    pub fn enveloped(c14n_uri: &str, inclusive_prefixes: Vec<String>) -> Result<Self, Error> {
        Self::enveloped_with(Arc::new(C14n), c14n_uri, inclusive_prefixes)
    }

    /// [`TransformPipeline::enveloped`] with a caller-supplied canonicalizer.
    pub fn enveloped_with(
        canonicalizer: Arc<dyn Canonicalizer>,
        c14n_uri: &str,
        inclusive_prefixes: Vec<String>,
    ) -> Result<Self, Error> {
        let mut pipeline = Self::new();
        pipeline.push(Box::new(EnvelopedSignatureTransform::new()));
        pipeline.push(Box::new(
            C14nTransform::from_uri(c14n_uri, inclusive_prefixes)?.with_canonicalizer(canonicalizer),
        ));
        Ok(pipeline)
    }

    /// Build a pipeline from the `Algorithm` URIs of a `<ds:Transforms>`
    /// list. Only the enveloped-signature transform and the allowed
    /// canonicalization algorithms are accepted.
    pub fn from_uris(
        canonicalizer: Arc<dyn Canonicalizer>,
        uris: &[&str],
        inclusive_prefixes: &[String],
    ) -> Result<Self, Error> {
        let mut pipeline = Self::new();
        for uri in uris {
            if *uri == algorithm::ENVELOPED_SIGNATURE {
                pipeline.push(Box::new(EnvelopedSignatureTransform::new()));
            } else {
                pipeline.push(Box::new(
                    C14nTransform::from_uri(uri, inclusive_prefixes.to_vec())?
                        .with_canonicalizer(Arc::clone(&canonicalizer)),
                ));
            }
        }
        Ok(pipeline)
    }

    /// Add a transform to the pipeline.
    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Execute all transforms in order.
    pub fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        let mut data = input;
        for transform in &self.transforms {
            data = transform.execute(data)?;
        }
        Ok(data)
    }

    /// Algorithm URIs of the transforms, in order.
    pub fn uris(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.uri()).collect()
    }

    /// Number of transforms in the pipeline.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

// ── C14N Transform ───────────────────────────────────────────────────

/// A canonicalization transform.
pub struct C14nTransform {
    mode: C14nMode,
    inclusive_prefixes: Vec<String>,
    canonicalizer: Arc<dyn Canonicalizer>,
}

impl C14nTransform {
    pub fn new(mode: C14nMode, inclusive_prefixes: Vec<String>) -> Self {
        Self {
            mode,
            inclusive_prefixes,
            canonicalizer: Arc::new(C14n),
        }
    }

    pub fn with_canonicalizer(mut self, canonicalizer: Arc<dyn Canonicalizer>) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    pub fn from_uri(uri: &str, inclusive_prefixes: Vec<String>) -> Result<Self, Error> {
        let mode = C14nMode::from_uri(uri)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("transform: {uri}")))?;
        Ok(Self::new(mode, inclusive_prefixes))
    }
}

impl Transform for C14nTransform {
    fn uri(&self) -> &str {
        self.mode.uri()
    }

    fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        match input {
            TransformData::Xml { element, inherited } => {
                let bytes = self.canonicalizer.canonicalize(
                    &element,
                    &inherited,
                    self.mode.uri(),
                    &self.inclusive_prefixes,
                )?;
                Ok(TransformData::Binary(bytes))
            }
            TransformData::Binary(data) => {
                let element = samlbind_xml::parse_bytes(&data)
                    .map_err(|e| Error::Transform(format!("c14n input is not XML: {e}")))?;
                let bytes = self.canonicalizer.canonicalize(
                    &element,
                    &[],
                    self.mode.uri(),
                    &self.inclusive_prefixes,
                )?;
                Ok(TransformData::Binary(bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samlbind_xml::parse;

    #[test]
    fn enveloped_chain_strips_signature_and_canonicalizes() {
        let root = parse(
            r#"<r xmlns:ds="http://www.w3.org/2000/09/xmldsig#" ID="a"><x/><ds:Signature><ds:SignedInfo/></ds:Signature></r>"#,
        )
        .unwrap();
        let pipeline = TransformPipeline::enveloped(algorithm::EXC_C14N, Vec::new()).unwrap();
        assert_eq!(
            pipeline.uris(),
            vec![algorithm::ENVELOPED_SIGNATURE, algorithm::EXC_C14N]
        );
        let out = pipeline.execute(TransformData::xml(root)).unwrap();
        let TransformData::Binary(bytes) = out else {
            panic!("expected binary output");
        };
        assert_eq!(bytes, br#"<r ID="a"><x></x></r>"#);
    }

    #[test]
    fn unknown_transform_is_unsupported() {
        let err = TransformPipeline::from_uris(Arc::new(C14n), &["urn:xslt"], &[])
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn binary_input_is_reparsed() {
        let t = C14nTransform::new(C14nMode::Inclusive, Vec::new());
        let out = t
            .execute(TransformData::Binary(b"<a   b='1'/>".to_vec()))
            .unwrap();
        assert_eq!(out.to_binary().unwrap(), br#"<a b="1"></a>"#);
    }
}
