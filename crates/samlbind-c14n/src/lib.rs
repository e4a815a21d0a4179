#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) over the samlbind element tree.
//!
//! Implements the four canonicalization variants accepted in SAML 1.1
//! signatures:
//! - Canonical XML 1.0 (with and without comments)
//! - Exclusive Canonical XML 1.0 (with and without comments)

pub mod exclusive;
pub mod inclusive;
pub mod render;

use samlbind_core::{algorithm, Error};
use samlbind_xml::{Element, NsDecl, Scope};

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI. Anything outside the four
    /// allowed algorithms yields `None`.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::C14N => Some(Self::Inclusive),
            algorithm::C14N_WITH_COMMENTS => Some(Self::InclusiveWithComments),
            algorithm::EXC_C14N => Some(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Some(Self::ExclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments | Self::ExclusiveWithComments)
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Exclusive | Self::ExclusiveWithComments)
    }
}

/// True if `uri` names one of the allowed canonicalization algorithms.
pub fn is_allowed(uri: &str) -> bool {
    C14nMode::from_uri(uri).is_some()
}

/// Canonicalize an element subtree.
///
/// - `element`: the apex of the subtree
/// - `inherited`: bindings in scope from ancestors not visible in the tree
///   (parsed elements already carry their own)
/// - `mode`: which C14N variant to use
/// - `inclusive_prefixes`: for exclusive C14N, the InclusiveNamespaces PrefixList
pub fn canonicalize(
    element: &Element,
    inherited: &[NsDecl],
    mode: C14nMode,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    match mode {
        C14nMode::Inclusive | C14nMode::InclusiveWithComments => {
            inclusive::canonicalize(element, inherited, mode.with_comments())
        }
        C14nMode::Exclusive | C14nMode::ExclusiveWithComments => exclusive::canonicalize(
            element,
            inherited,
            mode.with_comments(),
            inclusive_prefixes,
        ),
    }
}

/// Canonicalization as a pluggable service.
pub trait Canonicalizer: Send + Sync {
    /// Canonicalize `element` with the algorithm named by `algorithm`.
    fn canonicalize(
        &self,
        element: &Element,
        inherited: &[NsDecl],
        algorithm: &str,
        inclusive_prefixes: &[String],
    ) -> Result<Vec<u8>, Error>;
}

/// The built-in canonicalizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct C14n;

impl Canonicalizer for C14n {
    fn canonicalize(
        &self,
        element: &Element,
        inherited: &[NsDecl],
        algorithm: &str,
        inclusive_prefixes: &[String],
    ) -> Result<Vec<u8>, Error> {
        let mode = C14nMode::from_uri(algorithm).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("canonicalization: {algorithm}"))
        })?;
        canonicalize(element, inherited, mode, inclusive_prefixes)
    }
}

/// The binding context at the apex: caller-supplied bindings overlaid with
/// what the element itself inherited when it was parsed.
pub(crate) fn apex_scope(element: &Element, inherited: &[NsDecl]) -> Scope {
    let mut context: Vec<NsDecl> = inherited.to_vec();
    context.extend(element.inherited_namespaces());
    Scope::with_bindings(&context)
}
