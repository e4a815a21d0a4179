#![forbid(unsafe_code)]

//! Qualified names.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A namespace-qualified name with an optional presentation prefix.
///
/// Identity (equality, hashing) is the `(namespace, local)` pair; the prefix
/// only matters when the name is written out.
#[derive(Debug, Clone, Eq)]
pub struct QName {
    namespace: String,
    local: String,
    prefix: Option<String>,
}

impl QName {
    /// A name in `namespace` (empty for no namespace) without a prefix.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
            prefix: None,
        }
    }

    /// A name with a presentation prefix.
    pub fn prefixed(
        namespace: impl Into<String>,
        prefix: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        let prefix: String = prefix.into();
        Self {
            namespace: namespace.into(),
            local: local.into(),
            prefix: if prefix.is_empty() { None } else { Some(prefix) },
        }
    }

    /// A name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self::new("", local)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }

    /// Same identity, different presentation prefix.
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(str::to_owned);
        self
    }

    /// True if this name has the given namespace and local name.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }

    /// The `prefix:local` form as written in a document.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.local),
            None => self.local.clone(),
        }
    }

    /// The `{namespace}local` form used as a lookup key.
    pub fn expanded(&self) -> String {
        format!("{{{}}}{}", self.namespace, self.local)
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local == other.local
    }
}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expanded())
    }
}

/// Split a lexical QName into `(prefix, local)`.
pub fn split_qname(value: &str) -> (Option<&str>, &str) {
    match value.split_once(':') {
        Some((p, l)) => (Some(p), l),
        None => (None, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn prefix_is_not_part_of_identity() {
        let a = QName::prefixed("urn:x", "a", "T");
        let b = QName::prefixed("urn:x", "b", "T");
        assert_eq!(a, b);
        let set: HashSet<QName> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn qualified_and_expanded_forms() {
        let q = QName::prefixed("urn:x", "x", "Thing");
        assert_eq!(q.qualified(), "x:Thing");
        assert_eq!(q.expanded(), "{urn:x}Thing");
        assert_eq!(QName::local("a").qualified(), "a");
    }

    #[test]
    fn split() {
        assert_eq!(split_qname("p:l"), (Some("p"), "l"));
        assert_eq!(split_qname("l"), (None, "l"));
    }
}
