#![forbid(unsafe_code)]

//! Registry of handlers for extension points and element overrides.
//!
//! Element names and `xsi:type` names share one key space, so a lookup can
//! tell "nothing registered" apart from "registered with the wrong
//! capability".

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use samlbind_core::Error;
use samlbind_xml::{Element, QName};

use crate::context::SamlContext;
use crate::extension::{ExtensionKind, ExtensionObject, ExtensionType};

/// Parses one element into a concrete extension object.
pub type ParseFn = fn(&Element, &SamlContext) -> Result<Box<dyn ExtensionObject>, Error>;

/// What a registered handler can be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Parses an element identified by its own name.
    Element,
    /// Parses a wrapper element identified by its `xsi:type`.
    Extension,
}

/// A registered handler.
#[derive(Clone, Copy)]
pub struct Handler {
    capability: Capability,
    kind: ExtensionKind,
    type_name: &'static str,
    parse: ParseFn,
}

impl Handler {
    pub fn new(
        capability: Capability,
        kind: ExtensionKind,
        type_name: &'static str,
        parse: ParseFn,
    ) -> Self {
        Self {
            capability,
            kind,
            type_name,
            parse,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// The extension point this handler produces objects for.
    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }

    /// Rust type name of the produced object, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn parse(&self, element: &Element, ctx: &SamlContext) -> Result<Box<dyn ExtensionObject>, Error> {
        (self.parse)(element, ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("capability", &self.capability)
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .finish()
    }
}

fn parse_boxed<T: ExtensionType>(
    element: &Element,
    ctx: &SamlContext,
) -> Result<Box<dyn ExtensionObject>, Error> {
    Ok(Box::new(T::parse(element, ctx)?))
}

/// Thread-safe handler map. Registration replaces any previous handler for
/// the same key.
#[derive(Default)]
pub struct ExtensionRegistry {
    handlers: RwLock<HashMap<QName, Handler>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `key`. An existing entry is replaced.
    pub fn register(&self, key: QName, handler: Handler) {
        let previous = self.handlers.write().insert(key.clone(), handler);
        if let Some(previous) = previous {
            tracing::warn!(
                key = %key,
                replaced = previous.type_name,
                with = handler.type_name,
                "extension handler replaced"
            );
        } else {
            tracing::debug!(key = %key, handler = handler.type_name, "extension handler registered");
        }
    }

    /// Register `T` for the `xsi:type` value `T::type_name()`.
    pub fn register_extension<T: ExtensionType>(&self) {
        self.register(
            <T as ExtensionType>::type_name(),
            Handler::new(
                Capability::Extension,
                T::KIND,
                std::any::type_name::<T>(),
                parse_boxed::<T>,
            ),
        );
    }

    /// Register `T` for elements named `T::type_name()`.
    pub fn register_element<T: ExtensionType>(&self) {
        self.register(
            <T as ExtensionType>::type_name(),
            Handler::new(
                Capability::Element,
                T::KIND,
                std::any::type_name::<T>(),
                parse_boxed::<T>,
            ),
        );
    }

    /// Exact-key lookup; `None` when nothing is registered.
    pub fn lookup_element(&self, name: &QName) -> Option<Handler> {
        self.handlers.read().get(name).copied()
    }

    /// Lookup for `xsi:type` dispatch. A hit on an element handler is a
    /// `HandlerMismatch`, distinct from `Ok(None)`.
    pub fn lookup_extension(&self, type_name: &QName) -> Result<Option<Handler>, Error> {
        match self.lookup_element(type_name) {
            Some(h) if h.capability != Capability::Extension => Err(Error::HandlerMismatch(format!(
                "{} is registered for {type_name} as an element handler, not an extension handler",
                h.type_name
            ))),
            other => Ok(other),
        }
    }

    pub fn unregister(&self, key: &QName) -> Option<Handler> {
        self.handlers.write().remove(key)
    }

    pub fn contains(&self, key: &QName) -> bool {
        self.handlers.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let mut keys: Vec<String> = handlers.keys().map(QName::expanded).collect();
        keys.sort();
        f.debug_struct("ExtensionRegistry").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(_: &Element, _: &SamlContext) -> Result<Box<dyn ExtensionObject>, Error> {
        Err(Error::SchemaViolation("dummy".into()))
    }

    fn handler(capability: Capability, name: &'static str) -> Handler {
        Handler::new(capability, ExtensionKind::Condition, name, dummy)
    }

    #[test]
    fn miss_is_none_not_error() {
        let registry = ExtensionRegistry::new();
        let key = QName::new("urn:x", "T");
        assert!(registry.lookup_element(&key).is_none());
        assert!(registry.lookup_extension(&key).unwrap().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn last_registration_wins() {
        let registry = ExtensionRegistry::new();
        let key = QName::new("urn:x", "T");
        registry.register(key.clone(), handler(Capability::Extension, "first"));
        registry.register(key.clone(), handler(Capability::Extension, "second"));
        assert_eq!(registry.len(), 1);
        let found = registry.lookup_extension(&key).unwrap().unwrap();
        assert_eq!(found.type_name(), "second");
    }

    #[test]
    fn element_handler_is_not_an_extension_handler() {
        let registry = ExtensionRegistry::new();
        let key = QName::new("urn:x", "Custom");
        registry.register(key.clone(), handler(Capability::Element, "elem"));
        assert!(registry.lookup_element(&key).is_some());
        let err = registry.lookup_extension(&key).unwrap_err();
        assert!(matches!(err, Error::HandlerMismatch(_)));
        assert!(err.is_programmer_error());
    }

    #[test]
    fn prefix_does_not_affect_key() {
        let registry = ExtensionRegistry::new();
        registry.register(
            QName::prefixed("urn:x", "a", "T"),
            handler(Capability::Extension, "h"),
        );
        assert!(registry.contains(&QName::prefixed("urn:x", "b", "T")));
        assert!(registry.unregister(&QName::new("urn:x", "T")).is_some());
        assert!(!registry.contains(&QName::new("urn:x", "T")));
    }

    #[test]
    fn registry_is_shared_across_threads() {
        let registry = std::sync::Arc::new(ExtensionRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.register(
                        QName::new("urn:x", format!("T{i}")),
                        handler(Capability::Extension, "h"),
                    );
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.len(), 4);
    }
}
