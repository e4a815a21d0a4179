#![forbid(unsafe_code)]

//! Extension points and their resolver.
//!
//! SAML 1.1 leaves five abstract elements open: `Condition`, `Statement`,
//! `SubjectStatement`, `Query` and `SubjectQuery`. A concrete variant is
//! selected either by `xsi:type` on the wrapper element or by a substitution
//! element with its own name. Variants with a registered handler become
//! [`Extension::Known`]; everything else is kept as [`Extension::Unknown`]
//! and re-emitted byte for byte.

use std::any::Any;
use std::fmt;

use samlbind_core::{ns, Error};
use samlbind_xml::{Element, Node, QName, RawXml};

use crate::context::SamlContext;
use crate::registry::Capability;

/// The five open extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    Condition,
    Statement,
    SubjectStatement,
    Query,
    SubjectQuery,
}

impl ExtensionKind {
    /// Name of the abstract wrapper element.
    pub fn wrapper(self) -> QName {
        match self {
            ExtensionKind::Condition => saml_name(ns::node::CONDITION),
            ExtensionKind::Statement => saml_name(ns::node::STATEMENT),
            ExtensionKind::SubjectStatement => saml_name(ns::node::SUBJECT_STATEMENT),
            ExtensionKind::Query => samlp_name(ns::node::QUERY),
            ExtensionKind::SubjectQuery => samlp_name(ns::node::SUBJECT_QUERY),
        }
    }

    /// The kind whose wrapper element is `name`, if any.
    pub fn for_wrapper(name: &QName) -> Option<Self> {
        [
            ExtensionKind::Condition,
            ExtensionKind::Statement,
            ExtensionKind::SubjectStatement,
            ExtensionKind::Query,
            ExtensionKind::SubjectQuery,
        ]
        .into_iter()
        .find(|k| &k.wrapper() == name)
    }

    /// Whether an object of kind `other` may stand where `self` is
    /// expected. Subject statements are statements and subject queries are
    /// queries; otherwise kinds must match.
    pub fn accepts(self, other: ExtensionKind) -> bool {
        self == other
            || matches!(
                (self, other),
                (ExtensionKind::Statement, ExtensionKind::SubjectStatement)
                    | (ExtensionKind::Query, ExtensionKind::SubjectQuery)
            )
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wrapper().local_name())
    }
}

/// A concrete extension-point variant held behind a trait object.
pub trait ExtensionObject: fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> ExtensionKind;

    /// The `xsi:type` value (or, for substitution elements, the element
    /// name) this object serializes as.
    fn type_name(&self) -> QName;

    /// Write attributes and children into `element`. The resolver has
    /// already named the element and set `xsi:type` where needed.
    fn write_body(&self, element: &mut Element) -> Result<(), Error>;

    fn as_any(&self) -> &dyn Any;

    fn clone_box(&self) -> Box<dyn ExtensionObject>;
}

impl Clone for Box<dyn ExtensionObject> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A type that can be registered as an extension handler.
pub trait ExtensionType: ExtensionObject + Sized {
    const KIND: ExtensionKind;

    /// Registry key: the `xsi:type` value for extension handlers, the
    /// element name for element handlers.
    fn type_name() -> QName;

    fn parse(element: &Element, ctx: &SamlContext) -> Result<Self, Error>;
}

/// How a known variant was selected, which decides how it is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Wrapper element of the given kind carrying `xsi:type`.
    XsiType(ExtensionKind),
    /// Substitution element named by the object's type name.
    Element,
}

/// A variant nobody registered a handler for.
#[derive(Debug, Clone)]
pub struct UnknownExtension {
    raw: RawXml,
    type_name: QName,
    element: Element,
}

impl UnknownExtension {
    pub fn new(element: &Element, type_name: QName) -> Self {
        Self {
            raw: element.capture(),
            type_name,
            element: element.clone(),
        }
    }

    /// The `xsi:type` value or element name that failed to resolve.
    pub fn type_name(&self) -> &QName {
        &self.type_name
    }

    /// The captured source text.
    pub fn raw(&self) -> &RawXml {
        &self.raw
    }

    /// A parsed copy for inspection.
    pub fn element(&self) -> &Element {
        &self.element
    }
}

/// An extension-point value.
#[derive(Debug, Clone)]
pub enum Extension {
    Known {
        object: Box<dyn ExtensionObject>,
        dispatch: Dispatch,
    },
    Unknown(UnknownExtension),
}

impl Extension {
    /// Wrap `object` for `xsi:type` serialization under its own kind.
    pub fn known<T: ExtensionObject>(object: T) -> Self {
        let kind = object.kind();
        Extension::Known {
            object: Box::new(object),
            dispatch: Dispatch::XsiType(kind),
        }
    }

    /// Wrap `object` for serialization as a substitution element.
    pub fn known_element<T: ExtensionObject>(object: T) -> Self {
        Extension::Known {
            object: Box::new(object),
            dispatch: Dispatch::Element,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Extension::Known { .. })
    }

    pub fn type_name(&self) -> QName {
        match self {
            Extension::Known { object, .. } => object.type_name(),
            Extension::Unknown(u) => u.type_name.clone(),
        }
    }

    pub fn downcast_ref<T: ExtensionObject>(&self) -> Option<&T> {
        match self {
            Extension::Known { object, .. } => object.as_any().downcast_ref::<T>(),
            Extension::Unknown(_) => None,
        }
    }

    pub fn as_unknown(&self) -> Option<&UnknownExtension> {
        match self {
            Extension::Unknown(u) => Some(u),
            Extension::Known { .. } => None,
        }
    }

    /// Serialize. Unknown variants are emitted verbatim.
    pub fn to_node(&self) -> Result<Node, Error> {
        match self {
            Extension::Unknown(u) => Ok(Node::Raw(u.raw.clone())),
            Extension::Known { object, dispatch } => {
                let type_name = presentable(object.type_name());
                let mut element = match dispatch {
                    Dispatch::XsiType(kind) => {
                        let mut el = Element::new(kind.wrapper());
                        el.set_qname_attr(xsi_type(), &type_name);
                        el
                    }
                    Dispatch::Element => Element::new(type_name),
                };
                object.write_body(&mut element)?;
                Ok(Node::Element(element))
            }
        }
    }
}

/// Resolve an extension-point element of the expected `kind`.
///
/// A wrapper element is dispatched on its `xsi:type`; any other element is
/// treated as a substitution element and dispatched on its name.
pub fn parse_extension(element: &Element, kind: ExtensionKind, ctx: &SamlContext) -> Result<Extension, Error> {
    match ExtensionKind::for_wrapper(&element.name) {
        Some(wrapper) if kind.accepts(wrapper) => resolve(element, wrapper, ctx),
        Some(wrapper) => Err(Error::SchemaViolation(format!(
            "{wrapper} element found where a {kind} was expected"
        ))),
        None => resolve_element(element, kind, ctx),
    }
}

/// A registered element handler takes precedence over the built-in
/// parser for an element of the same name.
pub fn element_override(
    element: &Element,
    kind: ExtensionKind,
    ctx: &SamlContext,
) -> Option<Result<Extension, Error>> {
    let handler = ctx.registry().lookup_element(&element.name)?;
    (handler.capability() == Capability::Element).then(|| resolve_element(element, kind, ctx))
}

/// Resolve an abstract wrapper element through its `xsi:type`.
pub fn resolve(element: &Element, wrapper: ExtensionKind, ctx: &SamlContext) -> Result<Extension, Error> {
    let expected = wrapper.wrapper();
    if element.name != expected {
        return Err(Error::SchemaViolation(format!(
            "expected {}, found {}",
            expected.qualified(),
            element.name
        )));
    }
    let value = element.attr_ns(ns::XSI, ns::attr::TYPE).ok_or_else(|| {
        Error::SchemaViolation(format!("{} requires xsi:type", expected.qualified()))
    })?;
    let type_name = element.resolve_qname(value)?;

    let Some(handler) = ctx.registry().lookup_extension(&type_name)? else {
        tracing::debug!(%type_name, wrapper = %wrapper, "no handler; keeping extension as unknown");
        return Ok(Extension::Unknown(UnknownExtension::new(element, type_name)));
    };
    if !wrapper.accepts(handler.kind()) {
        return Err(Error::HandlerMismatch(format!(
            "{} handles {} but was found on a {wrapper}",
            handler.type_name(),
            handler.kind()
        )));
    }
    let object = handler.parse(element, ctx)?;
    check_kind(wrapper, object.as_ref())?;
    Ok(Extension::Known {
        object,
        dispatch: Dispatch::XsiType(wrapper),
    })
}

/// Resolve a substitution element through its name.
pub fn resolve_element(element: &Element, kind: ExtensionKind, ctx: &SamlContext) -> Result<Extension, Error> {
    match ctx.registry().lookup_element(&element.name) {
        Some(handler) if handler.capability() == Capability::Element => {
            if !kind.accepts(handler.kind()) {
                return Err(Error::HandlerMismatch(format!(
                    "{} handles {} but {} stands where a {kind} is expected",
                    handler.type_name(),
                    handler.kind(),
                    element.name
                )));
            }
            let object = handler.parse(element, ctx)?;
            check_kind(kind, object.as_ref())?;
            Ok(Extension::Known {
                object,
                dispatch: Dispatch::Element,
            })
        }
        _ => {
            tracing::debug!(name = %element.name, %kind, "no element handler; keeping as unknown");
            Ok(Extension::Unknown(UnknownExtension::new(
                element,
                element.name.clone(),
            )))
        }
    }
}

fn check_kind(expected: ExtensionKind, object: &dyn ExtensionObject) -> Result<(), Error> {
    if expected.accepts(object.kind()) {
        Ok(())
    } else {
        Err(Error::HandlerMismatch(format!(
            "handler produced a {} where a {expected} is expected",
            object.kind()
        )))
    }
}

/// A namespaced type name needs a prefix to be written as a QName.
fn presentable(name: QName) -> QName {
    if name.has_namespace() && name.prefix().is_none() {
        name.with_prefix(Some("ext"))
    } else {
        name
    }
}

pub(crate) fn xsi_type() -> QName {
    QName::prefixed(ns::XSI, ns::prefix::XSI, ns::attr::TYPE)
}

fn saml_name(local: &str) -> QName {
    QName::prefixed(ns::SAML, ns::prefix::SAML, local)
}

fn samlp_name(local: &str) -> QName {
    QName::prefixed(ns::SAMLP, ns::prefix::SAMLP, local)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXT: &str = "urn:example:ext";

    #[derive(Debug, Clone, PartialEq)]
    struct Tier {
        level: String,
    }

    impl ExtensionObject for Tier {
        fn kind(&self) -> ExtensionKind {
            ExtensionKind::Condition
        }
        fn type_name(&self) -> QName {
            <Tier as ExtensionType>::type_name()
        }
        fn write_body(&self, element: &mut Element) -> Result<(), Error> {
            element.set_attr("Level", self.level.clone());
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn clone_box(&self) -> Box<dyn ExtensionObject> {
            Box::new(self.clone())
        }
    }

    impl ExtensionType for Tier {
        const KIND: ExtensionKind = ExtensionKind::Condition;
        fn type_name() -> QName {
            QName::prefixed(EXT, "ext", "TierCondition")
        }
        fn parse(element: &Element, _ctx: &SamlContext) -> Result<Self, Error> {
            let level = element
                .attr("Level")
                .ok_or_else(|| Error::SchemaViolation("Level".into()))?;
            Ok(Tier {
                level: level.to_owned(),
            })
        }
    }

    fn condition(type_value: &str) -> Element {
        let doc = samlbind_xml::parse(&format!(
            r#"<saml:Conditions xmlns:saml="{}" xmlns:xsi="{}" xmlns:e="{EXT}"><saml:Condition xsi:type="{type_value}"  Level="gold"/></saml:Conditions>"#,
            ns::SAML,
            ns::XSI
        ))
        .unwrap();
        let condition = doc.child_elements().next().unwrap().clone();
        condition
    }

    #[test]
    fn registered_type_resolves_to_handler() {
        let ctx = SamlContext::new();
        ctx.registry().register_extension::<Tier>();
        let ext = parse_extension(&condition("e:TierCondition"), ExtensionKind::Condition, &ctx).unwrap();
        assert_eq!(ext.downcast_ref::<Tier>().unwrap().level, "gold");
    }

    #[test]
    fn unregistered_type_is_unknown_and_verbatim() {
        let ctx = SamlContext::new();
        let el = condition("e:TierCondition");
        let ext = parse_extension(&el, ExtensionKind::Condition, &ctx).unwrap();
        let unknown = ext.as_unknown().unwrap();
        assert_eq!(unknown.type_name(), &QName::new(EXT, "TierCondition"));
        let Node::Raw(raw) = ext.to_node().unwrap() else {
            panic!("unknown extensions serialize raw");
        };
        assert_eq!(raw.text(), el.raw_xml().unwrap());
    }

    #[test]
    fn missing_xsi_type_is_schema_violation() {
        let ctx = SamlContext::new();
        let el = Element::new(ExtensionKind::Condition.wrapper());
        assert!(matches!(
            resolve(&el, ExtensionKind::Condition, &ctx),
            Err(Error::SchemaViolation(_))
        ));
    }

    #[test]
    fn wrong_wrapper_is_schema_violation() {
        let ctx = SamlContext::new();
        let el = Element::new(ExtensionKind::Query.wrapper());
        assert!(matches!(
            resolve(&el, ExtensionKind::Condition, &ctx),
            Err(Error::SchemaViolation(_))
        ));
        assert!(matches!(
            parse_extension(&el, ExtensionKind::Statement, &ctx),
            Err(Error::SchemaViolation(_))
        ));
    }

    #[test]
    fn unbound_type_prefix_is_schema_violation() {
        let ctx = SamlContext::new();
        assert!(matches!(
            resolve(&condition("nope:T"), ExtensionKind::Condition, &ctx),
            Err(Error::SchemaViolation(_))
        ));
    }

    #[test]
    fn handler_for_other_kind_is_mismatch() {
        let ctx = SamlContext::new();
        ctx.registry().register_extension::<Tier>();
        let mut el = Element::new(ExtensionKind::Query.wrapper());
        el.set_qname_attr(xsi_type(), &<Tier as ExtensionType>::type_name());
        let err = resolve(&el, ExtensionKind::Query, &ctx).unwrap_err();
        assert!(matches!(err, Error::HandlerMismatch(_)));
    }

    #[test]
    fn substitution_element_dispatch() {
        let ctx = SamlContext::new();
        let mut el = Element::new(QName::prefixed(EXT, "ext", "TierCondition"));
        el.set_attr("Level", "silver");
        assert!(!parse_extension(&el, ExtensionKind::Condition, &ctx).unwrap().is_known());

        ctx.registry().register_element::<Tier>();
        let ext = parse_extension(&el, ExtensionKind::Condition, &ctx).unwrap();
        assert_eq!(ext.downcast_ref::<Tier>().unwrap().level, "silver");
        let Node::Element(out) = ext.to_node().unwrap() else {
            panic!("known extensions serialize as elements");
        };
        assert!(out.is(EXT, "TierCondition"));
        assert!(out.attr_ns(ns::XSI, ns::attr::TYPE).is_none());
    }

    #[test]
    fn known_serialization_declares_xsi_type() {
        let ext = Extension::known(Tier {
            level: "bronze".into(),
        });
        let Node::Element(el) = ext.to_node().unwrap() else {
            panic!("known extensions serialize as elements");
        };
        let text = samlbind_xml::writer::to_string(&el);
        let reparsed = samlbind_xml::parse(&text).unwrap();
        let value = reparsed.attr_ns(ns::XSI, ns::attr::TYPE).unwrap();
        assert_eq!(
            reparsed.resolve_qname(value).unwrap(),
            QName::new(EXT, "TierCondition")
        );
        assert_eq!(reparsed.attr("Level"), Some("bronze"));
    }

    #[test]
    fn statement_position_accepts_subject_statement() {
        assert!(ExtensionKind::Statement.accepts(ExtensionKind::SubjectStatement));
        assert!(!ExtensionKind::SubjectStatement.accepts(ExtensionKind::Statement));
        assert!(ExtensionKind::Query.accepts(ExtensionKind::SubjectQuery));
        assert!(!ExtensionKind::Condition.accepts(ExtensionKind::Statement));
    }
}
