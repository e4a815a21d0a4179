#![forbid(unsafe_code)]

//! Statements carried by an assertion.

use std::fmt;

use samlbind_core::{ns, Error};
use samlbind_xml::{Element, Node, QName};

use crate::assertion::subject::Subject;
use crate::assertion::Assertion;
use crate::context::SamlContext;
use crate::extension::{element_override, parse_extension, xsi_type, Extension, ExtensionKind};
use crate::schema::{
    datetime_attr, expect, passthrough, required_attr, required_child, saml, string_attr, uri_attr,
};
use crate::value::{SamlDateTime, SamlString, SamlUri};

#[derive(Debug, Clone)]
pub enum Statement {
    Authentication(AuthenticationStatement),
    Attribute(AttributeStatement),
    AuthorizationDecision(AuthorizationDecisionStatement),
    Extension(Extension),
}

impl Statement {
    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        if let Some(ext) = element_override(element, ExtensionKind::Statement, ctx) {
            return ext.map(Statement::Extension);
        }
        if element.name.namespace() == ns::SAML {
            match element.name.local_name() {
                ns::node::AUTHENTICATION_STATEMENT => {
                    return AuthenticationStatement::from_element(element)
                        .map(Statement::Authentication)
                }
                ns::node::ATTRIBUTE_STATEMENT => {
                    return AttributeStatement::from_element(element).map(Statement::Attribute)
                }
                ns::node::AUTHORIZATION_DECISION_STATEMENT => {
                    return AuthorizationDecisionStatement::from_element(element, ctx)
                        .map(Statement::AuthorizationDecision)
                }
                _ => {}
            }
        }
        parse_extension(element, ExtensionKind::Statement, ctx).map(Statement::Extension)
    }

    /// The subject of a built-in subject statement.
    pub fn subject(&self) -> Option<&Subject> {
        match self {
            Statement::Authentication(s) => Some(&s.subject),
            Statement::Attribute(s) => Some(&s.subject),
            Statement::AuthorizationDecision(s) => Some(&s.subject),
            Statement::Extension(_) => None,
        }
    }

    pub fn to_node(&mut self, ctx: &SamlContext) -> Result<Node, Error> {
        match self {
            Statement::Authentication(s) => s.to_element().map(Node::Element),
            Statement::Attribute(s) => s.to_element().map(Node::Element),
            Statement::AuthorizationDecision(s) => s.to_element(ctx).map(Node::Element),
            Statement::Extension(ext) => ext.to_node(),
        }
    }
}

// ── Authentication ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationStatement {
    pub subject: Subject,
    pub method: SamlUri,
    pub instant: SamlDateTime,
    pub locality: Option<SubjectLocality>,
    pub authority_bindings: Vec<AuthorityBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubjectLocality {
    pub ip_address: Option<String>,
    pub dns_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityBinding {
    /// Resolved through the namespace bindings in scope, never by prefix.
    pub authority_kind: QName,
    pub location: SamlUri,
    pub binding: SamlUri,
}

impl AuthenticationStatement {
    pub fn new(subject: Subject, method: SamlUri, instant: SamlDateTime) -> Self {
        Self {
            subject,
            method,
            instant,
            locality: None,
            authority_bindings: Vec::new(),
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::AUTHENTICATION_STATEMENT)?;
        let locality = element
            .first_child(ns::SAML, ns::node::SUBJECT_LOCALITY)
            .map(|l| SubjectLocality {
                ip_address: l.attr(ns::attr::IP_ADDRESS).map(str::to_owned),
                dns_address: l.attr(ns::attr::DNS_ADDRESS).map(str::to_owned),
            });
        let authority_bindings = element
            .children_named(ns::SAML, ns::node::AUTHORITY_BINDING)
            .map(|b| {
                Ok(AuthorityBinding {
                    authority_kind: b.resolve_qname(required_attr(b, ns::attr::AUTHORITY_KIND)?)?,
                    location: uri_attr(b, ns::attr::LOCATION)?,
                    binding: uri_attr(b, ns::attr::BINDING)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self {
            subject: Subject::from_element(required_child(element, ns::SAML, ns::node::SUBJECT)?)?,
            method: uri_attr(element, ns::attr::AUTHENTICATION_METHOD)?,
            instant: datetime_attr(element, ns::attr::AUTHENTICATION_INSTANT)?,
            locality,
            authority_bindings,
        })
    }

    pub fn to_element(&self) -> Result<Element, Error> {
        let mut el = saml(ns::node::AUTHENTICATION_STATEMENT);
        el.set_attr(ns::attr::AUTHENTICATION_METHOD, self.method.as_str());
        el.set_attr(ns::attr::AUTHENTICATION_INSTANT, self.instant.to_string());
        el.push(self.subject.to_element()?);
        if let Some(locality) = &self.locality {
            let mut l = saml(ns::node::SUBJECT_LOCALITY);
            if let Some(ip) = &locality.ip_address {
                l.set_attr(ns::attr::IP_ADDRESS, ip.clone());
            }
            if let Some(dns) = &locality.dns_address {
                l.set_attr(ns::attr::DNS_ADDRESS, dns.clone());
            }
            el.push(l);
        }
        for b in &self.authority_bindings {
            let mut binding = saml(ns::node::AUTHORITY_BINDING);
            let kind = if b.authority_kind.prefix().is_none() && b.authority_kind.has_namespace() {
                b.authority_kind.clone().with_prefix(Some("kind"))
            } else {
                b.authority_kind.clone()
            };
            binding.set_qname_attr(QName::local(ns::attr::AUTHORITY_KIND), &kind);
            binding.set_attr(ns::attr::LOCATION, b.location.as_str());
            binding.set_attr(ns::attr::BINDING, b.binding.as_str());
            el.push(binding);
        }
        Ok(el)
    }
}

// ── Attributes ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AttributeStatement {
    pub subject: Subject,
    pub attributes: Vec<Attribute>,
}

/// A named attribute with one or more values.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: SamlString,
    pub namespace: SamlUri,
    pub values: Vec<AttributeValue>,
}

/// An `<saml:AttributeValue>` kept as an element so arbitrary content and
/// `xsi:type` survive unchanged.
#[derive(Debug, Clone)]
pub struct AttributeValue(Element);

/// `AttributeName` and `AttributeNamespace` without values, as used by
/// attribute queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDesignator {
    pub name: SamlString,
    pub namespace: SamlUri,
}

impl AttributeStatement {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::ATTRIBUTE_STATEMENT)?;
        let attributes = element
            .children_named(ns::SAML, ns::node::ATTRIBUTE)
            .map(Attribute::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        let statement = Self {
            subject: Subject::from_element(required_child(element, ns::SAML, ns::node::SUBJECT)?)?,
            attributes,
        };
        statement.validate()?;
        Ok(statement)
    }

    pub fn to_element(&self) -> Result<Element, Error> {
        self.validate()?;
        let mut el = saml(ns::node::ATTRIBUTE_STATEMENT);
        el.push(self.subject.to_element()?);
        for a in &self.attributes {
            el.push(a.to_element()?);
        }
        Ok(el)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.attributes.is_empty() {
            return Err(Error::SchemaViolation(
                "AttributeStatement requires an Attribute".into(),
            ));
        }
        Ok(())
    }
}

impl Attribute {
    pub fn new(name: SamlString, namespace: SamlUri) -> Self {
        Self {
            name,
            namespace,
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: AttributeValue) -> Self {
        self.values.push(value);
        self
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::ATTRIBUTE)?;
        let values: Vec<AttributeValue> = element
            .children_named(ns::SAML, ns::node::ATTRIBUTE_VALUE)
            .map(|v| AttributeValue(v.clone()))
            .collect();
        if values.is_empty() {
            return Err(Error::SchemaViolation(
                "Attribute requires an AttributeValue".into(),
            ));
        }
        Ok(Self {
            name: string_attr(element, ns::attr::ATTRIBUTE_NAME)?,
            namespace: uri_attr(element, ns::attr::ATTRIBUTE_NAMESPACE)?,
            values,
        })
    }

    pub fn to_element(&self) -> Result<Element, Error> {
        if self.values.is_empty() {
            return Err(Error::SchemaViolation(
                "Attribute requires an AttributeValue".into(),
            ));
        }
        let mut el = saml(ns::node::ATTRIBUTE);
        el.set_attr(ns::attr::ATTRIBUTE_NAME, self.name.as_str());
        el.set_attr(ns::attr::ATTRIBUTE_NAMESPACE, self.namespace.as_str());
        for v in &self.values {
            el.push(passthrough(&v.0));
        }
        Ok(el)
    }
}

impl AttributeValue {
    /// A value with simple text content.
    pub fn text(value: impl Into<String>) -> Self {
        Self(saml(ns::node::ATTRIBUTE_VALUE).with_text(value))
    }

    /// A value with text content and an explicit `xsi:type`.
    pub fn typed(type_name: &QName, value: impl Into<String>) -> Self {
        let mut el = saml(ns::node::ATTRIBUTE_VALUE);
        el.set_qname_attr(xsi_type(), type_name);
        Self(el.with_text(value))
    }

    pub fn element(&self) -> &Element {
        &self.0
    }

    /// Concatenated text content.
    pub fn value(&self) -> String {
        self.0.text()
    }

    /// The resolved `xsi:type`, if any.
    pub fn type_name(&self) -> Result<Option<QName>, Error> {
        self.0
            .attr_ns(ns::XSI, ns::attr::TYPE)
            .map(|v| self.0.resolve_qname(v))
            .transpose()
    }
}

impl AttributeDesignator {
    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::ATTRIBUTE_DESIGNATOR)?;
        Ok(Self {
            name: string_attr(element, ns::attr::ATTRIBUTE_NAME)?,
            namespace: uri_attr(element, ns::attr::ATTRIBUTE_NAMESPACE)?,
        })
    }

    pub fn to_element(&self) -> Element {
        saml(ns::node::ATTRIBUTE_DESIGNATOR)
            .with_attr(ns::attr::ATTRIBUTE_NAME, self.name.as_str())
            .with_attr(ns::attr::ATTRIBUTE_NAMESPACE, self.namespace.as_str())
    }
}

// ── Authorization decisions ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny,
    Indeterminate,
}

impl Decision {
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value.trim() {
            "Permit" => Ok(Decision::Permit),
            "Deny" => Ok(Decision::Deny),
            "Indeterminate" => Ok(Decision::Indeterminate),
            other => Err(Error::SchemaViolation(format!("'{other}' is not a Decision"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Permit => "Permit",
            Decision::Deny => "Deny",
            Decision::Indeterminate => "Indeterminate",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub namespace: Option<SamlUri>,
    pub value: SamlString,
}

impl Action {
    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::ACTION)?;
        Ok(Self {
            namespace: crate::schema::opt_uri_attr(element, ns::attr::NAMESPACE)?,
            value: SamlString::parse(&element.text())?,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut el = saml(ns::node::ACTION);
        if let Some(namespace) = &self.namespace {
            el.set_attr(ns::attr::NAMESPACE, namespace.as_str());
        }
        el.with_text(self.value.as_str())
    }
}

/// Assertions, or references to them, that back a decision.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    pub items: Vec<EvidenceItem>,
}

#[derive(Debug, Clone)]
pub enum EvidenceItem {
    AssertionIdReference(String),
    Assertion(Box<Assertion>),
}

impl Evidence {
    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::EVIDENCE)?;
        let mut items = Vec::new();
        for child in element.child_elements() {
            if child.is(ns::SAML, ns::node::ASSERTION_ID_REFERENCE) {
                items.push(EvidenceItem::AssertionIdReference(child.text().trim().to_owned()));
            } else if child.is(ns::SAML, ns::node::ASSERTION) {
                items.push(EvidenceItem::Assertion(Box::new(Assertion::from_element(child, ctx)?)));
            } else {
                return Err(Error::SchemaViolation(format!(
                    "unexpected {} in Evidence",
                    child.name
                )));
            }
        }
        if items.is_empty() {
            return Err(Error::SchemaViolation("Evidence must not be empty".into()));
        }
        Ok(Self { items })
    }

    pub fn to_element(&mut self, ctx: &SamlContext) -> Result<Element, Error> {
        let mut el = saml(ns::node::EVIDENCE);
        for item in &mut self.items {
            match item {
                EvidenceItem::AssertionIdReference(id) => {
                    el.push(saml(ns::node::ASSERTION_ID_REFERENCE).with_text(id.clone()))
                }
                EvidenceItem::Assertion(a) => el.push(a.to_node(ctx)?),
            }
        }
        Ok(el)
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationDecisionStatement {
    pub subject: Subject,
    pub resource: SamlUri,
    pub decision: Decision,
    pub actions: Vec<Action>,
    pub evidence: Option<Evidence>,
}

impl AuthorizationDecisionStatement {
    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::AUTHORIZATION_DECISION_STATEMENT)?;
        let actions = element
            .children_named(ns::SAML, ns::node::ACTION)
            .map(Action::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        if actions.is_empty() {
            return Err(Error::SchemaViolation(
                "AuthorizationDecisionStatement requires an Action".into(),
            ));
        }
        Ok(Self {
            subject: Subject::from_element(required_child(element, ns::SAML, ns::node::SUBJECT)?)?,
            resource: uri_attr(element, ns::attr::RESOURCE)?,
            decision: Decision::parse(required_attr(element, ns::attr::DECISION)?)?,
            actions,
            evidence: element
                .first_child(ns::SAML, ns::node::EVIDENCE)
                .map(|e| Evidence::from_element(e, ctx))
                .transpose()?,
        })
    }

    pub fn to_element(&mut self, ctx: &SamlContext) -> Result<Element, Error> {
        if self.actions.is_empty() {
            return Err(Error::SchemaViolation(
                "AuthorizationDecisionStatement requires an Action".into(),
            ));
        }
        let mut el = saml(ns::node::AUTHORIZATION_DECISION_STATEMENT);
        el.set_attr(ns::attr::RESOURCE, self.resource.as_str());
        el.set_attr(ns::attr::DECISION, self.decision.as_str());
        el.push(self.subject.to_element()?);
        for a in &self.actions {
            el.push(a.to_element());
        }
        if let Some(evidence) = &mut self.evidence {
            el.push(evidence.to_element(ctx)?);
        }
        Ok(el)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::subject::NameIdentifier;

    fn subject() -> Subject {
        Subject::new(NameIdentifier::new(SamlString::parse("bob").unwrap()))
    }

    fn reparse(el: &Element) -> Element {
        samlbind_xml::parse(&samlbind_xml::writer::to_string(el)).unwrap()
    }

    #[test]
    fn authentication_statement_round_trip() {
        let mut s = AuthenticationStatement::new(
            subject(),
            SamlUri::parse("urn:oasis:names:tc:SAML:1.0:am:password").unwrap(),
            SamlDateTime::parse("2005-03-01T12:00:00Z").unwrap(),
        );
        s.locality = Some(SubjectLocality {
            ip_address: Some("192.0.2.1".into()),
            dns_address: None,
        });
        s.authority_bindings.push(AuthorityBinding {
            authority_kind: QName::new(ns::SAMLP, "AttributeQuery"),
            location: SamlUri::parse("https://idp.example.org/aa").unwrap(),
            binding: SamlUri::parse("urn:oasis:names:tc:SAML:1.0:bindings:SOAP-binding").unwrap(),
        });
        let parsed = AuthenticationStatement::from_element(&reparse(&s.to_element().unwrap())).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn authority_kind_resolves_by_namespace() {
        let src = format!(
            r#"<saml:AuthenticationStatement xmlns:saml="{}" xmlns:p="{}" AuthenticationMethod="urn:m" AuthenticationInstant="2005-03-01T12:00:00Z"><saml:Subject><saml:NameIdentifier>x</saml:NameIdentifier></saml:Subject><saml:AuthorityBinding AuthorityKind="p:AttributeQuery" Location="https://aa" Binding="urn:b"/></saml:AuthenticationStatement>"#,
            ns::SAML,
            ns::SAMLP
        );
        let s = AuthenticationStatement::from_element(&samlbind_xml::parse(&src).unwrap()).unwrap();
        assert_eq!(
            s.authority_bindings[0].authority_kind,
            QName::new(ns::SAMLP, "AttributeQuery")
        );
    }

    #[test]
    fn attribute_values_keep_xsi_type() {
        let attr = Attribute::new(
            SamlString::parse("mail").unwrap(),
            SamlUri::parse("urn:mace:dir:attribute-def").unwrap(),
        )
        .with_value(AttributeValue::typed(
            &QName::prefixed(ns::XS, ns::prefix::XS, "string"),
            "bob@example.org",
        ));
        let statement = AttributeStatement::new(subject()).with_attribute(attr);
        let parsed = AttributeStatement::from_element(&reparse(&statement.to_element().unwrap())).unwrap();
        let value = &parsed.attributes[0].values[0];
        assert_eq!(value.value(), "bob@example.org");
        assert_eq!(
            value.type_name().unwrap(),
            Some(QName::new(ns::XS, "string"))
        );
    }

    #[test]
    fn attribute_statement_needs_attributes() {
        let statement = AttributeStatement::new(subject());
        assert!(matches!(statement.to_element(), Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn decision_values() {
        assert_eq!(Decision::parse("Deny").unwrap(), Decision::Deny);
        assert!(matches!(Decision::parse("Maybe"), Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn statement_dispatch_falls_back_to_extension() {
        let ctx = SamlContext::new();
        let src = format!(
            r#"<saml:SubjectStatement xmlns:saml="{}" xmlns:xsi="{}" xmlns:v="urn:vendor" xsi:type="v:Custom"><saml:Subject><saml:NameIdentifier>x</saml:NameIdentifier></saml:Subject></saml:SubjectStatement>"#,
            ns::SAML,
            ns::XSI
        );
        let el = samlbind_xml::parse(&src).unwrap();
        let Statement::Extension(ext) = Statement::from_element(&el, &ctx).unwrap() else {
            panic!("expected an extension statement");
        };
        assert_eq!(ext.type_name(), QName::new("urn:vendor", "Custom"));
        assert!(!ext.is_known());
    }
}
