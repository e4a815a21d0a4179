#![forbid(unsafe_code)]

//! Queries a request can carry.

use samlbind_core::{ns, Error};
use samlbind_xml::{Element, Node};

use crate::assertion::{Action, AttributeDesignator, Evidence, Subject};
use crate::context::SamlContext;
use crate::extension::{element_override, parse_extension, Extension, ExtensionKind};
use crate::schema::{expect, opt_uri_attr, required_child, samlp, uri_attr};
use crate::value::SamlUri;

#[derive(Debug, Clone)]
pub enum Query {
    Authentication(AuthenticationQuery),
    Attribute(AttributeQuery),
    AuthorizationDecision(AuthorizationDecisionQuery),
    Extension(Extension),
}

impl Query {
    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        if let Some(ext) = element_override(element, ExtensionKind::Query, ctx) {
            return ext.map(Query::Extension);
        }
        if element.name.namespace() == ns::SAMLP {
            match element.name.local_name() {
                ns::node::AUTHENTICATION_QUERY => {
                    return AuthenticationQuery::from_element(element).map(Query::Authentication)
                }
                ns::node::ATTRIBUTE_QUERY => {
                    return AttributeQuery::from_element(element).map(Query::Attribute)
                }
                ns::node::AUTHORIZATION_DECISION_QUERY => {
                    return AuthorizationDecisionQuery::from_element(element, ctx)
                        .map(Query::AuthorizationDecision)
                }
                _ => {}
            }
        }
        parse_extension(element, ExtensionKind::Query, ctx).map(Query::Extension)
    }

    /// Whether `element` can stand in the query position of a request.
    pub(crate) fn is_query_element(element: &Element, ctx: &SamlContext) -> bool {
        if element.name.namespace() != ns::SAMLP {
            return ctx.registry().lookup_element(&element.name).is_some();
        }
        matches!(
            element.name.local_name(),
            ns::node::QUERY
                | ns::node::SUBJECT_QUERY
                | ns::node::AUTHENTICATION_QUERY
                | ns::node::ATTRIBUTE_QUERY
                | ns::node::AUTHORIZATION_DECISION_QUERY
        )
    }

    pub fn subject(&self) -> Option<&Subject> {
        match self {
            Query::Authentication(q) => Some(&q.subject),
            Query::Attribute(q) => Some(&q.subject),
            Query::AuthorizationDecision(q) => Some(&q.subject),
            Query::Extension(_) => None,
        }
    }

    pub fn to_node(&mut self, ctx: &SamlContext) -> Result<Node, Error> {
        match self {
            Query::Authentication(q) => q.to_element().map(Node::Element),
            Query::Attribute(q) => q.to_element().map(Node::Element),
            Query::AuthorizationDecision(q) => q.to_element(ctx).map(Node::Element),
            Query::Extension(ext) => ext.to_node(),
        }
    }
}

/// Asks for authentication assertions about a subject.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationQuery {
    pub subject: Subject,
    pub method: Option<SamlUri>,
}

impl AuthenticationQuery {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            method: None,
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAMLP, ns::node::AUTHENTICATION_QUERY)?;
        Ok(Self {
            subject: Subject::from_element(required_child(element, ns::SAML, ns::node::SUBJECT)?)?,
            method: opt_uri_attr(element, ns::attr::AUTHENTICATION_METHOD)?,
        })
    }

    pub fn to_element(&self) -> Result<Element, Error> {
        let mut el = samlp(ns::node::AUTHENTICATION_QUERY);
        if let Some(method) = &self.method {
            el.set_attr(ns::attr::AUTHENTICATION_METHOD, method.as_str());
        }
        el.push(self.subject.to_element()?);
        Ok(el)
    }
}

/// Asks for attribute values. No designators means all attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeQuery {
    pub subject: Subject,
    pub resource: Option<SamlUri>,
    pub designators: Vec<AttributeDesignator>,
}

impl AttributeQuery {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            resource: None,
            designators: Vec::new(),
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAMLP, ns::node::ATTRIBUTE_QUERY)?;
        Ok(Self {
            subject: Subject::from_element(required_child(element, ns::SAML, ns::node::SUBJECT)?)?,
            resource: opt_uri_attr(element, ns::attr::RESOURCE)?,
            designators: element
                .children_named(ns::SAML, ns::node::ATTRIBUTE_DESIGNATOR)
                .map(AttributeDesignator::from_element)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn to_element(&self) -> Result<Element, Error> {
        let mut el = samlp(ns::node::ATTRIBUTE_QUERY);
        if let Some(resource) = &self.resource {
            el.set_attr(ns::attr::RESOURCE, resource.as_str());
        }
        el.push(self.subject.to_element()?);
        for d in &self.designators {
            el.push(d.to_element());
        }
        Ok(el)
    }
}

/// Asks whether a subject may perform actions on a resource.
#[derive(Debug, Clone)]
pub struct AuthorizationDecisionQuery {
    pub subject: Subject,
    pub resource: SamlUri,
    pub actions: Vec<Action>,
    pub evidence: Option<Evidence>,
}

impl AuthorizationDecisionQuery {
    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        expect(element, ns::SAMLP, ns::node::AUTHORIZATION_DECISION_QUERY)?;
        let actions = element
            .children_named(ns::SAML, ns::node::ACTION)
            .map(Action::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        if actions.is_empty() {
            return Err(Error::SchemaViolation(
                "AuthorizationDecisionQuery requires an Action".into(),
            ));
        }
        Ok(Self {
            subject: Subject::from_element(required_child(element, ns::SAML, ns::node::SUBJECT)?)?,
            resource: uri_attr(element, ns::attr::RESOURCE)?,
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
                "AuthorizationDecisionQuery requires an Action".into(),
            ));
        }
        let mut el = samlp(ns::node::AUTHORIZATION_DECISION_QUERY);
        el.set_attr(ns::attr::RESOURCE, self.resource.as_str());
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
