#![forbid(unsafe_code)]

//! `<samlp:Request>`.

use samlbind_core::{ns, Error};
use samlbind_dsig::{SignatureRecord, SignatureState};
use samlbind_xml::{Element, Node, QName};

use crate::context::SamlContext;
use crate::protocol::query::Query;
use crate::schema::{
    check_version, datetime_attr, expect, required_attr, saml, samlp, set_qname_text, write_version,
};
use crate::signable::{signable_root, Signable};
use crate::value::SamlDateTime;

/// What a request asks for.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Query(Query),
    AssertionIdReferences(Vec<String>),
    AssertionArtifacts(Vec<String>),
}

impl RequestBody {
    fn check(&self) -> Result<(), Error> {
        match self {
            RequestBody::AssertionIdReferences(ids) if ids.is_empty() => Err(Error::SchemaViolation(
                "Request needs at least one AssertionIDReference".into(),
            )),
            RequestBody::AssertionArtifacts(a) if a.is_empty() => Err(Error::SchemaViolation(
                "Request needs at least one AssertionArtifact".into(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    id: Option<String>,
    issue_instant: Option<SamlDateTime>,
    respond_with: Vec<QName>,
    body: RequestBody,
    signature: SignatureState,
}

signable_root!(Request, samlbind_dsig::placement::REQUEST);

impl Request {
    pub fn new(body: RequestBody) -> Self {
        Self {
            id: None,
            issue_instant: None,
            respond_with: Vec::new(),
            body,
            signature: SignatureState::default(),
        }
    }

    pub fn query(query: Query) -> Self {
        Self::new(RequestBody::Query(query))
    }

    pub fn with_generated_id(mut self) -> Self {
        self.set_id(crate::id::generate());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.signature.invalidate();
        self.id = Some(id.into());
    }

    pub fn issue_instant(&self) -> Option<SamlDateTime> {
        self.issue_instant
    }

    pub fn set_issue_instant(&mut self, instant: SamlDateTime) {
        self.signature.invalidate();
        self.issue_instant = Some(instant);
    }

    /// Statement types the requester accepts in the response.
    pub fn respond_with(&self) -> &[QName] {
        &self.respond_with
    }

    pub fn respond_with_mut(&mut self) -> &mut Vec<QName> {
        self.signature.invalidate();
        &mut self.respond_with
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut RequestBody {
        self.signature.invalidate();
        &mut self.body
    }

    pub fn parse(xml: &str, ctx: &SamlContext) -> Result<Self, Error> {
        Self::from_element(&samlbind_xml::parse(xml)?, ctx)
    }

    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        expect(element, ns::SAMLP, ns::node::REQUEST)?;
        check_version(element)?;
        let id = required_attr(element, ns::attr::REQUEST_ID)?.trim().to_owned();
        let issue_instant = datetime_attr(element, ns::attr::ISSUE_INSTANT)?;

        let mut respond_with = Vec::new();
        let mut signature = None;
        let mut body: Option<RequestBody> = None;
        for child in element.child_elements() {
            if child.is(ns::SAMLP, ns::node::RESPOND_WITH) {
                if body.is_some() {
                    return Err(Error::SchemaViolation("RespondWith after the request body".into()));
                }
                respond_with.push(child.resolve_qname(&child.text())?);
            } else if child.is(ns::DSIG, ns::node::SIGNATURE) {
                if signature.is_some() {
                    return Err(Error::SchemaViolation("Request carries two signatures".into()));
                }
                signature = Some(SignatureRecord::from_element(child)?);
            } else if child.is(ns::SAML, ns::node::ASSERTION_ID_REFERENCE) {
                match &mut body {
                    None => body = Some(RequestBody::AssertionIdReferences(vec![trimmed(child)])),
                    Some(RequestBody::AssertionIdReferences(ids)) => ids.push(trimmed(child)),
                    Some(_) => return Err(mixed_body()),
                }
            } else if child.is(ns::SAMLP, ns::node::ASSERTION_ARTIFACT) {
                match &mut body {
                    None => body = Some(RequestBody::AssertionArtifacts(vec![trimmed(child)])),
                    Some(RequestBody::AssertionArtifacts(a)) => a.push(trimmed(child)),
                    Some(_) => return Err(mixed_body()),
                }
            } else if body.is_none() && Query::is_query_element(child, ctx) {
                body = Some(RequestBody::Query(Query::from_element(child, ctx)?));
            } else {
                return Err(Error::SchemaViolation(format!(
                    "unexpected {} in Request",
                    child.name
                )));
            }
        }
        let body = body.ok_or_else(|| Error::SchemaViolation("Request has no body".into()))?;

        let mut request = Self {
            id: Some(id),
            issue_instant: Some(issue_instant),
            respond_with,
            body,
            signature: SignatureState::default(),
        };
        if let Some(record) = signature {
            request.set_signature(record, element.clone())?;
        }
        Ok(request)
    }

    /// Serialize, signing first if a signature is pending.
    pub fn to_node(&mut self, ctx: &SamlContext) -> Result<Node, Error> {
        let mut state = std::mem::take(&mut self.signature);
        let id = self.id.clone();
        let result = state.serialize_with(
            id.as_deref(),
            samlbind_dsig::placement::REQUEST,
            ctx.canonicalizer(),
            || self.build(ctx),
        );
        self.signature = state;
        result
    }

    pub fn to_xml(&mut self, ctx: &SamlContext) -> Result<String, Error> {
        Ok(samlbind_xml::writer::node_to_string(&self.to_node(ctx)?))
    }

    fn build(&mut self, ctx: &SamlContext) -> Result<Element, Error> {
        let id = self
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::SchemaViolation("Request requires a RequestID".into()))?;
        self.body.check()?;

        let mut el = samlp(ns::node::REQUEST);
        write_version(&mut el);
        el.set_attr(ns::attr::REQUEST_ID, id);
        let instant = *self.issue_instant.get_or_insert_with(|| ctx.now().into());
        el.set_attr(ns::attr::ISSUE_INSTANT, instant.to_string());

        for name in &self.respond_with {
            let mut rw = samlp(ns::node::RESPOND_WITH);
            set_qname_text(&mut rw, &respond_with_name(name));
            el.push(rw);
        }
        match &mut self.body {
            RequestBody::Query(q) => el.push(q.to_node(ctx)?),
            RequestBody::AssertionIdReferences(ids) => {
                for id in ids.iter() {
                    el.push(saml(ns::node::ASSERTION_ID_REFERENCE).with_text(id.clone()));
                }
            }
            RequestBody::AssertionArtifacts(artifacts) => {
                for a in artifacts.iter() {
                    el.push(samlp(ns::node::ASSERTION_ARTIFACT).with_text(a.clone()));
                }
            }
        }
        Ok(el)
    }
}

fn trimmed(element: &Element) -> String {
    element.text().trim().to_owned()
}

fn mixed_body() -> Error {
    Error::SchemaViolation("Request mixes query, reference and artifact forms".into())
}

fn respond_with_name(name: &QName) -> QName {
    if name.namespace() == ns::SAML {
        name.clone().with_prefix(Some(ns::prefix::SAML))
    } else if name.has_namespace() && name.prefix().is_none() {
        name.clone().with_prefix(Some("rw"))
    } else {
        name.clone()
    }
}
