#![forbid(unsafe_code)]

//! `<samlp:Response>`.

use samlbind_core::{ns, Error};
use samlbind_dsig::{SignatureRecord, SignatureState};
use samlbind_xml::{Element, Node};

use crate::assertion::Assertion;
use crate::context::SamlContext;
use crate::protocol::status::Status;
use crate::schema::{
    check_version, datetime_attr, expect, opt_uri_attr, required_attr, required_child, samlp,
    write_version,
};
use crate::signable::{signable_root, Signable};
use crate::value::{SamlDateTime, SamlUri};

#[derive(Debug, Clone, Default)]
pub struct Response {
    id: Option<String>,
    in_response_to: Option<String>,
    issue_instant: Option<SamlDateTime>,
    recipient: Option<SamlUri>,
    status: Status,
    assertions: Vec<Assertion>,
    signature: SignatureState,
}

signable_root!(Response, samlbind_dsig::placement::RESPONSE);

impl Response {
    /// A successful response with no assertions yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(status: Status) -> Self {
        Self {
            status,
            ..Self::default()
        }
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

    pub fn in_response_to(&self) -> Option<&str> {
        self.in_response_to.as_deref()
    }

    pub fn set_in_response_to(&mut self, request_id: Option<String>) {
        self.signature.invalidate();
        self.in_response_to = request_id;
    }

    pub fn issue_instant(&self) -> Option<SamlDateTime> {
        self.issue_instant
    }

    pub fn set_issue_instant(&mut self, instant: SamlDateTime) {
        self.signature.invalidate();
        self.issue_instant = Some(instant);
    }

    pub fn recipient(&self) -> Option<&SamlUri> {
        self.recipient.as_ref()
    }

    pub fn set_recipient(&mut self, recipient: Option<SamlUri>) {
        self.signature.invalidate();
        self.recipient = recipient;
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.signature.invalidate();
        self.status = status;
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn assertions_mut(&mut self) -> &mut Vec<Assertion> {
        self.signature.invalidate();
        &mut self.assertions
    }

    pub fn add_assertion(&mut self, assertion: Assertion) {
        self.signature.invalidate();
        self.assertions.push(assertion);
    }

    pub fn parse(xml: &str, ctx: &SamlContext) -> Result<Self, Error> {
        Self::from_element(&samlbind_xml::parse(xml)?, ctx)
    }

    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        expect(element, ns::SAMLP, ns::node::RESPONSE)?;
        check_version(element)?;
        let mut response = Self {
            id: Some(required_attr(element, ns::attr::RESPONSE_ID)?.trim().to_owned()),
            in_response_to: element
                .attr(ns::attr::IN_RESPONSE_TO)
                .map(|v| v.trim().to_owned()),
            issue_instant: Some(datetime_attr(element, ns::attr::ISSUE_INSTANT)?),
            recipient: opt_uri_attr(element, ns::attr::RECIPIENT)?,
            status: Status::from_element(required_child(element, ns::SAMLP, ns::node::STATUS)?)?,
            ..Self::default()
        };

        let mut signature = None;
        for child in element.child_elements() {
            if child.is(ns::SAMLP, ns::node::STATUS) {
                continue;
            } else if child.is(ns::SAML, ns::node::ASSERTION) {
                response.assertions.push(Assertion::from_element(child, ctx)?);
            } else if child.is(ns::DSIG, ns::node::SIGNATURE) {
                if signature.is_some() {
                    return Err(Error::SchemaViolation("Response carries two signatures".into()));
                }
                signature = Some(SignatureRecord::from_element(child)?);
            } else {
                return Err(Error::SchemaViolation(format!(
                    "unexpected {} in Response",
                    child.name
                )));
            }
        }
        if let Some(record) = signature {
            response.set_signature(record, element.clone())?;
        }
        Ok(response)
    }

    /// Serialize, signing the response (and any assertion with a pending
    /// signature) as configured.
    pub fn to_node(&mut self, ctx: &SamlContext) -> Result<Node, Error> {
        let mut state = std::mem::take(&mut self.signature);
        let id = self.id.clone();
        let result = state.serialize_with(
            id.as_deref(),
            samlbind_dsig::placement::RESPONSE,
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
            .ok_or_else(|| Error::SchemaViolation("Response requires a ResponseID".into()))?;

        let mut el = samlp(ns::node::RESPONSE);
        write_version(&mut el);
        el.set_attr(ns::attr::RESPONSE_ID, id);
        if let Some(irt) = &self.in_response_to {
            el.set_attr(ns::attr::IN_RESPONSE_TO, irt.clone());
        }
        let instant = *self.issue_instant.get_or_insert_with(|| ctx.now().into());
        el.set_attr(ns::attr::ISSUE_INSTANT, instant.to_string());
        if let Some(recipient) = &self.recipient {
            el.set_attr(ns::attr::RECIPIENT, recipient.as_str());
        }

        el.push(self.status.to_element()?);
        for assertion in &mut self.assertions {
            el.push(assertion.to_node(ctx)?);
        }
        Ok(el)
    }
}
