#![forbid(unsafe_code)]

//! `<saml:Assertion>` and the types it carries.

pub mod advice;
pub mod conditions;
pub mod statement;
pub mod subject;

pub use advice::{Advice, AdviceItem};
pub use conditions::{AudienceRestrictionCondition, Condition, Conditions};
pub use statement::{
    Action, Attribute, AttributeDesignator, AttributeStatement, AttributeValue,
    AuthenticationStatement, AuthorityBinding, AuthorizationDecisionStatement, Decision, Evidence,
    EvidenceItem, Statement, SubjectLocality,
};
pub use subject::{NameIdentifier, Subject, SubjectConfirmation};

use samlbind_core::{ns, Error};
use samlbind_dsig::{SignatureRecord, SignatureState};
use samlbind_xml::{Element, Node};

use crate::context::SamlContext;
use crate::schema::{check_version, datetime_attr, expect, required_attr, saml, string_attr, write_version};
use crate::signable::{signable_root, Signable};
use crate::value::{SamlDateTime, SamlString};

/// A SAML 1.1 assertion.
///
/// A parsed assertion that carried a signature serializes back to its
/// source text unchanged until it is modified; any setter or `_mut`
/// accessor drops that signature.
#[derive(Debug, Clone, Default)]
pub struct Assertion {
    id: Option<String>,
    issuer: Option<SamlString>,
    issue_instant: Option<SamlDateTime>,
    conditions: Option<Conditions>,
    advice: Option<Advice>,
    statements: Vec<Statement>,
    signature: SignatureState,
}

signable_root!(Assertion, samlbind_dsig::placement::ASSERTION);

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    /// An assertion with a freshly generated `AssertionID`.
    pub fn with_generated_id() -> Self {
        Self {
            id: Some(crate::id::generate()),
            ..Self::default()
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.signature.invalidate();
        self.id = Some(id.into());
    }

    pub fn issuer(&self) -> Option<&SamlString> {
        self.issuer.as_ref()
    }

    pub fn set_issuer(&mut self, issuer: SamlString) {
        self.signature.invalidate();
        self.issuer = Some(issuer);
    }

    pub fn issue_instant(&self) -> Option<SamlDateTime> {
        self.issue_instant
    }

    pub fn set_issue_instant(&mut self, instant: SamlDateTime) {
        self.signature.invalidate();
        self.issue_instant = Some(instant);
    }

    pub fn conditions(&self) -> Option<&Conditions> {
        self.conditions.as_ref()
    }

    pub fn set_conditions(&mut self, conditions: Option<Conditions>) {
        self.signature.invalidate();
        self.conditions = conditions;
    }

    pub fn conditions_mut(&mut self) -> &mut Option<Conditions> {
        self.signature.invalidate();
        &mut self.conditions
    }

    pub fn advice(&self) -> Option<&Advice> {
        self.advice.as_ref()
    }

    pub fn set_advice(&mut self, advice: Option<Advice>) {
        self.signature.invalidate();
        self.advice = advice;
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut Vec<Statement> {
        self.signature.invalidate();
        &mut self.statements
    }

    pub fn add_statement(&mut self, statement: Statement) {
        self.signature.invalidate();
        self.statements.push(statement);
    }

    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.add_statement(statement);
        self
    }

    /// Whether the assertion's conditions hold at the context's current
    /// time, allowing for the configured clock skew.
    pub fn is_valid_now(&self, ctx: &SamlContext) -> bool {
        self.conditions
            .as_ref()
            .map_or(true, |c| c.is_valid_at(ctx.now(), ctx.clock_skew()))
    }

    // ── Parsing ──────────────────────────────────────────────────────

    pub fn parse(xml: &str, ctx: &SamlContext) -> Result<Self, Error> {
        Self::from_element(&samlbind_xml::parse(xml)?, ctx)
    }

    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::ASSERTION)?;
        check_version(element)?;
        let id = required_attr(element, ns::attr::ASSERTION_ID)?.trim().to_owned();

        let mut assertion = Self {
            id: Some(id),
            issuer: Some(string_attr(element, ns::attr::ISSUER)?),
            issue_instant: Some(datetime_attr(element, ns::attr::ISSUE_INSTANT)?),
            ..Self::default()
        };
        let mut signature = None;
        for child in element.child_elements() {
            if child.is(ns::SAML, ns::node::CONDITIONS) {
                if assertion.conditions.is_some() || !assertion.statements.is_empty() {
                    return Err(Error::SchemaViolation("misplaced Conditions in Assertion".into()));
                }
                assertion.conditions = Some(Conditions::from_element(child, ctx)?);
            } else if child.is(ns::SAML, ns::node::ADVICE) {
                if assertion.advice.is_some() || !assertion.statements.is_empty() {
                    return Err(Error::SchemaViolation("misplaced Advice in Assertion".into()));
                }
                assertion.advice = Some(Advice::from_element(child, ctx)?);
            } else if child.is(ns::DSIG, ns::node::SIGNATURE) {
                if signature.is_some() {
                    return Err(Error::SchemaViolation("Assertion carries two signatures".into()));
                }
                signature = Some(SignatureRecord::from_element(child)?);
            } else {
                assertion.statements.push(Statement::from_element(child, ctx)?);
            }
        }
        if assertion.statements.is_empty() {
            return Err(Error::SchemaViolation("Assertion requires a statement".into()));
        }
        if let Some(record) = signature {
            assertion.set_signature(record, element.clone())?;
        }
        Ok(assertion)
    }

    // ── Serialization ────────────────────────────────────────────────

    /// Serialize, signing first if a signature is pending.
    pub fn to_node(&mut self, ctx: &SamlContext) -> Result<Node, Error> {
        let mut state = std::mem::take(&mut self.signature);
        let id = self.id.clone();
        let result = state.serialize_with(
            id.as_deref(),
            samlbind_dsig::placement::ASSERTION,
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
            .ok_or_else(|| Error::SchemaViolation("Assertion requires an AssertionID".into()))?;
        let issuer = self
            .issuer
            .as_ref()
            .ok_or_else(|| Error::SchemaViolation("Assertion requires an Issuer".into()))?;
        if self.statements.is_empty() {
            return Err(Error::SchemaViolation("Assertion requires a statement".into()));
        }

        let mut el = saml(ns::node::ASSERTION);
        write_version(&mut el);
        el.set_attr(ns::attr::ASSERTION_ID, id);
        el.set_attr(ns::attr::ISSUER, issuer.as_str());
        let instant = *self.issue_instant.get_or_insert_with(|| ctx.now().into());
        el.set_attr(ns::attr::ISSUE_INSTANT, instant.to_string());

        if let Some(conditions) = &self.conditions {
            el.push(conditions.to_element()?);
        }
        if let Some(advice) = &mut self.advice {
            el.push(advice.to_element(ctx)?);
        }
        for statement in &mut self.statements {
            el.push(statement.to_node(ctx)?);
        }
        Ok(el)
    }
}
