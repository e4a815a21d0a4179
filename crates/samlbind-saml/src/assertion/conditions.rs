#![forbid(unsafe_code)]

//! `<saml:Conditions>` and the condition variants.

use chrono::{DateTime, Duration, Utc};
use samlbind_core::{ns, Error};
use samlbind_xml::{Element, Node};

use crate::context::SamlContext;
use crate::extension::{element_override, parse_extension, Extension, ExtensionKind};
use crate::schema::{expect, opt_datetime_attr, saml};
use crate::value::{SamlDateTime, SamlUri};

#[derive(Debug, Clone, Default)]
pub struct Conditions {
    pub not_before: Option<SamlDateTime>,
    pub not_on_or_after: Option<SamlDateTime>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone)]
pub enum Condition {
    AudienceRestriction(AudienceRestrictionCondition),
    DoNotCache,
    Extension(Extension),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudienceRestrictionCondition {
    pub audiences: Vec<SamlUri>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `now` lies inside `[NotBefore, NotOnOrAfter)`, widened by
    /// `skew` on both ends.
    pub fn is_valid_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        if let Some(nb) = self.not_before {
            if now + skew < nb.inner() {
                return false;
            }
        }
        if let Some(noa) = self.not_on_or_after {
            if now - skew >= noa.inner() {
                return false;
            }
        }
        true
    }

    /// Audiences of every audience restriction, in document order.
    pub fn audiences(&self) -> impl Iterator<Item = &SamlUri> {
        self.conditions
            .iter()
            .filter_map(|c| match c {
                Condition::AudienceRestriction(a) => Some(&a.audiences),
                _ => None,
            })
            .flatten()
    }

    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::CONDITIONS)?;
        let mut conditions = Vec::new();
        for child in element.child_elements() {
            conditions.push(Condition::from_element(child, ctx)?);
        }
        Ok(Self {
            not_before: opt_datetime_attr(element, ns::attr::NOT_BEFORE)?,
            not_on_or_after: opt_datetime_attr(element, ns::attr::NOT_ON_OR_AFTER)?,
            conditions,
        })
    }

    pub fn to_element(&self) -> Result<Element, Error> {
        let mut el = saml(ns::node::CONDITIONS);
        if let Some(nb) = &self.not_before {
            el.set_attr(ns::attr::NOT_BEFORE, nb.to_string());
        }
        if let Some(noa) = &self.not_on_or_after {
            el.set_attr(ns::attr::NOT_ON_OR_AFTER, noa.to_string());
        }
        for c in &self.conditions {
            el.push(c.to_node()?);
        }
        Ok(el)
    }
}

impl Condition {
    pub fn from_element(element: &Element, ctx: &SamlContext) -> Result<Self, Error> {
        if let Some(ext) = element_override(element, ExtensionKind::Condition, ctx) {
            return ext.map(Condition::Extension);
        }
        if element.is(ns::SAML, ns::node::AUDIENCE_RESTRICTION_CONDITION) {
            let audiences = element
                .children_named(ns::SAML, ns::node::AUDIENCE)
                .map(|a| SamlUri::parse(&a.text()))
                .collect::<Result<Vec<_>, _>>()?;
            if audiences.is_empty() {
                return Err(Error::SchemaViolation(
                    "AudienceRestrictionCondition requires an Audience".into(),
                ));
            }
            return Ok(Condition::AudienceRestriction(AudienceRestrictionCondition {
                audiences,
            }));
        }
        if element.is(ns::SAML, ns::node::DO_NOT_CACHE_CONDITION) {
            return Ok(Condition::DoNotCache);
        }
        parse_extension(element, ExtensionKind::Condition, ctx).map(Condition::Extension)
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        match self {
            Condition::AudienceRestriction(a) => {
                let mut el = saml(ns::node::AUDIENCE_RESTRICTION_CONDITION);
                for audience in &a.audiences {
                    el.push(saml(ns::node::AUDIENCE).with_text(audience.as_str()));
                }
                Ok(Node::Element(el))
            }
            Condition::DoNotCache => Ok(Node::Element(saml(ns::node::DO_NOT_CACHE_CONDITION))),
            Condition::Extension(ext) => ext.to_node(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2005, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn validity_window_with_skew() {
        let c = Conditions {
            not_before: Some(at(10).into()),
            not_on_or_after: Some(at(12).into()),
            conditions: Vec::new(),
        };
        let none = Duration::zero();
        assert!(!c.is_valid_at(at(9), none));
        assert!(c.is_valid_at(at(10), none));
        assert!(c.is_valid_at(at(11), none));
        assert!(!c.is_valid_at(at(12), none));
        assert!(c.is_valid_at(at(9), Duration::hours(1)));
        assert!(Conditions::new().is_valid_at(at(0), none));
    }

    #[test]
    fn audience_restriction_parses() {
        let ctx = SamlContext::new();
        let src = format!(
            r#"<saml:Conditions xmlns:saml="{}" NotBefore="2005-01-01T10:00:00Z"><saml:AudienceRestrictionCondition><saml:Audience>https://sp.example.org</saml:Audience></saml:AudienceRestrictionCondition><saml:DoNotCacheCondition/></saml:Conditions>"#,
            ns::SAML
        );
        let c = Conditions::from_element(&samlbind_xml::parse(&src).unwrap(), &ctx).unwrap();
        assert_eq!(c.conditions.len(), 2);
        assert_eq!(
            c.audiences().map(SamlUri::as_str).collect::<Vec<_>>(),
            ["https://sp.example.org"]
        );
        assert!(matches!(c.conditions[1], Condition::DoNotCache));
        assert_eq!(c.not_before, Some(at(10).into()));
    }

    #[test]
    fn empty_audience_restriction_is_rejected() {
        let ctx = SamlContext::new();
        let el = saml(ns::node::AUDIENCE_RESTRICTION_CONDITION);
        assert!(matches!(
            Condition::from_element(&el, &ctx),
            Err(Error::SchemaViolation(_))
        ));
    }
}
