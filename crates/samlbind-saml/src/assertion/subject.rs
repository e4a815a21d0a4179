#![forbid(unsafe_code)]

//! `<saml:Subject>` and its parts.

use samlbind_core::{ns, Error};
use samlbind_xml::Element;

use crate::schema::{expect, opt_uri_attr, passthrough, saml};
use crate::value::{SamlString, SamlUri};

/// The principal a subject statement or query is about. At least one of
/// the two parts is present.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub name_identifier: Option<NameIdentifier>,
    pub confirmation: Option<SubjectConfirmation>,
}

impl Subject {
    pub fn new(name_identifier: NameIdentifier) -> Self {
        Self {
            name_identifier: Some(name_identifier),
            confirmation: None,
        }
    }

    pub fn with_confirmation(mut self, confirmation: SubjectConfirmation) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::SUBJECT)?;
        let name_identifier = element
            .first_child(ns::SAML, ns::node::NAME_IDENTIFIER)
            .map(NameIdentifier::from_element)
            .transpose()?;
        let confirmation = element
            .first_child(ns::SAML, ns::node::SUBJECT_CONFIRMATION)
            .map(SubjectConfirmation::from_element)
            .transpose()?;
        let subject = Self {
            name_identifier,
            confirmation,
        };
        subject.validate()?;
        Ok(subject)
    }

    pub fn to_element(&self) -> Result<Element, Error> {
        self.validate()?;
        let mut el = saml(ns::node::SUBJECT);
        if let Some(name) = &self.name_identifier {
            el.push(name.to_element());
        }
        if let Some(confirmation) = &self.confirmation {
            el.push(confirmation.to_element()?);
        }
        Ok(el)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.name_identifier.is_none() && self.confirmation.is_none() {
            return Err(Error::SchemaViolation(
                "Subject needs a NameIdentifier or a SubjectConfirmation".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameIdentifier {
    pub value: SamlString,
    pub name_qualifier: Option<String>,
    pub format: Option<SamlUri>,
}

impl NameIdentifier {
    pub fn new(value: SamlString) -> Self {
        Self {
            value,
            name_qualifier: None,
            format: None,
        }
    }

    pub fn with_format(mut self, format: SamlUri) -> Self {
        self.format = Some(format);
        self
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::NAME_IDENTIFIER)?;
        Ok(Self {
            value: SamlString::parse(&element.text())?,
            name_qualifier: element.attr(ns::attr::NAME_QUALIFIER).map(str::to_owned),
            format: opt_uri_attr(element, ns::attr::FORMAT)?,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut el = saml(ns::node::NAME_IDENTIFIER);
        if let Some(q) = &self.name_qualifier {
            el.set_attr(ns::attr::NAME_QUALIFIER, q.clone());
        }
        if let Some(f) = &self.format {
            el.set_attr(ns::attr::FORMAT, f.as_str());
        }
        el.with_text(self.value.as_str())
    }
}

/// Confirmation methods plus optional confirmation data and key material,
/// both carried as opaque elements.
#[derive(Debug, Clone)]
pub struct SubjectConfirmation {
    pub methods: Vec<SamlUri>,
    pub data: Option<Element>,
    pub key_info: Option<Element>,
}

impl PartialEq for SubjectConfirmation {
    fn eq(&self, other: &Self) -> bool {
        self.methods == other.methods
    }
}

impl SubjectConfirmation {
    pub fn new(method: SamlUri) -> Self {
        Self {
            methods: vec![method],
            data: None,
            key_info: None,
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAML, ns::node::SUBJECT_CONFIRMATION)?;
        let methods = element
            .children_named(ns::SAML, ns::node::CONFIRMATION_METHOD)
            .map(|m| SamlUri::parse(&m.text()))
            .collect::<Result<Vec<_>, _>>()?;
        if methods.is_empty() {
            return Err(Error::SchemaViolation(
                "SubjectConfirmation requires a ConfirmationMethod".into(),
            ));
        }
        Ok(Self {
            methods,
            data: element
                .first_child(ns::SAML, ns::node::SUBJECT_CONFIRMATION_DATA)
                .cloned(),
            key_info: element.first_child(ns::DSIG, ns::node::KEY_INFO).cloned(),
        })
    }

    pub fn to_element(&self) -> Result<Element, Error> {
        if self.methods.is_empty() {
            return Err(Error::SchemaViolation(
                "SubjectConfirmation requires a ConfirmationMethod".into(),
            ));
        }
        let mut el = saml(ns::node::SUBJECT_CONFIRMATION);
        for m in &self.methods {
            el.push(saml(ns::node::CONFIRMATION_METHOD).with_text(m.as_str()));
        }
        if let Some(data) = &self.data {
            el.push(passthrough(data));
        }
        if let Some(key_info) = &self.key_info {
            el.push(passthrough(key_info));
        }
        Ok(el)
    }
}
