#![forbid(unsafe_code)]

//! `<samlp:Status>` and status codes.

use samlbind_core::{ns, Error};
use samlbind_xml::{Element, QName};

use crate::schema::{expect, passthrough, required_attr, required_child, samlp};

/// The SAML 1.1 top-level status codes (local names in the protocol
/// namespace).
pub const TOP_LEVEL_CODES: [&str; 10] = [
    "Success",
    "Requester",
    "Responder",
    "VersionMismatch",
    "RequestVersionTooHigh",
    "RequestVersionTooLow",
    "RequestVersionDeprecated",
    "TooManyResponses",
    "RequestDenied",
    "ResourceNotRecognized",
];

/// A status code, possibly refined by nested second-level codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCode {
    pub value: QName,
    pub sub: Option<Box<StatusCode>>,
}

impl StatusCode {
    pub fn new(value: QName) -> Self {
        Self { value, sub: None }
    }

    /// A code from the protocol namespace.
    pub fn samlp(local: &str) -> Self {
        Self::new(QName::prefixed(ns::SAMLP, ns::prefix::SAMLP, local))
    }

    pub fn with_sub(mut self, sub: StatusCode) -> Self {
        self.sub = Some(Box::new(sub));
        self
    }

    pub fn is(&self, local: &str) -> bool {
        self.value.is(ns::SAMLP, local)
    }

    /// Top-level codes are restricted to the ten protocol-defined values.
    pub fn check_top_level(&self) -> Result<(), Error> {
        if self.value.namespace() == ns::SAMLP && TOP_LEVEL_CODES.contains(&self.value.local_name()) {
            Ok(())
        } else {
            Err(Error::ProtocolViolation(format!(
                "{} is not a top-level status code",
                self.value.expanded()
            )))
        }
    }

    fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAMLP, ns::node::STATUS_CODE)?;
        let value = element.resolve_qname(required_attr(element, ns::attr::VALUE)?)?;
        let sub = element
            .first_child(ns::SAMLP, ns::node::STATUS_CODE)
            .map(StatusCode::from_element)
            .transpose()?
            .map(Box::new);
        Ok(Self { value, sub })
    }

    fn to_element(&self) -> Element {
        let mut el = samlp(ns::node::STATUS_CODE);
        let value = if self.value.namespace() == ns::SAMLP {
            self.value.clone().with_prefix(Some(ns::prefix::SAMLP))
        } else if self.value.prefix().is_none() && self.value.has_namespace() {
            self.value.clone().with_prefix(Some("code"))
        } else {
            self.value.clone()
        };
        el.set_qname_attr(QName::local(ns::attr::VALUE), &value);
        if let Some(sub) = &self.sub {
            el.push(sub.to_element());
        }
        el
    }
}

#[derive(Debug, Clone)]
pub struct Status {
    pub code: StatusCode,
    pub message: Option<String>,
    /// Kept as parsed.
    pub detail: Option<Element>,
}

impl Status {
    pub fn new(code: StatusCode) -> Self {
        Self {
            code,
            message: None,
            detail: None,
        }
    }

    pub fn success() -> Self {
        Self::new(StatusCode::samlp("Success"))
    }

    pub fn requester(message: impl Into<String>) -> Self {
        Self::new(StatusCode::samlp("Requester")).with_message(message)
    }

    pub fn responder(message: impl Into<String>) -> Self {
        Self::new(StatusCode::samlp("Responder")).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.code.is("Success")
    }

    pub fn from_element(element: &Element) -> Result<Self, Error> {
        expect(element, ns::SAMLP, ns::node::STATUS)?;
        let code = StatusCode::from_element(required_child(element, ns::SAMLP, ns::node::STATUS_CODE)?)?;
        code.check_top_level()?;
        Ok(Self {
            code,
            message: element
                .first_child(ns::SAMLP, ns::node::STATUS_MESSAGE)
                .map(Element::text),
            detail: element.first_child(ns::SAMLP, ns::node::STATUS_DETAIL).cloned(),
        })
    }

    pub fn to_element(&self) -> Result<Element, Error> {
        self.code.check_top_level()?;
        let mut el = samlp(ns::node::STATUS);
        el.push(self.code.to_element());
        if let Some(message) = &self.message {
            el.push(samlp(ns::node::STATUS_MESSAGE).with_text(message.clone()));
        }
        if let Some(detail) = &self.detail {
            el.push(passthrough(detail));
        }
        Ok(el)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}
