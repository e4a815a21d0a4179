#![forbid(unsafe_code)]

//! Shared helpers for reading and writing SAML elements.

use samlbind_core::{ns, Error};
use samlbind_xml::{Element, Node, QName};

use crate::value::{SamlDateTime, SamlString, SamlUri};

pub(crate) fn saml(local: &str) -> Element {
    Element::new(QName::prefixed(ns::SAML, ns::prefix::SAML, local))
}

pub(crate) fn samlp(local: &str) -> Element {
    Element::new(QName::prefixed(ns::SAMLP, ns::prefix::SAMLP, local))
}

pub(crate) fn expect(element: &Element, namespace: &str, local: &str) -> Result<(), Error> {
    if element.is(namespace, local) {
        Ok(())
    } else {
        Err(Error::SchemaViolation(format!(
            "expected {{{namespace}}}{local}, found {}",
            element.name
        )))
    }
}

pub(crate) fn required_attr<'a>(element: &'a Element, name: &str) -> Result<&'a str, Error> {
    element.attr(name).ok_or_else(|| {
        Error::SchemaViolation(format!(
            "{} is missing required attribute {name}",
            element.name.local_name()
        ))
    })
}

pub(crate) fn string_attr(element: &Element, name: &str) -> Result<SamlString, Error> {
    SamlString::parse(required_attr(element, name)?)
}

pub(crate) fn uri_attr(element: &Element, name: &str) -> Result<SamlUri, Error> {
    SamlUri::parse(required_attr(element, name)?)
}

pub(crate) fn opt_uri_attr(element: &Element, name: &str) -> Result<Option<SamlUri>, Error> {
    element.attr(name).map(SamlUri::parse).transpose()
}

pub(crate) fn opt_datetime_attr(element: &Element, name: &str) -> Result<Option<SamlDateTime>, Error> {
    element.attr(name).map(SamlDateTime::parse).transpose()
}

pub(crate) fn datetime_attr(element: &Element, name: &str) -> Result<SamlDateTime, Error> {
    SamlDateTime::parse(required_attr(element, name)?)
}

/// Required child; `SchemaViolation` when absent.
pub(crate) fn required_child<'a>(
    element: &'a Element,
    namespace: &str,
    local: &str,
) -> Result<&'a Element, Error> {
    element.first_child(namespace, local).ok_or_else(|| {
        Error::SchemaViolation(format!(
            "{} is missing required child {local}",
            element.name.local_name()
        ))
    })
}

/// MajorVersion and MinorVersion must both be present and equal to 1.
pub(crate) fn check_version(element: &Element) -> Result<(), Error> {
    let major = version_attr(element, ns::attr::MAJOR_VERSION)?;
    let minor = version_attr(element, ns::attr::MINOR_VERSION)?;
    if (major, minor) != (1, 1) {
        return Err(Error::VersionMismatch(format!(
            "{} declares version {major}.{minor}, expected 1.1",
            element.name.local_name()
        )));
    }
    Ok(())
}

fn version_attr(element: &Element, name: &str) -> Result<u32, Error> {
    let value = required_attr(element, name)?;
    value.trim().parse().map_err(|_| {
        Error::SchemaViolation(format!("{name} '{value}' is not an integer"))
    })
}

pub(crate) fn write_version(element: &mut Element) {
    element.set_attr(ns::attr::MAJOR_VERSION, "1");
    element.set_attr(ns::attr::MINOR_VERSION, "1");
}

/// A parsed element re-emitted verbatim, or a built one as is.
pub(crate) fn passthrough(element: &Element) -> Node {
    match element.to_raw() {
        Some(raw) => Node::Raw(raw),
        None => Node::Element(element.clone()),
    }
}

/// Write a QName as element text, declaring the binding it relies on.
pub(crate) fn set_qname_text(element: &mut Element, value: &QName) {
    if let Some(prefix) = value.prefix() {
        element.require_namespace(prefix, value.namespace());
    }
    element.push_text(value.qualified());
}
