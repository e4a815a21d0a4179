mod common;

use std::any::Any;
use std::sync::Arc;

use common::{canonical, context, hmac};
use samlbind::saml::assertion::{NameIdentifier, Subject};
use samlbind::saml::protocol::{Query, RequestBody};
use samlbind::saml::SamlString;
use samlbind::xml::{Element, QName};
use samlbind::{
    ns, Error, Extension, ExtensionKind, ExtensionObject, ExtensionType, Request, SamlContext,
    Signable, Verifiable,
};

const CONSENT: &str = "urn:example:consent";

/// Asks whether the subject agreed to release data for a purpose.
#[derive(Debug, Clone, PartialEq)]
struct ConsentQuery {
    subject: Subject,
    purpose: String,
}

impl ExtensionObject for ConsentQuery {
    fn kind(&self) -> ExtensionKind {
        ExtensionKind::SubjectQuery
    }

    fn type_name(&self) -> QName {
        <Self as ExtensionType>::type_name()
    }

    fn write_body(&self, element: &mut Element) -> Result<(), Error> {
        element.set_attr("Purpose", self.purpose.clone());
        element.push(self.subject.to_element()?);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn ExtensionObject> {
        Box::new(self.clone())
    }
}

impl ExtensionType for ConsentQuery {
    const KIND: ExtensionKind = ExtensionKind::SubjectQuery;

    fn type_name() -> QName {
        QName::prefixed(CONSENT, "c", "ConsentQueryType")
    }

    fn parse(element: &Element, _ctx: &SamlContext) -> Result<Self, Error> {
        let subject = element
            .first_child(ns::SAML, ns::node::SUBJECT)
            .ok_or_else(|| Error::SchemaViolation("ConsentQuery requires a Subject".into()))?;
        let purpose = element
            .attr("Purpose")
            .ok_or_else(|| Error::SchemaViolation("ConsentQuery requires a Purpose".into()))?;
        Ok(Self {
            subject: Subject::from_element(subject)?,
            purpose: purpose.to_owned(),
        })
    }
}

/// A substitution element for `samlp:Query` naming an earlier request.
#[derive(Debug, Clone, PartialEq)]
struct StatusQuery {
    reference: String,
}

impl ExtensionObject for StatusQuery {
    fn kind(&self) -> ExtensionKind {
        ExtensionKind::Query
    }

    fn type_name(&self) -> QName {
        <Self as ExtensionType>::type_name()
    }

    fn write_body(&self, element: &mut Element) -> Result<(), Error> {
        element.set_attr("Ref", self.reference.clone());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn ExtensionObject> {
        Box::new(self.clone())
    }
}

impl ExtensionType for StatusQuery {
    const KIND: ExtensionKind = ExtensionKind::Query;

    fn type_name() -> QName {
        QName::prefixed(CONSENT, "c", "StatusQuery")
    }

    fn parse(element: &Element, _ctx: &SamlContext) -> Result<Self, Error> {
        Ok(Self {
            reference: element.attr("Ref").unwrap_or_default().to_owned(),
        })
    }
}

const CONSENT_QUERY: &str = concat!(
    r#"<samlp:SubjectQuery  Purpose="billing" xsi:type="c:ConsentQueryType">"#,
    r#"<saml:Subject><saml:NameIdentifier>alice</saml:NameIdentifier></saml:Subject>"#,
    r#"</samlp:SubjectQuery>"#
);

fn request_with(body: &str) -> String {
    format!(
        concat!(
            r#"<samlp:Request xmlns:samlp="{p}" xmlns:saml="{a}" xmlns:xsi="{xsi}" xmlns:c="{c}" "#,
            r#"MajorVersion="1" MinorVersion="1" RequestID="_cq" IssueInstant="2005-03-01T12:00:00Z">"#,
            "{body}</samlp:Request>"
        ),
        p = ns::SAMLP,
        a = ns::SAML,
        xsi = ns::XSI,
        c = CONSENT,
        body = body
    )
}

fn extension_query(request: &Request) -> &Extension {
    let RequestBody::Query(Query::Extension(ext)) = request.body() else {
        panic!("expected an extension query, got {:?}", request.body());
    };
    ext
}

#[test]
fn registered_subject_query_resolves() {
    let ctx = context();
    ctx.registry().register_extension::<ConsentQuery>();

    let request = Request::parse(&request_with(CONSENT_QUERY), &ctx).unwrap();
    let consent = extension_query(&request)
        .downcast_ref::<ConsentQuery>()
        .unwrap();
    assert_eq!(consent.purpose, "billing");
    assert_eq!(
        consent.subject.name_identifier.as_ref().unwrap().value.as_str(),
        "alice"
    );
}

#[test]
fn known_subject_query_serializes_with_xsi_type() {
    let ctx = context();
    ctx.registry().register_extension::<ConsentQuery>();

    let consent = ConsentQuery {
        subject: Subject::new(NameIdentifier::new(SamlString::parse("bob").unwrap())),
        purpose: "research".into(),
    };
    let mut request = Request::query(Query::Extension(Extension::known(consent.clone())));
    request.set_id("_known_q");
    let xml = request.to_xml(&ctx).unwrap();
    assert!(xml.contains(r#"<samlp:SubjectQuery"#));
    assert!(xml.contains(r#"xsi:type="c:ConsentQueryType""#));

    let parsed = Request::parse(&xml, &ctx).unwrap();
    assert_eq!(
        extension_query(&parsed).downcast_ref::<ConsentQuery>(),
        Some(&consent)
    );
}

#[test]
fn registered_element_stands_in_for_query() {
    let ctx = context();
    ctx.registry().register_element::<StatusQuery>();

    let source = request_with(r#"<c:StatusQuery Ref="_earlier"/>"#);
    let mut request = Request::parse(&source, &ctx).unwrap();
    assert_eq!(
        extension_query(&request).downcast_ref::<StatusQuery>(),
        Some(&StatusQuery {
            reference: "_earlier".into()
        })
    );
    assert_eq!(canonical(&request.to_xml(&ctx).unwrap()), canonical(&source));
}

#[test]
fn unregistered_subject_query_round_trips_byte_for_byte() {
    let ctx = context();
    let source = request_with(CONSENT_QUERY);
    let mut request = Request::parse(&source, &ctx).unwrap();

    let unknown = extension_query(&request).as_unknown().unwrap();
    assert_eq!(unknown.type_name(), &QName::new(CONSENT, "ConsentQueryType"));
    assert_eq!(unknown.raw().text(), CONSENT_QUERY);

    let xml = request.to_xml(&ctx).unwrap();
    assert!(xml.contains(CONSENT_QUERY));
    assert_eq!(canonical(&xml), canonical(&source));
}

#[test]
fn unregistered_subject_query_survives_signing() {
    let ctx = context();
    let mut request = Request::parse(&request_with(CONSENT_QUERY), &ctx).unwrap();
    request.sign_with(Arc::new(hmac(b"k")), &ctx).unwrap();
    let xml = request.to_xml(&ctx).unwrap();

    let parsed = Request::parse(&xml, &ctx).unwrap();
    assert!(parsed.is_signed());
    parsed.verify(&hmac(b"k"), &ctx).unwrap();
    assert_eq!(
        extension_query(&parsed).type_name(),
        QName::new(CONSENT, "ConsentQueryType")
    );
}

#[test]
fn known_subject_query_survives_signing() {
    let ctx = context();
    ctx.registry().register_extension::<ConsentQuery>();

    let mut request = Request::parse(&request_with(CONSENT_QUERY), &ctx).unwrap();
    request.sign_with(Arc::new(hmac(b"k")), &ctx).unwrap();
    let xml = request.to_xml(&ctx).unwrap();

    let parsed = Request::parse(&xml, &ctx).unwrap();
    parsed.verify(&hmac(b"k"), &ctx).unwrap();
    assert_eq!(
        extension_query(&parsed)
            .downcast_ref::<ConsentQuery>()
            .unwrap()
            .purpose,
        "billing"
    );
}

#[test]
fn plain_query_handler_on_subject_query_is_a_mismatch() {
    let ctx = context();
    ctx.registry().register_extension::<StatusQuery>();
    let body = CONSENT_QUERY.replace("c:ConsentQueryType", "c:StatusQuery");
    let err = Request::parse(&request_with(&body), &ctx).unwrap_err();
    assert!(matches!(err, Error::HandlerMismatch(_)));
}
