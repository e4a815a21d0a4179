mod common;

use std::sync::Arc;

use common::{assertion, canonical, context, hmac};
use samlbind::saml::assertion::{AttributeValue, Decision, EvidenceItem};
use samlbind::saml::protocol::{Query, RequestBody, StatusCode};
use samlbind::xml::QName;
use samlbind::{ns, Assertion, Error, Request, Response, Signable, Statement, Status};

fn response_fixture() -> String {
    format!(
        concat!(
            r#"<samlp:Response xmlns:samlp="{p}" xmlns:saml="{a}" xmlns:xsi="{xsi}" xmlns:xs="{xs}" "#,
            r#"MajorVersion="1" MinorVersion="1" ResponseID="_resp1" InResponseTo="_req1" "#,
            r#"IssueInstant="2005-03-01T12:00:00Z" Recipient="https://sp.example.org/acs">"#,
            r#"<samlp:Status><samlp:StatusCode Value="samlp:Success"/></samlp:Status>"#,
            r#"<saml:Assertion MajorVersion="1" MinorVersion="1" AssertionID="_as1" "#,
            r#"Issuer="https://idp.example.org" IssueInstant="2005-03-01T12:00:00Z">"#,
            r#"<saml:Conditions NotBefore="2005-03-01T11:55:00Z" NotOnOrAfter="2005-03-01T12:05:00Z">"#,
            r#"<saml:AudienceRestrictionCondition><saml:Audience>https://sp.example.org</saml:Audience>"#,
            r#"</saml:AudienceRestrictionCondition></saml:Conditions>"#,
            r#"<saml:AttributeStatement><saml:Subject>"#,
            r#"<saml:NameIdentifier Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">alice@example.org</saml:NameIdentifier>"#,
            r#"</saml:Subject>"#,
            r#"<saml:Attribute AttributeName="eduPersonAffiliation" AttributeNamespace="urn:mace:shibboleth:1.0:attributeNamespace:uri">"#,
            r#"<saml:AttributeValue xsi:type="xs:string">member</saml:AttributeValue>"#,
            r#"<saml:AttributeValue>staff</saml:AttributeValue></saml:Attribute></saml:AttributeStatement>"#,
            r#"<saml:AuthorizationDecisionStatement Resource="https://sp.example.org/doc" Decision="Permit">"#,
            r#"<saml:Subject><saml:NameIdentifier>alice@example.org</saml:NameIdentifier></saml:Subject>"#,
            r#"<saml:Action Namespace="urn:oasis:names:tc:SAML:1.0:action:rwedc">Read</saml:Action>"#,
            r#"<saml:Evidence><saml:AssertionIDReference>_prior</saml:AssertionIDReference></saml:Evidence>"#,
            r#"</saml:AuthorizationDecisionStatement></saml:Assertion></samlp:Response>"#
        ),
        p = ns::SAMLP,
        a = ns::SAML,
        xsi = ns::XSI,
        xs = ns::XS
    )
}

#[test]
fn response_round_trip_is_canonically_equal() {
    let ctx = context();
    let source = response_fixture();
    let mut response = Response::parse(&source, &ctx).unwrap();

    assert_eq!(response.in_response_to(), Some("_req1"));
    assert!(response.status().is_success());
    let a = &response.assertions()[0];
    assert!(a.is_valid_now(&ctx));
    assert_eq!(
        a.conditions().unwrap().audiences().map(|u| u.as_str()).collect::<Vec<_>>(),
        ["https://sp.example.org"]
    );

    let Statement::Attribute(attrs) = &a.statements()[0] else {
        panic!("expected an attribute statement");
    };
    let values: Vec<&AttributeValue> = attrs.attributes[0].values.iter().collect();
    assert_eq!(values[0].value(), "member");
    assert_eq!(values[0].type_name().unwrap(), Some(QName::new(ns::XS, "string")));
    assert_eq!(values[1].type_name().unwrap(), None);

    let Statement::AuthorizationDecision(authz) = &a.statements()[1] else {
        panic!("expected an authorization decision statement");
    };
    assert_eq!(authz.decision, Decision::Permit);
    assert!(matches!(
        &authz.evidence.as_ref().unwrap().items[0],
        EvidenceItem::AssertionIdReference(id) if id == "_prior"
    ));

    assert_eq!(canonical(&response.to_xml(&ctx).unwrap()), canonical(&source));
}

#[test]
fn request_round_trip_is_canonically_equal() {
    let ctx = context();
    let source = format!(
        concat!(
            r#"<samlp:Request xmlns:samlp="{p}" xmlns:saml="{a}" MajorVersion="1" MinorVersion="1" "#,
            r#"RequestID="_req1" IssueInstant="2005-03-01T12:00:00Z">"#,
            r#"<samlp:RespondWith>saml:AttributeStatement</samlp:RespondWith>"#,
            r#"<samlp:AttributeQuery Resource="https://sp.example.org">"#,
            r#"<saml:Subject><saml:NameIdentifier>alice</saml:NameIdentifier></saml:Subject>"#,
            r#"<saml:AttributeDesignator AttributeName="mail" AttributeNamespace="urn:mace:dir:attribute-def"/>"#,
            r#"</samlp:AttributeQuery></samlp:Request>"#
        ),
        p = ns::SAMLP,
        a = ns::SAML
    );
    let mut request = Request::parse(&source, &ctx).unwrap();
    assert_eq!(
        request.respond_with(),
        [QName::new(ns::SAML, ns::node::ATTRIBUTE_STATEMENT)]
    );
    let RequestBody::Query(Query::Attribute(q)) = request.body() else {
        panic!("expected an attribute query");
    };
    assert_eq!(q.designators.len(), 1);
    assert_eq!(canonical(&request.to_xml(&ctx).unwrap()), canonical(&source));
}

#[test]
fn version_attributes_must_be_one_one() {
    let ctx = context();
    let source = response_fixture();

    let major = source.replacen(r#"MajorVersion="1""#, r#"MajorVersion="2""#, 1);
    assert!(matches!(Response::parse(&major, &ctx), Err(Error::VersionMismatch(_))));

    let minor = source.replacen(r#"MinorVersion="1""#, r#"MinorVersion="0""#, 1);
    assert!(matches!(Response::parse(&minor, &ctx), Err(Error::VersionMismatch(_))));

    // Second occurrence: the nested assertion.
    let nested = source
        .replacen(r#"MinorVersion="1""#, r#"MinorVersion="X""#, 1)
        .replacen(r#"MinorVersion="1""#, r#"MinorVersion="0""#, 1)
        .replacen(r#"MinorVersion="X""#, r#"MinorVersion="1""#, 1);
    assert!(matches!(Response::parse(&nested, &ctx), Err(Error::VersionMismatch(_))));

    let garbage = source.replacen(r#"MajorVersion="1""#, r#"MajorVersion="one""#, 1);
    assert!(matches!(Response::parse(&garbage, &ctx), Err(Error::SchemaViolation(_))));
}

#[test]
fn top_level_status_code_domain() {
    let ctx = context();
    let source = response_fixture();

    let bogus = source.replace(r#"Value="samlp:Success""#, r#"Value="samlp:Maybe""#);
    assert!(matches!(Response::parse(&bogus, &ctx), Err(Error::ProtocolViolation(_))));

    for code in samlbind::saml::protocol::status::TOP_LEVEL_CODES {
        let mut response = Response::with_status(Status::new(StatusCode::samlp(code)));
        response.set_id("_s");
        let xml = response.to_xml(&ctx).unwrap();
        assert!(Response::parse(&xml, &ctx).unwrap().status().code.is(code));
    }
}

#[test]
fn status_code_resolves_by_namespace_not_prefix() {
    let ctx = context();
    let source = response_fixture()
        .replace(r#"Value="samlp:Success""#, r#"xmlns:q="urn:oasis:names:tc:SAML:1.0:protocol" Value="q:Success""#);
    let response = Response::parse(&source, &ctx).unwrap();
    assert!(response.status().is_success());
}

fn signed_assertion_xml(id: &str) -> String {
    let ctx = context();
    let mut a = assertion(id);
    a.sign_with(Arc::new(hmac(b"k")), &ctx).unwrap();
    a.to_xml(&ctx).unwrap()
}

fn reference_block(xml: &str) -> &str {
    let start = xml.find("<ds:Reference").unwrap();
    let end = xml.find("</ds:Reference>").unwrap() + "</ds:Reference>".len();
    &xml[start..end]
}

#[test]
fn reference_without_fragment_is_rejected() {
    let ctx = context();
    let xml = signed_assertion_xml("_ref").replace(r##"URI="#_ref""##, r#"URI="_ref""#);
    let err = Assertion::parse(&xml, &ctx).unwrap_err();
    assert!(matches!(err, Error::ReferenceValidationFailed(_)));
    assert!(err.is_reference_error());
}

#[test]
fn reference_to_another_element_is_rejected() {
    let ctx = context();
    let xml = signed_assertion_xml("_ref").replace(r##"URI="#_ref""##, r##"URI="#_other""##);
    assert!(matches!(
        Assertion::parse(&xml, &ctx),
        Err(Error::ReferenceValidationFailed(_))
    ));
}

#[test]
fn reference_count_must_be_one() {
    let ctx = context();
    let xml = signed_assertion_xml("_ref");
    let block = reference_block(&xml).to_owned();

    let doubled = xml.replace(&block, &format!("{block}{block}"));
    assert!(matches!(
        Assertion::parse(&doubled, &ctx),
        Err(Error::ReferenceCountMismatch(2))
    ));

    let none = xml.replace(&block, "");
    assert!(matches!(
        Assertion::parse(&none, &ctx),
        Err(Error::ReferenceCountMismatch(0))
    ));
}

#[test]
fn signed_response_passes_through_unchanged() {
    let ctx = context();
    let mut response = Response::new();
    response.set_id("_pt");
    response.add_assertion(assertion("_pt_a"));
    response.sign_with(Arc::new(hmac(b"k")), &ctx).unwrap();
    let xml = response.to_xml(&ctx).unwrap();

    let mut parsed = Response::parse(&xml, &ctx).unwrap();
    assert!(parsed.is_signed());
    assert_eq!(parsed.to_xml(&ctx).unwrap(), xml);

    parsed.assertions_mut()[0].set_issuer(samlbind::saml::SamlString::parse("x").unwrap());
    assert!(!parsed.is_signed());
    assert!(!parsed.to_xml(&ctx).unwrap().contains("ds:Signature"));
}
