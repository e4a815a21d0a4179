#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use chrono::{TimeZone, Utc};
use samlbind::saml::assertion::{
    Advice, AuthenticationStatement, Conditions, NameIdentifier, Subject,
};
use samlbind::saml::context::FixedClock;
use samlbind::saml::{SamlDateTime, SamlString, SamlUri};
use samlbind::{algorithm, Assertion, KeySigner, SamlContext, Statement};

pub const PASSWORD: &str = "urn:oasis:names:tc:SAML:1.0:am:password";

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("samlbind=debug"))
        .with_test_writer()
        .try_init();
}

/// A context whose clock is pinned to 2005-03-01T12:00:00Z.
pub fn context() -> SamlContext {
    init_logging();
    SamlContext::builder()
        .clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2005, 3, 1, 12, 0, 0).unwrap(),
        )))
        .build()
}

pub fn hmac(key: &[u8]) -> KeySigner {
    KeySigner::new(
        samlbind::SigningKey::Hmac(key.to_vec()),
        algorithm::HMAC_SHA256,
    )
    .unwrap()
}

/// One RSA key per test binary; generation is slow.
pub fn rsa_key() -> &'static rsa::RsaPrivateKey {
    static KEY: OnceLock<rsa::RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
}

pub fn authentication(name: &str) -> Statement {
    Statement::Authentication(AuthenticationStatement::new(
        Subject::new(NameIdentifier::new(SamlString::parse(name).unwrap())),
        SamlUri::parse(PASSWORD).unwrap(),
        SamlDateTime::parse("2005-03-01T11:59:30Z").unwrap(),
    ))
}

pub fn assertion(id: &str) -> Assertion {
    let mut a = Assertion::new().with_statement(authentication("alice"));
    a.set_id(id);
    a.set_issuer(SamlString::parse("https://idp.example.org").unwrap());
    a
}

/// An assertion with Conditions and Advice ahead of its statement.
pub fn full_assertion(id: &str) -> Assertion {
    let mut a = assertion(id);
    a.set_conditions(Some(Conditions {
        not_before: Some(SamlDateTime::parse("2005-03-01T11:55:00Z").unwrap()),
        not_on_or_after: Some(SamlDateTime::parse("2005-03-01T12:05:00Z").unwrap()),
        conditions: Vec::new(),
    }));
    let mut advice = Advice::new();
    advice
        .items
        .push(samlbind::saml::assertion::AdviceItem::AssertionIdReference("_prior".into()));
    a.set_advice(Some(advice));
    a
}

/// Local names of the child elements of the document element of `xml`.
pub fn child_names(xml: &str) -> Vec<String> {
    let root = samlbind::xml::parse(xml).unwrap();
    root.child_elements()
        .map(|c| c.name.local_name().to_owned())
        .collect()
}

/// Exclusive canonical form of a document, for comparisons that ignore
/// insignificant serialization differences.
pub fn canonical(xml: &str) -> String {
    use samlbind::c14n::Canonicalizer;
    let root = samlbind::xml::parse(xml).unwrap();
    let bytes = samlbind::c14n::C14n
        .canonicalize(&root, &[], algorithm::EXC_C14N, &[])
        .unwrap();
    String::from_utf8(bytes).unwrap()
}
