#![forbid(unsafe_code)]

//! XML namespace constants used across the library.

/// SAML 1.x assertion namespace
pub const SAML: &str = "urn:oasis:names:tc:SAML:1.0:assertion";

/// SAML 1.x protocol namespace
pub const SAMLP: &str = "urn:oasis:names:tc:SAML:1.0:protocol";

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Exclusive C14N namespace
pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

/// XML Schema instance namespace
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML Schema namespace
pub const XS: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";

// ── Conventional prefixes ────────────────────────────────────────────

pub mod prefix {
    pub const SAML: &str = "saml";
    pub const SAMLP: &str = "samlp";
    pub const DSIG: &str = "ds";
    pub const EXC_C14N: &str = "ec";
    pub const XSI: &str = "xsi";
    pub const XS: &str = "xs";
}

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // Assertion elements
    pub const ASSERTION: &str = "Assertion";
    pub const ASSERTION_ID_REFERENCE: &str = "AssertionIDReference";
    pub const CONDITIONS: &str = "Conditions";
    pub const CONDITION: &str = "Condition";
    pub const AUDIENCE_RESTRICTION_CONDITION: &str = "AudienceRestrictionCondition";
    pub const AUDIENCE: &str = "Audience";
    pub const DO_NOT_CACHE_CONDITION: &str = "DoNotCacheCondition";
    pub const ADVICE: &str = "Advice";
    pub const STATEMENT: &str = "Statement";
    pub const SUBJECT_STATEMENT: &str = "SubjectStatement";
    pub const SUBJECT: &str = "Subject";
    pub const NAME_IDENTIFIER: &str = "NameIdentifier";
    pub const SUBJECT_CONFIRMATION: &str = "SubjectConfirmation";
    pub const CONFIRMATION_METHOD: &str = "ConfirmationMethod";
    pub const SUBJECT_CONFIRMATION_DATA: &str = "SubjectConfirmationData";
    pub const AUTHENTICATION_STATEMENT: &str = "AuthenticationStatement";
    pub const SUBJECT_LOCALITY: &str = "SubjectLocality";
    pub const AUTHORITY_BINDING: &str = "AuthorityBinding";
    pub const AUTHORIZATION_DECISION_STATEMENT: &str = "AuthorizationDecisionStatement";
    pub const ACTION: &str = "Action";
    pub const EVIDENCE: &str = "Evidence";
    pub const ATTRIBUTE_STATEMENT: &str = "AttributeStatement";
    pub const ATTRIBUTE_DESIGNATOR: &str = "AttributeDesignator";
    pub const ATTRIBUTE: &str = "Attribute";
    pub const ATTRIBUTE_VALUE: &str = "AttributeValue";

    // Protocol elements
    pub const REQUEST: &str = "Request";
    pub const RESPONSE: &str = "Response";
    pub const RESPOND_WITH: &str = "RespondWith";
    pub const QUERY: &str = "Query";
    pub const SUBJECT_QUERY: &str = "SubjectQuery";
    pub const AUTHENTICATION_QUERY: &str = "AuthenticationQuery";
    pub const ATTRIBUTE_QUERY: &str = "AttributeQuery";
    pub const AUTHORIZATION_DECISION_QUERY: &str = "AuthorizationDecisionQuery";
    pub const ASSERTION_ARTIFACT: &str = "AssertionArtifact";
    pub const STATUS: &str = "Status";
    pub const STATUS_CODE: &str = "StatusCode";
    pub const STATUS_MESSAGE: &str = "StatusMessage";
    pub const STATUS_DETAIL: &str = "StatusDetail";

    // DSig elements
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNED_INFO: &str = "SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "SignatureMethod";
    pub const SIGNATURE_VALUE: &str = "SignatureValue";
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const DIGEST_VALUE: &str = "DigestValue";
    pub const REFERENCE: &str = "Reference";
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";
    pub const KEY_INFO: &str = "KeyInfo";
    pub const KEY_NAME: &str = "KeyName";
    pub const X509_DATA: &str = "X509Data";
    pub const X509_CERTIFICATE: &str = "X509Certificate";

    // Exc C14N
    pub const INCLUSIVE_NAMESPACES: &str = "InclusiveNamespaces";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    // SAML
    pub const MAJOR_VERSION: &str = "MajorVersion";
    pub const MINOR_VERSION: &str = "MinorVersion";
    pub const ASSERTION_ID: &str = "AssertionID";
    pub const REQUEST_ID: &str = "RequestID";
    pub const RESPONSE_ID: &str = "ResponseID";
    pub const ISSUER: &str = "Issuer";
    pub const ISSUE_INSTANT: &str = "IssueInstant";
    pub const IN_RESPONSE_TO: &str = "InResponseTo";
    pub const RECIPIENT: &str = "Recipient";
    pub const NOT_BEFORE: &str = "NotBefore";
    pub const NOT_ON_OR_AFTER: &str = "NotOnOrAfter";
    pub const NAME_QUALIFIER: &str = "NameQualifier";
    pub const FORMAT: &str = "Format";
    pub const AUTHENTICATION_METHOD: &str = "AuthenticationMethod";
    pub const AUTHENTICATION_INSTANT: &str = "AuthenticationInstant";
    pub const IP_ADDRESS: &str = "IPAddress";
    pub const DNS_ADDRESS: &str = "DNSAddress";
    pub const AUTHORITY_KIND: &str = "AuthorityKind";
    pub const LOCATION: &str = "Location";
    pub const BINDING: &str = "Binding";
    pub const RESOURCE: &str = "Resource";
    pub const DECISION: &str = "Decision";
    pub const NAMESPACE: &str = "Namespace";
    pub const ATTRIBUTE_NAME: &str = "AttributeName";
    pub const ATTRIBUTE_NAMESPACE: &str = "AttributeNamespace";
    pub const VALUE: &str = "Value";

    // XSI
    pub const TYPE: &str = "type";

    // DSig
    pub const URI: &str = "URI";
    pub const ALGORITHM: &str = "Algorithm";
    pub const PREFIX_LIST: &str = "PrefixList";
}
