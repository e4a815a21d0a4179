#![forbid(unsafe_code)]

//! Profile-constrained scalar values.
//!
//! Every value goes through the same pipeline: sanitize (trim), base
//! schema check (`SchemaViolation`), SAML profile check
//! (`ProtocolViolation`), construct.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use samlbind_core::Error;

fn sanitize(raw: &str) -> &str {
    raw.trim()
}

/// A string that is not empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SamlString(String);

impl SamlString {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let value = sanitize(raw);
        if value.is_empty() {
            return Err(Error::ProtocolViolation(
                "string value is empty or whitespace".into(),
            ));
        }
        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SamlString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SamlString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A non-empty URI reference. Absolute URIs must parse; relative
/// references are accepted as long as they contain no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SamlUri(String);

impl SamlUri {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let value = sanitize(raw);
        if value.chars().any(char::is_whitespace) {
            return Err(Error::SchemaViolation(format!(
                "'{value}' is not a URI reference"
            )));
        }
        if has_scheme(value) {
            url::Url::parse(value)
                .map_err(|e| Error::SchemaViolation(format!("'{value}' is not a URI: {e}")))?;
        }
        if value.is_empty() {
            return Err(Error::ProtocolViolation("URI value is empty".into()));
        }
        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// True if `value` starts with `scheme:` as defined by RFC 3986.
fn has_scheme(value: &str) -> bool {
    let Some(colon) = value.find(':') else {
        return false;
    };
    let scheme = &value[..colon];
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl fmt::Display for SamlUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SamlUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An `xsd:dateTime` in UTC, written with a trailing `Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SamlDateTime(DateTime<Utc>);

impl SamlDateTime {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let value = sanitize(raw);
        // RFC 3339 also allows a space or lowercase `t` between date and
        // time; xsd:dateTime does not.
        let separated = value
            .split_once('T')
            .is_some_and(|(date, time)| date.len() >= 10 && !time.is_empty());
        if !separated || value.contains(char::is_whitespace) {
            return Err(Error::SchemaViolation(format!(
                "'{value}' is not an xsd:dateTime"
            )));
        }
        let parsed = DateTime::parse_from_rfc3339(value).map(|d| d.with_timezone(&Utc));
        let parsed = match parsed {
            Ok(d) => Some(d),
            Err(_) => {
                // Lexically valid without a zone; the profile check rejects it.
                NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
                    Error::SchemaViolation(format!("'{value}' is not an xsd:dateTime: {e}"))
                })?;
                None
            }
        };
        if !value.ends_with('Z') {
            return Err(Error::ProtocolViolation(format!(
                "dateTime '{value}' is not in UTC ('Z')"
            )));
        }
        let parsed = parsed.ok_or_else(|| {
            Error::SchemaViolation(format!("'{value}' is not an xsd:dateTime"))
        })?;
        Ok(Self(parsed))
    }

    pub fn inner(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for SamlDateTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl fmt::Display for SamlDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}
