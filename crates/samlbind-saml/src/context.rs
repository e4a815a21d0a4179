#![forbid(unsafe_code)]

//! Capability context threaded through every parse and serialize call.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use samlbind_c14n::{C14n, Canonicalizer};
use samlbind_core::{algorithm, Error};
use serde::{Deserialize, Serialize};

use crate::registry::ExtensionRegistry;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant. Useful in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Largest accepted `clock_skew_seconds`: one day.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 86_400;

/// Serializable settings for a [`SamlContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlConfig {
    /// Algorithm URIs the verifier refuses.
    pub blacklisted_algorithms: Vec<String>,
    /// Canonicalization used by `Signable::sign_with`.
    pub default_canonicalization: String,
    /// Tolerance applied to `Conditions` time windows.
    pub clock_skew_seconds: i64,
}

impl Default for SamlConfig {
    fn default() -> Self {
        Self {
            blacklisted_algorithms: algorithm::DEFAULT_BLACKLIST
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            default_canonicalization: algorithm::EXC_C14N.to_owned(),
            clock_skew_seconds: 180,
        }
    }
}

impl SamlConfig {
    /// Parse settings from TOML. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<(), Error> {
        if !samlbind_c14n::is_allowed(&self.default_canonicalization) {
            return Err(Error::UnsupportedAlgorithm(format!(
                "canonicalization: {}",
                self.default_canonicalization
            )));
        }
        if !(0..=MAX_CLOCK_SKEW_SECONDS).contains(&self.clock_skew_seconds) {
            return Err(Error::Config(format!(
                "clock_skew_seconds must be between 0 and {MAX_CLOCK_SKEW_SECONDS}, got {}",
                self.clock_skew_seconds
            )));
        }
        Ok(())
    }
}

struct Inner {
    clock: Arc<dyn Clock>,
    canonicalizer: Arc<dyn Canonicalizer>,
    registry: ExtensionRegistry,
    blacklist: Vec<String>,
    default_canonicalization: String,
    clock_skew: Duration,
}

/// Clock, canonicalizer, extension registry and verifier policy.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct SamlContext {
    inner: Arc<Inner>,
}

impl SamlContext {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SamlContextBuilder {
        SamlContextBuilder::default()
    }

    pub fn from_config(config: &SamlConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::builder().config(config.clone()).build())
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    /// The current time according to the context clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    pub fn canonicalizer(&self) -> Arc<dyn Canonicalizer> {
        Arc::clone(&self.inner.canonicalizer)
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.inner.registry
    }

    /// Algorithms a verifier must reject.
    pub fn blacklisted_algorithms(&self) -> &[String] {
        &self.inner.blacklist
    }

    pub fn default_canonicalization(&self) -> &str {
        &self.inner.default_canonicalization
    }

    pub fn clock_skew(&self) -> Duration {
        self.inner.clock_skew
    }
}

impl Default for SamlContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SamlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamlContext")
            .field("registry", &self.inner.registry)
            .field("blacklist", &self.inner.blacklist)
            .field("default_canonicalization", &self.inner.default_canonicalization)
            .field("clock_skew", &self.inner.clock_skew)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SamlContext`].
#[derive(Default)]
pub struct SamlContextBuilder {
    clock: Option<Arc<dyn Clock>>,
    canonicalizer: Option<Arc<dyn Canonicalizer>>,
    registry: Option<ExtensionRegistry>,
    config: SamlConfig,
}

impl SamlContextBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn canonicalizer(mut self, canonicalizer: Arc<dyn Canonicalizer>) -> Self {
        self.canonicalizer = Some(canonicalizer);
        self
    }

    pub fn registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn blacklist<I, S>(mut self, algorithms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.blacklisted_algorithms = algorithms.into_iter().map(Into::into).collect();
        self
    }

    pub fn config(mut self, config: SamlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> SamlContext {
        SamlContext {
            inner: Arc::new(Inner {
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                canonicalizer: self.canonicalizer.unwrap_or_else(|| Arc::new(C14n)),
                registry: self.registry.unwrap_or_default(),
                blacklist: self.config.blacklisted_algorithms,
                default_canonicalization: self.config.default_canonicalization,
                clock_skew: Duration::seconds(
                    self.config.clock_skew_seconds.clamp(0, MAX_CLOCK_SKEW_SECONDS),
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_blacklist_md5() {
        let ctx = SamlContext::new();
        assert!(ctx
            .blacklisted_algorithms()
            .iter()
            .any(|a| a == algorithm::RSA_MD5));
        assert_eq!(ctx.default_canonicalization(), algorithm::EXC_C14N);
    }

    #[test]
    fn config_from_toml() {
        let config = SamlConfig::from_toml(
            r#"
blacklisted_algorithms = ["http://www.w3.org/2000/09/xmldsig#rsa-sha1"]
clock_skew_seconds = 30
"#,
        )
        .unwrap();
        assert_eq!(config.blacklisted_algorithms, vec![algorithm::RSA_SHA1.to_owned()]);
        assert_eq!(config.default_canonicalization, algorithm::EXC_C14N);
        let ctx = SamlContext::from_config(&config).unwrap();
        assert_eq!(ctx.clock_skew(), Duration::seconds(30));
    }

    #[test]
    fn config_rejects_unknown_canonicalization() {
        let err = SamlConfig::from_toml(r#"default_canonicalization = "urn:nope""#).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
        assert!(matches!(
            SamlConfig::from_toml("clock_skew_seconds = \"x\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn config_bounds_clock_skew() {
        for value in ["-1", "86401", "9223372036854775807"] {
            assert!(matches!(
                SamlConfig::from_toml(&format!("clock_skew_seconds = {value}")),
                Err(Error::Config(_))
            ));
        }
        assert!(SamlConfig::from_toml("clock_skew_seconds = 86400").is_ok());

        let unchecked = SamlConfig {
            clock_skew_seconds: i64::MAX,
            ..SamlConfig::default()
        };
        assert!(matches!(
            SamlContext::from_config(&unchecked),
            Err(Error::Config(_))
        ));
        let ctx = SamlContext::builder().config(unchecked).build();
        assert_eq!(ctx.clock_skew(), Duration::seconds(MAX_CLOCK_SKEW_SECONDS));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = SamlConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(SamlConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn fixed_clock() {
        let t = Utc.with_ymd_and_hms(2004, 5, 6, 7, 8, 9).unwrap();
        let ctx = SamlContext::builder().clock(Arc::new(FixedClock(t))).build();
        assert_eq!(ctx.now(), t);
    }

    #[test]
    fn clones_share_registry() {
        let ctx = SamlContext::new();
        let other = ctx.clone();
        assert!(std::ptr::eq(ctx.registry(), other.registry()));
    }
}
