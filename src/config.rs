use arc_swap::ArcSwap;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::ValidationError;

pub const DEFAULT_TIMEOUT_SECS: i64 = 10;
pub const MIN_TIMEOUT_SECS: i64 = 1;
pub const MAX_TIMEOUT_SECS: i64 = 30;

/// Plugin-local configuration as supplied by the host, before defaults.
///
/// Every field is optional: an absent field keeps the default rather than
/// resetting it to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawConfig {
    #[serde(
        default,
        alias = "Timeout",
        deserialize_with = "lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<i64>,

    #[serde(
        default,
        alias = "SkipVerify",
        alias = "skipVerify",
        alias = "skipverify",
        alias = "skipTLSVerify",
        alias = "skiptlsverify",
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub skip_verify: Option<bool>,
}

impl RawConfig {
    /// Normalize a loosely-typed payload into a `RawConfig`.
    ///
    /// `null` means "no configuration". Objects may carry numbers, booleans or
    /// their string spellings; unknown keys are ignored.
    pub fn decode(value: &serde_json::Value) -> Result<Self, ValidationError> {
        match value {
            serde_json::Value::Null => Ok(Self::default()),
            serde_json::Value::Object(_) => {
                Self::deserialize(value).map_err(|e| ValidationError::Decode(e.to_string()))
            }
            other => Err(ValidationError::Decode(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }
}

/// Options shared by all plugins of the host agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GlobalOptions {
    #[serde(default, alias = "Timeout")]
    pub timeout: i64,
}

/// Settings actually used by a request after all sources are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub timeout_seconds: u64,
    pub skip_tls_verify: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECS as u64,
            skip_tls_verify: false,
        }
    }
}

impl EffectiveConfig {
    /// Relaxed policy for ad-hoc runs from a terminal
    pub fn manual() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECS as u64,
            skip_tls_verify: true,
        }
    }
}

/// Merge defaults, plugin-local config and the global timeout.
///
/// An explicit local timeout wins; the global timeout only fills an unset or
/// zero local value. The result is clamped into range instead of failing.
pub fn resolve(local: Option<&RawConfig>, global: Option<&GlobalOptions>) -> EffectiveConfig {
    let local_timeout = local.and_then(|c| c.timeout);
    let global_timeout = global.map(|g| g.timeout).filter(|t| *t > 0);

    let timeout = match (local_timeout, global_timeout) {
        (Some(t), _) if t != 0 => t,
        (_, Some(g)) => g,
        (Some(t), None) => t,
        (None, None) => DEFAULT_TIMEOUT_SECS,
    };

    let clamped = timeout.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
    if clamped != timeout {
        tracing::warn!(requested = timeout, applied = clamped, "Timeout corrected into range");
    }

    EffectiveConfig {
        timeout_seconds: clamped as u64,
        skip_tls_verify: local.and_then(|c| c.skip_verify).unwrap_or(false),
    }
}

/// Check whether a configuration would be accepted, without applying it
pub fn validate(candidate: &RawConfig) -> Result<(), ValidationError> {
    let timeout = candidate.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout) {
        return Err(ValidationError::TimeoutOutOfRange { value: timeout });
    }
    Ok(())
}

/// Process-wide effective configuration.
///
/// Readers take a snapshot without locking; `set` swaps the whole value.
#[derive(Debug)]
pub struct ConfigCell {
    inner: ArcSwap<EffectiveConfig>,
}

impl ConfigCell {
    pub fn new(config: EffectiveConfig) -> Self {
        Self {
            inner: ArcSwap::from_pointee(config),
        }
    }

    pub fn get(&self) -> EffectiveConfig {
        **self.inner.load()
    }

    pub fn set(&self, config: EffectiveConfig) {
        self.inner.store(Arc::new(config));
    }
}

impl Default for ConfigCell {
    fn default() -> Self {
        Self::new(EffectiveConfig::default())
    }
}

/// Load plugin-local configuration from an optional file plus `SEGI9_*`
/// environment variables.
pub fn load_raw_config(path: &Path) -> anyhow::Result<RawConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("SEGI9"))
        .build()?;

    let value: serde_json::Value = settings.try_deserialize()?;
    Ok(RawConfig::decode(&value)?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Int(n)) => Ok(Some(n)),
        Some(Scalar::Float(f)) if f.fract() == 0.0 => Ok(Some(f as i64)),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid integer: {:?}", s))),
        Some(_) => Err(D::Error::custom("expected an integer")),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Bool(b)) => Ok(Some(b)),
        Some(Scalar::Int(0)) => Ok(Some(false)),
        Some(Scalar::Int(1)) => Ok(Some(true)),
        Some(Scalar::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!("invalid boolean: {:?}", s))),
        },
        Some(_) => Err(D::Error::custom("expected a boolean")),
    }
}
