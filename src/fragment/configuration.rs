//! Per-route fragment cache configuration.
//!
//! Numeric settings are lenient: anything that is not a non-negative number
//! falls back to the default of 1 instead of failing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FragmentCacheError, Result};

/// Value used for expiration and version when input is absent or invalid.
pub const DEFAULT_SETTING: u64 = 1;

// == Fragment Cache Configuration ==
/// Settings for one cacheable fragment route.
///
/// Attached to sub-requests by the dispatch layer and immutable while a
/// request is being handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawConfiguration")]
pub struct FragmentCacheConfiguration {
    /// Expiration in minutes
    expiration: u64,
    /// Bumping the version orphans every fragment cached under the old one
    version: u64,
    /// Free-form data for key generation observers; never hashed directly
    options: BTreeMap<String, String>,
}

impl Default for FragmentCacheConfiguration {
    fn default() -> Self {
        Self {
            expiration: DEFAULT_SETTING,
            version: DEFAULT_SETTING,
            options: BTreeMap::new(),
        }
    }
}

impl FragmentCacheConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from a JSON object with optional
    /// `expiration`, `version` and `options` members.
    pub fn from_values(values: Value) -> Result<Self> {
        serde_json::from_value(values)
            .map_err(|e| FragmentCacheError::InvalidConfiguration(e.to_string()))
    }

    pub fn with_expiration(mut self, minutes: u64) -> Self {
        self.expiration = minutes;
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Expiration in minutes.
    pub fn expiration(&self) -> u64 {
        self.expiration
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Sets the expiration from loosely typed input, defaulting to 1.
    pub fn set_expiration(&mut self, raw: &Value) -> &mut Self {
        self.expiration = coerce_setting(raw);
        self
    }

    /// Sets the version from loosely typed input, defaulting to 1.
    pub fn set_version(&mut self, raw: &Value) -> &mut Self {
        self.version = coerce_setting(raw);
        self
    }

    /// Replaces the options. Anything but an object clears them.
    pub fn set_options(&mut self, raw: &Value) -> &mut Self {
        self.options = match raw {
            Value::Object(map) => map
                .iter()
                .map(|(name, value)| (name.clone(), option_text(value)))
                .collect(),
            _ => BTreeMap::new(),
        };
        self
    }
}

/// Accepts integers, floats and numeric strings (truncated toward zero).
/// Negative, non-finite and non-numeric input yields the default.
fn coerce_setting(raw: &Value) -> u64 {
    let number = match raw {
        Value::Number(n) => {
            if let Some(n) = n.as_u64() {
                return n;
            }
            n.as_f64()
        }
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n >= 0.0 => n.trunc() as u64,
        _ => DEFAULT_SETTING,
    }
}

fn option_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// == Raw Configuration ==
/// Wire shape of a configuration before coercion.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfiguration {
    #[serde(default)]
    expiration: Option<Value>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    options: Option<Value>,
}

impl From<RawConfiguration> for FragmentCacheConfiguration {
    fn from(raw: RawConfiguration) -> Self {
        let mut configuration = Self::default();
        if let Some(expiration) = &raw.expiration {
            configuration.set_expiration(expiration);
        }
        if let Some(version) = &raw.version {
            configuration.set_version(version);
        }
        if let Some(options) = &raw.options {
            configuration.set_options(options);
        }
        configuration
    }
}
