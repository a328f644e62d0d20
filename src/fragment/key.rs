//! Fragment cache key derivation.
//!
//! Keys have the shape `AciliaComponentFragmentCache:<environment>:v<version>:<digest>`
//! where `<digest>` is the SHA-1 of the sub-request URI digest, the master
//! request URI digest and every observer contribution, joined with `:`.

use std::fmt;

use sha1::{Digest, Sha1};
use tracing::debug;

use crate::error::Result;
use crate::fragment::{
    FragmentCacheConfiguration, KeyGenerationContext, KeyGenerationHook, RequestDescriptor,
};

/// First segment of every fragment key.
pub const KEY_NAMESPACE: &str = "AciliaComponentFragmentCache";

/// Separator between key segments and between hashed key parts.
pub const KEY_SEPARATOR: &str = ":";

/// Lowercase hex SHA-1 of `input`.
pub fn digest(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

// == Cache Key ==
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// == Key Builder ==
/// Derives fragment keys for one environment.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    environment: String,
}

impl KeyBuilder {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Computes the key for `sub_request` rendered under `master_request`.
    ///
    /// Observers registered on `hook` may append key parts; their order is
    /// part of the key. An observer failure aborts key generation.
    pub fn build(
        &self,
        configuration: &FragmentCacheConfiguration,
        sub_request: &RequestDescriptor,
        master_request: &RequestDescriptor,
        hook: &KeyGenerationHook,
    ) -> Result<CacheKey> {
        let context = KeyGenerationContext::new(configuration, sub_request, master_request);
        let context = hook.dispatch(context)?;

        let mut material = Vec::with_capacity(2 + context.parts().len());
        material.push(digest(sub_request.uri()));
        material.push(digest(master_request.uri()));
        material.extend(context.into_parts());

        let key = [
            KEY_NAMESPACE.to_string(),
            self.environment.clone(),
            format!("v{}", configuration.version()),
            digest(&material.join(KEY_SEPARATOR)),
        ]
        .join(KEY_SEPARATOR);

        debug!(
            sub_request = sub_request.uri(),
            master_request = master_request.uri(),
            extra_parts = material.len() - 2,
            "computed fragment key {}",
            key
        );

        Ok(CacheKey(key))
    }
}
