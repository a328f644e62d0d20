//! Key generation context handed to observers.

use crate::fragment::{digest, FragmentCacheConfiguration, RequestDescriptor};

/// State of one key computation.
///
/// Observers receive the context by value, may append parts, and hand it
/// back. Only digests of the contributed strings are kept.
#[derive(Debug)]
pub struct KeyGenerationContext<'a> {
    configuration: &'a FragmentCacheConfiguration,
    sub_request: &'a RequestDescriptor,
    master_request: &'a RequestDescriptor,
    parts: Vec<String>,
}

impl<'a> KeyGenerationContext<'a> {
    pub fn new(
        configuration: &'a FragmentCacheConfiguration,
        sub_request: &'a RequestDescriptor,
        master_request: &'a RequestDescriptor,
    ) -> Self {
        Self {
            configuration,
            sub_request,
            master_request,
            parts: Vec::new(),
        }
    }

    pub fn configuration(&self) -> &'a FragmentCacheConfiguration {
        self.configuration
    }

    pub fn sub_request(&self) -> &'a RequestDescriptor {
        self.sub_request
    }

    pub fn master_request(&self) -> &'a RequestDescriptor {
        self.master_request
    }

    /// Appends the digest of `raw` to the key material and returns it.
    pub fn add_part(&mut self, raw: &str) -> String {
        let part = digest(raw);
        self.parts.push(part.clone());
        part
    }

    /// Digests contributed so far, in contribution order.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<String> {
        self.parts
    }
}
