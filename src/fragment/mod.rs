//! Fragment Module
//!
//! Key derivation, the key generation hook and the controller that caches
//! sub-request output.

mod configuration;
mod context;
mod controller;
mod hook;
mod key;
mod observers;
mod request;


pub use configuration::{FragmentCacheConfiguration, DEFAULT_SETTING};
pub use context::KeyGenerationContext;
pub use controller::{
    annotate, CacheStatus, ControllerDecision, FragmentCacheController, FragmentCacheKey,
};
pub use hook::{KeyGenerationHook, KeyGenerationObserver, KEY_GENERATION_EVENT};
pub use key::{digest, CacheKey, KeyBuilder, KEY_NAMESPACE, KEY_SEPARATOR};
pub use observers::{HeaderKeyPart, OptionKeyPart, RequestSide};
pub use request::{MasterRequest, RequestDescriptor, RequestKind};
