//! Fragment Cache Controller
//!
//! Binds key derivation and the fragment store to the two interception
//! points of a sub-request: before its handler runs and after it produced a
//! response.
//!
//! # Lifecycle
//! - master requests and sub-requests without configuration are left alone
//! - with configuration the key is always computed, then:
//!   - disabled: key recorded, handler runs, body gets a DISABLED marker
//!   - hit: cached body served, handler skipped, nothing written
//!   - miss: key recorded, handler runs, body stored and gets a MISS marker
//!
//! Concurrent misses for one key are not coordinated; both render and both
//! write.

use std::fmt;
use std::sync::Arc;

use axum::http::Extensions;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fragment::{
    CacheKey, FragmentCacheConfiguration, KeyBuilder, KeyGenerationHook, RequestDescriptor,
    RequestKind,
};
use crate::store::FragmentStore;

// == Cache Status ==
/// Outcome reported in debug annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Disabled,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Disabled => write!(f, "DISABLED"),
        }
    }
}

/// Wraps `content` in begin/end comments naming `status` and `key`.
pub fn annotate(status: CacheStatus, key: &CacheKey, content: &str) -> String {
    format!(
        "<!-- {status} - Begin Fragment Cache for KEY: {key} -->{content}<!-- End Fragment Cache for KEY: {key} -->"
    )
}

// == Pending Key ==
/// Request-scoped attribute carrying the key from the pre-execution phase
/// to the response phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentCacheKey(pub CacheKey);

// == Controller Decision ==
/// What the host should do after the pre-execution phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerDecision {
    /// Run the handler and skip the response phase.
    Bypass,
    /// Run the handler, then pass its body to `on_response`.
    Proceed,
    /// Skip the handler and respond with this body.
    Serve(String),
}

// == Controller ==
pub struct FragmentCacheController {
    keys: KeyBuilder,
    hook: Arc<KeyGenerationHook>,
    store: Arc<dyn FragmentStore>,
    debug: bool,
    enabled: bool,
}

impl FragmentCacheController {
    pub fn new(
        environment: impl Into<String>,
        hook: Arc<KeyGenerationHook>,
        store: Arc<dyn FragmentStore>,
    ) -> Self {
        Self {
            keys: KeyBuilder::new(environment),
            hook,
            store,
            debug: false,
            enabled: true,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn key_builder(&self) -> &KeyBuilder {
        &self.keys
    }

    /// Pre-execution phase.
    ///
    /// Reads the configuration from `attributes` and, when a handler must
    /// run, records the computed key there for `on_response`.
    pub async fn on_controller(
        &self,
        kind: RequestKind,
        sub_request: &RequestDescriptor,
        master_request: &RequestDescriptor,
        attributes: &mut Extensions,
    ) -> Result<ControllerDecision> {
        if !kind.is_sub_request() {
            return Ok(ControllerDecision::Bypass);
        }

        let Some(configuration) = attributes.get::<FragmentCacheConfiguration>() else {
            return Ok(ControllerDecision::Bypass);
        };

        let key = self
            .keys
            .build(configuration, sub_request, master_request, &self.hook)?;

        if !self.enabled {
            debug!(key = %key, "fragment cache disabled, rendering");
            attributes.insert(FragmentCacheKey(key));
            return Ok(ControllerDecision::Proceed);
        }

        let cached = match self.store.get(key.as_str()).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(key = %key, error = %e, "fragment store lookup failed, rendering");
                None
            }
        };

        match cached {
            Some(content) => {
                debug!(key = %key, "fragment cache hit");
                Ok(ControllerDecision::Serve(
                    self.decorate(CacheStatus::Hit, &key, content),
                ))
            }
            None => {
                debug!(key = %key, "fragment cache miss");
                attributes.insert(FragmentCacheKey(key));
                Ok(ControllerDecision::Proceed)
            }
        }
    }

    /// Response phase: stores a freshly rendered body and annotates it.
    ///
    /// Without configuration or a recorded key the body is returned as is.
    pub async fn on_response(
        &self,
        kind: RequestKind,
        attributes: &Extensions,
        content: String,
    ) -> String {
        if !kind.is_sub_request() {
            return content;
        }

        let Some(configuration) = attributes.get::<FragmentCacheConfiguration>() else {
            return content;
        };
        let Some(FragmentCacheKey(key)) = attributes.get::<FragmentCacheKey>() else {
            return content;
        };

        if !self.enabled {
            return self.decorate(CacheStatus::Disabled, key, content);
        }

        match self
            .store
            .set(key.as_str(), content.clone(), configuration.expiration())
            .await
        {
            Ok(()) => debug!(
                key = %key,
                expiration_minutes = configuration.expiration(),
                "fragment stored"
            ),
            Err(e) => warn!(key = %key, error = %e, "failed to store fragment"),
        }

        self.decorate(CacheStatus::Miss, key, content)
    }

    fn decorate(&self, status: CacheStatus, key: &CacheKey, content: String) -> String {
        if self.debug {
            annotate(status, key, &content)
        } else {
            content
        }
    }
}

impl fmt::Debug for FragmentCacheController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentCacheController")
            .field("environment", &self.keys.environment())
            .field("hook", &self.hook)
            .field("debug", &self.debug)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FragmentCacheError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // == Recording Store ==
    #[derive(Default)]
    struct RecordingStore {
        entries: Mutex<HashMap<String, (String, u64)>>,
        gets: Mutex<usize>,
        sets: Mutex<usize>,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn with_entry(key: &str, value: &str) -> Self {
            let store = Self::default();
            store
                .entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), 1));
            store
        }

        fn gets(&self) -> usize {
            *self.gets.lock().unwrap()
        }

        fn sets(&self) -> usize {
            *self.sets.lock().unwrap()
        }

        fn stored(&self, key: &str) -> Option<(String, u64)> {
            self.entries.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl FragmentStore for RecordingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            *self.gets.lock().unwrap() += 1;
            if self.fail {
                return Err(FragmentCacheError::Store("unreachable".into()));
            }
            Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
        }

        async fn set(&self, key: &str, value: String, ttl_minutes: u64) -> Result<()> {
            *self.sets.lock().unwrap() += 1;
            if self.fail {
                return Err(FragmentCacheError::Store("unreachable".into()));
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value, ttl_minutes));
            Ok(())
        }
    }

    fn controller(store: Arc<RecordingStore>) -> FragmentCacheController {
        FragmentCacheController::new("test", Arc::new(KeyGenerationHook::new()), store)
    }

    fn requests() -> (RequestDescriptor, RequestDescriptor) {
        (
            RequestDescriptor::new("/fragments/block/42"),
            RequestDescriptor::new("/article/7"),
        )
    }

    fn configured(expiration: u64) -> Extensions {
        let mut attributes = Extensions::new();
        attributes.insert(FragmentCacheConfiguration::new().with_expiration(expiration));
        attributes
    }

    fn expected_key(controller: &FragmentCacheController) -> CacheKey {
        let (sub, master) = requests();
        controller
            .key_builder()
            .build(
                &FragmentCacheConfiguration::new(),
                &sub,
                &master,
                &KeyGenerationHook::new(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_master_request_bypasses() {
        let store = Arc::new(RecordingStore::default());
        let controller = controller(store.clone());
        let (sub, master) = requests();
        let mut attributes = configured(5);

        let decision = controller
            .on_controller(RequestKind::Master, &sub, &master, &mut attributes)
            .await
            .unwrap();
        let body = controller
            .on_response(RequestKind::Master, &attributes, "body".to_string())
            .await;

        assert_eq!(decision, ControllerDecision::Bypass);
        assert_eq!(body, "body");
        assert!(attributes.get::<FragmentCacheKey>().is_none());
        assert_eq!(store.gets() + store.sets(), 0);
    }

    #[tokio::test]
    async fn test_missing_configuration_bypasses() {
        let store = Arc::new(RecordingStore::default());
        let controller = controller(store.clone());
        let (sub, master) = requests();
        let mut attributes = Extensions::new();

        let decision = controller
            .on_controller(RequestKind::Sub, &sub, &master, &mut attributes)
            .await
            .unwrap();

        assert_eq!(decision, ControllerDecision::Bypass);
        assert_eq!(store.gets(), 0);
    }

    #[tokio::test]
    async fn test_miss_then_populate() {
        let store = Arc::new(RecordingStore::default());
        let controller = controller(store.clone());
        let (sub, master) = requests();
        let mut attributes = configured(5);

        let decision = controller
            .on_controller(RequestKind::Sub, &sub, &master, &mut attributes)
            .await
            .unwrap();
        assert_eq!(decision, ControllerDecision::Proceed);

        let FragmentCacheKey(key) = attributes.get::<FragmentCacheKey>().cloned().unwrap();
        let body = controller
            .on_response(RequestKind::Sub, &attributes, "X".to_string())
            .await;

        assert_eq!(body, "X");
        assert_eq!(store.stored(key.as_str()), Some(("X".to_string(), 5)));
        assert_eq!(store.sets(), 1);
    }

    #[tokio::test]
    async fn test_hit_serves_cached_body_without_write() {
        let probe = controller(Arc::new(RecordingStore::default()));
        let key = expected_key(&probe);
        let store = Arc::new(RecordingStore::with_entry(key.as_str(), "V"));
        let controller = controller(store.clone()).with_debug(true);
        let (sub, master) = requests();
        let mut attributes = configured(1);

        let decision = controller
            .on_controller(RequestKind::Sub, &sub, &master, &mut attributes)
            .await
            .unwrap();

        assert_eq!(
            decision,
            ControllerDecision::Serve(format!(
                "<!-- HIT - Begin Fragment Cache for KEY: {key} -->V<!-- End Fragment Cache for KEY: {key} -->"
            ))
        );
        assert!(attributes.get::<FragmentCacheKey>().is_none());
        assert_eq!(store.sets(), 0);
    }

    #[tokio::test]
    async fn test_disabled_never_touches_store() {
        let store = Arc::new(RecordingStore::default());
        let controller = controller(store.clone())
            .with_enabled(false)
            .with_debug(true);
        let (sub, master) = requests();
        let mut attributes = configured(5);

        let decision = controller
            .on_controller(RequestKind::Sub, &sub, &master, &mut attributes)
            .await
            .unwrap();
        let body = controller
            .on_response(RequestKind::Sub, &attributes, "X".to_string())
            .await;

        let key = expected_key(&controller);
        assert_eq!(decision, ControllerDecision::Proceed);
        assert_eq!(body, annotate(CacheStatus::Disabled, &key, "X"));
        assert_eq!(store.gets() + store.sets(), 0);
    }

    #[tokio::test]
    async fn test_disabled_without_debug_leaves_body() {
        let store = Arc::new(RecordingStore::default());
        let controller = controller(store).with_enabled(false);
        let (sub, master) = requests();
        let mut attributes = configured(5);

        controller
            .on_controller(RequestKind::Sub, &sub, &master, &mut attributes)
            .await
            .unwrap();
        let body = controller
            .on_response(RequestKind::Sub, &attributes, "X".to_string())
            .await;

        assert_eq!(body, "X");
    }

    #[tokio::test]
    async fn test_response_without_key_is_noop() {
        let store = Arc::new(RecordingStore::default());
        let controller = controller(store.clone()).with_debug(true);

        let body = controller
            .on_response(RequestKind::Sub, &configured(5), "X".to_string())
            .await;

        assert_eq!(body, "X");
        assert_eq!(store.sets(), 0);
    }

    #[tokio::test]
    async fn test_store_failures_degrade_to_rendering() {
        let store = Arc::new(RecordingStore::failing());
        let controller = controller(store.clone()).with_debug(true);
        let (sub, master) = requests();
        let mut attributes = configured(5);

        let decision = controller
            .on_controller(RequestKind::Sub, &sub, &master, &mut attributes)
            .await
            .unwrap();
        let body = controller
            .on_response(RequestKind::Sub, &attributes, "X".to_string())
            .await;

        let key = expected_key(&controller);
        assert_eq!(decision, ControllerDecision::Proceed);
        assert_eq!(body, annotate(CacheStatus::Miss, &key, "X"));
        assert_eq!(store.sets(), 1);
    }

    #[test]
    fn test_annotate_format() {
        let key = CacheKey::from("AciliaComponentFragmentCache:dev:v1:abc");
        assert_eq!(
            annotate(CacheStatus::Miss, &key, "<p>x</p>"),
            "<!-- MISS - Begin Fragment Cache for KEY: AciliaComponentFragmentCache:dev:v1:abc --><p>x</p><!-- End Fragment Cache for KEY: AciliaComponentFragmentCache:dev:v1:abc -->"
        );
    }
}
