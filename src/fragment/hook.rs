//! The key generation hook.
//!
//! A synchronous, ordered broadcast point through which observers add key
//! material before a fragment key is finalized. Observers are kept sorted by
//! priority (higher first, ties in registration order) from the moment they
//! are registered, so dispatch never re-sorts.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{FragmentCacheError, Result};
use crate::fragment::KeyGenerationContext;

/// Name of the key generation event.
pub const KEY_GENERATION_EVENT: &str = "fragment_cache.key_generation";

// == Observer ==
/// Contributes key parts for a fragment.
///
/// Implementations run on the lookup path of every cached fragment and must
/// not block on I/O.
pub trait KeyGenerationObserver: Send + Sync {
    /// Identifies the observer in logs and errors.
    fn name(&self) -> &str;

    /// Receives the context, optionally calls `add_part`, and returns it.
    fn on_key_generation<'a>(
        &self,
        context: KeyGenerationContext<'a>,
    ) -> anyhow::Result<KeyGenerationContext<'a>>;
}

struct RegisteredObserver {
    priority: i32,
    observer: Arc<dyn KeyGenerationObserver>,
}

// == Hook ==
#[derive(Default)]
pub struct KeyGenerationHook {
    observers: Vec<RegisteredObserver>,
}

impl KeyGenerationHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer`; higher priorities run first.
    pub fn register(&mut self, observer: Arc<dyn KeyGenerationObserver>, priority: i32) {
        let position = self
            .observers
            .iter()
            .position(|registered| registered.priority < priority)
            .unwrap_or(self.observers.len());
        self.observers
            .insert(position, RegisteredObserver { priority, observer });
    }

    pub fn with_observer<O>(mut self, observer: O, priority: i32) -> Self
    where
        O: KeyGenerationObserver + 'static,
    {
        self.register(Arc::new(observer), priority);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Observer names in dispatch order.
    pub fn observer_names(&self) -> Vec<&str> {
        self.observers.iter().map(|r| r.observer.name()).collect()
    }

    /// Runs every observer in order, threading the context through them.
    ///
    /// The first failure aborts the dispatch; no partial key is produced.
    pub fn dispatch<'a>(
        &self,
        mut context: KeyGenerationContext<'a>,
    ) -> Result<KeyGenerationContext<'a>> {
        trace!(
            event = KEY_GENERATION_EVENT,
            observers = self.observers.len(),
            "dispatching key generation"
        );

        for registered in &self.observers {
            context = registered
                .observer
                .on_key_generation(context)
                .map_err(|e| FragmentCacheError::Observer {
                    observer: registered.observer.name().to_string(),
                    message: format!("{e:#}"),
                })?;
        }

        Ok(context)
    }
}

impl fmt::Debug for KeyGenerationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGenerationHook")
            .field("observers", &self.observer_names())
            .finish()
    }
}
