//! Fragment Cache - HTTP response-fragment caching
//!
//! Caches the rendered output of sub-requests under keys derived from the
//! sub-request, the master request, a configuration version and
//! observer-contributed key parts, and replays it on matching requests.

pub mod api;
pub mod config;
pub mod error;
pub mod fragment;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::{cached, create_router, AppState, FragmentRenderer};
pub use config::Config;
pub use error::{FragmentCacheError, Result};
pub use fragment::{FragmentCacheConfiguration, FragmentCacheController, KeyGenerationHook};
pub use tasks::spawn_cleanup_task;
