//! API Module
//!
//! HTTP handlers, routing and the axum integration of the fragment cache.
//!
//! # Endpoints
//! - `GET /article/:id` - Master page rendered from fragments
//! - `GET /fragments/...` - Fragment routes
//! - `GET /stats` - Fragment store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod render;
pub mod routes;

pub use handlers::*;
pub use middleware::{cached, fragment_cache_middleware};
pub use render::FragmentRenderer;
pub use routes::{create_router, fragment_routes};
