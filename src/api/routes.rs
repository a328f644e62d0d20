//! API Routes
//!
//! Configures the Axum routers for the master pages and the fragments.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    article_page, clock_fragment, headline_fragment, health_handler, related_fragment,
    stats_handler, AppState,
};
use super::middleware::cached;
use crate::fragment::{FragmentCacheConfiguration, FragmentCacheController};

/// Fragment routes, each cacheable one carrying its configuration.
///
/// # Fragments
/// - `GET /fragments/headline/:id` - cached 5 minutes
/// - `GET /fragments/related/:id` - cached 10 minutes, version 2, section option
/// - `GET /fragments/clock` - never cached
pub fn fragment_routes(controller: Arc<FragmentCacheController>) -> Router {
    Router::new()
        .route(
            "/fragments/headline/:id",
            cached(
                get(headline_fragment),
                FragmentCacheConfiguration::new().with_expiration(5),
                controller.clone(),
            ),
        )
        .route(
            "/fragments/related/:id",
            cached(
                get(related_fragment),
                FragmentCacheConfiguration::new()
                    .with_expiration(10)
                    .with_version(2)
                    .with_option("section", "related"),
                controller,
            ),
        )
        .route("/fragments/clock", get(clock_fragment))
}

/// Creates the main router.
///
/// # Endpoints
/// - `GET /article/:id` - Master page rendered from fragments
/// - `GET /stats` - Fragment store statistics
/// - `GET /health` - Health check endpoint
/// - the fragment routes, reachable directly as master requests (never cached)
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let fragments = fragment_routes(state.controller.clone());

    Router::new()
        .route("/article/:id", get(article_page))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .merge(fragments)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
