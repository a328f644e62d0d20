//! API Handlers
//!
//! The demo article page, the fragments it is composed of, and the
//! operational endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap},
    response::Html,
    Json,
};
use tokio::sync::RwLock;

use crate::api::{routes::fragment_routes, FragmentRenderer};
use crate::config::Config;
use crate::error::Result;
use crate::fragment::{
    FragmentCacheController, HeaderKeyPart, KeyGenerationHook, OptionKeyPart, RequestDescriptor,
};
use crate::models::{HealthResponse, StatsResponse};
use crate::store::MemoryStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Fragment store, shared with the cleanup task
    pub store: Arc<RwLock<MemoryStore>>,
    pub controller: Arc<FragmentCacheController>,
    /// Dispatches sub-requests to the fragment routes
    pub renderer: FragmentRenderer,
}

impl AppState {
    /// Wires the fragment routes to `controller`.
    pub fn new(store: Arc<RwLock<MemoryStore>>, controller: Arc<FragmentCacheController>) -> Self {
        let renderer = FragmentRenderer::new(fragment_routes(controller.clone()));
        Self {
            store,
            controller,
            renderer,
        }
    }

    /// Builds the store, the key generation hook and the controller from
    /// configuration.
    ///
    /// Fragments vary on the master request's `Accept-Language` and on the
    /// `section` route option.
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(RwLock::new(MemoryStore::new(config.max_entries)));
        let hook = KeyGenerationHook::new()
            .with_observer(HeaderKeyPart::master(ACCEPT_LANGUAGE), 0)
            .with_observer(OptionKeyPart::new("section"), -10);
        let controller = FragmentCacheController::new(
            config.environment.clone(),
            Arc::new(hook),
            store.clone(),
        )
        .with_debug(config.debug)
        .with_enabled(config.enabled);

        Self::new(store, Arc::new(controller))
    }
}

/// Handler for GET /article/:id
///
/// Master page composed from fragment sub-requests.
pub async fn article_page(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    master: RequestDescriptor,
) -> Result<Html<String>> {
    let headline = state
        .renderer
        .render(&format!("/fragments/headline/{id}"), &master)
        .await?;
    let related = state
        .renderer
        .render(&format!("/fragments/related/{id}"), &master)
        .await?;
    let clock = state.renderer.render("/fragments/clock", &master).await?;

    Ok(Html(format!(
        "<html><body><article>{headline}</article><aside>{related}</aside><footer>{clock}</footer></body></html>"
    )))
}

/// Handler for GET /fragments/headline/:id
pub async fn headline_fragment(Path(id): Path<u64>) -> Html<String> {
    Html(format!("<h1>Article {id}</h1>"))
}

/// Handler for GET /fragments/related/:id
///
/// Lists neighbouring articles, labelled in the requested language.
pub async fn related_fragment(Path(id): Path<u64>, headers: HeaderMap) -> Html<String> {
    let language = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("en");
    let title = if language.starts_with("es") {
        "Relacionados"
    } else {
        "Related"
    };

    let items: String = (id + 1..=id + 3)
        .map(|related| format!("<li><a href=\"/article/{related}\">{related}</a></li>"))
        .collect();

    Html(format!("<h2>{title}</h2><ul>{items}</ul>"))
}

/// Handler for GET /fragments/clock
///
/// Deliberately uncached.
pub async fn clock_fragment() -> Html<String> {
    Html(format!(
        "<time>{}</time>",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ))
}

/// Handler for GET /stats
///
/// Returns fragment store statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    // Acquire read lock for stats
    let store = state.store.read().await;
    Json(StatsResponse::from(store.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
