//! Fragment cache middleware
//!
//! Runs the controller around a fragment route: the pre-execution phase
//! before the handler, the response phase on the buffered body afterwards.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue,
    },
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::MethodRouter,
    Extension,
};
use tracing::warn;

use crate::error::{FragmentCacheError, Result};
use crate::fragment::{
    ControllerDecision, FragmentCacheConfiguration, FragmentCacheController, MasterRequest,
    RequestDescriptor, RequestKind,
};

/// Attaches `configuration` and the fragment cache middleware to a route.
///
/// The configuration layer is outermost so it is in place before the
/// middleware runs.
pub fn cached<S>(
    route: MethodRouter<S>,
    configuration: FragmentCacheConfiguration,
    controller: Arc<FragmentCacheController>,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route
        .layer::<_, Infallible>(middleware::from_fn_with_state(
            controller,
            fragment_cache_middleware,
        ))
        .layer(Extension(configuration))
}

/// Middleware body; see [`cached`].
pub async fn fragment_cache_middleware(
    State(controller): State<Arc<FragmentCacheController>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let kind = RequestKind::of(&request);
    let sub_request = RequestDescriptor::from_request(&request);
    let master_request = match request.extensions().get::<MasterRequest>() {
        Some(MasterRequest(master)) => master.clone(),
        None => {
            if kind.is_sub_request() {
                warn!(
                    uri = sub_request.uri(),
                    "sub-request without master request, not caching"
                );
            }
            return Ok(next.run(request).await);
        }
    };

    let decision = controller
        .on_controller(kind, &sub_request, &master_request, request.extensions_mut())
        .await?;

    match decision {
        ControllerDecision::Bypass => Ok(next.run(request).await),
        ControllerDecision::Serve(content) => Ok(Html(content).into_response()),
        ControllerDecision::Proceed => {
            let attributes = request.extensions().clone();
            let response = next.run(request).await;
            if !response.status().is_success() {
                warn!(
                    uri = sub_request.uri(),
                    status = %response.status(),
                    "fragment handler failed, not caching"
                );
                return Ok(response);
            }

            let (mut parts, body) = response.into_parts();
            let bytes = to_bytes(body, usize::MAX)
                .await
                .map_err(|e| FragmentCacheError::Internal(e.to_string()))?;

            let content = match String::from_utf8(bytes.to_vec()) {
                Ok(content) => content,
                Err(_) => {
                    warn!(uri = sub_request.uri(), "fragment body is not UTF-8, not caching");
                    return Ok(Response::from_parts(parts, Body::from(bytes)));
                }
            };

            let content = controller.on_response(kind, &attributes, content).await;

            parts.headers.remove(CONTENT_LENGTH);
            parts
                .headers
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("text/html; charset=utf-8"));
            Ok(Response::from_parts(parts, Body::from(content)))
        }
    }
}
