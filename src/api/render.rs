//! Sub-request dispatch.
//!
//! Fragments are rendered by dispatching an internal request against the
//! fragment router. The master request travels with it explicitly, so one
//! renderer can serve any number of concurrent master requests.

use std::convert::Infallible;

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_LENGTH, TRANSFER_ENCODING},
        Method, Request,
    },
    Router,
};
use tower::ServiceExt;
use tracing::debug;

use crate::error::{FragmentCacheError, Result};
use crate::fragment::{MasterRequest, RequestDescriptor, RequestKind};

#[derive(Clone)]
pub struct FragmentRenderer {
    fragments: Router,
}

impl FragmentRenderer {
    pub fn new(fragments: Router) -> Self {
        Self { fragments }
    }

    /// Renders the fragment at `uri` as a sub-request of `master`.
    ///
    /// The sub-request inherits the master request's headers, minus the
    /// body framing ones since it carries no body.
    pub async fn render(&self, uri: &str, master: &RequestDescriptor) -> Result<String> {
        let mut request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| FragmentCacheError::InvalidRequest(e.to_string()))?;

        let headers = request.headers_mut();
        *headers = master.headers().clone();
        headers.remove(CONTENT_LENGTH);
        headers.remove(TRANSFER_ENCODING);
        request.extensions_mut().insert(RequestKind::Sub);
        request
            .extensions_mut()
            .insert(MasterRequest(master.clone()));

        debug!(uri, master = master.uri(), "dispatching fragment sub-request");

        let response = self
            .fragments
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never: Infallible| match never {});

        let status = response.status();
        if !status.is_success() {
            return Err(FragmentCacheError::SubRequest {
                uri: uri.to_string(),
                status,
            });
        }

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| FragmentCacheError::Internal(e.to_string()))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
