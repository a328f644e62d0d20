//! Request descriptors and request-scoped markers.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderName, Request, Uri},
};

// == Request Descriptor ==
/// The parts of a request that participate in key generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Path plus query string, as received
    uri: String,
    headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self {
            uri: request_uri(request.uri()),
            headers: request.headers().clone(),
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            uri: request_uri(&parts.uri),
            headers: parts.headers.clone(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, None when absent or not visible ASCII.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Canonical request URI: path and query, without scheme or authority.
fn request_uri(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestDescriptor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

// == Request Kind ==
/// Whether a request came from outside or was dispatched internally for a
/// fragment. Requests without this extension are master requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestKind {
    #[default]
    Master,
    Sub,
}

impl RequestKind {
    pub fn of<B>(request: &Request<B>) -> Self {
        request.extensions().get::<Self>().copied().unwrap_or_default()
    }

    pub fn is_sub_request(self) -> bool {
        self == Self::Sub
    }
}

// == Master Request ==
/// The master request a sub-request was dispatched from, carried as a
/// request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterRequest(pub RequestDescriptor);
