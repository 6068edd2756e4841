//! Request preparation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for tracing
//! - Buffer the body once so every handler tried sees the same request
//!
//! # Design Decisions
//! - Request ID added as early as possible, and echoed on the response
//! - Body size is bounded before any handler runs
//! - An oversized body and a broken body stream are different failures

use axum::body::{Body, Bytes};
use axum::http::{HeaderName, HeaderValue, Request};
use futures_util::StreamExt;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::RouteRequest;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Makes a fresh UUID v4 request ID for each request.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Why a request body could not be buffered.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// The client went away or the body stream broke.
    #[error("failed to read request body: {0}")]
    Read(#[from] axum::Error),
}

/// Collect the body into memory, failing if it exceeds `limit` bytes.
pub async fn buffer(request: Request<Body>, limit: usize) -> Result<RouteRequest, BodyError> {
    let (parts, body) = request.into_parts();
    let mut stream = body.into_data_stream();
    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if collected.len() + chunk.len() > limit {
            return Err(BodyError::TooLarge { limit });
        }
        collected.extend_from_slice(&chunk);
    }
    Ok(Request::from_parts(parts, Bytes::from(collected)))
}
