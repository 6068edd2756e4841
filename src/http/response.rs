//! Fixed responses produced by the router itself.
//!
//! Bodies are empty. The status code is the whole message.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;

fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// No route matched, or every matching route declined.
pub fn not_found() -> Response {
    empty(StatusCode::NOT_FOUND)
}

/// A handler failed or broke its contract.
pub fn internal_error() -> Response {
    empty(StatusCode::INTERNAL_SERVER_ERROR)
}

/// The request body could not be read.
pub fn bad_request() -> Response {
    empty(StatusCode::BAD_REQUEST)
}

/// The request body could not be buffered within the configured limit.
pub fn payload_too_large() -> Response {
    empty(StatusCode::PAYLOAD_TOO_LARGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_statuses() {
        assert_eq!(not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(internal_error().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload_too_large().status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(bad_request().status(), StatusCode::BAD_REQUEST);
    }
}
