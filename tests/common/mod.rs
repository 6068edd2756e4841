//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use axum::body::Bytes;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use routefs::routing::{BoxError, Context, Module, Route, RouteRequest};
use tempfile::TempDir;

/// Create a route root containing empty files at the given relative paths.
pub fn route_tree(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        touch(dir.path(), file);
    }
    dir
}

/// Create an empty file (and its parent directories) under `root`.
pub fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}

/// Root path as the string form discovery options take.
pub fn root_of(dir: &TempDir) -> String {
    dir.path().to_string_lossy().into_owned()
}

/// A module whose route answers with `body`.
pub fn responding(body: &'static str) -> Module {
    Module::new(Route::new(move |_ctx: Context| async move {
        Ok::<_, BoxError>(body.into_response())
    }))
}

/// A module whose route echoes the captured map as `key=value` pairs.
pub fn echoing_captures() -> Module {
    Module::new(Route::new(|ctx: Context| async move {
        let text = ctx
            .captured
            .iter()
            .map(|(k, v)| format!("{k}={}", v.as_deref().unwrap_or("-")))
            .collect::<Vec<_>>()
            .join("&");
        Ok::<_, BoxError>(text.into_response())
    }))
}

/// A module whose route always declines.
pub fn declining() -> Module {
    Module::new(Route::new(|_ctx: Context| async { Ok::<_, BoxError>(()) }))
}

/// A module whose route always fails.
pub fn failing(message: &'static str) -> Module {
    Module::new(Route::new(move |_ctx: Context| async move {
        Err::<(), BoxError>(message.into())
    }))
}

/// A module whose route returns a plain string, which is not a response.
pub fn returning_string() -> Module {
    Module::new(Route::new(|_ctx: Context| async {
        Ok::<_, BoxError>("just a string")
    }))
}

/// A GET request for `path` with an empty body.
pub fn request(path: &str) -> RouteRequest {
    Request::builder().uri(path).body(Bytes::new()).unwrap()
}

/// Collect a response body into a string.
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
