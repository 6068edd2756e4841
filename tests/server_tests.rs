//! The HTTP layer in front of the dispatcher.

mod common;

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use routefs::config::RouterConfig;
use routefs::http::{HttpServer, LiveDispatcher};
use routefs::lifecycle::Shutdown;
use routefs::routing::{discover_table, Dispatcher, DiscoveryOptions, Registry};
use tokio::net::TcpListener;
use tower::ServiceExt;

async fn serving(files: &[&str], registry: &Registry) -> (tempfile::TempDir, LiveDispatcher) {
    let dir = route_tree(files);
    let (_, table) = discover_table(&DiscoveryOptions::new(root_of(&dir)), registry)
        .await
        .unwrap();
    let live = Arc::new(ArcSwap::from_pointee(Dispatcher::with_tracing(table)));
    (dir, live)
}

fn registry() -> Registry {
    Registry::new()
        .with("hello.route.rs", responding("Hello, world!"))
        .with("throw.route.rs", failing("nope"))
        .with(":name.route.rs", echoing_captures().with_precedence(-1.0))
}

const FILES: &[&str] = &["hello.route.rs", "throw.route.rs", ":name.route.rs"];

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_routes_through_http_layers() {
    let (_dir, live) = serving(FILES, &registry()).await;
    let app = HttpServer::new(RouterConfig::default(), live).app();

    let response = app.clone().oneshot(get("/hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_text(response).await, "Hello, world!");

    let response = app.clone().oneshot(get("/world")).await.unwrap();
    assert_eq!(body_text(response).await, "name=world");

    let response = app.clone().oneshot(get("/throw")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "");

    let response = app.oneshot(get("/a/b")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "");
}

#[tokio::test]
async fn test_incoming_request_id_is_kept() {
    let (_dir, live) = serving(FILES, &registry()).await;
    let app = HttpServer::new(RouterConfig::default(), live).app();

    let request = Request::builder()
        .uri("/hello")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (_dir, live) = serving(FILES, &registry()).await;
    let mut config = RouterConfig::default();
    config.limits.max_body_bytes = 8;
    let app = HttpServer::new(config, live).app();

    let request = Request::builder()
        .method("POST")
        .uri("/hello")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let request = Request::builder()
        .method("POST")
        .uri("/hello")
        .body(Body::from("small"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_broken_body_is_a_bad_request() {
    let (_dir, live) = serving(FILES, &registry()).await;
    let app = HttpServer::new(RouterConfig::default(), live).app();

    let chunks = futures_util::stream::iter(vec![
        Ok(axum::body::Bytes::from_static(b"part")),
        Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "client went away")),
    ]);
    let request = Request::builder()
        .method("POST")
        .uri("/hello")
        .body(Body::from_stream(chunks))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_body_is_visible_to_every_handler_tried() {
    let declining_after_read = routefs::Module::new(routefs::Route::new(
        |ctx: routefs::Context| async move {
            assert_eq!(ctx.request.body().as_ref(), b"payload");
            Ok::<_, routefs::routing::BoxError>(())
        },
    ))
    .with_precedence(1.0);
    let echo_body = routefs::Module::new(routefs::Route::new(|ctx: routefs::Context| async move {
        let body = String::from_utf8_lossy(ctx.request.body()).into_owned();
        Ok::<_, routefs::routing::BoxError>(axum::response::IntoResponse::into_response(body))
    }));
    let registry = Registry::new()
        .with("first.route.rs", declining_after_read)
        .with(":any.route.rs", echo_body);
    let (_dir, live) = serving(&["first.route.rs", ":any.route.rs"], &registry).await;
    let app = HttpServer::new(RouterConfig::default(), live).app();

    let request = Request::builder()
        .method("POST")
        .uri("/first")
        .body(Body::from("payload"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(body_text(response).await, "payload");
}

#[tokio::test]
async fn test_swapped_table_takes_effect() {
    let (_dir, live) = serving(FILES, &registry()).await;
    let app = HttpServer::new(RouterConfig::default(), Arc::clone(&live)).app();

    let response = app.clone().oneshot(get("/hello")).await.unwrap();
    assert_eq!(body_text(response).await, "Hello, world!");

    let reloaded = Registry::new().with("hello.route.rs", responding("Reloaded"));
    let (_other, replacement) = serving(&["hello.route.rs"], &reloaded).await;
    live.store(replacement.load_full());

    let response = app.oneshot(get("/hello")).await.unwrap();
    assert_eq!(body_text(response).await, "Reloaded");
}

#[tokio::test]
async fn test_serves_on_a_socket_until_shutdown() {
    let (_dir, live) = serving(FILES, &registry()).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(RouterConfig::default(), live);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{addr}/hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "Hello, world!");
    drop(client);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
