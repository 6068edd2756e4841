//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router whose fallback is the route dispatcher
//! - Wire up middleware (tracing, timeout, request ID)
//! - Buffer request bodies and hand requests to the live dispatcher
//! - Bind server to listener with graceful shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RouterConfig;
use crate::http::request::{buffer, request_id, BodyError, UuidRequestId};
use crate::http::response::{bad_request, payload_too_large};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::{Dispatch, Dispatcher};

/// The dispatcher currently serving. Reloads swap in a new one atomically.
pub type LiveDispatcher = Arc<ArcSwap<Dispatcher>>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: LiveDispatcher,
    pub max_body_bytes: usize,
}

/// HTTP server in front of the route dispatcher.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RouterConfig, dispatcher: LiveDispatcher) -> Self {
        let state = AppState {
            dispatcher,
            max_body_bytes: config.limits.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.limits.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered application, for in-process testing.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// Fallback handler: every request goes through the route table.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let request = match buffer(request, state.max_body_bytes).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Request body rejected");
            metrics::record_request("rejected", start_time);
            return match e {
                BodyError::TooLarge { .. } => payload_too_large(),
                BodyError::Read(_) => bad_request(),
            };
        }
    };

    // Pin the table for the whole request; a reload mid-request does not affect it.
    let dispatcher = state.dispatcher.load_full();
    let Dispatch { response, resolution } = dispatcher.dispatch(request).await;

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        resolution = resolution.label(),
        "Request dispatched"
    );
    metrics::record_request(resolution.label(), start_time);

    response
}
