//! Diagnostic sink for discovery and dispatch.
//!
//! The routing core never logs to an ambient stream directly; it reports to
//! a [`Diagnostics`] object handed to it at construction. The stock sink
//! forwards to `tracing`, tests install a recording one.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::routing::table::RouteTable;

/// Receiver of the routing core's human-readable diagnostics.
pub trait Diagnostics: Send + Sync + fmt::Debug {
    /// A table was built and is about to serve.
    fn routes_loaded(&self, table: &RouteTable);

    /// A handler returned something that is neither a response nor a
    /// fallthrough.
    fn unexpected_outcome(&self, source_path: &str, request_path: &str, value: &str);

    /// A handler failed or panicked.
    fn handler_failed(&self, source_path: &str, request_path: &str, error: &str);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn routes_loaded(&self, table: &RouteTable) {
        let listing: String = table
            .iter()
            .map(|e| format!("\n- {}", e.pattern()))
            .collect();
        tracing::info!(routes = table.len(), "Routes:{}", listing);
    }

    fn unexpected_outcome(&self, source_path: &str, request_path: &str, value: &str) {
        tracing::error!(
            source_path = %source_path,
            path = %request_path,
            value = %value,
            "Unexpected response value; only a response or a fallthrough may be returned from a handler"
        );
    }

    fn handler_failed(&self, source_path: &str, request_path: &str, error: &str) {
        tracing::error!(
            source_path = %source_path,
            path = %request_path,
            error = %error,
            "Handler failed"
        );
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RoutesLoaded(Vec<String>),
    UnexpectedOutcome { source_path: String, value: String },
    HandlerFailed { source_path: String, error: String },
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn routes_loaded(&self, table: &RouteTable) {
        self.push(Event::RoutesLoaded(
            table.patterns().into_iter().map(str::to_string).collect(),
        ));
    }

    fn unexpected_outcome(&self, source_path: &str, _request_path: &str, value: &str) {
        self.push(Event::UnexpectedOutcome {
            source_path: source_path.to_string(),
            value: value.to_string(),
        });
    }

    fn handler_failed(&self, source_path: &str, _request_path: &str, error: &str) {
        self.push(Event::HandlerFailed {
            source_path: source_path.to_string(),
            error: error.to_string(),
        });
    }
}
