//! Request dispatch against an ordered route table.
//!
//! # State Machine
//! ```text
//! Scanning(0)
//!   → no match                → Scanning(i+1)
//!   → match, handler runs:
//!       response              → Resolved            (terminal)
//!       fallthrough / ()      → Scanning(i+1)
//!       anything else         → ContractViolation   (terminal, 500)
//!       error / panic         → Exception           (terminal, 500)
//! Scanning(n)                 → Exhausted           (terminal, 404)
//! ```
//!
//! # Design Decisions
//! - Entries are tried strictly in table order, one handler at a time
//! - A misbehaving handler is never masked by trying the next entry
//! - No retries, no timeouts; the transport owns those

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::response::Response;
use futures_util::future::{self, FutureExt};

use super::route::{Context, Outcome, RouteRequest};
use super::table::RouteTable;
use crate::http::response::{internal_error, not_found};
use crate::observability::diagnostics::{Diagnostics, TracingDiagnostics};

/// Terminal state of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A handler produced a response.
    Resolved { source_path: String },
    /// A handler returned neither a response nor a fallthrough.
    ContractViolation { source_path: String },
    /// A handler failed or panicked.
    Exception { source_path: String },
    /// Nothing matched, or every match declined.
    Exhausted,
}

impl Resolution {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Resolved { .. } => "resolved",
            Resolution::ContractViolation { .. } => "contract_violation",
            Resolution::Exception { .. } => "exception",
            Resolution::Exhausted => "exhausted",
        }
    }
}

/// The response for one request and how it was reached.
#[derive(Debug)]
pub struct Dispatch {
    pub response: Response,
    pub resolution: Resolution,
}

/// Runs requests through a fixed route table.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Dispatcher {
    pub fn new(table: RouteTable, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            table: Arc::new(table),
            diagnostics,
        }
    }

    /// A dispatcher reporting through `tracing`.
    pub fn with_tracing(table: RouteTable) -> Self {
        Self::new(table, Arc::new(TracingDiagnostics))
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }

    /// Entry point for the HTTP listener.
    pub async fn handle(&self, request: RouteRequest) -> Response {
        self.dispatch(request).await.response
    }

    /// Dispatch one request, reporting the terminal state reached.
    pub async fn dispatch(&self, request: RouteRequest) -> Dispatch {
        let request = Arc::new(request);
        let path = request.uri().path();

        for entry in self.table.iter() {
            let Some(captured) = entry.pattern().captures(path) else {
                continue;
            };
            let source_path = entry.source_path();

            let ctx = Context {
                request: Arc::clone(&request),
                captured,
                path: source_path.to_string(),
                pattern: entry.pattern().clone(),
            };

            // The call itself runs inside the guard. A closure may panic
            // before it hands back a future.
            let invocation = future::lazy(|_| entry.route().call(ctx)).flatten();
            let result = AssertUnwindSafe(invocation).catch_unwind().await;

            match result {
                Ok(Ok(Outcome::Response(response))) => {
                    tracing::debug!(source_path = %source_path, path = %path, "Route resolved");
                    return Dispatch {
                        response,
                        resolution: Resolution::Resolved {
                            source_path: source_path.to_string(),
                        },
                    };
                }
                Ok(Ok(Outcome::Fallthrough)) => {
                    tracing::trace!(source_path = %source_path, path = %path, "Route declined");
                }
                Ok(Ok(Outcome::Unexpected(value))) => {
                    self.diagnostics.unexpected_outcome(source_path, path, &value);
                    return Dispatch {
                        response: internal_error(),
                        resolution: Resolution::ContractViolation {
                            source_path: source_path.to_string(),
                        },
                    };
                }
                Ok(Err(error)) => {
                    self.diagnostics
                        .handler_failed(source_path, path, &error.to_string());
                    return Dispatch {
                        response: internal_error(),
                        resolution: Resolution::Exception {
                            source_path: source_path.to_string(),
                        },
                    };
                }
                Err(panic) => {
                    self.diagnostics
                        .handler_failed(source_path, path, &panic_message(panic.as_ref()));
                    return Dispatch {
                        response: internal_error(),
                        resolution: Resolution::Exception {
                            source_path: source_path.to_string(),
                        },
                    };
                }
            }
        }

        Dispatch {
            response: not_found(),
            resolution: Resolution::Exhausted,
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "panicked: static");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "panicked: owned");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "panicked");
    }

    #[tokio::test]
    async fn test_empty_table_is_exhausted() {
        let dispatcher = Dispatcher::with_tracing(RouteTable::default());
        let request = RouteRequest::new(Default::default());
        let dispatch = dispatcher.dispatch(request).await;
        assert_eq!(dispatch.resolution, Resolution::Exhausted);
        assert_eq!(dispatch.resolution.label(), "exhausted");
        assert_eq!(dispatch.response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
