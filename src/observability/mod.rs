//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing core produces:
//!     → diagnostics.rs (route listings, handler failures; injected sink)
//!
//! Serving loop produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The routing core reports through an explicit sink, not a global stream
//! - Request ID flows through all log lines of a request
//! - Metrics are cheap (atomic increments)

pub mod diagnostics;
pub mod logging;
pub mod metrics;

pub use diagnostics::{Diagnostics, RecordingDiagnostics, TracingDiagnostics};
