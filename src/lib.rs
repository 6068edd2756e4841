//! Filesystem-driven route discovery and dispatch.
//!
//! # Architecture Overview
//!
//! ```text
//!   root/                         ┌───────────────────────────────┐
//!   ├── hello.route.rs  ────────▶ │ routing::discovery            │
//!   ├── api/                      │   walk → filter → load        │
//!   │   └── hello.route.rs        │   → compile patterns          │
//!   └── [name].route.rs           └──────────────┬────────────────┘
//!                                                ▼
//!                                 ┌───────────────────────────────┐
//!                                 │ routing::table                │
//!                                 │   precedence ↓, pattern, path │──▶ routes.gen.toml
//!                                 └──────────────┬────────────────┘    (routing::manifest)
//!                                                ▼
//!     Client Request  ──▶ http ──▶ routing::dispatcher ──▶ handler (response / fallthrough)
//!                                                │
//!                                                ▼
//!                                     500 on failure, 404 when exhausted
//!
//!   Cross-cutting: config, observability (logging, metrics, diagnostics),
//!                  lifecycle (startup, reload, shutdown), cli
//! ```
//!
//! Route handlers are ordinary async functions compiled into the host
//! program and registered by file path in a [`routing::Registry`]; the files
//! under the root decide which of them are served, and under which pattern.

pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::{App, Shutdown};
pub use routing::{Context, Dispatcher, Module, Outcome, Registry, Route};
