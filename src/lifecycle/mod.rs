//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build route table → Start watcher/reloader → Start listener
//!
//! Reload (reload.rs):
//!     File change → Debounce → Rebuild table → Atomic swap
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl+C → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: table first, then background tasks, then listener
//! - Reload never interrupts serving; the old table serves until the swap

pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{App, StartupError};
