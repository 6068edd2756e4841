//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup / reload):
//!     root directory
//!     → discovery.rs (walk, filter by suffix, load modules)
//!     → pattern.rs (compile file names into patterns)
//!     → table.rs (sort by precedence, then pattern)
//!     → Freeze as immutable RouteTable
//!     → manifest.rs (optionally persist the order)
//!
//! Incoming Request (path)
//!     → dispatcher.rs (scan table in order, run handlers)
//!     → Return: response, 500, or 404
//! ```
//!
//! # Design Decisions
//! - Tables are built completely, then swapped in; never mutated while serving
//! - Deterministic: same inputs always give the same order
//! - A manifest is served in its stored order, never re-sorted

pub mod discovery;
pub mod dispatcher;
pub mod manifest;
pub mod module;
pub mod pattern;
pub mod route;
pub mod table;

use std::path::PathBuf;
use std::sync::Arc;

pub use discovery::{Discovery, DiscoveryError, DiscoveryOptions};
pub use dispatcher::{Dispatch, Dispatcher, Resolution};
pub use manifest::{Manifest, ManifestError};
pub use module::{LoadError, Module, ModuleLoader, Registry};
pub use pattern::{Captured, PatternError, RoutePattern};
pub use route::{BoxError, Context, Outcome, Route, RouteRequest};
pub use table::{PatternComparator, RouteEntry, RouteTable, TableError};

use crate::observability::diagnostics::Diagnostics;

/// Failure to produce a route table.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Where a route table comes from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Walk a directory. When `manifest` is set, the resulting order is also
    /// written to that file name inside the resolved root.
    Discover {
        options: DiscoveryOptions,
        manifest: Option<String>,
    },
    /// Load a previously written manifest, skipping discovery and ordering.
    Manifest(PathBuf),
}

/// Discover routes and sort them into canonical order.
pub async fn discover_table(
    options: &DiscoveryOptions,
    loader: &dyn ModuleLoader,
) -> Result<(Discovery, RouteTable), DiscoveryError> {
    let discovery = options.resolve().await?;
    let entries = discovery.discover(loader).await?;
    let table = RouteTable::ordered(entries, discovery.comparator())?;
    Ok((discovery, table))
}

/// Build a ready dispatcher from `source`.
///
/// Nothing is returned unless the whole table was built and validated.
pub async fn build(
    source: &Source,
    loader: &dyn ModuleLoader,
    diagnostics: Arc<dyn Diagnostics>,
) -> Result<Dispatcher, BuildError> {
    let table = match source {
        Source::Discover { options, manifest } => {
            let (discovery, table) = discover_table(options, loader).await?;
            if let Some(name) = manifest {
                Manifest::from_table(&table)
                    .write(&discovery.root().join(name))
                    .await?;
            }
            table
        }
        Source::Manifest(path) => Manifest::read(path).await?.load(loader).await?,
    };

    diagnostics.routes_loaded(&table);
    Ok(Dispatcher::new(table, diagnostics))
}
