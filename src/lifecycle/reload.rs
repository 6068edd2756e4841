//! Hot reload of the route table.
//!
//! # Data Flow
//! ```text
//! File change under the root
//!     → RootWatcher (notify, filters out the manifest)
//!     → Reloader (debounce, full rebuild)
//!     → atomic swap of the live dispatcher
//! ```
//!
//! # Design Decisions
//! - A rebuild is complete before it is visible; no half-built table serves
//! - A failed rebuild is logged and the current table keeps serving
//! - In-flight requests finish on the table they started with

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::http::LiveDispatcher;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::diagnostics::Diagnostics;
use crate::observability::metrics;
use crate::routing::{build, BuildError, ModuleLoader, Source};

/// Watches the route root and signals when something under it changes.
pub struct RootWatcher {
    root: PathBuf,
    ignored: Vec<PathBuf>,
    change_tx: mpsc::UnboundedSender<()>,
}

impl RootWatcher {
    /// Create a new RootWatcher.
    ///
    /// Returns the watcher and a receiver that yields once per relevant change.
    pub fn new(root: &Path) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        (
            Self {
                root: root.to_path_buf(),
                ignored: Vec::new(),
                change_tx,
            },
            change_rx,
        )
    }

    /// Do not report changes that only touch `path`.
    pub fn ignore(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignored.push(path.into());
        self
    }

    /// Start watching. Changes stop being reported once the returned watcher
    /// is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx.clone();
        let ignored = self.ignored.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_create()
                        || event.kind.is_modify()
                        || event.kind.is_remove();
                    if relevant && !only_ignored(&event, &ignored) {
                        tracing::debug!(paths = ?event.paths, "Route root changed");
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default(),
        )?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        tracing::info!(root = ?self.root, "Route watcher started");
        Ok(watcher)
    }
}

fn only_ignored(event: &Event, ignored: &[PathBuf]) -> bool {
    !event.paths.is_empty() && event.paths.iter().all(|p| ignored.contains(p))
}

/// Rebuilds the route table and swaps it into the live dispatcher.
pub struct Reloader {
    source: Source,
    loader: Arc<dyn ModuleLoader>,
    diagnostics: Arc<dyn Diagnostics>,
    live: LiveDispatcher,
    debounce: Duration,
}

impl Reloader {
    pub fn new(
        source: Source,
        loader: Arc<dyn ModuleLoader>,
        diagnostics: Arc<dyn Diagnostics>,
        live: LiveDispatcher,
    ) -> Self {
        Self {
            source,
            loader,
            diagnostics,
            live,
            debounce: Duration::from_millis(200),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Rebuild once. On failure the live dispatcher is left untouched.
    pub async fn reload(&self) -> Result<(), BuildError> {
        let result = build(&self.source, self.loader.as_ref(), Arc::clone(&self.diagnostics)).await;
        metrics::record_reload(result.is_ok());
        let dispatcher = result?;
        metrics::record_routes(dispatcher.table().len());
        self.live.store(Arc::new(dispatcher));
        Ok(())
    }

    /// Rebuild on every change until `shutdown` fires or the watcher goes away.
    pub async fn run(
        self,
        mut changes: mpsc::UnboundedReceiver<()>,
        mut shutdown: ShutdownSignal,
    ) {
        loop {
            tokio::select! {
                change = changes.recv() => {
                    if change.is_none() {
                        break;
                    }
                }
                () = shutdown.recv() => break,
            }

            // Editors save in bursts; settle before rebuilding. Shutdown
            // interrupts both the wait and the rebuild.
            let settled = async {
                tokio::time::sleep(self.debounce).await;
                while changes.try_recv().is_ok() {}
                tracing::info!("Route change detected, reloading...");
                self.reload().await
            };
            tokio::select! {
                result = settled => match result {
                    Ok(()) => tracing::info!(
                        routes = self.live.load().table().len(),
                        "Routes reloaded"
                    ),
                    Err(e) => tracing::error!(
                        "Failed to reload routes: {}. Keeping current routes.",
                        e
                    ),
                },
                () = shutdown.recv() => break,
            }
        }
        tracing::debug!("Reloader stopped");
    }
}
