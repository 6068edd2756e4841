//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the first route table (discovery or manifest)
//! - Start background tasks (metrics, route watcher, reloader)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is served
//! - Listener starts last (traffic only when the table is ready)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::net::TcpListener;

use crate::config::RouterConfig;
use crate::http::HttpServer;
use crate::lifecycle::reload::{Reloader, RootWatcher};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::observability::metrics;
use crate::routing::{
    build, discover_table, BuildError, DiscoveryOptions, Manifest, ModuleLoader, PatternComparator,
    Source,
};

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Failed to watch routes: {0}")]
    Watch(#[from] notify::Error),
}

/// A configured router application, ready to write its manifest or serve.
pub struct App {
    config: RouterConfig,
    loader: Arc<dyn ModuleLoader>,
    diagnostics: Arc<dyn Diagnostics>,
    comparator: Option<PatternComparator>,
    manifest: Option<PathBuf>,
}

impl App {
    pub fn new(config: RouterConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            config,
            loader,
            diagnostics: Arc::new(TracingDiagnostics),
            comparator: None,
            manifest: None,
        }
    }

    /// Break precedence ties with `comparator` instead of code point order.
    ///
    /// It must be a total order; one that contradicts itself fails the build
    /// with a discovery error rather than panicking.
    pub fn with_comparator(mut self, comparator: PatternComparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Serve from a manifest file instead of discovering routes.
    pub fn from_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            root: self.config.routes.root.clone(),
            suffix: Some(self.config.routes.suffix.clone()),
            compare: self.comparator.clone(),
        }
    }

    /// Where tables come from, given the configuration.
    pub fn source(&self) -> Source {
        match &self.manifest {
            Some(path) => Source::Manifest(path.clone()),
            None => Source::Discover {
                options: self.discovery_options(),
                manifest: self
                    .config
                    .routes
                    .write
                    .then(|| self.config.routes.manifest.clone()),
            },
        }
    }

    /// Discover routes and write the manifest without serving.
    pub async fn write_manifest(&self) -> Result<Manifest, BuildError> {
        let options = self.discovery_options();
        let (discovery, table) = discover_table(&options, self.loader.as_ref()).await?;
        self.diagnostics.routes_loaded(&table);
        let manifest = Manifest::from_table(&table);
        manifest
            .write(&discovery.root().join(&self.config.routes.manifest))
            .await?;
        Ok(manifest)
    }

    /// Build the table and serve until Ctrl+C.
    pub async fn serve(self, watch: bool) -> Result<(), StartupError> {
        let shutdown = Shutdown::new();
        tokio::spawn(signals::shutdown_on_ctrl_c(shutdown.clone()));
        self.serve_until(watch, shutdown).await
    }

    /// Build the table and serve until `shutdown` fires.
    pub async fn serve_until(self, watch: bool, shutdown: Shutdown) -> Result<(), StartupError> {
        let source = self.source();
        let dispatcher = build(&source, self.loader.as_ref(), Arc::clone(&self.diagnostics)).await?;
        metrics::record_routes(dispatcher.table().len());
        let live = Arc::new(ArcSwap::from_pointee(dispatcher));

        if self.config.observability.metrics_enabled {
            if let Ok(addr) = self.config.observability.metrics_address.parse() {
                metrics::init_metrics(addr);
            } else {
                tracing::error!(
                    metrics_address = %self.config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }

        // Held for the lifetime of the server; dropping it stops watching.
        let _watcher = match (&source, watch) {
            (Source::Discover { options, .. }, true) => {
                let discovery = options.resolve().await.map_err(BuildError::from)?;
                let manifest_path = discovery.root().join(&self.config.routes.manifest);
                let (watcher, changes) = RootWatcher::new(discovery.root());
                let watcher = watcher.ignore(manifest_path).run()?;

                let reloader = Reloader::new(
                    source.clone(),
                    Arc::clone(&self.loader),
                    Arc::clone(&self.diagnostics),
                    Arc::clone(&live),
                )
                .with_debounce(Duration::from_millis(self.config.reload.debounce_ms));
                tokio::spawn(reloader.run(changes, shutdown.subscribe()));
                Some(watcher)
            }
            (Source::Manifest(_), true) => {
                tracing::info!("Serving from a manifest; file watching disabled");
                None
            }
            (_, false) => None,
        };

        let address = self.config.listener.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind {
                address: address.clone(),
                source,
            })?;

        HttpServer::new(self.config, live)
            .run(listener, shutdown.subscribe())
            .await?;
        Ok(())
    }
}
