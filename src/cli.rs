//! Command-line entry point for host programs.
//!
//! A host program compiles its route handlers in, registers them, and hands
//! the registry to [`run`]:
//!
//! ```no_run
//! use std::sync::Arc;
//! use clap::Parser;
//! use routefs::cli::{self, Args};
//! use routefs::routing::Registry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cli::CliError> {
//!     let registry = Registry::new();
//!     cli::run(Args::parse(), Arc::new(registry)).await
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::{load_config, ConfigError, RouterConfig};
use crate::config::validation::validate_config;
use crate::lifecycle::{App, StartupError};
use crate::observability::logging;
use crate::routing::{BuildError, ModuleLoader, PatternComparator};

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "routefs")]
#[command(about = "Serve routes discovered from route files under a directory", long_about = None)]
pub struct Args {
    /// Directory to search for route files (default: working directory)
    pub root: Option<String>,

    /// Route file suffix, as in `hello.<SUFFIX>.rs`
    #[arg(short, long)]
    pub suffix: Option<String>,

    /// Do not write the route manifest
    #[arg(long)]
    pub no_write: bool,

    /// Do not rebuild routes when files under the root change
    #[arg(long)]
    pub no_watch: bool,

    /// Discover routes and write the manifest, then exit
    #[arg(long)]
    pub no_serve: bool,

    /// Serve from this manifest instead of discovering routes
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["root", "no_serve"])]
    pub manifest: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

impl Args {
    /// Override `config` with whatever was given on the command line.
    pub fn apply(&self, config: &mut RouterConfig) {
        if let Some(root) = &self.root {
            config.routes.root = Some(root.clone());
        }
        if let Some(suffix) = &self.suffix {
            config.routes.suffix = suffix.clone();
        }
        if self.no_write {
            config.routes.write = false;
        }
        if self.no_watch {
            config.reload.enabled = false;
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
    }

    /// Load the configuration file (or defaults) and apply overrides.
    pub fn config(&self) -> Result<RouterConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RouterConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Error type for the command-line entry point.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Startup(#[from] StartupError),
}

/// Run the router with modules resolved through `loader`.
pub async fn run(args: Args, loader: Arc<dyn ModuleLoader>) -> Result<(), CliError> {
    run_with(args, loader, None).await
}

/// [`run`], breaking precedence ties with `comparator` when given. An
/// inconsistent comparator is reported as a build error.
pub async fn run_with(
    args: Args,
    loader: Arc<dyn ModuleLoader>,
    comparator: Option<PatternComparator>,
) -> Result<(), CliError> {
    let config = args.config()?;
    logging::init(&config.observability);

    tracing::info!(
        root = config.routes.root.as_deref().unwrap_or("."),
        suffix = %config.routes.suffix,
        bind_address = %config.listener.bind_address,
        "Configuration loaded"
    );

    let watch = config.reload.enabled;
    let mut app = App::new(config, loader);
    if let Some(manifest) = &args.manifest {
        app = app.from_manifest(manifest);
    }
    if let Some(comparator) = comparator {
        app = app.with_comparator(comparator);
    }

    if args.no_serve {
        let manifest = app.write_manifest().await?;
        tracing::info!(routes = manifest.routes.len(), "Not serving (--no-serve)");
        return Ok(());
    }

    app.serve(watch).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
