//! Route manifest: a persisted, already-ordered route table.
//!
//! # Data Flow
//! ```text
//! RouteTable (canonical order)
//!     → Manifest::from_table → TOML on disk
//!
//! TOML on disk
//!     → Manifest::read → Manifest::load(loader)
//!     → RouteTable (stored order, never re-sorted)
//! ```
//!
//! Regenerating the manifest is the only way to pick up ordering changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::module::{LoadError, ModuleLoader};
use super::pattern::{PatternError, RoutePattern};
use super::table::{RouteEntry, RouteTable, TableError};

/// File name used when none is configured, relative to the discovery root.
pub const DEFAULT_MANIFEST: &str = "routes.gen.toml";

const HEADER: &str = "# Generated by routefs. Do not edit; regenerate instead.\n\n";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("cannot access manifest `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("manifest names module `{0}`, which has no route handler")]
    MissingRoute(String),

    #[error("manifest entry `{reference}` has an invalid pattern: {source}")]
    Pattern {
        reference: String,
        #[source]
        source: PatternError,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// One manifest line: a pattern and the module that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub pattern: String,
    pub module: String,
}

/// Ordered `(pattern, module)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "route")]
    pub routes: Vec<ManifestEntry>,
}

impl Manifest {
    /// Capture `table` in its current order.
    pub fn from_table(table: &RouteTable) -> Self {
        let routes = table
            .iter()
            .map(|entry| ManifestEntry {
                pattern: entry.pattern().as_str().to_string(),
                module: entry.source_path().to_string(),
            })
            .collect();
        Self { routes }
    }

    pub fn to_toml(&self) -> Result<String, ManifestError> {
        Ok(format!("{HEADER}{}", toml::to_string(self)?))
    }

    pub fn from_toml(text: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(text)?)
    }

    pub async fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let content = self.to_toml()?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), routes = self.routes.len(), "Manifest written");
        Ok(())
    }

    pub async fn read(path: &Path) -> Result<Self, ManifestError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml(&text)
    }

    /// Build a table in exactly the stored order, resolving every module
    /// through `loader`.
    ///
    /// Entries carry precedence `0`; precedence only matters for sorting,
    /// which a manifest never does.
    pub async fn load(&self, loader: &dyn ModuleLoader) -> Result<RouteTable, ManifestError> {
        let mut entries = Vec::with_capacity(self.routes.len());
        for ManifestEntry { pattern, module } in &self.routes {
            let route = loader
                .load(module)
                .await?
                .and_then(|m| m.route)
                .ok_or_else(|| ManifestError::MissingRoute(module.clone()))?;
            let pattern = RoutePattern::compile(pattern).map_err(|source| ManifestError::Pattern {
                reference: module.clone(),
                source,
            })?;
            entries.push(RouteEntry::new(pattern, route, 0.0, module.clone()));
        }
        Ok(RouteTable::from_ordered(entries)?)
    }
}
