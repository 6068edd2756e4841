//! Resolving route files to compiled handlers.
//!
//! Route files on disk decide which routes exist and which patterns they
//! serve. The code behind each file is compiled into the host program and
//! looked up by its module reference: the file path relative to the root,
//! `/`-separated, suffix and extension included (`api/hello.route.rs`).

use std::collections::HashMap;

use async_trait::async_trait;

use super::route::{BoxError, Route};

/// Exports of one route module.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// The default export. Modules without one are not routes.
    pub route: Option<Route>,
    /// The optional `precedence` export. Greater wins; absent means `0`.
    pub precedence: Option<f64>,
}

impl Module {
    /// A module whose default export is `route`.
    pub fn new(route: Route) -> Self {
        Self {
            route: Some(route),
            precedence: None,
        }
    }

    /// Set the `precedence` export.
    pub fn with_precedence(mut self, precedence: f64) -> Self {
        self.precedence = Some(precedence);
        self
    }
}

/// Failure to load a module. Aborts discovery.
#[derive(Debug, thiserror::Error)]
#[error("failed to load module `{reference}`: {source}")]
pub struct LoadError {
    pub reference: String,
    #[source]
    pub source: BoxError,
}

impl LoadError {
    pub fn new(reference: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            reference: reference.into(),
            source: source.into(),
        }
    }
}

/// Resolves module references to module exports.
///
/// Implementations must be `Send + Sync`; discovery loads candidates
/// concurrently.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the module behind `reference`.
    ///
    /// `Ok(None)` means nothing is registered for that file, which excludes it
    /// from the table without failing discovery.
    async fn load(&self, reference: &str) -> Result<Option<Module>, LoadError>;
}

/// A fixed map from module reference to module, built by the host program.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    modules: HashMap<String, Module>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` under `reference`, replacing any earlier entry.
    pub fn insert(&mut self, reference: impl Into<String>, module: Module) -> &mut Self {
        let reference = reference.into();
        if self.modules.insert(reference.clone(), module).is_some() {
            tracing::warn!(module = %reference, "Module registered twice; keeping the last one");
        }
        self
    }

    /// Builder form of [`Registry::insert`].
    pub fn with(mut self, reference: impl Into<String>, module: Module) -> Self {
        self.insert(reference, module);
        self
    }

    pub fn get(&self, reference: &str) -> Option<&Module> {
        self.modules.get(reference)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[async_trait]
impl ModuleLoader for Registry {
    async fn load(&self, reference: &str) -> Result<Option<Module>, LoadError> {
        Ok(self.modules.get(reference).cloned())
    }
}
