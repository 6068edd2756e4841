//! Route discovery.
//!
//! # Responsibilities
//! - Resolve the configured root to a real local directory
//! - Walk the tree and keep files named `<pattern>.<suffix>.rs[x]`
//! - Load each candidate's module and validate its exports
//!
//! # Design Decisions
//! - Fail fast: any invalid precedence or load error aborts the whole pass
//! - Candidates load concurrently; the order they finish in means nothing
//! - Modules without a route are skipped, not rejected

use std::path::{Path, PathBuf};

use futures_util::future::try_join_all;
use regex::Regex;
use walkdir::WalkDir;

use super::module::{LoadError, ModuleLoader};
use super::pattern::{PatternError, RoutePattern};
use super::table::{PatternComparator, RouteEntry, TableError};

/// Suffix used when none is configured.
pub const DEFAULT_SUFFIX: &str = "route";

/// Errors that abort discovery. No table is produced.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("specify a directory to find routes")]
    EmptyRoot,

    #[error("only local paths or file URLs are supported, got `{0}`")]
    NonLocalRoot(String),

    #[error("cannot resolve root `{root}`: {source}")]
    RootNotFound {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("root `{0}` is not a directory")]
    NotADirectory(PathBuf),

    #[error("suffix cannot be empty")]
    EmptySuffix,

    #[error("suffix `{0}` cannot contain slashes")]
    SuffixContainsSlash(String),

    #[error("suffix `{0}` cannot start or end with dots")]
    SuffixDotEdges(String),

    #[error("module `{reference}` exports precedence {value}, which is not a finite number")]
    InvalidPrecedence { reference: String, value: f64 },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("route file `{reference}` has an invalid pattern: {source}")]
    Pattern {
        reference: String,
        #[source]
        source: PatternError,
    },

    #[error("failed to walk route directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("directory walk did not complete: {0}")]
    WalkTask(#[from] tokio::task::JoinError),

    #[error("invalid suffix filter: {0}")]
    Filter(#[from] regex::Error),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Discovery settings as the caller supplies them.
#[derive(Clone, Default)]
pub struct DiscoveryOptions {
    /// Directory (or `file://` URL) to search. Defaults to the working directory.
    pub root: Option<String>,
    /// Route file suffix, `route` for `*.route.rs`. Defaults to [`DEFAULT_SUFFIX`].
    pub suffix: Option<String>,
    /// Tie-breaker among routes of equal precedence.
    pub compare: Option<PatternComparator>,
}

impl std::fmt::Debug for DiscoveryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryOptions")
            .field("root", &self.root)
            .field("suffix", &self.suffix)
            .field("compare", &self.compare.as_ref().map(|_| ".."))
            .finish()
    }
}

impl DiscoveryOptions {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_comparator(mut self, compare: PatternComparator) -> Self {
        self.compare = Some(compare);
        self
    }

    /// Validate the options and resolve the root on disk.
    pub async fn resolve(&self) -> Result<Discovery, DiscoveryError> {
        let root = resolve_root(self.root.as_deref()).await?;
        let suffix = self.suffix.clone().unwrap_or_else(|| DEFAULT_SUFFIX.to_string());
        validate_suffix(&suffix)?;
        let filter = Regex::new(&format!(
            r"^(?P<pattern>.+?)\.{}\.rsx?$",
            regex::escape(&suffix)
        ))?;

        Ok(Discovery {
            root,
            suffix,
            filter,
            compare: self.compare.clone(),
        })
    }
}

/// Check the suffix rules: non-empty, slash-free, no leading or trailing dot.
pub fn validate_suffix(suffix: &str) -> Result<(), DiscoveryError> {
    if suffix.is_empty() {
        return Err(DiscoveryError::EmptySuffix);
    }
    if suffix.contains('/') {
        return Err(DiscoveryError::SuffixContainsSlash(suffix.to_string()));
    }
    if suffix.starts_with('.') || suffix.ends_with('.') {
        return Err(DiscoveryError::SuffixDotEdges(suffix.to_string()));
    }
    Ok(())
}

async fn resolve_root(root: Option<&str>) -> Result<PathBuf, DiscoveryError> {
    let path = match root {
        Some("") => return Err(DiscoveryError::EmptyRoot),
        Some(root) => root_to_path(root)?,
        None => std::env::current_dir().map_err(|source| DiscoveryError::RootNotFound {
            root: PathBuf::from("."),
            source,
        })?,
    };

    let real = tokio::fs::canonicalize(&path)
        .await
        .map_err(|source| DiscoveryError::RootNotFound {
            root: path.clone(),
            source,
        })?;
    let metadata = tokio::fs::metadata(&real)
        .await
        .map_err(|source| DiscoveryError::RootNotFound {
            root: real.clone(),
            source,
        })?;
    if !metadata.is_dir() {
        return Err(DiscoveryError::NotADirectory(real));
    }
    Ok(real)
}

fn root_to_path(root: &str) -> Result<PathBuf, DiscoveryError> {
    match url::Url::parse(root) {
        // One-letter schemes are Windows drive letters, not URLs.
        Ok(url) if url.scheme().len() > 1 => {
            if url.scheme() != "file" {
                return Err(DiscoveryError::NonLocalRoot(root.to_string()));
            }
            url.to_file_path()
                .map_err(|_| DiscoveryError::NonLocalRoot(root.to_string()))
        }
        _ => Ok(PathBuf::from(root)),
    }
}

/// Validated discovery settings bound to a real root directory.
#[derive(Clone)]
pub struct Discovery {
    root: PathBuf,
    suffix: String,
    filter: Regex,
    compare: Option<PatternComparator>,
}

impl std::fmt::Debug for Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovery")
            .field("root", &self.root)
            .field("suffix", &self.suffix)
            .finish_non_exhaustive()
    }
}

/// A file that looks like a route, before its module is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Module reference, e.g. `api/hello.route.rs`.
    pub reference: String,
    /// Pattern text derived from the file name, e.g. `/api/hello`.
    pub pattern: String,
}

impl Discovery {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn comparator(&self) -> Option<&PatternComparator> {
        self.compare.as_ref()
    }

    /// Pattern text for a module reference, if the file is a route file.
    pub fn pattern_for(&self, reference: &str) -> Option<String> {
        let pathname = format!("/{reference}");
        self.filter
            .captures(&pathname)
            .and_then(|caps| caps.name("pattern"))
            .map(|m| m.as_str().to_string())
    }

    /// Walk the root and list every route file under it.
    pub async fn candidates(&self) -> Result<Vec<Candidate>, DiscoveryError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.walk()).await?
    }

    fn walk(&self) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut candidates = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(reference) = module_reference(&self.root, entry.path()) else {
                tracing::warn!(path = %entry.path().display(), "Skipping file with a non UTF-8 name");
                continue;
            };
            if let Some(pattern) = self.pattern_for(&reference) {
                candidates.push(Candidate { reference, pattern });
            }
        }
        Ok(candidates)
    }

    /// Discover every route under the root. The result is unordered.
    pub async fn discover(
        &self,
        loader: &dyn ModuleLoader,
    ) -> Result<Vec<RouteEntry>, DiscoveryError> {
        let candidates = self.candidates().await?;
        tracing::debug!(
            root = %self.root.display(),
            candidates = candidates.len(),
            "Loading route modules"
        );
        let loaded = try_join_all(candidates.into_iter().map(|c| load_candidate(loader, c))).await?;
        Ok(loaded.into_iter().flatten().collect())
    }
}

async fn load_candidate(
    loader: &dyn ModuleLoader,
    candidate: Candidate,
) -> Result<Option<RouteEntry>, DiscoveryError> {
    let Candidate { reference, pattern } = candidate;

    let Some(module) = loader.load(&reference).await? else {
        tracing::debug!(module = %reference, "No module registered for route file; skipping");
        return Ok(None);
    };

    let precedence = validate_precedence(&reference, module.precedence)?;

    let Some(route) = module.route else {
        tracing::debug!(module = %reference, "Module has no route handler; skipping");
        return Ok(None);
    };

    let pattern = RoutePattern::compile(&pattern).map_err(|source| DiscoveryError::Pattern {
        reference: reference.clone(),
        source,
    })?;

    Ok(Some(RouteEntry::new(pattern, route, precedence, reference)))
}

/// Absent precedence is `0`; anything non-finite is fatal.
pub fn validate_precedence(reference: &str, precedence: Option<f64>) -> Result<f64, DiscoveryError> {
    let value = precedence.unwrap_or(0.0);
    if !value.is_finite() {
        return Err(DiscoveryError::InvalidPrecedence {
            reference: reference.to_string(),
            value,
        });
    }
    // Fold -0.0 into 0.0 so it ties with the default.
    Ok(value + 0.0)
}

fn module_reference(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
