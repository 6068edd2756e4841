//! Route entries and the ordered route table.
//!
//! # Responsibilities
//! - Hold discovered routes as immutable entries
//! - Impose the one canonical order on live-discovered routes
//! - Accept an already-ordered list verbatim (manifest load)
//!
//! # Design Decisions
//! - Precedence descending always dominates the pattern comparator
//! - The comparator only breaks ties within equal precedence
//! - Module reference ascending is the last tie-break, so the order is total
//!   even when two files share a pattern and a precedence

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::pattern::RoutePattern;
use super::route::Route;

/// Overrides pattern-vs-pattern ordering among routes of equal precedence.
///
/// Returning `None` falls back to [`compare_by_codepoints`]. Must describe a
/// consistent total order; a comparator that contradicts itself (or panics)
/// fails table construction with [`TableError::InconsistentComparator`].
pub type PatternComparator = Arc<dyn Fn(&str, &str) -> Option<Ordering> + Send + Sync>;

/// Lexicographic comparison by Unicode code point; a strict prefix sorts first.
pub fn compare_by_codepoints(a: &str, b: &str) -> Ordering {
    a.chars().cmp(b.chars())
}

/// One route in the table.
#[derive(Clone)]
pub struct RouteEntry {
    pattern: RoutePattern,
    route: Route,
    precedence: f64,
    source_path: String,
}

impl RouteEntry {
    pub fn new(
        pattern: RoutePattern,
        route: Route,
        precedence: f64,
        source_path: impl Into<String>,
    ) -> Self {
        Self {
            pattern,
            route,
            precedence,
            source_path: source_path.into(),
        }
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn precedence(&self) -> f64 {
        self.precedence
    }

    /// Module reference of the route file.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern.as_str())
            .field("precedence", &self.precedence)
            .field("source_path", &self.source_path)
            .finish()
    }
}

/// Errors building a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// Two entries claimed the same module reference.
    #[error("module `{0}` appears more than once in the route table")]
    DuplicateModule(String),

    /// The pattern comparator disagreed with itself between `first` and `second`.
    #[error("pattern comparator is not a total order (`{first}` vs `{second}`)")]
    InconsistentComparator { first: String, second: String },
}

/// An ordered, immutable sequence of routes, unique by module reference.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Sort `entries` into canonical order.
    pub fn ordered(
        mut entries: Vec<RouteEntry>,
        compare: Option<&PatternComparator>,
    ) -> Result<Self, TableError> {
        ensure_unique(&entries)?;
        let sorted = panic::catch_unwind(AssertUnwindSafe(|| {
            entries.sort_by(|a, b| order(a, b, compare));
        }));
        if sorted.is_err() {
            if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
                return Err(inconsistent(first, last));
            }
        }
        ensure_consistent(&entries, compare)?;
        Ok(Self { entries })
    }

    /// Keep `entries` in the order given. Used for manifests, whose stored
    /// order is authoritative.
    pub fn from_ordered(entries: Vec<RouteEntry>) -> Result<Self, TableError> {
        ensure_unique(&entries)?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pattern texts in table order.
    pub fn patterns(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.pattern.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteEntry;
    type IntoIter = std::slice::Iter<'a, RouteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn order(a: &RouteEntry, b: &RouteEntry, compare: Option<&PatternComparator>) -> Ordering {
    b.precedence
        .total_cmp(&a.precedence)
        .then_with(|| {
            let (pa, pb) = (a.pattern.as_str(), b.pattern.as_str());
            compare
                .and_then(|c| c(pa, pb))
                .unwrap_or_else(|| compare_by_codepoints(pa, pb))
        })
        .then_with(|| a.source_path.cmp(&b.source_path))
}

fn ensure_unique(entries: &[RouteEntry]) -> Result<(), TableError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.source_path.as_str()) {
            return Err(TableError::DuplicateModule(entry.source_path.clone()));
        }
    }
    Ok(())
}

/// Adjacent entries must compare as ordered in both directions.
fn ensure_consistent(
    entries: &[RouteEntry],
    compare: Option<&PatternComparator>,
) -> Result<(), TableError> {
    let Some(compare) = compare else {
        return Ok(());
    };
    for pair in entries.windows(2) {
        let forward = order(&pair[0], &pair[1], Some(compare));
        let backward = order(&pair[1], &pair[0], Some(compare));
        if forward == Ordering::Greater || backward != forward.reverse() {
            return Err(inconsistent(&pair[0], &pair[1]));
        }
    }
    Ok(())
}

fn inconsistent(first: &RouteEntry, second: &RouteEntry) -> TableError {
    TableError::InconsistentComparator {
        first: first.pattern.as_str().to_string(),
        second: second.pattern.as_str().to_string(),
    }
}
