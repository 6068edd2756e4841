//! Path pattern compilation.
//!
//! # Responsibilities
//! - Turn pattern text (`/api/:id/*`) into an anchored matcher
//! - Escape literal segments before they reach the regex engine
//! - Extract captures from a concrete request path
//!
//! # Design Decisions
//! - Matching is case-sensitive and ignores the query string
//! - Literal segments match their percent-encoded form, since request paths
//!   arrive encoded (`/hello world` serves `/hello%20world`)
//! - `:name` matches exactly one non-empty segment
//! - `*` swallows the rest of the path and must be the last segment
//! - Wildcards are exposed under positional keys (`"0"`, `"1"`, ...)

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;

/// Prefix that turns a segment into a named capture.
pub const CAPTURE_MARKER: char = ':';

/// Segment text that turns a segment into a trailing wildcard.
pub const WILDCARD: &str = "*";

/// Bytes a literal segment must percent-encode to match a request path.
///
/// Same set URL parsers apply to paths: controls, space, `"`, `#`, `<`, `>`,
/// `?`, backtick and braces. Non-ASCII is always encoded. `%` is kept so an
/// already-encoded file name matches as written.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Captured substrings of a matched path, keyed by capture name.
///
/// A value is `None` when its group did not take part in the match.
pub type Captured = BTreeMap<String, Option<String>>;

/// Errors produced while compiling pattern text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    /// Pattern text must begin with `/`.
    #[error("pattern `{pattern}` must start with `/`")]
    MissingLeadingSlash { pattern: String },

    /// `*` appeared somewhere other than the final segment.
    #[error("wildcard is only allowed as the last segment of `{pattern}`")]
    MisplacedWildcard { pattern: String },

    /// A capture marker with no name after it.
    #[error("capture in `{pattern}` must be given a name")]
    UnnamedCapture { pattern: String },

    /// A capture name that is not an identifier.
    #[error("`{name}` in `{pattern}` is not a valid capture name")]
    InvalidCaptureName { pattern: String, name: String },

    /// The same capture name used twice.
    #[error("capture `{name}` appears more than once in `{pattern}`")]
    DuplicateCapture { pattern: String, name: String },

    /// The generated expression was rejected by the regex engine.
    #[error("pattern `{pattern}` failed to compile: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// One `/`-delimited piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matched verbatim.
    Literal(String),
    /// Matches one segment and records it under the given name.
    Capture(String),
    /// Matches the remainder of the path.
    Wildcard,
}

#[derive(Debug)]
struct Compiled {
    source: String,
    segments: Vec<Segment>,
    regex: Regex,
    /// Capture key for each regex group, in group order.
    keys: Vec<String>,
}

/// A compiled URL path pattern.
///
/// Cloning is cheap; the compiled form is shared.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    inner: Arc<Compiled>,
}

impl RoutePattern {
    /// Compile pattern text such as `/api/hello`, `/:dynamic` or `/*`.
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let Some(rest) = source.strip_prefix('/') else {
            return Err(PatternError::MissingLeadingSlash {
                pattern: source.to_string(),
            });
        };

        let raw: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut keys: Vec<String> = Vec::new();
        let mut expr = String::with_capacity(source.len() + 8);
        expr.push('^');

        let mut wildcards = 0usize;
        for (i, segment) in raw.iter().enumerate() {
            expr.push('/');
            if *segment == WILDCARD {
                if i + 1 != raw.len() {
                    return Err(PatternError::MisplacedWildcard {
                        pattern: source.to_string(),
                    });
                }
                expr.push_str("(.*)");
                keys.push(wildcards.to_string());
                wildcards += 1;
                segments.push(Segment::Wildcard);
            } else if let Some(name) = segment.strip_prefix(CAPTURE_MARKER) {
                validate_name(source, name)?;
                if keys.iter().any(|k| k == name) {
                    return Err(PatternError::DuplicateCapture {
                        pattern: source.to_string(),
                        name: name.to_string(),
                    });
                }
                expr.push_str("([^/]+)");
                keys.push(name.to_string());
                segments.push(Segment::Capture(name.to_string()));
            } else {
                let encoded = utf8_percent_encode(segment, PATH_SEGMENT).to_string();
                expr.push_str(&regex::escape(&encoded));
                segments.push(Segment::Literal((*segment).to_string()));
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|source_err| PatternError::Regex {
            pattern: source.to_string(),
            source: source_err,
        })?;

        Ok(Self {
            inner: Arc::new(Compiled {
                source: source.to_string(),
                segments,
                regex,
                keys,
            }),
        })
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.inner.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.inner.segments
    }

    /// Returns true if `path` matches this pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.inner.regex.is_match(path)
    }

    /// Match `path`, returning a fresh capture map on success.
    pub fn captures(&self, path: &str) -> Option<Captured> {
        let caps = self.inner.regex.captures(path)?;
        let captured = self
            .inner
            .keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), caps.get(i + 1).map(|m| m.as_str().to_string())))
            .collect();
        Some(captured)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RoutePattern {}

fn validate_name(pattern: &str, name: &str) -> Result<(), PatternError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(PatternError::UnnamedCapture {
            pattern: pattern.to_string(),
        });
    };
    let valid = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PatternError::InvalidCaptureName {
            pattern: pattern.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern() {
        let pattern = RoutePattern::compile("/api/hello").unwrap();
        assert!(pattern.is_match("/api/hello"));
        assert!(!pattern.is_match("/api/hello/"));
        assert!(!pattern.is_match("/api/Hello")); // Case sensitive
        assert_eq!(pattern.captures("/api/hello").unwrap().len(), 0);
    }

    #[test]
    fn test_root_and_trailing_slash() {
        let root = RoutePattern::compile("/").unwrap();
        assert!(root.is_match("/"));
        assert!(!root.is_match("/x"));

        let dir = RoutePattern::compile("/api/").unwrap();
        assert!(dir.is_match("/api/"));
        assert!(!dir.is_match("/api"));
    }

    #[test]
    fn test_literal_is_escaped() {
        let pattern = RoutePattern::compile("/a.b+(c)").unwrap();
        assert!(pattern.is_match("/a.b+(c)"));
        assert!(!pattern.is_match("/axb+(c)"));
        assert!(!pattern.is_match("/a.bb(c)"));
    }

    #[test]
    fn test_literal_matches_encoded_path() {
        let spaced = RoutePattern::compile("/hello world").unwrap();
        assert!(spaced.is_match("/hello%20world"));
        assert!(!spaced.is_match("/hello world"));

        let accented = RoutePattern::compile("/café/:id").unwrap();
        let captured = accented.captures("/caf%C3%A9/7").unwrap();
        assert_eq!(captured.get("id"), Some(&Some("7".to_string())));
        assert_eq!(accented.as_str(), "/café/:id");

        let encoded = RoutePattern::compile("/a%20b").unwrap();
        assert!(encoded.is_match("/a%20b"));
    }

    #[test]
    fn test_named_capture() {
        let pattern = RoutePattern::compile("/users/:id/posts").unwrap();
        let captured = pattern.captures("/users/42/posts").unwrap();
        assert_eq!(captured.get("id"), Some(&Some("42".to_string())));
        assert!(pattern.captures("/users//posts").is_none());
        assert!(pattern.captures("/users/4/2/posts").is_none());
    }

    #[test]
    fn test_wildcard_takes_remainder() {
        let pattern = RoutePattern::compile("/*").unwrap();
        let captured = pattern.captures("/a/b/c").unwrap();
        assert_eq!(captured.get("0"), Some(&Some("a/b/c".to_string())));

        let captured = pattern.captures("/").unwrap();
        assert_eq!(captured.get("0"), Some(&Some(String::new())));
    }

    #[test]
    fn test_capture_and_wildcard_together() {
        let pattern = RoutePattern::compile("/files/:bucket/*").unwrap();
        let captured = pattern.captures("/files/docs/2024/report.pdf").unwrap();
        assert_eq!(captured.get("bucket"), Some(&Some("docs".to_string())));
        assert_eq!(captured.get("0"), Some(&Some("2024/report.pdf".to_string())));
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("files".into()),
                Segment::Capture("bucket".into()),
                Segment::Wildcard,
            ]
        );
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            RoutePattern::compile("api"),
            Err(PatternError::MissingLeadingSlash { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/*/tail"),
            Err(PatternError::MisplacedWildcard { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/:"),
            Err(PatternError::UnnamedCapture { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/:9lives"),
            Err(PatternError::InvalidCaptureName { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/:id/:id"),
            Err(PatternError::DuplicateCapture { .. })
        ));
    }

    #[test]
    fn test_display_is_source_text() {
        let pattern = RoutePattern::compile("/:dynamic").unwrap();
        assert_eq!(pattern.to_string(), "/:dynamic");
    }
}
