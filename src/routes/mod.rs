//! Application route patterns
//!
//! Patterns are slash-separated paths: `/cms/orders`
//! Each segment must match [a-zA-Z0-9_-]+, or be a `:name` placeholder
//! that matches any single segment.
//!
//! Wildcards are only allowed at the end:
//! - `/cms/orders/*` matches `/cms/orders`, `/cms/orders/42`, `/cms/orders/42/items`
//! - `/cms/*` matches the console root and anything under it
//! - `*` matches every path

use std::fmt;
use thiserror::Error;

/// Valid characters for a route segment
fn is_valid_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Validate a single literal segment
fn is_valid_segment(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_valid_segment_char)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route pattern cannot be empty")]
    Empty,

    #[error("route pattern must start with '/'")]
    MissingLeadingSlash,

    #[error("invalid segment '{0}': must match [a-zA-Z0-9_-]+ or :name")]
    InvalidSegment(String),

    #[error("wildcard '*' can only appear as the last segment")]
    WildcardNotAtEnd,

    #[error("empty segment in route pattern")]
    EmptySegment,
}

/// Split a request path into its segments.
///
/// Query string and fragment are dropped; empty segments (leading,
/// trailing or doubled slashes) are ignored.
pub fn path_segments(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

/// One segment of a route pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn matches(&self, part: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == part,
            Segment::Param(_) => true,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(lit) => write!(f, "{}", lit),
            Segment::Param(name) => write!(f, ":{}", name),
        }
    }
}

/// A route pattern that may include placeholders and a trailing wildcard
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    /// Segments before the wildcard (or all of them if no wildcard)
    segments: Vec<Segment>,
    /// Whether this pattern ends with a wildcard
    is_wildcard: bool,
}

impl RoutePattern {
    /// Parse a route pattern (may end with /*)
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        if pattern.is_empty() {
            return Err(RouteError::Empty);
        }

        // Special case: "*" matches everything
        if pattern == "*" {
            return Ok(Self {
                segments: Vec::new(),
                is_wildcard: true,
            });
        }

        let Some(body) = pattern.strip_prefix('/') else {
            return Err(RouteError::MissingLeadingSlash);
        };

        // "/" is the storefront root
        if body.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
                is_wildcard: false,
            });
        }

        let (body, is_wildcard) = match body.strip_suffix("/*") {
            Some(prefix) => (prefix, true),
            None if body == "*" => ("", true),
            None => (body, false),
        };

        let mut segments = Vec::new();
        if !body.is_empty() {
            for part in body.split('/') {
                if part.is_empty() {
                    return Err(RouteError::EmptySegment);
                }

                if part.contains('*') {
                    return Err(RouteError::WildcardNotAtEnd);
                }

                match part.strip_prefix(':') {
                    Some(name) if is_valid_segment(name) => {
                        segments.push(Segment::Param(name.to_string()))
                    }
                    None if is_valid_segment(part) => {
                        segments.push(Segment::Literal(part.to_string()))
                    }
                    _ => return Err(RouteError::InvalidSegment(part.to_string())),
                }
            }
        }

        Ok(Self {
            segments,
            is_wildcard,
        })
    }

    /// Check if this pattern matches a request path
    pub fn matches(&self, path: &str) -> bool {
        let parts = path_segments(path);

        if self.is_wildcard {
            parts.len() >= self.segments.len()
                && self
                    .segments
                    .iter()
                    .zip(&parts)
                    .all(|(seg, part)| seg.matches(part))
        } else {
            parts.len() == self.segments.len()
                && self
                    .segments
                    .iter()
                    .zip(&parts)
                    .all(|(seg, part)| seg.matches(part))
        }
    }

    /// Ordering key used to pick the most specific of several matching
    /// patterns: literal segments first, then placeholders, and an exact
    /// pattern beats a wildcard of the same shape
    pub fn specificity(&self) -> (usize, usize, bool) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        (literals, self.segments.len() - literals, !self.is_wildcard)
    }

    /// Check if this is a wildcard pattern
    pub fn is_wildcard(&self) -> bool {
        self.is_wildcard
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return if self.is_wildcard {
                write!(f, "*")
            } else {
                write!(f, "/")
            };
        }

        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        if self.is_wildcard {
            write!(f, "/*")?;
        }
        Ok(())
    }
}
