//! Route patterns and configuration.

use serde::{Deserialize, Serialize};

use crate::context::RouteParams;

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A path pattern such as `/product/:id/section/:kind`.
///
/// Literal segments match exactly, `:name` segments capture one non-empty
/// path segment. Matching is whole-path: the segment counts must agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> Self {
        let segments = split_segments(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// Match a request path, returning captured parameters.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = split_segments(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    let value = decode_segment(part);
                    if value.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), value);
                }
            }
        }
        Some(params)
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

// Path segments use percent-encoding without the `+` convention of forms.
fn decode_segment(segment: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned()
}

/// Configuration for a single route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route pattern (e.g., "/product/:id").
    pub pattern: String,
    /// Handler name, used in logs and to dispatch.
    pub handler: String,
    /// HTTP methods this route accepts.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

impl RouteConfig {
    /// Create a new GET route configuration.
    pub fn new(pattern: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            handler: handler.into(),
            methods: default_methods(),
        }
    }

    /// Set allowed HTTP methods.
    pub fn with_methods(mut self, methods: Vec<&str>) -> Self {
        self.methods = methods.into_iter().map(String::from).collect();
        self
    }

    /// Check whether a method is accepted (case-insensitive).
    pub fn allows(&self, method: &http::Method) -> bool {
        self.methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method.as_str()))
    }

    /// Parsed form of the pattern.
    pub fn route_pattern(&self) -> RoutePattern {
        RoutePattern::parse(&self.pattern)
    }
}
