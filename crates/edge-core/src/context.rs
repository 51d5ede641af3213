//! Request context with typed parameters.

use std::collections::HashMap;

use http::Method;

use crate::lifecycle::TimingContext;

/// Unique request identifier for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new random request ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Create from an existing ID string (e.g. an inbound `x-request-id`).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extracted route parameters (e.g., `:id` from `/product/:id`).
pub type RouteParams = HashMap<String, String>;

/// Decoded query string parameters. Later duplicates win.
pub type QueryParams = HashMap<String, String>;

/// HTTP headers, keyed by lowercase name.
pub type Headers = HashMap<String, String>;

/// Typed request context passed to workload handlers.
#[derive(Debug)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    /// Route parameters, filled in once a route has matched.
    pub params: RouteParams,
    /// Query string parameters.
    pub query: QueryParams,
    /// HTTP headers.
    pub headers: Headers,
    /// Timing context for observability.
    pub timing: TimingContext,
}

impl RequestContext {
    /// Create a context from a method and a raw `path?query` string.
    pub fn new(method: Method, path_with_query: &str) -> Self {
        let (path, query) = match path_with_query.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (path_with_query, QueryParams::new()),
        };

        Self {
            request_id: RequestId::generate(),
            method,
            path: normalize_path(path),
            params: RouteParams::new(),
            query,
            headers: Headers::new(),
            timing: TimingContext::new(),
        }
    }

    /// Add a header. Names are stored lowercase.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Reuse an inbound request ID instead of the generated one.
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = id;
        self
    }

    /// Get a route parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Get a query parameter by name. Empty values count as absent.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }
}

fn parse_query(query: &str) -> QueryParams {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Collapse an empty path to `/` and drop a single trailing slash.
fn normalize_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    path.strip_suffix('/').unwrap_or(path).to_string()
}
