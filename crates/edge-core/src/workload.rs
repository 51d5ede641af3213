//! Workload definition and errors.

use serde::{Deserialize, Serialize};

use crate::context::{RequestContext, RouteParams};
use crate::route::RouteConfig;

/// Workload manifest - the explicit set of routes a deployable unit serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadManifest {
    /// Unique name for this workload.
    pub name: String,
    /// Semantic version.
    pub version: String,
    /// Routes this workload handles, tried in order.
    pub routes: Vec<RouteConfig>,
}

/// Outcome of matching a request against a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    /// A route matched; carries the handler name and captured params.
    Matched {
        handler: String,
        params: RouteParams,
    },
    /// The path matched a route that does not accept this method.
    MethodNotAllowed,
    /// No route pattern matched the path.
    NotFound,
}

impl WorkloadManifest {
    /// Create a new workload manifest.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            routes: Vec::new(),
        }
    }

    /// Add a route to this workload.
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Match the request path and method against the routes.
    pub fn match_request(&self, method: &http::Method, path: &str) -> RouteMatch {
        let mut path_matched = false;

        for route in &self.routes {
            let Some(params) = route.route_pattern().matches(path) else {
                continue;
            };
            if route.allows(method) {
                return RouteMatch::Matched {
                    handler: route.handler.clone(),
                    params,
                };
            }
            path_matched = true;
        }

        if path_matched {
            RouteMatch::MethodNotAllowed
        } else {
            RouteMatch::NotFound
        }
    }

    /// Match and, on success, copy the captured params into the context.
    pub fn route(&self, ctx: &mut RequestContext) -> RouteMatch {
        let matched = self.match_request(&ctx.method, &ctx.path);
        if let RouteMatch::Matched { params, .. } = &matched {
            ctx.params = params.clone();
        }
        matched
    }
}

/// Error type for workload operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    #[error("Shell not sent before sections")]
    ShellNotSent,

    #[error("Streaming error: {0}")]
    StreamError(String),

    #[error("Slot '{0}' is not declared in the shell")]
    UnknownSlot(String),

    #[error("Section '{0}' failed: {1}")]
    SectionFailed(String, String),
}
