//! Request routing and the page lifecycle.

use edge_sdk::edge_cache::QueryHandle;
use edge_sdk::edge_core::{RequestContext, RouteConfig, RouteMatch, WorkloadManifest};

use crate::data::Product;
use crate::sections::SectionKind;

pub const WORKLOAD_NAME: &str = "product-page";

const PAGE: &str = "page";
const SECTION: &str = "section";
const MISSING_ID: &str = "missing_id";

/// What a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /product/:id`, optionally `?size=`.
    Page { id: String, size: Option<String> },
    /// `GET /product/:id/section/:kind`, the fragment for one section.
    Section {
        id: String,
        kind: SectionKind,
        size: Option<String>,
    },
    /// `/product` with no id.
    MissingId,
    /// An id that cannot be used in URLs or headers.
    InvalidId,
    NoMatch,
    MethodNotAllowed,
}

/// Maps requests onto [`Route`]s.
#[derive(Debug, Clone)]
pub struct RouteController {
    manifest: WorkloadManifest,
}

impl Default for RouteController {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteController {
    pub fn new() -> Self {
        let manifest = WorkloadManifest::new(WORKLOAD_NAME, env!("CARGO_PKG_VERSION"))
            .with_route(RouteConfig::new("/product/:id", PAGE).with_methods(vec!["GET"]))
            .with_route(
                RouteConfig::new("/product/:id/section/:kind", SECTION).with_methods(vec!["GET"]),
            )
            .with_route(RouteConfig::new("/product", MISSING_ID).with_methods(vec!["GET"]));
        Self { manifest }
    }

    pub fn manifest(&self) -> &WorkloadManifest {
        &self.manifest
    }

    /// Resolve the request, filling `ctx.params` on a match.
    pub fn resolve(&self, ctx: &mut RequestContext) -> Route {
        let handler = match self.manifest.route(ctx) {
            RouteMatch::Matched { handler, .. } => handler,
            RouteMatch::MethodNotAllowed => return Route::MethodNotAllowed,
            RouteMatch::NotFound => return Route::NoMatch,
        };

        let id = ctx.param("id").map(str::to_string);
        if id.as_deref().is_some_and(|id| id.chars().any(char::is_control)) {
            return Route::InvalidId;
        }
        let size = ctx.query_param("size").map(str::to_string);

        match (handler.as_str(), id) {
            (PAGE, Some(id)) => Route::Page { id, size },
            (SECTION, Some(id)) => match ctx.param("kind").and_then(SectionKind::parse) {
                Some(kind) => Route::Section { id, kind, size },
                None => Route::NoMatch,
            },
            (MISSING_ID, _) => Route::MissingId,
            _ => Route::NoMatch,
        }
    }
}

/// Where a page is in its lifecycle.
///
/// `NoId` → `Prefetching` → `Loaded`, `NotFound` or `Failed`. A different id
/// starts again from `Prefetching` with its own cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    NoId,
    Prefetching { id: String },
    Loaded { id: String },
    NotFound { id: String },
    Failed { id: String, error: String },
}

impl PageState {
    /// The state a request for `id` starts in.
    pub fn start(id: Option<&str>) -> Self {
        match id {
            Some(id) if !id.is_empty() => Self::Prefetching { id: id.to_string() },
            _ => Self::NoId,
        }
    }

    /// Settle a prefetching page with the outcome of its product query.
    /// Any other state is returned unchanged.
    pub fn settle(self, product: &QueryHandle<Product>) -> Self {
        let Self::Prefetching { id } = self else {
            return self;
        };

        if product.data().is_some() {
            return Self::Loaded { id };
        }
        match product.error() {
            Some(error) if error.is_not_found() => Self::NotFound { id },
            Some(error) => Self::Failed {
                id,
                error: error.to_string(),
            },
            None => Self::Failed {
                id,
                error: "product query settled without data".to_string(),
            },
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::NoId => None,
            Self::Prefetching { id }
            | Self::Loaded { id }
            | Self::NotFound { id }
            | Self::Failed { id, .. } => Some(id),
        }
    }

    /// HTTP status for a page that ended in this state.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoId => 400,
            Self::Prefetching { .. } | Self::Loaded { .. } => 200,
            Self::NotFound { .. } => 404,
            Self::Failed { .. } => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_sdk::edge_cache::{CacheStatus, QueryError};
    use edge_sdk::edge_data::FetchError;
    use http::Method;

    fn resolve(method: Method, path: &str) -> Route {
        let mut ctx = RequestContext::new(method, path);
        RouteController::new().resolve(&mut ctx)
    }

    #[test]
    fn test_page_route_with_size() {
        assert_eq!(
            resolve(Method::GET, "/product/42?size=M"),
            Route::Page {
                id: "42".into(),
                size: Some("M".into())
            }
        );
        assert_eq!(
            resolve(Method::GET, "/product/42/"),
            Route::Page {
                id: "42".into(),
                size: None
            }
        );
    }

    #[test]
    fn test_section_route() {
        assert_eq!(
            resolve(Method::GET, "/product/42/section/reviews"),
            Route::Section {
                id: "42".into(),
                kind: SectionKind::Reviews,
                size: None
            }
        );
        assert_eq!(resolve(Method::GET, "/product/42/section/gallery"), Route::NoMatch);
    }

    #[test]
    fn test_missing_id_and_unknown_paths() {
        assert_eq!(resolve(Method::GET, "/product"), Route::MissingId);
        assert_eq!(resolve(Method::GET, "/product/"), Route::MissingId);
        assert_eq!(resolve(Method::GET, "/cart"), Route::NoMatch);
    }

    #[test]
    fn test_control_characters_in_id_rejected() {
        assert_eq!(resolve(Method::GET, "/product/a%0Ab"), Route::InvalidId);
        assert_eq!(resolve(Method::GET, "/product/%7F/section/sizes"), Route::InvalidId);
        assert!(matches!(resolve(Method::GET, "/product/a%20b"), Route::Page { .. }));
    }

    #[test]
    fn test_other_methods_rejected() {
        assert_eq!(resolve(Method::POST, "/product/42"), Route::MethodNotAllowed);
    }

    #[test]
    fn test_resolve_fills_params() {
        let mut ctx = RequestContext::new(Method::GET, "/product/a%20b");
        RouteController::new().resolve(&mut ctx);
        assert_eq!(ctx.param("id"), Some("a b"));
    }

    #[test]
    fn test_state_transitions() {
        assert_eq!(PageState::start(None), PageState::NoId);
        assert_eq!(PageState::start(Some("")), PageState::NoId);

        let prefetching = PageState::start(Some("42"));
        assert_eq!(prefetching.id(), Some("42"));

        let product = crate::testing::product("42");
        let loaded = prefetching
            .clone()
            .settle(&QueryHandle::ready(product, CacheStatus::Miss));
        assert_eq!(loaded, PageState::Loaded { id: "42".into() });
        assert_eq!(loaded.status_code(), 200);

        let missing = QueryHandle::failed(QueryError::from(FetchError::Http {
            status: 404,
            url: "u".into(),
        }));
        assert_eq!(
            prefetching.clone().settle(&missing),
            PageState::NotFound { id: "42".into() }
        );

        let down = QueryHandle::failed(QueryError::from(FetchError::Connection("reset".into())));
        let failed = prefetching.settle(&down);
        assert_eq!(failed.status_code(), 502);
        assert!(matches!(failed, PageState::Failed { .. }));
    }

    #[test]
    fn test_settle_ignores_other_states() {
        let loaded = PageState::Loaded { id: "1".into() };
        assert_eq!(loaded.clone().settle(&QueryHandle::loading()), loaded);
    }
}
