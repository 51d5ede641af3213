//! Request handling: route, load, pick status and headers.

use std::fmt::Display;

use edge_sdk::edge_cache::{CacheHeadersBuilder, CacheStatus, RouteCachePolicy};
use edge_sdk::edge_core::{RequestContext, WorkloadError};
use edge_sdk::edge_executor::{apply_fallback, FallbackStrategy};
use edge_sdk::edge_streaming::StreamingSink;
use futures::Sink;

use crate::page::{
    load_page, section_data, stream_page, PageOutcome, ReadyPage, SectionData, StreamSummary,
};
use crate::route::{Route, RouteController};
use crate::sections::{
    failed_page, invalid_id_page, method_not_allowed_page, missing_id_page, not_found_page,
    unknown_page,
    SectionKind, SizeSelection,
};
use crate::storefront::Storefront;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// A response ready to be written.
#[derive(Debug)]
pub enum PageResponse {
    /// A product page, streamed section by section.
    Stream {
        status: u16,
        headers: Vec<(String, String)>,
        page: Box<ReadyPage>,
    },
    /// A body that is complete up front: error pages and section fragments.
    Full {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    },
}

impl PageResponse {
    pub fn status(&self) -> u16 {
        match self {
            Self::Stream { status, .. } | Self::Full { status, .. } => *status,
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        match self {
            Self::Stream { headers, .. } | Self::Full { headers, .. } => headers,
        }
    }

    /// First header named `name` (lowercase).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Write the body. Streamed pages report what was streamed.
    pub async fn write_to<S, E>(
        self,
        store: &Storefront,
        sink: &mut StreamingSink<S, E>,
    ) -> Result<Option<StreamSummary>, WorkloadError>
    where
        S: Sink<Vec<u8>, Error = E> + Unpin,
        E: Display,
    {
        match self {
            Self::Stream { page, .. } => stream_page(*page, store, sink).await.map(Some),
            Self::Full { body, .. } => {
                sink.send_shell(&body).await?;
                sink.complete("").await?;
                Ok(None)
            }
        }
    }
}

/// Route the request and load whatever it needs.
pub async fn handle_request(store: &Storefront, ctx: &mut RequestContext) -> PageResponse {
    let logger = store.logger();
    let route = RouteController::new().resolve(ctx);

    logger
        .info_builder("request")
        .field("method", ctx.method.as_str())
        .field("path", ctx.path.as_str())
        .emit();

    let response = match route {
        Route::Page { id, size } => page_response(store, ctx, id, size).await,
        Route::Section { id, kind, size } => section_response(store, ctx, &id, kind, size).await,
        Route::MissingId => full(400, error_headers(ctx), missing_id_page()),
        Route::InvalidId => full(400, error_headers(ctx), invalid_id_page()),
        Route::NoMatch => full(404, error_headers(ctx), unknown_page()),
        Route::MethodNotAllowed => {
            let mut headers = error_headers(ctx);
            headers.push(("allow".to_string(), "GET".to_string()));
            full(405, headers, method_not_allowed_page())
        }
    };

    logger
        .info_builder("response")
        .field("path", ctx.path.as_str())
        .field_i64("status", i64::from(response.status()))
        .emit();

    response
}

async fn page_response(
    store: &Storefront,
    ctx: &RequestContext,
    id: String,
    size: Option<String>,
) -> PageResponse {
    match load_page(store, &id, size).await {
        PageOutcome::Ready(page) => {
            let cache = page
                .scope
                .product()
                .map_or(CacheStatus::Miss, |ctx| ctx.query().status());
            let shareable = !page.early.iter().any(SectionData::is_failed);
            PageResponse::Stream {
                status: 200,
                headers: page_headers(store, ctx, &id, cache, shareable),
                page,
            }
        }
        PageOutcome::NotFound { id } => full(404, error_headers(ctx), not_found_page(&id)),
        PageOutcome::Failed { id, error } => {
            store
                .logger()
                .error_builder("product unavailable")
                .field("product_id", id)
                .field("error", error)
                .emit();
            full(502, error_headers(ctx), failed_page(&retry_href(ctx)))
        }
    }
}

async fn section_response(
    store: &Storefront,
    ctx: &RequestContext,
    id: &str,
    kind: SectionKind,
    size: Option<String>,
) -> PageResponse {
    let data = section_data(store, kind, id).await;
    let selection = SizeSelection::new(id).with_size(size);

    match data.render(&selection, store.config()) {
        Ok(html) => full(200, page_headers(store, ctx, id, data.cache_status(), true), html),
        Err(error) => {
            store
                .logger()
                .warn_builder("section fragment failed")
                .field("section", kind.as_str())
                .field("product_id", id)
                .field("error", error.as_str())
                .emit();
            let status = if data.is_not_found() { 404 } else { 502 };
            let html =
                apply_fallback(&FallbackStrategy::ShowError, kind.label(), &error).into_html();
            full(status, error_headers(ctx), html)
        }
    }
}

fn full(status: u16, headers: Vec<(String, String)>, body: String) -> PageResponse {
    PageResponse::Full {
        status,
        headers,
        body,
    }
}

/// Cacheable for the staleness window, tagged for purging by product.
///
/// Headers go out before the sections settle. A section known to have
/// failed by then makes the page `no-store`; one that fails later still
/// ships under the public policy, bounded by `max-age` and purgeable through
/// the `product:{id}` tag.
fn page_headers(
    store: &Storefront,
    ctx: &RequestContext,
    id: &str,
    cache: CacheStatus,
    shareable: bool,
) -> Vec<(String, String)> {
    let config = store.config();
    let policy = if shareable {
        RouteCachePolicy::public(config.stale_time()).with_swr(config.swr())
    } else {
        RouteCachePolicy::none()
    }
    .with_tag("pdp")
    .with_tag(format!("product:{}", id));

    with_content_type(
        CacheHeadersBuilder::new()
            .policy(&policy)
            .status(cache)
            .request_id(ctx.request_id.as_str())
            .build(),
    )
}

fn error_headers(ctx: &RequestContext) -> Vec<(String, String)> {
    with_content_type(
        CacheHeadersBuilder::new()
            .policy(&RouteCachePolicy::none())
            .request_id(ctx.request_id.as_str())
            .build(),
    )
}

fn with_content_type(mut headers: Vec<(String, String)>) -> Vec<(String, String)> {
    headers.insert(0, ("content-type".to_string(), CONTENT_TYPE_HTML.to_string()));
    headers
}

/// The requested path and query, for the retry link.
fn retry_href(ctx: &RequestContext) -> String {
    let mut query: Vec<(&String, &String)> = ctx.query.iter().collect();
    if query.is_empty() {
        return ctx.path.clone();
    }
    query.sort();
    let encoded: Vec<String> = query
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    format!("{}?{}", ctx.path, encoded.join("&"))
}
