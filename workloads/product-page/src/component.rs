//! Spin entry point.

use std::rc::Rc;

use anyhow::{anyhow, Context};
use spin_sdk::http::{Fields, IncomingRequest, Method, OutgoingResponse, ResponseOutparam};
use spin_sdk::http_component;

use edge_sdk::edge_cache::{KvStore, MemoryStore, QueryClient, QueryStore, SystemClock};
use edge_sdk::edge_core::{RequestContext, RequestId};
use edge_sdk::edge_data::{FetchClient, SpinTransport};
use edge_sdk::edge_observability::{init_subscriber, LogFormat, StructuredLogger};
use edge_sdk::edge_streaming::StreamingSink;

use crate::api::ProductApi;
use crate::config::PageConfig;
use crate::handler::handle_request;
use crate::route::WORKLOAD_NAME;
use crate::storefront::Storefront;

#[http_component]
async fn handle_product_page(req: IncomingRequest, response_out: ResponseOutparam) {
    init_subscriber("info");

    if let Err(e) = serve(req, response_out).await {
        tracing::error!(error = %format!("{:#}", e), "product page request failed");
    }
}

async fn serve(req: IncomingRequest, response_out: ResponseOutparam) -> anyhow::Result<()> {
    let path = req.path_with_query().unwrap_or_else(|| "/".to_string());
    let mut ctx = RequestContext::new(http_method(req.method())?, &path);
    if let Some(id) = header(&req, "x-request-id") {
        ctx = ctx.with_request_id(RequestId::from_string(id));
    }

    let config = load_config()?;
    let logger = StructuredLogger::new(ctx.request_id.clone())
        .with_workload(WORKLOAD_NAME)
        .with_route(ctx.path.as_str())
        .with_format(LogFormat::Json);

    let store: Box<dyn QueryStore> = match KvStore::open_default() {
        Ok(kv) => Box::new(kv),
        Err(e) => {
            logger
                .warn_builder("key-value store unavailable, caching in memory")
                .field("error", e.to_string())
                .emit();
            Box::new(MemoryStore::new())
        }
    };

    let api = ProductApi::new(
        FetchClient::new(Rc::new(SpinTransport), ctx.request_id.clone()),
        &config.api_base_url,
        logger.clone(),
    );
    let storefront = Storefront::new(
        api,
        QueryClient::new(store, Rc::new(SystemClock)),
        Rc::new(config),
        logger,
    );

    let response = handle_request(&storefront, &mut ctx).await;

    let header_list: Vec<(String, Vec<u8>)> = response
        .headers()
        .iter()
        .map(|(name, value)| (name.clone(), value.clone().into_bytes()))
        .collect();
    let headers = Fields::from_list(&header_list)
        .map_err(|e| anyhow!("invalid response headers: {:?}", e))?;
    let outgoing = OutgoingResponse::new(headers);
    outgoing
        .set_status_code(response.status())
        .map_err(|_| anyhow!("invalid status code {}", response.status()))?;

    let body = outgoing.take_body();
    response_out.set(outgoing);
    let mut sink = StreamingSink::new(body, ctx.timing.clone());

    response
        .write_to(&storefront, &mut sink)
        .await
        .context("streaming the response failed")?;
    Ok(())
}

/// Bundled configuration with Spin variables layered on top.
fn load_config() -> anyhow::Result<PageConfig> {
    let config = PageConfig::bundled()?;
    let api_base_url = spin_sdk::variables::get("api_base_url").ok();
    let stale_time_secs = spin_sdk::variables::get("stale_time_secs").ok();
    config
        .with_overrides(api_base_url, stale_time_secs)
        .context("invalid Spin variables")
}

fn http_method(method: Method) -> anyhow::Result<http::Method> {
    Ok(match method {
        Method::Get => http::Method::GET,
        Method::Head => http::Method::HEAD,
        Method::Post => http::Method::POST,
        Method::Put => http::Method::PUT,
        Method::Delete => http::Method::DELETE,
        Method::Connect => http::Method::CONNECT,
        Method::Options => http::Method::OPTIONS,
        Method::Trace => http::Method::TRACE,
        Method::Patch => http::Method::PATCH,
        Method::Other(other) => http::Method::from_bytes(other.as_bytes())
            .with_context(|| format!("unsupported method {}", other))?,
    })
}

fn header(req: &IncomingRequest, name: &str) -> Option<String> {
    req.headers()
        .get(&name.to_string())
        .into_iter()
        .find_map(|value| String::from_utf8(value).ok())
        .filter(|value| !value.is_empty())
}
