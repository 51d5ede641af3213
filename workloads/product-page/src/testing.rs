//! Fixtures shared by the unit tests.

use std::rc::Rc;

use edge_sdk::edge_cache::{ManualClock, MemoryStore, QueryClient, QueryStore};
use edge_sdk::edge_core::RequestId;
use edge_sdk::edge_data::{FetchClient, StaticTransport};
use edge_sdk::edge_observability::{LogCapture, LogLevel, StructuredLogger};

use crate::api::ProductApi;
use crate::config::PageConfig;
use crate::data::{Price, Product};
use crate::storefront::Storefront;

pub const CATALOG: &str = "http://catalog.test";

pub fn product(id: &str) -> Product {
    Product {
        id: id.into(),
        name: "Trail Runner".into(),
        description: "Light trail shoe".into(),
        images: vec!["https://img.test/42-1.jpg".into()],
        price: Price { value: 100.0, discount: Some(20.0) },
        rating: Some(4.2),
    }
}

/// Catalog answers for product `42`. Anything else is a 404.
pub fn fixture_transport() -> StaticTransport {
    StaticTransport::new()
        .with_json(
            format!("{}/products/details/42", CATALOG),
            r#"{"id": 42, "name": "Trail Runner", "description": "Light trail shoe",
                "images": ["https://img.test/42-1.jpg"], "price": {"value": 100, "discount": 20},
                "rating": 4.2}"#,
        )
        .with_json(
            format!("{}/products/sizes/42", CATALOG),
            r#"{"total": ["S", "M", "L", "XL"], "available": ["M", "L"]}"#,
        )
        .with_json(
            format!("{}/products/recommended/42", CATALOG),
            r#"[{"id": 7, "name": "Trail Sock", "images": [], "price": {"value": 12},
                 "delivery_date": "2024-11-06"}]"#,
        )
        .with_json(
            format!("{}/products/comments/42", CATALOG),
            r#"[{"name": "Ana", "createdAt": "2024-03-02T10:00:00Z", "title": "Great",
                 "content": "Fits well"}]"#,
        )
}

pub fn storefront_with(
    transport: StaticTransport,
) -> (Storefront, Rc<StaticTransport>, LogCapture) {
    storefront_with_config(transport, PageConfig::default())
}

pub fn storefront_with_config(
    transport: StaticTransport,
    config: PageConfig,
) -> (Storefront, Rc<StaticTransport>, LogCapture) {
    build(transport, config, Box::new(MemoryStore::new()))
}

pub fn storefront_with_store(
    transport: StaticTransport,
    store: Box<dyn QueryStore>,
) -> (Storefront, Rc<StaticTransport>, LogCapture) {
    build(transport, PageConfig::default(), store)
}

fn build(
    transport: StaticTransport,
    config: PageConfig,
    store: Box<dyn QueryStore>,
) -> (Storefront, Rc<StaticTransport>, LogCapture) {
    let transport = Rc::new(transport);
    let capture = LogCapture::new();
    let request_id = RequestId::from_string("test-req");
    let logger = StructuredLogger::new(request_id.clone())
        .with_workload("product-page")
        .with_min_level(LogLevel::Debug)
        .with_capture(capture.clone());

    let config = PageConfig {
        api_base_url: CATALOG.to_string(),
        ..config
    };
    let api = ProductApi::new(
        FetchClient::new(transport.clone(), request_id),
        &config.api_base_url,
        logger.clone(),
    );
    let queries = QueryClient::new(store, Rc::new(ManualClock::new(1_700_000_000_000)));

    (
        Storefront::new(api, queries, Rc::new(config), logger),
        transport,
        capture,
    )
}
