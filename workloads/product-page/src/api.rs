//! Catalog service calls.
//!
//! Four read-only GETs, each keyed by a product id:
//!
//! | kind          | endpoint                        |
//! |---------------|---------------------------------|
//! | `product`     | `/products/details/{id}`        |
//! | `sizes`       | `/products/sizes/{id}`          |
//! | `recommended` | `/products/recommended/{id}`    |
//! | `reviews`     | `/products/comments/{id}`       |

use std::fmt;
use std::rc::Rc;

use edge_sdk::edge_cache::QueryKey;
use edge_sdk::edge_data::{DependencyTag, FetchClient, FetchError};
use edge_sdk::edge_observability::StructuredLogger;
use serde::de::DeserializeOwned;

use crate::data::{Comment, Product, RecommendedPick, SizeAvailability};

/// The catalog queries a page issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Product,
    Sizes,
    Recommended,
    Reviews,
}

impl QueryKind {
    pub const ALL: [QueryKind; 4] = [
        Self::Product,
        Self::Sizes,
        Self::Recommended,
        Self::Reviews,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Sizes => "sizes",
            Self::Recommended => "recommended",
            Self::Reviews => "reviews",
        }
    }

    /// Path segment under `/products/`.
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Product => "details",
            Self::Sizes => "sizes",
            Self::Recommended => "recommended",
            Self::Reviews => "comments",
        }
    }

    pub fn tag(&self) -> DependencyTag {
        match self {
            Self::Product => DependencyTag::Catalog,
            Self::Sizes => DependencyTag::Inventory,
            Self::Recommended => DependencyTag::Recommendations,
            Self::Reviews => DependencyTag::Reviews,
        }
    }

    /// Cache key for this kind of data about `product_id`.
    pub fn key(&self, product_id: &str) -> QueryKey {
        QueryKey::new(self.name(), product_id)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed client for the catalog service.
#[derive(Debug, Clone)]
pub struct ProductApi {
    client: FetchClient,
    base_url: Rc<str>,
    logger: StructuredLogger,
}

impl ProductApi {
    pub fn new(client: FetchClient, base_url: &str, logger: StructuredLogger) -> Self {
        Self {
            client,
            base_url: Rc::from(base_url.trim_end_matches('/')),
            logger,
        }
    }

    /// Endpoint for `kind` and `product_id`. The id is percent-encoded.
    pub fn url(&self, kind: QueryKind, product_id: &str) -> String {
        format!(
            "{}/products/{}/{}",
            self.base_url,
            kind.segment(),
            urlencoding::encode(product_id)
        )
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product, FetchError> {
        self.get(QueryKind::Product, product_id).await
    }

    pub async fn get_recommended_picks(
        &self,
        product_id: &str,
    ) -> Result<Vec<RecommendedPick>, FetchError> {
        self.get(QueryKind::Recommended, product_id).await
    }

    pub async fn get_reviews(&self, product_id: &str) -> Result<Vec<Comment>, FetchError> {
        self.get(QueryKind::Reviews, product_id).await
    }

    pub async fn get_available_sizes(
        &self,
        product_id: &str,
    ) -> Result<SizeAvailability, FetchError> {
        self.get(QueryKind::Sizes, product_id).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        kind: QueryKind,
        product_id: &str,
    ) -> Result<T, FetchError> {
        self.logger
            .debug_builder(format!("fetch {} {}", kind, product_id))
            .field("product_id", product_id)
            .field("kind", kind.name())
            .emit();

        self.client
            .get_json(&self.url(kind, product_id), kind.tag())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_sdk::edge_core::RequestId;
    use edge_sdk::edge_data::StaticTransport;
    use edge_sdk::edge_observability::{LogCapture, LogLevel};
    use futures::executor::block_on;

    const BASE: &str = "http://catalog/";

    fn api(transport: StaticTransport, capture: &LogCapture) -> (ProductApi, Rc<StaticTransport>) {
        let transport = Rc::new(transport);
        let id = RequestId::from_string("req-1");
        let logger = StructuredLogger::new(id.clone())
            .with_min_level(LogLevel::Debug)
            .with_capture(capture.clone());
        let client = FetchClient::new(transport.clone(), id);
        (ProductApi::new(client, BASE, logger), transport)
    }

    #[test]
    fn test_urls_per_kind() {
        let (api, _) = api(StaticTransport::new(), &LogCapture::new());
        assert_eq!(api.url(QueryKind::Product, "42"), "http://catalog/products/details/42");
        assert_eq!(api.url(QueryKind::Reviews, "42"), "http://catalog/products/comments/42");
        assert_eq!(api.url(QueryKind::Sizes, "a b"), "http://catalog/products/sizes/a%20b");
    }

    #[test]
    fn test_decodes_sizes_and_logs_call() {
        let capture = LogCapture::new();
        let (api, transport) = api(
            StaticTransport::new().with_json(
                "http://catalog/products/sizes/42",
                r#"{"total": ["S", "M"], "available": ["M"]}"#,
            ),
            &capture,
        );

        let sizes = block_on(api.get_available_sizes("42")).unwrap();
        assert_eq!(sizes.available, vec!["M".to_string()]);
        assert_eq!(transport.calls("http://catalog/products/sizes/42"), 1);

        let entry = &capture.entries()[0];
        assert_eq!(entry.message, "fetch sizes 42");
        assert_eq!(entry.field_str("product_id"), Some("42"));
        assert_eq!(entry.field_str("kind"), Some("sizes"));
    }

    #[test]
    fn test_missing_product_is_not_found() {
        let (api, _) = api(StaticTransport::new(), &LogCapture::new());
        let err = block_on(api.get_product("404")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let (api, _) = api(
            StaticTransport::new().with_json("http://catalog/products/comments/1", "{}"),
            &LogCapture::new(),
        );
        let err = block_on(api.get_reviews("1")).unwrap_err();
        assert!(matches!(err, FetchError::Deserialization(_)));
    }
}
