//! Cached access to the catalog for one request.

use std::rc::Rc;

use edge_sdk::edge_cache::{QueryClient, QueryHandle, QueryOptions};
use edge_sdk::edge_data::FetchError;
use edge_sdk::edge_observability::StructuredLogger;
use futures::future::{FutureExt, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{ProductApi, QueryKind};
use crate::config::PageConfig;
use crate::data::{Comment, Product, RecommendedPick, SizeAvailability};

type Fetch<T> = LocalBoxFuture<'static, Result<T, FetchError>>;

/// The catalog API behind the query cache, plus the page configuration.
///
/// Cheap to clone; clones share the cache.
#[derive(Debug, Clone)]
pub struct Storefront {
    api: ProductApi,
    queries: QueryClient,
    config: Rc<PageConfig>,
    logger: StructuredLogger,
}

impl Storefront {
    pub fn new(
        api: ProductApi,
        queries: QueryClient,
        config: Rc<PageConfig>,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            api,
            queries,
            config,
            logger,
        }
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn options(&self) -> QueryOptions {
        self.config.query_options()
    }

    /// Register all four queries for `product_id`. Fresh entries are left
    /// alone; everything else starts fetching on the next poll of any query.
    pub fn prefetch_all(&self, product_id: &str) {
        let options = self.options();
        for kind in QueryKind::ALL {
            let key = kind.key(product_id);
            // The cache keeps the registration; the completion future is not needed.
            drop(match kind {
                QueryKind::Product => {
                    self.queries
                        .prefetch(key, self.fetcher(product_id, fetch_product), &options)
                }
                QueryKind::Sizes => {
                    self.queries
                        .prefetch(key, self.fetcher(product_id, fetch_sizes), &options)
                }
                QueryKind::Recommended => {
                    self.queries
                        .prefetch(key, self.fetcher(product_id, fetch_recommended), &options)
                }
                QueryKind::Reviews => {
                    self.queries
                        .prefetch(key, self.fetcher(product_id, fetch_reviews), &options)
                }
            });
        }

        self.logger
            .debug_builder("prefetch issued")
            .field("product_id", product_id)
            .emit();
    }

    pub async fn product(&self, product_id: &str) -> QueryHandle<Product> {
        self.query(QueryKind::Product, product_id, fetch_product).await
    }

    pub async fn sizes(&self, product_id: &str) -> QueryHandle<SizeAvailability> {
        self.query(QueryKind::Sizes, product_id, fetch_sizes).await
    }

    pub async fn recommended(&self, product_id: &str) -> QueryHandle<Vec<RecommendedPick>> {
        self.query(QueryKind::Recommended, product_id, fetch_recommended)
            .await
    }

    pub async fn reviews(&self, product_id: &str) -> QueryHandle<Vec<Comment>> {
        self.query(QueryKind::Reviews, product_id, fetch_reviews).await
    }

    async fn query<T>(
        &self,
        kind: QueryKind,
        product_id: &str,
        call: fn(ProductApi, String) -> Fetch<T>,
    ) -> QueryHandle<T>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let handle = self
            .queries
            .query(
                kind.key(product_id),
                self.fetcher(product_id, call),
                &self.options(),
            )
            .await;

        let mut log = self
            .logger
            .debug_builder("query settled")
            .field("product_id", product_id)
            .field("kind", kind.name())
            .field("cache", handle.status().to_string());
        if let Some(error) = handle.error() {
            log = log.field("error", error.to_string());
        }
        log.emit();

        for (key, error) in self.queries.take_store_errors() {
            self.logger
                .warn_builder("query cache store failed")
                .field("key", key.to_string())
                .field("error", error.to_string())
                .emit();
        }

        handle
    }

    fn fetcher<T: 'static>(
        &self,
        product_id: &str,
        call: fn(ProductApi, String) -> Fetch<T>,
    ) -> impl Fn() -> Fetch<T> + 'static {
        let api = self.api.clone();
        let product_id = product_id.to_string();
        move || call(api.clone(), product_id.clone())
    }
}

fn fetch_product(api: ProductApi, id: String) -> Fetch<Product> {
    async move { api.get_product(&id).await }.boxed_local()
}

fn fetch_sizes(api: ProductApi, id: String) -> Fetch<SizeAvailability> {
    async move { api.get_available_sizes(&id).await }.boxed_local()
}

fn fetch_recommended(api: ProductApi, id: String) -> Fetch<Vec<RecommendedPick>> {
    async move { api.get_recommended_picks(&id).await }.boxed_local()
}

fn fetch_reviews(api: ProductApi, id: String) -> Fetch<Vec<Comment>> {
    async move { api.get_reviews(&id).await }.boxed_local()
}

#[cfg(test)]
mod tests {
    use crate::testing::{fixture_transport, storefront_with, storefront_with_store, CATALOG};
    use edge_sdk::edge_cache::{CacheError, CacheResult, CacheStatus, CachedEntry, QueryKey, QueryStore};
    use futures::executor::block_on;

    #[test]
    fn test_prefetch_then_query_fetches_once() {
        let (store, transport, _) = storefront_with(fixture_transport());

        store.prefetch_all("42");
        let product = block_on(store.product("42"));
        let sizes = block_on(store.sizes("42"));

        assert_eq!(product.data().map(|p| p.name.as_str()), Some("Trail Runner"));
        assert_eq!(sizes.data().map(|s| s.total.len()), Some(4));
        assert_eq!(transport.calls(&format!("{}/products/details/42", CATALOG)), 1);
        assert_eq!(transport.calls(&format!("{}/products/sizes/42", CATALOG)), 1);
    }

    #[test]
    fn test_second_query_is_a_hit() {
        let (store, transport, _) = storefront_with(fixture_transport());

        block_on(store.reviews("42"));
        let again = block_on(store.reviews("42"));

        assert_eq!(again.status(), CacheStatus::Hit);
        assert_eq!(transport.calls(&format!("{}/products/comments/42", CATALOG)), 1);
    }

    #[test]
    fn test_keys_are_per_product() {
        let (store, transport, _) = storefront_with(fixture_transport());

        block_on(store.product("42"));
        let other = block_on(store.product("7"));

        assert!(other.error().is_some_and(|e| e.is_not_found()));
        assert_eq!(transport.calls(&format!("{}/products/details/7", CATALOG)), 1);
    }

    struct UnwritableStore;

    impl QueryStore for UnwritableStore {
        fn get(&self, _key: &QueryKey) -> CacheResult<Option<CachedEntry>> {
            Ok(None)
        }

        fn set(&self, _key: &QueryKey, _entry: CachedEntry) -> CacheResult<()> {
            Err(CacheError::Storage("quota exceeded".into()))
        }

        fn remove(&self, _key: &QueryKey) -> CacheResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_store_write_failure_is_logged() {
        let (store, transport, capture) =
            storefront_with_store(fixture_transport(), Box::new(UnwritableStore));

        let first = block_on(store.sizes("42"));
        let second = block_on(store.sizes("42"));

        assert!(first.data().is_some());
        assert_eq!(second.status(), CacheStatus::Miss);
        assert_eq!(transport.calls(&format!("{}/products/sizes/42", CATALOG)), 2);

        let failures: Vec<_> = capture
            .entries()
            .into_iter()
            .filter(|e| e.message == "query cache store failed")
            .collect();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].field_str("key"), Some("sizes:42"));
        assert_eq!(failures[0].field_str("error"), Some("storage error: quota exceeded"));
    }
}
