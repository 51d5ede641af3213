//! Caching infrastructure for streamed storefront pages.
//!
//! This crate provides:
//! - `QueryClient` - Keyed query cache with staleness windows and
//!   in-flight de-duplication
//! - `QueryStore` - Storage backends (in-memory, Spin key-value)
//! - `RouteCachePolicy` - Route-level Cache-Control configuration
//! - `CacheHeadersBuilder` - Response cache headers
//!
//! # Example
//!
//! ```ignore
//! use edge_cache::{QueryClient, QueryKey, QueryOptions};
//!
//! let client = QueryClient::in_memory();
//! let key = QueryKey::new("product", "42");
//!
//! client.prefetch(key.clone(), move || fetch_product(..), &QueryOptions::default());
//! let handle = client.query::<Product, _, _>(key, move || fetch_product(..), &options).await;
//! ```

mod headers;
mod key;
mod policy;
mod query;
mod store;

pub use headers::*;
pub use key::*;
pub use policy::*;
pub use query::*;
pub use store::*;
