//! Public SDK for streamed storefront page workloads.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use edge_sdk::prelude::*;
//!
//! let ctx = RequestContext::new(http::Method::GET, "/product/42");
//! let logger = StructuredLogger::new(ctx.request_id.clone());
//! let queries = QueryClient::in_memory();
//!
//! sink.send_shell(&shell.render_opening()).await?;
//! sink.send_html(&Slot::new("reviews").with_placeholder(skeleton).render()).await?;
//!
//! let reviews = queries.query(QueryKey::new("reviews", "42"), fetch_reviews, &options).await;
//! sink.fill_slot("reviews", &fill_fragment("reviews", &render(&reviews))).await?;
//! sink.complete(&shell.render_closing()).await?;
//! ```

pub use edge_cache;
pub use edge_core;
pub use edge_data;
pub use edge_executor;
pub use edge_observability;
pub use edge_streaming;

/// Prelude for convenient imports.
pub mod prelude {
    pub use edge_cache::*;
    pub use edge_core::*;
    pub use edge_data::*;
    pub use edge_executor::*;
    pub use edge_observability::*;
    pub use edge_streaming::*;
}
