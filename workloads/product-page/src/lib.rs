//! Product detail page workload.
//!
//! Streams a storefront product page from a Spin component:
//! - Shell and product body as soon as the product record is in
//! - Sizes, recommended picks and reviews filled into their slots as each
//!   query resolves, or left to the browser when configured
//! - Catalog reads go through a keyed query cache with a staleness window
//! - Failed sections show an error in place; the rest of the page renders

pub mod api;
pub mod config;
pub mod context;
pub mod data;
pub mod handler;
pub mod page;
pub mod route;
pub mod sections;
pub mod storefront;

#[cfg(target_arch = "wasm32")]
mod component;

#[cfg(test)]
mod testing;

pub use api::{ProductApi, QueryKind};
pub use config::{ConfigError, PageConfig};
pub use context::{ContextError, ProductContext, ProductScope};
pub use handler::{handle_request, PageResponse};
pub use page::{load_page, stream_page, PageOutcome, ReadyPage, StreamSummary};
pub use route::{PageState, Route, RouteController};
pub use storefront::Storefront;
