//! Observability infrastructure for streamed storefront pages.
//!
//! This crate provides:
//! - `StructuredLogger` - Structured logging with request context
//! - `LogBuilder` - Fluent per-entry fields
//! - `init_subscriber` - Installs the `tracing` subscriber entries go to

mod logging;
mod subscriber;

pub use logging::*;
pub use subscriber::*;

// Re-export RequestId from edge-core for convenience
pub use edge_core::RequestId;
