//! Data access layer with dependency tagging.
//!
//! This crate provides:
//! - `HttpTransport` - The seam outbound requests go through
//! - `StaticTransport` - Fixture responses for development and tests
//! - `SpinTransport` - Spin outbound HTTP (wasm32 only)
//! - `FetchClient` - JSON GETs with status mapping
//! - `DependencyTag` - Semantic dependency categories
//! - `RetryPolicy` - Which failures are worth another attempt

mod client;
mod dependency;
mod retry;
mod transport;

pub use client::*;
pub use dependency::*;
pub use retry::*;
pub use transport::*;
