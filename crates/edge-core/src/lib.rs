//! Core abstractions for streamed storefront pages.
//!
//! This crate provides the fundamental types:
//! - `RequestContext` - Typed request parameters (path, query, route params)
//! - `RoutePattern` / `RouteConfig` - Path patterns with `:param` segments
//! - `WorkloadManifest` - The routes a workload serves
//! - `TimingContext` / `LifecyclePhase` - Request lifecycle tracking

mod context;
mod lifecycle;
mod route;
mod workload;

pub use context::*;
pub use lifecycle::*;
pub use route::*;
pub use workload::*;
