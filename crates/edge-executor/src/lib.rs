//! Stream-as-ready slot execution.
//!
//! This crate enables out-of-order slot filling:
//! - `SectionScheduler` - Tracks each slot from placeholder to fill
//! - `OrderingStrategy` / `FillQueue` - When a finished fill may be sent
//! - `FallbackStrategy` - What a failed slot is filled with

mod fallback;
mod ordering;
mod scheduler;

pub use fallback::*;
pub use ordering::*;
pub use scheduler::*;
