//! Streaming primitives for shell-first SSR.
//!
//! This crate enforces shell-first streaming patterns:
//! - `StreamingSink` - Platform-controlled streaming
//! - `Shell` - Shell template abstraction
//! - `Slot` - Named placeholders filled later in the stream
//! - `FlushPolicy` - Explicit flush control
//! - `escape_html` - Escaping for interpolated text

mod escape;
mod flush;
mod shell;
mod sink;
mod slot;

pub use escape::*;
pub use flush::*;
pub use shell::*;
pub use sink::*;
pub use slot::*;
