//! Explicit flush control - no implicit buffering.

/// Flush policy for streaming responses. The shell is always flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Flush after every body write and slot fill.
    #[default]
    AfterEachWrite,
    /// Flush after the shell only; later writes go out with the close.
    AfterShell,
}

impl FlushPolicy {
    /// Check if should flush after a body write or slot fill.
    pub fn flush_after_write(&self) -> bool {
        matches!(self, Self::AfterEachWrite)
    }
}
