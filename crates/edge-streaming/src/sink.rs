//! Platform-controlled streaming sink.

use std::fmt::Display;

use edge_core::{LifecyclePhase, TimingContext, WorkloadError};
use futures::{Sink, SinkExt};

use crate::flush::FlushPolicy;

/// State of the streaming sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    /// Initial state, shell not yet sent.
    Initial,
    /// Shell has been sent, body and fills can be streamed.
    ShellSent,
    /// Closing markup written.
    Completed,
}

/// Platform-controlled streaming sink that enforces shell-first pattern.
///
/// Generic over the underlying sink so it works with Spin's outgoing body
/// as well as a `Vec<Vec<u8>>` in tests.
pub struct StreamingSink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    inner: S,
    state: SinkState,
    flush: FlushPolicy,
    timing: TimingContext,
    slots_filled: Vec<String>,
    bytes_sent: usize,
}

impl<S, E> StreamingSink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    /// Create a new streaming sink.
    pub fn new(sink: S, timing: TimingContext) -> Self {
        Self {
            inner: sink,
            state: SinkState::Initial,
            flush: FlushPolicy::default(),
            timing,
            slots_filled: Vec::new(),
            bytes_sent: 0,
        }
    }

    /// Set the flush policy.
    pub fn with_flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush = policy;
        self
    }

    /// Send the shell HTML. Must be called before anything else.
    pub async fn send_shell(&mut self, html: &str) -> Result<(), WorkloadError> {
        if self.state != SinkState::Initial {
            return Err(WorkloadError::StreamError(
                "Shell already sent or sink completed".to_string(),
            ));
        }

        self.write(html.as_bytes().to_vec(), true).await?;
        self.timing.mark("shell_sent");
        self.state = SinkState::ShellSent;

        Ok(())
    }

    /// Send body HTML that belongs in document order after the shell.
    pub async fn send_html(&mut self, html: &str) -> Result<(), WorkloadError> {
        self.ensure_open()?;
        let flush = self.flush.flush_after_write();
        self.write(html.as_bytes().to_vec(), flush).await
    }

    /// Send the fill markup for a slot. Each slot is filled at most once.
    pub async fn fill_slot(&mut self, name: &str, html: &str) -> Result<(), WorkloadError> {
        self.ensure_open()?;
        if self.slots_filled.iter().any(|s| s == name) {
            return Err(WorkloadError::StreamError(format!(
                "Slot '{}' already filled",
                name
            )));
        }

        let flush = self.flush.flush_after_write();
        self.write(html.as_bytes().to_vec(), flush).await?;
        self.timing.mark_slot_filled(name);
        self.slots_filled.push(name.to_string());

        Ok(())
    }

    /// Send the closing markup and close the underlying sink.
    pub async fn complete(&mut self, closing: &str) -> Result<(), WorkloadError> {
        self.ensure_open()?;
        self.write(closing.as_bytes().to_vec(), false).await?;
        self.inner
            .close()
            .await
            .map_err(|e| WorkloadError::StreamError(e.to_string()))?;
        self.state = SinkState::Completed;
        self.timing.mark("complete");
        Ok(())
    }

    /// Names of the slots filled so far, in fill order.
    pub fn slots_filled(&self) -> &[String] {
        &self.slots_filled
    }

    /// Total bytes written.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Get the current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        match self.state {
            SinkState::Initial => LifecyclePhase::Start,
            SinkState::ShellSent => match self.slots_filled.last() {
                Some(name) => LifecyclePhase::SlotFilled(name.clone()),
                None => LifecyclePhase::ShellSent,
            },
            SinkState::Completed => LifecyclePhase::Completion,
        }
    }

    /// Get timing context reference.
    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    /// Consume the sink and return the inner value.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn ensure_open(&self) -> Result<(), WorkloadError> {
        match self.state {
            SinkState::Initial => Err(WorkloadError::ShellNotSent),
            SinkState::Completed => Err(WorkloadError::StreamError(
                "Sink already completed".to_string(),
            )),
            SinkState::ShellSent => Ok(()),
        }
    }

    async fn write(&mut self, bytes: Vec<u8>, flush: bool) -> Result<(), WorkloadError> {
        let len = bytes.len();
        let result = if flush {
            self.inner.send(bytes).await
        } else {
            self.inner.feed(bytes).await
        };
        result.map_err(|e| WorkloadError::StreamError(e.to_string()))?;
        self.bytes_sent += len;
        Ok(())
    }
}
