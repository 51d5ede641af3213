//! Retry policies for fetch operations.

use serde::{Deserialize, Serialize};

use crate::client::FetchError;

/// Conditions that trigger a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryCondition {
    /// Retry on specific HTTP status code.
    StatusCode(u16),
    /// Retry on any 5xx status.
    ServerError,
    /// Retry when no response came back.
    ConnectionError,
}

impl RetryCondition {
    /// Check if an error matches this condition.
    pub fn matches(&self, error: &FetchError) -> bool {
        match (self, error) {
            (Self::StatusCode(code), FetchError::Http { status, .. }) => status == code,
            (Self::ServerError, FetchError::Http { status, .. }) => (500..600).contains(status),
            (Self::ConnectionError, FetchError::Connection(_)) => true,
            _ => false,
        }
    }
}

/// Retry policy configuration.
///
/// Attempts are immediate; a component has no timer to back off on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Conditions that trigger retry.
    #[serde(default = "default_conditions")]
    pub retry_on: Vec<RetryCondition>,
}

fn default_conditions() -> Vec<RetryCondition> {
    vec![RetryCondition::ServerError, RetryCondition::ConnectionError]
}

impl RetryPolicy {
    /// Retry server errors and connection failures up to `max_retries` times.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            retry_on: default_conditions(),
        }
    }

    /// Create a policy with no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            retry_on: Vec::new(),
        }
    }

    /// Set retry conditions.
    pub fn with_conditions(mut self, conditions: Vec<RetryCondition>) -> Self {
        self.retry_on = conditions;
        self
    }

    /// Whether attempt number `attempt` (0-indexed) that failed with
    /// `error` should be followed by another.
    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        self.retry_on.iter().any(|c| c.matches(error))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}
