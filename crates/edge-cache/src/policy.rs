//! Route-level cache policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cache scope determining who can cache the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Cacheable by CDN and browser (shared cache).
    Public,
    /// Cacheable by browser only (private cache).
    Private,
    /// No caching.
    #[default]
    None,
}

impl CacheScope {
    /// Get the Cache-Control directive for this scope.
    pub fn cache_control_directive(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::None => "no-store",
        }
    }
}

/// Route-level cache policy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteCachePolicy {
    /// Cache scope.
    pub scope: CacheScope,
    /// Time-to-live for cached responses.
    pub ttl: Duration,
    /// Stale-while-revalidate window.
    pub stale_while_revalidate: Option<Duration>,
    /// Stale-if-error window.
    pub stale_if_error: Option<Duration>,
    /// Cache tags for purging.
    pub tags: Vec<String>,
}

impl RouteCachePolicy {
    /// A policy that forbids caching. Used for error pages.
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a public cache policy.
    pub fn public(ttl: Duration) -> Self {
        Self {
            scope: CacheScope::Public,
            ttl,
            ..Default::default()
        }
    }

    /// Create a private cache policy.
    pub fn private(ttl: Duration) -> Self {
        Self {
            scope: CacheScope::Private,
            ttl,
            ..Default::default()
        }
    }

    /// Set stale-while-revalidate window.
    pub fn with_swr(mut self, duration: Duration) -> Self {
        self.stale_while_revalidate = Some(duration);
        self
    }

    /// Set stale-if-error window.
    pub fn with_stale_if_error(mut self, duration: Duration) -> Self {
        self.stale_if_error = Some(duration);
        self
    }

    /// Add a cache tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Generate Cache-Control header value.
    pub fn cache_control_header(&self) -> String {
        if self.scope == CacheScope::None {
            return "no-store".to_string();
        }

        let mut parts = vec![self.scope.cache_control_directive().to_string()];

        parts.push(format!("max-age={}", self.ttl.as_secs()));

        if let Some(swr) = self.stale_while_revalidate {
            parts.push(format!("stale-while-revalidate={}", swr.as_secs()));
        }

        if let Some(sie) = self.stale_if_error {
            parts.push(format!("stale-if-error={}", sie.as_secs()));
        }

        parts.join(", ")
    }

    /// Generate the cache tags header value, if any tags are set.
    pub fn tags_header(&self) -> Option<String> {
        if self.tags.is_empty() {
            None
        } else {
            Some(self.tags.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_cache_control() {
        let policy = RouteCachePolicy::public(Duration::from_secs(300))
            .with_swr(Duration::from_secs(60));

        assert_eq!(
            policy.cache_control_header(),
            "public, max-age=300, stale-while-revalidate=60"
        );
    }

    #[test]
    fn test_none_is_no_store() {
        let policy = RouteCachePolicy::none().with_tag("pdp");
        assert_eq!(policy.cache_control_header(), "no-store");
    }

    #[test]
    fn test_stale_if_error_directive() {
        let policy = RouteCachePolicy::private(Duration::from_secs(10))
            .with_stale_if_error(Duration::from_secs(600));
        assert_eq!(
            policy.cache_control_header(),
            "private, max-age=10, stale-if-error=600"
        );
    }

    #[test]
    fn test_tags_header() {
        assert_eq!(RouteCachePolicy::public(Duration::ZERO).tags_header(), None);

        let policy = RouteCachePolicy::public(Duration::ZERO)
            .with_tag("pdp")
            .with_tag("product:42");
        assert_eq!(policy.tags_header().as_deref(), Some("pdp, product:42"));
    }
}
