//! Response cache headers.

use crate::policy::RouteCachePolicy;
use crate::store::CacheStatus;

/// Header names.
pub mod header_names {
    pub const CACHE_CONTROL: &str = "cache-control";
    /// Cache tags for purging.
    pub const X_CACHE_TAGS: &str = "x-cache-tags";
    /// How the primary record was obtained (HIT, MISS, STALE).
    pub const X_CACHE_STATUS: &str = "x-cache-status";
    /// Request ID for tracing.
    pub const X_REQUEST_ID: &str = "x-request-id";
}

/// Builder for cache response headers.
#[derive(Debug, Default)]
pub struct CacheHeadersBuilder {
    cache_control: Option<String>,
    tags: Option<String>,
    status: Option<CacheStatus>,
    request_id: Option<String>,
}

impl CacheHeadersBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Cache-Control and tags from a route policy.
    pub fn policy(mut self, policy: &RouteCachePolicy) -> Self {
        self.cache_control = Some(policy.cache_control_header());
        self.tags = policy.tags_header();
        self
    }

    /// Report how the primary record was obtained.
    pub fn status(mut self, status: CacheStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Echo the request ID.
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Build the headers.
    pub fn build(self) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if let Some(cc) = self.cache_control {
            headers.push((header_names::CACHE_CONTROL.to_string(), cc));
        }

        if let Some(tags) = self.tags {
            headers.push((header_names::X_CACHE_TAGS.to_string(), tags));
        }

        if let Some(status) = self.status {
            headers.push((header_names::X_CACHE_STATUS.to_string(), status.to_string()));
        }

        if let Some(id) = self.request_id {
            headers.push((header_names::X_REQUEST_ID.to_string(), id));
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn get<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_builds_from_policy() {
        let policy = RouteCachePolicy::public(Duration::from_secs(300))
            .with_swr(Duration::from_secs(60))
            .with_tag("pdp");
        let headers = CacheHeadersBuilder::new()
            .policy(&policy)
            .status(CacheStatus::Hit)
            .request_id("abc")
            .build();

        assert_eq!(
            get(&headers, "cache-control"),
            Some("public, max-age=300, stale-while-revalidate=60")
        );
        assert_eq!(get(&headers, "x-cache-tags"), Some("pdp"));
        assert_eq!(get(&headers, "x-cache-status"), Some("HIT"));
        assert_eq!(get(&headers, "x-request-id"), Some("abc"));
    }

    #[test]
    fn test_omits_unset_headers() {
        let headers = CacheHeadersBuilder::new()
            .policy(&RouteCachePolicy::none())
            .build();

        assert_eq!(headers.len(), 1);
        assert_eq!(get(&headers, "cache-control"), Some("no-store"));
    }
}
