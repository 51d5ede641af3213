//! Fetch client with dependency tagging.

use std::rc::Rc;

use edge_core::RequestId;
use serde::de::DeserializeOwned;

use crate::dependency::DependencyTag;
use crate::transport::HttpTransport;

/// Error type for fetch operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl FetchError {
    /// The upstream answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// HTTP status, when the upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Platform-controlled fetch client.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct FetchClient {
    transport: Rc<dyn HttpTransport>,
    request_id: RequestId,
}

impl FetchClient {
    /// Create a new fetch client over a transport.
    pub fn new(transport: Rc<dyn HttpTransport>, request_id: RequestId) -> Self {
        Self {
            transport,
            request_id,
        }
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Any status >= 400 is an error; the body is not inspected.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        tag: DependencyTag,
    ) -> Result<T, FetchError> {
        let resp = self.transport.get(url).await?;

        if resp.status >= 400 {
            return Err(FetchError::Http {
                status: resp.status,
                url: url.to_string(),
            });
        }

        serde_json::from_slice(&resp.body)
            .map_err(|e| FetchError::Deserialization(format!("{} ({}): {}", url, tag, e)))
    }

    /// Get the request ID.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StaticTransport;
    use futures::executor::block_on;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    fn client(transport: StaticTransport) -> FetchClient {
        FetchClient::new(Rc::new(transport), RequestId::from_string("req-1"))
    }

    #[test]
    fn test_decodes_json_body() {
        let client = client(StaticTransport::new().with_json("http://api/x", r#"{"id":"7"}"#));
        let item: Item = block_on(client.get_json("http://api/x", DependencyTag::Catalog)).unwrap();
        assert_eq!(item, Item { id: "7".into() });
    }

    #[test]
    fn test_status_maps_to_http_error() {
        let client = client(StaticTransport::new().with_status("http://api/x", 503));
        let err = block_on(client.get_json::<Item>("http://api/x", DependencyTag::Catalog))
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_missing_fixture_is_not_found() {
        let client = client(StaticTransport::new());
        let err = block_on(client.get_json::<Item>("http://api/nope", DependencyTag::Reviews))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_bad_body_is_deserialization_error() {
        let client = client(StaticTransport::new().with_json("http://api/x", "not json"));
        let err = block_on(client.get_json::<Item>("http://api/x", DependencyTag::Catalog))
            .unwrap_err();

        assert!(matches!(err, FetchError::Deserialization(ref m) if m.contains("catalog")));
        assert_eq!(err.status(), None);
    }
}
