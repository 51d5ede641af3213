//! Outbound HTTP transports.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;

use crate::client::FetchError;

/// A raw HTTP response: status and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A 200 response with a JSON body.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into().into_bytes(),
        }
    }

    /// An empty response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// The seam every outbound GET goes through.
///
/// Components run single-threaded, so implementations are not required to
/// be `Send`.
#[async_trait(?Send)]
pub trait HttpTransport {
    /// Issue a GET. Only transport-level failures are errors; any status
    /// code that came back is returned as a response.
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Spin outbound HTTP.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinTransport;

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl HttpTransport for SpinTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let req = spin_sdk::http::Request::get(url).build();
        let resp: spin_sdk::http::Response = spin_sdk::http::send(req)
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        Ok(HttpResponse {
            status: *resp.status(),
            body: resp.body().to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
enum Fixture {
    Respond(HttpResponse),
    Fail(String),
}

/// Fixture responses keyed by exact URL.
///
/// Unknown URLs answer 404. Every call is counted per URL, and a fixture can
/// be told to stay pending for a number of polls so tests can control the
/// order in which concurrent requests settle.
#[derive(Debug, Default)]
pub struct StaticTransport {
    fixtures: RefCell<HashMap<String, Fixture>>,
    delays: RefCell<HashMap<String, usize>>,
    calls: RefCell<HashMap<String, usize>>,
}

impl StaticTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `url` with a 200 JSON body.
    pub fn with_json(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.set(url, HttpResponse::json(body));
        self
    }

    /// Respond to `url` with a bare status.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.set(url, HttpResponse::status(status));
        self
    }

    /// Fail requests to `url` at the connection level.
    pub fn with_connection_error(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.fixtures
            .borrow_mut()
            .insert(url.into(), Fixture::Fail(message.into()));
        self
    }

    /// Stay pending for `polls` polls before answering `url`.
    pub fn with_delay(self, url: impl Into<String>, polls: usize) -> Self {
        self.delays.borrow_mut().insert(url.into(), polls);
        self
    }

    /// Replace the response for `url`. Usable after the transport is shared.
    pub fn set(&self, url: impl Into<String>, response: HttpResponse) {
        self.fixtures
            .borrow_mut()
            .insert(url.into(), Fixture::Respond(response));
    }

    /// Number of GETs issued for `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.calls.borrow().get(url).copied().unwrap_or(0)
    }

    /// Number of GETs issued overall.
    pub fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }
}

#[async_trait(?Send)]
impl HttpTransport for StaticTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        *self.calls.borrow_mut().entry(url.to_string()).or_insert(0) += 1;

        let polls = self.delays.borrow().get(url).copied().unwrap_or(0);
        YieldNow { remaining: polls }.await;

        let fixture = self.fixtures.borrow().get(url).cloned();
        match fixture {
            Some(Fixture::Respond(resp)) => Ok(resp),
            Some(Fixture::Fail(message)) => Err(FetchError::Connection(message)),
            None => Ok(HttpResponse::status(404)),
        }
    }
}

/// Returns `Pending` a fixed number of times, waking itself each time.
struct YieldNow {
    remaining: usize,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
