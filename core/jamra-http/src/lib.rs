//! HTTP client capability handed to Jamra extensions.
//!
//! Extensions never touch network primitives directly; they go through
//! [`HttpRequester`], which lets the host enforce identification headers and
//! timeouts uniformly. The capability is deliberately thin:
//! - single-shot requests, no automatic retry (retry policy belongs to the
//!   calling handler)
//! - per-request timeout and a cooperative [`CancellationToken`]; whichever
//!   fires first aborts the in-flight request, and the two surface as
//!   distinct [`HttpError`] variants so "upstream too slow" and "caller gave
//!   up" stay distinguishable
//! - response bodies are decoded by content type: JSON to a parsed
//!   [`Value`], text to a string, everything else to raw bytes

mod client;
mod request;
mod response;

pub use client::HttpClient;
pub use request::{HttpMethod, RequestBody, RequestOptions};
pub use response::{HttpBody, HttpResponse};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result type for HTTP capability operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors surfaced by the HTTP capability.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The per-request (or client default) timeout elapsed first.
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// The caller's cancellation token fired first.
    #[error("request to {url} was cancelled by the caller")]
    Cancelled { url: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Connection, TLS, or protocol failure from the transport.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The upstream declared JSON but the body did not parse as JSON.
    #[error("response from {url} declared JSON but failed to parse: {reason}")]
    Decode { url: String, reason: String },

    #[error("failed to construct http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// Request capability an extension context carries.
///
/// [`HttpClient`] is the host's implementation; embedders supply their own
/// (e.g. a recording stub in tests) by implementing this trait.
#[async_trait]
pub trait HttpRequester: Send + Sync {
    async fn request(&self, url: &str, options: RequestOptions) -> HttpResult<HttpResponse>;

    /// Convenience GET with default options.
    async fn get(&self, url: &str) -> HttpResult<HttpResponse> {
        self.request(url, RequestOptions::default()).await
    }
}

/// Convenience accessor used by handlers that expect a JSON upstream.
impl HttpResponse {
    /// Returns the decoded JSON body, or `None` when the upstream did not
    /// declare a JSON content type.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            HttpBody::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
