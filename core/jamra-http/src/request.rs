//! Request options recognized by the HTTP capability.

use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// HTTP method for a capability request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
        }
    }
}

/// Request body payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Serialized as JSON with a `application/json` content type.
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// Options for one capability request. `Default` is a GET with no extra
/// headers, no query, no body, the client's default timeout, and no
/// cancellation token.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    /// Flattened into the URL's query string, appended after any pairs the
    /// URL already carries.
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Overrides the client's default timeout for this request.
    pub timeout: Option<Duration>,
    /// Cooperative cancellation; races the timeout.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
