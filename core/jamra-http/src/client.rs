//! Default [`HttpRequester`] implementation over reqwest.

use crate::request::{RequestBody, RequestOptions};
use crate::response::decode_body;
use crate::{HttpError, HttpRequester, HttpResponse, HttpResult};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("Jamra/", env!("CARGO_PKG_VERSION"));

/// HTTP client the host constructs for extension contexts.
///
/// Every request carries the Jamra user agent and is bounded by a timeout —
/// either the per-request override or the client default. The client itself
/// is cheap to clone (reqwest pools connections internally).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HttpClient {
    pub fn new() -> HttpResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Client whose default per-request timeout is `timeout`.
    pub fn with_timeout(timeout: Duration) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(HttpError::ClientBuild)?;
        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    fn map_transport(url: &str, timeout: Duration, err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }
        } else {
            HttpError::Transport(err)
        }
    }
}

#[async_trait]
impl HttpRequester for HttpClient {
    async fn request(&self, url: &str, options: RequestOptions) -> HttpResult<HttpResponse> {
        let mut parsed = reqwest::Url::parse(url)
            .map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;
        if !options.query.is_empty() {
            let mut pairs = parsed.query_pairs_mut();
            for (name, value) in &options.query {
                pairs.append_pair(name, value);
            }
        }

        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let mut builder = self
            .client
            .request(options.method.as_reqwest(), parsed.clone())
            .timeout(timeout);

        for (name, value) in &options.headers {
            let header_name =
                HeaderName::try_from(name.as_str()).map_err(|e| HttpError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::try_from(value.as_str()).map_err(|e| HttpError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            builder = builder.header(header_name, header_value);
        }

        match options.body {
            Some(RequestBody::Json(ref value)) => builder = builder.json(value),
            Some(RequestBody::Text(text)) => builder = builder.body(text),
            Some(RequestBody::Bytes(bytes)) => builder = builder.body(bytes),
            None => {}
        }

        debug!(url = %parsed, method = ?options.method, "dispatching upstream request");

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, bytes))
        };

        // A cancellation that ties with completion is reported as cancelled:
        // the caller already stopped caring about the result.
        let result = match &options.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    return Err(HttpError::Cancelled {
                        url: url.to_string(),
                    });
                }
                result = exchange => result,
            },
            None => exchange.await,
        };

        let (status, headers, bytes) =
            result.map_err(|e| Self::map_transport(url, timeout, e))?;

        let content_type = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone());
        let body = decode_body(url, content_type.as_deref(), bytes.to_vec())?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
