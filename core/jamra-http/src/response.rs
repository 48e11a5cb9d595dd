//! Response shape and content-type-driven body decoding.

use crate::{HttpError, HttpResult};
use serde_json::Value;

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    /// Upstream declared a JSON content type; parsed eagerly.
    Json(Value),
    /// Upstream declared a textual content type.
    Text(String),
    /// Anything else (images, archives, …) stays raw.
    Bytes(Vec<u8>),
}

/// Response returned by the HTTP capability.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: HttpBody,
}

/// True for `application/json` and structured-syntax suffixes like
/// `application/vnd.api+json`.
fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    essence.ends_with("/json") || essence.ends_with("+json")
}

fn is_text(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("text/")
        || matches!(
            essence.as_str(),
            "application/xml" | "application/xhtml+xml" | "application/javascript"
        )
}

pub(crate) fn decode_body(
    url: &str,
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> HttpResult<HttpBody> {
    match content_type {
        Some(ct) if is_json(ct) => {
            let value: Value =
                serde_json::from_slice(&bytes).map_err(|e| HttpError::Decode {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(HttpBody::Json(value))
        }
        Some(ct) if is_text(ct) => Ok(HttpBody::Text(String::from_utf8_lossy(&bytes).into_owned())),
        _ => Ok(HttpBody::Bytes(bytes)),
    }
}
