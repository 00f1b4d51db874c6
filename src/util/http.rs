//! Shared HTTP client, SSE parsing, and auth utilities.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::GenieError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(300))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Build default headers for a Bearer-token API.
///
/// A token that cannot travel in a header (control characters, newlines) is
/// a [`GenieError::Configuration`]; the token itself is never echoed.
pub fn bearer_headers(token: &str) -> Result<HeaderMap, GenieError> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        GenieError::Configuration("credential contains characters not allowed in a header".into())
    })?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(AUTHORIZATION, auth);
    Ok(headers)
}

/// Turn a non-2xx response into [`GenieError::Protocol`], passing 2xx through.
pub async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, GenieError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    };
    Err(GenieError::protocol(status.as_u16(), message))
}

pub fn trim_trailing_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// One line of a server-sent event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    Event(&'a str),
    Data(&'a str),
}

/// Classify an SSE line, ignoring comments and unknown fields.
pub fn parse_sse_line(line: &str) -> Option<SseLine<'_>> {
    if let Some(event) = line.strip_prefix("event:") {
        return Some(SseLine::Event(event.trim()));
    }
    line.strip_prefix("data:")
        .map(|data| SseLine::Data(data.strip_prefix(' ').unwrap_or(data)))
}
