//! Stream relay endpoint
//!
//! Fetches an upstream media URL on the client's behalf, attaching the
//! referer the host requires, and streams the body straight through.
//! Targets on loopback or local networks are refused so the relay cannot
//! be used to reach things only the server can see.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use serde::Deserialize;
use tracing::debug;
use url::{Host, Url};

use crate::errors::{WebError, WebResult};
use crate::fetch::random_user_agent;

use super::AppState;

const PASSTHROUGH_HEADERS: [&str; 3] = ["content-length", "content-range", "accept-ranges"];

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
    pub referer: Option<String>,
}

pub async fn proxy_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ProxyParams>,
) -> WebResult<Response> {
    let url = params
        .url
        .as_deref()
        .filter(|url| !url.is_empty())
        .ok_or_else(|| WebError::invalid_request("url", "Missing url parameter"))?;
    let target =
        Url::parse(url).map_err(|_| WebError::invalid_request("url", "Invalid URL format"))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(WebError::invalid_request(
            "url",
            "Invalid protocol. Only HTTP/HTTPS allowed.",
        ));
    }
    if forbidden_target(&target) {
        return Err(WebError::forbidden_target(target.as_str()));
    }

    debug!(url = %target, "relaying stream");
    let mut request = state
        .proxy_client
        .get(target.as_str())
        .header("User-Agent", random_user_agent())
        .header("Accept", "*/*");
    if let Some(referer) = params.referer.as_deref().filter(|referer| !referer.is_empty()) {
        request = request.header("Referer", referer);
    }
    if let Some(range) = headers.get("range").and_then(|value| value.to_str().ok()) {
        request = request.header("Range", range);
    }

    let upstream = request
        .send()
        .await
        .map_err(|err| WebError::upstream_failed(format!("{target}: {err}")))?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("video/mp4")
        .to_string();

    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", content_type);
    for name in PASSTHROUGH_HEADERS {
        if let Some(value) = upstream
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
        {
            builder = builder.header(name, value.to_string());
        }
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|err| WebError::upstream_failed(format!("response build for {target}: {err}")))
}

/// Loopback, unspecified and `.local`/`localhost` targets are off limits
fn forbidden_target(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".local")
        }
        Some(Host::Ipv4(ip)) => ip.is_loopback() || ip.is_unspecified(),
        Some(Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forbidden(url: &str) -> bool {
        forbidden_target(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_loopback_and_local_targets_are_forbidden() {
        assert!(forbidden("http://localhost/admin"));
        assert!(forbidden("http://LOCALHOST:8080/admin"));
        assert!(forbidden("http://127.0.0.1/admin"));
        assert!(forbidden("http://127.8.8.8/x"));
        assert!(forbidden("http://0.0.0.0/x"));
        assert!(forbidden("http://[::1]/x"));
        assert!(forbidden("http://[::]/x"));
        assert!(forbidden("http://media.local/x"));
    }

    #[test]
    fn test_public_targets_are_allowed() {
        assert!(!forbidden("https://cdn.example.com/v.mp4"));
        assert!(!forbidden("http://93.184.216.34/v.mp4"));
        assert!(!forbidden("https://edge.localcdn.net/v.m3u8"));
    }
}
