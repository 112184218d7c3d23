//! Content identifier codec
//!
//! Maps a source-site URL to an opaque, provider-scoped identifier and back.
//! Identifiers are `<provider>:<base64url(url)>` with no padding, so they are
//! stable, reversible, and safe to embed in URL path segments.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Encode a source URL into a provider-scoped content identifier
pub fn encode(provider: &str, url: &str) -> String {
    format!("{}:{}", provider, URL_SAFE_NO_PAD.encode(url.as_bytes()))
}

/// Decode a content identifier back to its source URL.
///
/// Returns `None` when the identifier belongs to a different provider or the
/// encoded portion is not valid base64url / UTF-8.
pub fn decode(provider: &str, id: &str) -> Option<String> {
    let encoded = id.strip_prefix(provider)?.strip_prefix(':')?;
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

/// Extract the provider namespace from an identifier
pub fn provider_of(id: &str) -> Option<&str> {
    id.split_once(':').map(|(provider, _)| provider)
}
