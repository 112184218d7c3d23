use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The single content type this bridge serves
pub const MEDIA_TYPE: &str = "movie";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailMetadata {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<Vec<String>>,
}

/// How a resolved stream can be played
///
/// Exactly one variant is populated per stream: either a direct media URL
/// the client can fetch, or a page URL the user must open in a browser.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamKind {
    Direct { url: String },
    External { url: String },
}

/// A playable result produced by the embed resolution engine
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStream {
    pub name: String,
    pub kind: StreamKind,
    pub quality: Option<String>,
    pub referer: Option<String>,
}

impl ResolvedStream {
    pub fn direct<N: Into<String>, U: Into<String>>(name: N, url: U) -> Self {
        Self {
            name: name.into(),
            kind: StreamKind::Direct { url: url.into() },
            quality: None,
            referer: None,
        }
    }

    pub fn external<N: Into<String>, U: Into<String>>(name: N, url: U) -> Self {
        Self {
            name: name.into(),
            kind: StreamKind::External { url: url.into() },
            quality: None,
            referer: None,
        }
    }

    pub fn with_quality<Q: Into<String>>(mut self, quality: Q) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn with_referer<R: Into<String>>(mut self, referer: R) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// The URL used for deduplication, regardless of kind
    pub fn dedup_url(&self) -> &str {
        match &self.kind {
            StreamKind::Direct { url } => url,
            StreamKind::External { url } => url,
        }
    }
}

/// Wire-protocol stream object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior_hints: Option<StreamBehaviorHints>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamBehaviorHints {
    pub not_web_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_headers: Option<ProxyHeaders>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyHeaders {
    pub request: HashMap<String, String>,
}

impl Stream {
    /// Build the wire object for a resolved stream.
    ///
    /// Direct streams that require a referer are marked not-web-ready and
    /// carry the header in `proxyHeaders`; when `proxy_base` is configured
    /// the URL is rewritten through the relay endpoint instead so clients
    /// without custom-header support can play them.
    pub fn from_resolved(resolved: &ResolvedStream, proxy_base: Option<&str>) -> Self {
        let title = match resolved.kind {
            StreamKind::External { .. } => format!("{} - Open in Browser", resolved.name),
            StreamKind::Direct { .. } => match &resolved.quality {
                Some(q) => format!("{} - {}", resolved.name, q),
                None => resolved.name.clone(),
            },
        };

        match &resolved.kind {
            StreamKind::External { url } => Self {
                name: resolved.name.clone(),
                title,
                url: None,
                external_url: Some(url.clone()),
                behavior_hints: None,
            },
            StreamKind::Direct { url } => {
                if let (Some(base), Some(referer)) = (proxy_base, resolved.referer.as_deref()) {
                    let proxied = format!(
                        "{}/proxy/stream?url={}&referer={}",
                        base.trim_end_matches('/'),
                        urlencoding::encode(url),
                        urlencoding::encode(referer)
                    );
                    Self {
                        name: resolved.name.clone(),
                        title,
                        url: Some(proxied),
                        external_url: None,
                        behavior_hints: Some(StreamBehaviorHints {
                            not_web_ready: false,
                            proxy_headers: None,
                        }),
                    }
                } else {
                    let proxy_headers = resolved.referer.as_ref().map(|referer| ProxyHeaders {
                        request: HashMap::from([(String::from("Referer"), referer.clone())]),
                    });
                    Self {
                        name: resolved.name.clone(),
                        title,
                        url: Some(url.clone()),
                        external_url: None,
                        behavior_hints: Some(StreamBehaviorHints {
                            not_web_ready: resolved.referer.is_some(),
                            proxy_headers,
                        }),
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub resources: Vec<String>,
    pub types: Vec<String>,
    pub catalogs: Vec<ManifestCatalog>,
    pub id_prefixes: Vec<String>,
    pub behavior_hints: ManifestBehaviorHints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestCatalog {
    #[serde(rename = "type")]
    pub media_type: String,
    pub id: String,
    pub name: String,
    pub extra: Vec<ExtraProp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraProp {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
}

impl ExtraProp {
    pub fn required<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            is_required: Some(true),
        }
    }

    pub fn optional<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            is_required: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestBehaviorHints {
    pub adult: bool,
    pub configurable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub metas: Vec<CatalogItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaResponse {
    pub meta: Option<DetailMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamsResponse {
    pub streams: Vec<Stream>,
}
