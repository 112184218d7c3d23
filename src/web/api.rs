//! Dashboard and admin endpoints
//!
//! Small JSON surface for poking at the service without an addon client:
//! status and cache counters, the catalog table with ready-made URLs, raw
//! catalog/metadata lookups, and a cache flush.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::WebResult;
use crate::providers::{build_manifest, SITES};

use super::AppState;

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let manifest = build_manifest();
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": (Utc::now() - state.started_at).num_seconds(),
        "providers": SITES.iter().map(|site| site.id).collect::<Vec<_>>(),
        "catalogs": manifest.catalogs.len(),
        "cache": state.cache.stats(),
        "endpoints": {
            "manifest": "/manifest.json",
            "catalog": "/catalog/movie/{id}.json",
            "meta": "/meta/movie/{id}.json",
            "stream": "/stream/movie/{id}.json",
            "proxy": "/proxy/stream?url={url}&referer={referer}"
        }
    }))
}

/// Catalog table with per-catalog sample URLs, for wiring up a client by hand
pub async fn catalogs() -> Json<Value> {
    let sites: Vec<Value> = SITES
        .iter()
        .map(|site| {
            json!({
                "id": site.id,
                "name": site.label,
                "baseUrl": site.base_url,
                "itemsPerPage": site.items_per_page,
                "search": format!(
                    "/catalog/movie/{}-search/search={{query}}.json",
                    site.id
                ),
                "catalogs": site
                    .catalogs
                    .iter()
                    .map(|catalog| {
                        json!({
                            "id": catalog.id,
                            "name": catalog.name,
                            "url": format!("/catalog/movie/{}.json", catalog.id),
                        })
                    })
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    Json(json!({ "sites": sites }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiCatalogQuery {
    pub skip: Option<usize>,
    pub search: Option<String>,
}

/// Raw item list for one catalog id, bypassing the wire envelope
pub async fn api_catalog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ApiCatalogQuery>,
) -> WebResult<Json<Value>> {
    let skip = query.skip.unwrap_or(0);
    let items = match query.search.as_deref().filter(|q| !q.is_empty()) {
        Some(search) => state.providers.search(&id, search, skip).await,
        None => state.providers.list_catalog(&id, skip).await,
    };
    Ok(Json(serde_json::to_value(items)?))
}

pub async fn api_meta(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<Value>> {
    let meta = state.providers.get_detail(&id).await;
    Ok(Json(serde_json::to_value(meta)?))
}

pub async fn cache_clear(State(state): State<AppState>) -> Json<Value> {
    state.cache.flush_all();
    info!("cache flushed via admin endpoint");
    Json(json!({ "success": true }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
