//! Addon wire-protocol endpoints
//!
//! The manifest, catalog, meta and stream resources. Clients append `.json`
//! to the last path segment, which axum's router cannot match directly, so
//! each handler strips the suffix itself. Extra catalog arguments arrive
//! either as query parameters or packed into one path segment of
//! percent-encoded `k=v` pairs.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use crate::models::{CatalogResponse, Manifest, MetaResponse, StreamsResponse};
use crate::providers::build_manifest;

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub skip: Option<usize>,
}

pub async fn manifest() -> Json<Manifest> {
    Json(build_manifest())
}

pub async fn catalog(
    State(state): State<AppState>,
    Path((_media_type, id)): Path<(String, String)>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogResponse> {
    let id = strip_json_suffix(&id);
    Json(catalog_response(&state, id, query).await)
}

pub async fn catalog_with_extra(
    State(state): State<AppState>,
    Path((_media_type, id, extra)): Path<(String, String, String)>,
) -> Json<CatalogResponse> {
    let query = parse_extra(strip_json_suffix(&extra));
    Json(catalog_response(&state, &id, query).await)
}

/// Search catalogs require a query and return nothing without one; browse
/// catalogs ignore the search parameter entirely.
async fn catalog_response(state: &AppState, id: &str, query: CatalogQuery) -> CatalogResponse {
    let skip = query.skip.unwrap_or(0);
    let metas = if id.ends_with("-search") {
        match query.search.as_deref().filter(|q| !q.is_empty()) {
            Some(search) => {
                debug!(catalog = %id, query = %search, skip, "search request");
                state.providers.search(id, search, skip).await
            }
            None => Vec::new(),
        }
    } else {
        debug!(catalog = %id, skip, "catalog request");
        state.providers.list_catalog(id, skip).await
    };
    CatalogResponse { metas }
}

pub async fn meta(
    State(state): State<AppState>,
    Path((_media_type, id)): Path<(String, String)>,
) -> Json<MetaResponse> {
    let id = strip_json_suffix(&id);
    Json(MetaResponse {
        meta: state.providers.get_detail(id).await,
    })
}

pub async fn stream(
    State(state): State<AppState>,
    Path((_media_type, id)): Path<(String, String)>,
) -> Json<StreamsResponse> {
    let id = strip_json_suffix(&id);
    Json(StreamsResponse {
        streams: state
            .providers
            .get_streams(id, state.proxy_base.as_deref())
            .await,
    })
}

fn strip_json_suffix(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

/// Split an extra path segment into known catalog arguments. Pairs without
/// `=` and unknown keys are ignored.
fn parse_extra(extra: &str) -> CatalogQuery {
    let mut query = CatalogQuery::default();
    for pair in extra.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = urlencoding::decode(key)
            .map(|k| k.into_owned())
            .unwrap_or_else(|_| key.to_string());
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match key.as_str() {
            "search" => query.search = Some(value),
            "skip" => query.skip = value.parse().ok(),
            _ => {}
        }
    }
    query
}
