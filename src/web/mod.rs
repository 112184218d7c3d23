//! HTTP layer
//!
//! The addon wire protocol, the stream relay, and a small admin API on one
//! router. Handlers stay thin: catalog, metadata and stream requests go
//! straight to the provider facade, which owns caching and degradation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::cache::CacheService;
use crate::config::Config;
use crate::errors::WebError;
use crate::fetch::PageFetch;
use crate::providers::ProviderFacade;

pub mod api;
pub mod protocol;
pub mod proxy;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<ProviderFacade>,
    pub cache: CacheService,
    pub config: Arc<Config>,
    pub proxy_client: reqwest::Client,
    /// Public base URL for relay rewriting, `None` when not configured
    pub proxy_base: Option<String>,
    pub started_at: DateTime<Utc>,
}

/// Maps web-layer failures onto wire responses. Relay rejections get a
/// terse body so callers cannot probe which internal hosts exist.
impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebError::InvalidRequest { message, .. } => (StatusCode::BAD_REQUEST, message),
            WebError::ForbiddenTarget { url } => {
                warn!("Refused relay request for {}", url);
                (StatusCode::FORBIDDEN, "Forbidden network target".to_string())
            }
            WebError::UpstreamFailed { message } => {
                error!("Stream relay upstream failure: {}", message);
                (StatusCode::BAD_GATEWAY, "Failed to proxy stream".to_string())
            }
            WebError::JsonParse(err) => {
                error!("Failed to serialize response body: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub async fn new(
        config: Config,
        fetcher: Arc<dyn PageFetch>,
        cache: CacheService,
    ) -> Result<Self> {
        let proxy_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch.proxy_timeout_seconds.max(1)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        let base = config.web.base_url.trim();
        let proxy_base = (!base.is_empty()).then(|| base.trim_end_matches('/').to_string());

        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;

        let app = Self::create_router(AppState {
            providers: Arc::new(ProviderFacade::new(fetcher, cache.clone())),
            cache,
            config: Arc::new(config),
            proxy_client,
            proxy_base,
            started_at: Utc::now(),
        });

        Ok(Self { app, addr })
    }

    /// Addon clients request `<resource>/<type>/<id>.json`; the router
    /// matches without the suffix and handlers strip it from the tail
    /// segment themselves.
    fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/manifest.json", get(protocol::manifest))
            .route("/catalog/:type/:id", get(protocol::catalog))
            .route("/catalog/:type/:id/:extra", get(protocol::catalog_with_extra))
            .route("/meta/:type/:id", get(protocol::meta))
            .route("/stream/:type/:id", get(protocol::stream))
            .route("/proxy/stream", get(proxy::proxy_stream))
            .route("/api/status", get(api::status))
            .route("/api/catalogs", get(api::catalogs))
            .route("/api/catalog/:id", get(api::api_catalog))
            .route("/api/meta/:id", get(api::api_meta))
            .route("/api/cache/clear", post(api::cache_clear))
            .route("/health", get(api::health))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Router clone for in-process testing without a listener
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}
