//! Axum web server.
//!
//! The two cache endpoints are the system boundary the rest of the
//! application talks to; `/graph` serves the assembled payload the
//! rendering frontend consumes. Operational failures come back as
//! structured `success: false` envelopes, never raw stack traces; bad
//! requests (unknown source) are rejected with a 400 before any store
//! access.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Settings;
use crate::error::OntologyError;
use crate::graph::{GraphAssembler, SchemaGraph};
use crate::metadata::{MetadataProvider, ProviderRegistry};
use crate::service::{shared, CacheQueryService, CacheRefreshService, CacheStatus, SharedStore};
use crate::store::OntologyCacheStore;

/// Application state shared across handlers.
pub struct AppState {
    registry: Arc<ProviderRegistry>,
    refresh: CacheRefreshService,
    query: CacheQueryService,
    assembler: GraphAssembler,
}

impl AppState {
    /// Wire up services over a registry and a store handle.
    pub fn new(registry: Arc<ProviderRegistry>, store: SharedStore) -> Self {
        Self::with_min_confidence(registry, store, crate::discovery::thresholds::MIN_PERSIST)
    }

    /// Wire up services with a configured persistence cutoff.
    pub fn with_min_confidence(
        registry: Arc<ProviderRegistry>,
        store: SharedStore,
        min_confidence: f64,
    ) -> Self {
        let provider: Arc<dyn MetadataProvider> = registry.clone();
        Self {
            registry,
            refresh: CacheRefreshService::with_min_confidence(provider, store.clone(), min_confidence),
            query: CacheQueryService::new(store),
            assembler: GraphAssembler::new(),
        }
    }
}

/// Build the axum router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache/status", get(cache_status))
        .route("/cache/refresh", post(cache_refresh))
        .route("/graph", get(graph))
        .layer(cors)
        .with_state(state)
}

/// Start the web server.
pub async fn serve(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let store = match &settings.cache.path {
        Some(path) => OntologyCacheStore::open_at(path)?,
        None => OntologyCacheStore::open()?,
    };
    let registry = Arc::new(settings.build_registry()?);
    let sources = registry.known_sources();

    let state = Arc::new(AppState::with_min_confidence(
        registry,
        shared(store),
        settings.discovery.min_confidence,
    ));
    let app = router(state);

    let addr = format!("127.0.0.1:{}", settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("schemalens");
    println!("   URL: http://localhost:{}", settings.server.port);
    println!("   Sources: {}", sources.join(", "));
    println!();
    println!("   Press Ctrl+C to stop");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct SourceQuery {
    source: String,
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
    source: String,
    cache: CachePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize, Default)]
struct CachePayload {
    cache_valid: bool,
    total_relationships: usize,
    high_confidence: usize,
    manually_verified: usize,
    last_discovery: Option<String>,
}

impl From<CacheStatus> for CachePayload {
    fn from(status: CacheStatus) -> Self {
        CachePayload {
            cache_valid: status.cache_valid,
            total_relationships: status.total_relationships,
            high_confidence: status.high_confidence,
            manually_verified: status.manually_verified,
            last_discovery: status
                .last_discovery
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

#[derive(Deserialize)]
struct RefreshRequest {
    source: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<RefreshStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct RefreshStatistics {
    cleared: usize,
    discovered: usize,
    inserted: usize,
    updated: usize,
    discovery_time_ms: f64,
}

#[derive(Serialize)]
struct GraphResponse {
    success: bool,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    graph: Option<SchemaGraph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /cache/status?source=<source_id> - Cache health for one source.
///
/// Degrades gracefully: store failures come back as `cache_valid: false`
/// with a reason instead of failing the whole page.
async fn cache_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourceQuery>,
) -> Json<StatusResponse> {
    match state.query.status(&params.source).await {
        Ok(status) => Json(StatusResponse {
            success: true,
            source: params.source,
            cache: status.into(),
            error: None,
        }),
        Err(e) => {
            log::error!("status query failed for '{}': {}", params.source, e);
            Json(StatusResponse {
                success: false,
                source: params.source,
                cache: CachePayload::default(),
                error: Some(e.to_string()),
            })
        }
    }
}

/// POST /cache/refresh - Recompute and swap the cache for one source.
async fn cache_refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, (StatusCode, String)> {
    match state.refresh.refresh(&req.source).await {
        Ok(result) => {
            let rounded = (result.discovery_time_ms * 100.0).round() / 100.0;
            Ok(Json(RefreshResponse {
                success: true,
                statistics: Some(RefreshStatistics {
                    cleared: result.cleared,
                    discovered: result.discovered,
                    inserted: result.inserted,
                    updated: result.updated,
                    discovery_time_ms: rounded,
                }),
                message: Some(format!(
                    "Cache refreshed successfully. Discovered {} relationships in {}ms",
                    result.discovered,
                    result.discovery_time_ms.round() as u64
                )),
                error: None,
            }))
        }
        Err(OntologyError::InvalidSourceId(id)) => Err((
            StatusCode::BAD_REQUEST,
            format!(
                "unknown source '{}'; configured sources: {}",
                id,
                state.registry.known_sources().join(", ")
            ),
        )),
        Err(e) => Ok(Json(RefreshResponse {
            success: false,
            statistics: None,
            message: None,
            error: Some(e.to_string()),
        })),
    }
}

/// GET /graph?source=<source_id> - Assembled node/edge payload for the
/// rendering layer, built from fresh entities plus cached edges.
async fn graph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourceQuery>,
) -> Result<Json<GraphResponse>, (StatusCode, String)> {
    let entities = match state.registry.list_entities(&params.source).await {
        Ok(entities) => entities,
        Err(crate::metadata::MetadataError::UnknownSource(id)) => {
            return Err((StatusCode::BAD_REQUEST, format!("unknown source '{}'", id)));
        }
        Err(e) => {
            log::error!("graph assembly failed for '{}': {}", params.source, e);
            return Ok(Json(GraphResponse {
                success: false,
                source: params.source,
                graph: None,
                error: Some(e.to_string()),
            }));
        }
    };

    let edges = match state.query.get_edges(&params.source).await {
        Ok(edges) => edges,
        Err(e) => {
            log::error!("graph assembly failed for '{}': {}", params.source, e);
            return Ok(Json(GraphResponse {
                success: false,
                source: params.source,
                graph: None,
                error: Some(e.to_string()),
            }));
        }
    };

    match state.assembler.assemble(&entities, &edges) {
        Ok(graph) => Ok(Json(GraphResponse {
            success: true,
            source: params.source,
            graph: Some(graph),
            error: None,
        })),
        Err(e @ OntologyError::DuplicateNodeIdentity(_)) => {
            // Data-integrity bug upstream; fail loudly, do not dedupe.
            log::error!("graph assembly failed for '{}': {}", params.source, e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
        Err(e) => {
            log::error!("graph assembly failed for '{}': {}", params.source, e);
            Ok(Json(GraphResponse {
                success: false,
                source: params.source,
                graph: None,
                error: Some(e.to_string()),
            }))
        }
    }
}
