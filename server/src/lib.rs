//! HTTP API for a Keel cache node.

mod config;
mod logging;
mod peers;

pub use config::{ConfigError, ServerConfig};
pub use logging::{LogControl, LogControlError, LogThreshold, UnrecognizedLogThreshold};
pub use peers::spawn_peer_forwarder;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use keel_dynattr::{CacheInvalidation, CacheUpdate, DynamicAttributesCacheService, InvalidationBus};
use keel_types::HybridTimestamp;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

pub const ATTRIBUTES_ROUTE: &str = "/api/v1/dynamic-attributes";
pub const RELOAD_ROUTE: &str = "/api/v1/dynamic-attributes/reload";
pub const LOG_THRESHOLD_ROUTE: &str = "/api/v1/log-threshold";
pub const INVALIDATE_ROUTE: &str = "/api/v1/cluster/invalidate";

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn DynamicAttributesCacheService>,
    pub bus: InvalidationBus,
    pub log: LogControl,
}

#[derive(Deserialize)]
pub struct SinceQuery {
    pub since: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ThresholdBody {
    pub threshold: String,
}

/// Error reply: `{ "error": message }` with the given status.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn reload_handler(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || service.load_cache())
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .map_err(|e| {
            warn!(error = %e, "Reload requested over HTTP failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn attributes_handler(
    State(state): State<AppState>,
    Query(query): Query<SinceQuery>,
) -> Result<Response, ApiError> {
    let since = match query.since.as_deref() {
        Some(since) => since
            .parse::<HybridTimestamp>()
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e))?,
        None => HybridTimestamp::EPOCH,
    };

    match state.service.get_cache_if_newer(since) {
        CacheUpdate::Newer(snapshot) => Ok(Json(snapshot.as_ref()).into_response()),
        CacheUpdate::Unchanged => Ok(StatusCode::NOT_MODIFIED.into_response()),
    }
}

async fn get_threshold_handler(State(state): State<AppState>) -> Json<ThresholdBody> {
    Json(ThresholdBody {
        threshold: state.log.threshold().to_string(),
    })
}

async fn set_threshold_handler(
    State(state): State<AppState>,
    Json(body): Json<ThresholdBody>,
) -> Result<StatusCode, ApiError> {
    state
        .log
        .set_threshold_str(&body.threshold)
        .map_err(|e| match e {
            LogControlError::Unrecognized(_) => ApiError::new(StatusCode::BAD_REQUEST, e),
            LogControlError::Reload(_) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e),
        })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn invalidate_handler(
    State(state): State<AppState>,
    Json(message): Json<CacheInvalidation>,
) -> StatusCode {
    let listeners = state.bus.publish(message);
    debug!(origin = %message.origin, timestamp = %message.timestamp, listeners, "Received peer invalidation");
    StatusCode::ACCEPTED
}

/// Build the HTTP API router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(ATTRIBUTES_ROUTE, get(attributes_handler))
        .route(RELOAD_ROUTE, post(reload_handler))
        .route(
            LOG_THRESHOLD_ROUTE,
            get(get_threshold_handler).put(set_threshold_handler),
        )
        .route(INVALIDATE_ROUTE, post(invalidate_handler))
        .with_state(state)
}

/// Resolves once `signal` fires.
///
/// If the signal listener cannot be installed the error is logged and this
/// never resolves, so the server keeps running instead of shutting down.
pub async fn wait_for_shutdown(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
