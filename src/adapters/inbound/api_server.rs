//! Relay API Server
//!
//! HTTP API exposing rule and alert listing for configured datasources.
//! Callers name the datasource by numeric id or unique identifier; the
//! relay resolves it and forwards to the backend's own API.

use crate::application::RelayService;
use crate::domain::entities::{CallerIdentity, InboundRequest};
use crate::domain::errors::RelayError;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Organisation of the caller.
pub const HEADER_ORG_ID: &str = "x-org-id";
/// Login of the caller.
pub const HEADER_USER_LOGIN: &str = "x-user-login";
/// `true` asks the datasource store to bypass its cache.
pub const HEADER_CACHE_SKIP: &str = "x-cache-skip";

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub relay: Arc<RelayService>,
}

/// API Server for the relay.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, relay: Arc<RelayService>) -> Self {
        Self {
            listen_addr,
            state: ApiState { relay },
        }
    }

    /// Build the router with all relay endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            // Health endpoint
            .route("/health", get(health_handler))
            // By numeric datasource id
            .route(
                "/api/prometheus/id/:DatasourceID/api/v1/rules",
                get(rules_handler),
            )
            .route(
                "/api/prometheus/id/:DatasourceID/api/v1/alerts",
                get(alerts_handler),
            )
            // By datasource unique identifier
            .route(
                "/api/prometheus/uid/:DatasourceUID/api/v1/rules",
                get(rules_handler),
            )
            .route(
                "/api/prometheus/uid/:DatasourceUID/api/v1/alerts",
                get(alerts_handler),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the API server.
    ///
    /// The final Ok(()) is excluded from coverage since axum::serve runs forever.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self) -> anyhow::Result<()> {
        let app = self.router();

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("relay API listening on {}", self.listen_addr);

        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Convert the HTTP request parts into the relay's inbound request.
fn inbound_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    path_params: HashMap<String, String>,
) -> InboundRequest {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let caller = CallerIdentity::new(
        header_str(HEADER_ORG_ID)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1),
        header_str(HEADER_USER_LOGIN).unwrap_or("anonymous"),
    );

    let skip_cache = header_str(HEADER_CACHE_SKIP)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false);

    // Caller-identity headers stay on this side of the relay
    let forwarded = headers
        .iter()
        .filter(|(k, _)| {
            let k = k.as_str();
            k != HEADER_ORG_ID && k != HEADER_USER_LOGIN && k != HEADER_CACHE_SKIP
        })
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|v| (k.as_str().to_string(), v.to_string()))
        })
        .collect();

    InboundRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: forwarded,
        path_params,
        caller,
        skip_cache,
    }
}

fn error_response(err: &RelayError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
        "status": "error",
        "errorType": err.error_type(),
        "error": err.to_string(),
    });
    (status, Json(body)).into_response()
}

fn relay_response<T: Serialize>(result: Result<T, RelayError>) -> Response {
    match result {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(err) => error_response(&err),
    }
}

// Handler functions

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn rules_handler(
    State(state): State<ApiState>,
    Path(params): Path<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let req = inbound_request(&method, &uri, &headers, params);
    relay_response(state.relay.get_rule_statuses(&req).await)
}

async fn alerts_handler(
    State(state): State<ApiState>,
    Path(params): Path<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let req = inbound_request(&method, &uri, &headers, params);
    relay_response(state.relay.get_alert_statuses(&req).await)
}
