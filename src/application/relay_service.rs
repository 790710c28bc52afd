//! Relay Service - Main application use case
//!
//! Orchestrates one relay call: resolving the target datasource, building
//! the backend path, forwarding the request and decoding the reply. This is
//! the primary interface for the inbound adapter.

use crate::domain::entities::{
    Datasource, InboundRequest, OutboundRequest, UpstreamResponse, PARAM_DATASOURCE_ID,
    PARAM_DATASOURCE_UID,
};
use crate::domain::errors::RelayError;
use crate::domain::models::{AlertResponse, RuleResponse};
use crate::domain::ports::{DatasourceStore, UpstreamClient};
use crate::domain::services::RouteRegistry;
use crate::domain::value_objects::{DatasourceRef, Operation};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Headers never copied onto the outbound request.
///
/// Caller credentials belong to the relay, not to the backend.
const SKIPPED_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Upper bound on upstream error text echoed back to the caller.
const MAX_ERROR_MESSAGE_BYTES: usize = 512;

/// Relay service - main application use case.
///
/// Every call runs the same linear pipeline and stops at the first failure:
/// 1. Resolve the target datasource
/// 2. Build the backend path from its type
/// 3. Forward the request
/// 4. Decode the reply into the operation's schema
pub struct RelayService {
    datasources: Arc<dyn DatasourceStore>,
    upstream: Arc<dyn UpstreamClient>,
}

impl RelayService {
    /// Create a new relay service.
    pub fn new(datasources: Arc<dyn DatasourceStore>, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self {
            datasources,
            upstream,
        }
    }

    /// List rule groups of the datasource named by the request.
    pub async fn get_rule_statuses(&self, req: &InboundRequest) -> Result<RuleResponse, RelayError> {
        self.relay(req, Operation::Rules).await
    }

    /// List active alerts of the datasource named by the request.
    pub async fn get_alert_statuses(
        &self,
        req: &InboundRequest,
    ) -> Result<AlertResponse, RelayError> {
        self.relay(req, Operation::Alerts).await
    }

    async fn relay<T: DeserializeOwned>(
        &self,
        req: &InboundRequest,
        op: Operation,
    ) -> Result<T, RelayError> {
        let ds = self.resolve_target(req).await.inspect_err(|e| {
            tracing::warn!("relay {} {}: resolution failed: {}", op, req.path, e);
        })?;

        let path = RouteRegistry::build_path(&ds, op).inspect_err(|e| {
            tracing::warn!("relay {}: datasource {}: {}", op, ds.uid, e);
        })?;

        let resp = self.forward(req, &ds, path).await?;
        decode(&resp).inspect_err(|_| {
            tracing::warn!(
                "relay {}: datasource {} returned a body that does not match the schema",
                op,
                ds.uid
            );
        })
    }

    /// Extract the datasource reference from the request's path parameters.
    ///
    /// A numeric id takes precedence over a unique identifier.
    pub fn datasource_ref(req: &InboundRequest) -> Result<DatasourceRef, RelayError> {
        if let Some(raw) = req.param(PARAM_DATASOURCE_ID) {
            return raw
                .parse::<i64>()
                .map(DatasourceRef::ById)
                .map_err(|_| RelayError::InvalidIdentifier);
        }

        match req.param(PARAM_DATASOURCE_UID) {
            Some(uid) => Ok(DatasourceRef::ByUid(uid.to_string())),
            None => Err(RelayError::MissingIdentifier),
        }
    }

    /// Resolve the datasource named by the request and check it can be
    /// forwarded to.
    pub async fn resolve_target(&self, req: &InboundRequest) -> Result<Datasource, RelayError> {
        let ds_ref = Self::datasource_ref(req)?;

        let ds = match &ds_ref {
            DatasourceRef::ById(id) => {
                self.datasources
                    .get_by_id(*id, &req.caller, req.skip_cache)
                    .await?
            }
            DatasourceRef::ByUid(uid) => {
                self.datasources
                    .get_by_uid(uid, &req.caller, req.skip_cache)
                    .await?
            }
        };

        if ds.url.is_empty() {
            return Err(RelayError::BackendMisconfigured(
                "URL for this data source is empty".to_string(),
            ));
        }

        tracing::debug!("resolved {} -> {} ({})", ds_ref, ds.url, ds.backend_type);
        Ok(ds)
    }

    /// Forward the request to `path` on the datasource.
    ///
    /// Returns the raw reply for any 2xx status; everything else becomes a
    /// `ForwardingFailure`.
    pub async fn forward(
        &self,
        req: &InboundRequest,
        ds: &Datasource,
        path: &str,
    ) -> Result<UpstreamResponse, RelayError> {
        let outbound = OutboundRequest {
            method: req.method.clone(),
            url: outbound_url(&ds.url, path, req.query.as_deref())?,
            headers: forwarded_headers(&req.headers),
        };

        let url = outbound.url.clone();
        let resp = self.upstream.execute(outbound).await.map_err(|e| {
            tracing::warn!("forward to {} failed: {}", url, e);
            RelayError::from(e)
        })?;

        if !resp.is_success() {
            tracing::warn!("backend {} responded with status {}", url, resp.status);
            return Err(RelayError::ForwardingFailure {
                status: Some(resp.status),
                message: upstream_error_message(&resp),
            });
        }

        tracing::debug!("forwarded {} {} -> {}", req.method, url, resp.status);
        Ok(resp)
    }
}

/// Join the operation path (and inbound query) onto the datasource base URL.
///
/// Any path prefix on the base URL is kept.
fn outbound_url(base: &str, path: &str, query: Option<&str>) -> Result<String, RelayError> {
    let mut url = reqwest::Url::parse(base).map_err(|e| {
        RelayError::BackendMisconfigured(format!("URL for this data source is invalid: {}", e))
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(RelayError::BackendMisconfigured(format!(
            "URL for this data source is not an http(s) URL: {}",
            base
        )));
    }

    let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url.set_query(query.filter(|q| !q.is_empty()));
    url.set_fragment(None);

    Ok(url.to_string())
}

fn forwarded_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| {
            !SKIPPED_HEADERS
                .iter()
                .any(|skipped| name.eq_ignore_ascii_case(skipped))
        })
        .cloned()
        .collect()
}

/// Pick a short message out of an error reply.
fn upstream_error_message(resp: &UpstreamResponse) -> String {
    let content_type = resp.header("content-type").unwrap_or_default();

    if content_type.starts_with("application/json") {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice(&resp.body) {
            for key in ["message", "error"] {
                if let Some(serde_json::Value::String(msg)) = map.get(key) {
                    return msg.clone();
                }
            }
        }
    } else if content_type.starts_with("text/html") {
        return "redacted html".to_string();
    }

    let text = String::from_utf8_lossy(&resp.body);
    let text = text.trim();
    if text.is_empty() {
        return format!("backend responded with status {}", resp.status);
    }

    let mut end = text.len().min(MAX_ERROR_MESSAGE_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

fn decode<T: DeserializeOwned>(resp: &UpstreamResponse) -> Result<T, RelayError> {
    serde_json::from_slice(&resp.body).map_err(|e| {
        tracing::debug!("decode error: {}", e);
        RelayError::InvalidBackendResponse
    })
}
