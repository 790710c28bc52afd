//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the relay domain.
//! They have no external dependencies beyond serde and contain only
//! business logic.

use crate::domain::value_objects::BackendType;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Path parameter carrying a numeric datasource id.
pub const PARAM_DATASOURCE_ID: &str = "DatasourceID";
/// Path parameter carrying a datasource unique identifier.
pub const PARAM_DATASOURCE_UID: &str = "DatasourceUID";

/// A configured backend instance, as owned by the datasource store.
///
/// The relay only borrows this per request; it never caches or mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasource {
    /// Numeric identifier (unique per installation)
    pub id: i64,
    /// Unique string identifier
    pub uid: String,
    /// Organisation owning this datasource
    pub org_id: i64,
    /// Human readable name
    pub name: String,
    /// Declared backend type
    pub backend_type: BackendType,
    /// Base URL the relay forwards to
    pub url: String,
}

/// Identity of the caller, passed through to the datasource store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub org_id: i64,
    pub login: String,
}

impl CallerIdentity {
    pub fn new(org_id: i64, login: impl Into<String>) -> Self {
        Self {
            org_id,
            login: login.into(),
        }
    }
}

impl Default for CallerIdentity {
    fn default() -> Self {
        Self::new(1, "anonymous")
    }
}

/// Inbound request as seen by the relay after the HTTP layer parsed it.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: String,
    /// Path of the inbound URL
    pub path: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Named path parameters captured by the router
    pub path_params: HashMap<String, String>,
    pub caller: CallerIdentity,
    /// Ask the datasource store to bypass its cache
    pub skip_cache: bool,
}

impl InboundRequest {
    /// Create a GET request with no headers or parameters.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            query: None,
            headers: Vec::new(),
            path_params: HashMap::new(),
            caller: CallerIdentity::default(),
            skip_cache: false,
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.insert(name.to_string(), value.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a non-empty path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Request the relay issues against a resolved backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Raw reply from a backend.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== InboundRequest Tests =====

    #[test]
    fn test_inbound_get_defaults() {
        let req = InboundRequest::get("/api/prometheus/id/1/api/v1/rules");
        assert_eq!(req.method, "GET");
        assert!(req.query.is_none());
        assert!(req.headers.is_empty());
        assert!(!req.skip_cache);
        assert_eq!(req.caller, CallerIdentity::default());
    }

    #[test]
    fn test_param_ignores_empty_values() {
        let req = InboundRequest::get("/")
            .with_param(PARAM_DATASOURCE_ID, "")
            .with_param(PARAM_DATASOURCE_UID, "abc");

        assert_eq!(req.param(PARAM_DATASOURCE_ID), None);
        assert_eq!(req.param(PARAM_DATASOURCE_UID), Some("abc"));
    }

    #[test]
    fn test_param_missing() {
        let req = InboundRequest::get("/");
        assert_eq!(req.param(PARAM_DATASOURCE_ID), None);
    }

    // ===== UpstreamResponse Tests =====

    fn response(status: u16) -> UpstreamResponse {
        UpstreamResponse {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Bytes::new(),
        }
    }

    #[test]
    fn test_is_success_range() {
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(199).is_success());
        assert!(!response(302).is_success());
        assert!(!response(503).is_success());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = response(200);
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.header("x-missing"), None);
    }
}
