//! Prometheus HTTP API payloads
//!
//! Fixed schemas for the two forwarded operations. Both Prometheus and the
//! Loki ruler answer with the same envelope: `status`, optional
//! `errorType`/`error`, and an operation-specific `data` object.
//!
//! Decoded payloads are re-encoded unchanged: numbers keep their JSON
//! representation and fields this crate does not model are carried in
//! `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

pub type Labels = BTreeMap<String, String>;

/// Fields of a backend object that have no typed counterpart.
pub type Extra = Map<String, Value>;

/// Reply of `GET /api/v1/rules`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data: RuleDiscovery,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDiscovery {
    pub groups: Vec<RuleGroup>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroup {
    pub name: String,
    pub file: String,
    pub rules: Vec<Rule>,
    /// Evaluation interval in seconds
    pub interval: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_time: Option<Number>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// An alerting or recording rule.
///
/// Alerting-only fields are optional so both kinds share one shape;
/// `rule_type` tells them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub name: String,
    pub query: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub health: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// `for` duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Labels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<Alert>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_time: Option<Number>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Reply of `GET /api/v1/alerts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data: AlertDiscovery,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertDiscovery {
    pub alerts: Vec<Alert>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub annotations: Labels,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_at: Option<String>,
    /// Sample value, as the string Prometheus renders it
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(flatten)]
    pub extra: Extra,
}
