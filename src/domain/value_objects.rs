//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};

/// Declared type of a backend datasource.
///
/// Only Prometheus-API-compatible backends are routable. Any other type
/// string coming out of the datasource store is kept verbatim in `Other`
/// so that the caller can be told exactly what was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackendType {
    /// Prometheus (and compatible: Cortex, Mimir, Thanos query)
    Prometheus,
    /// Grafana Loki ruler
    Loki,
    /// Any type the relay does not know how to route
    Other(String),
}

impl BackendType {
    /// Every type with an entry in the route registry.
    pub const SUPPORTED: [BackendType; 2] = [BackendType::Prometheus, BackendType::Loki];

    /// Parse a backend type from the datasource store's type string.
    ///
    /// # Examples
    /// ```
    /// use rules_relay::BackendType;
    ///
    /// assert_eq!(BackendType::from_str("prometheus"), BackendType::Prometheus);
    /// assert_eq!(BackendType::from_str("graphite"), BackendType::Other("graphite".into()));
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s {
            "prometheus" => Self::Prometheus,
            "loki" => Self::Loki,
            other => Self::Other(other.to_string()),
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Prometheus => "prometheus",
            Self::Loki => "loki",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for BackendType {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

impl From<BackendType> for String {
    fn from(t: BackendType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two read operations the relay can forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List alerting and recording rule groups
    Rules,
    /// List active alerts
    Alerts,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Alerts => "alerts",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Paths a backend type exposes for the two supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePair {
    pub rules: &'static str,
    pub alerts: &'static str,
}

impl RoutePair {
    /// Select the path for an operation.
    pub fn path_for(&self, op: Operation) -> &'static str {
        match op {
            Operation::Rules => self.rules,
            Operation::Alerts => self.alerts,
        }
    }
}

/// How an inbound request names its target datasource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasourceRef {
    /// Numeric datasource id
    ById(i64),
    /// Unique string identifier
    ByUid(String),
}

impl std::fmt::Display for DatasourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ById(id) => write!(f, "id={}", id),
            Self::ByUid(uid) => write!(f, "uid={}", uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_from_str_known() {
        assert_eq!(BackendType::from_str("prometheus"), BackendType::Prometheus);
        assert_eq!(BackendType::from_str("loki"), BackendType::Loki);
    }

    #[test]
    fn test_backend_type_from_str_is_case_sensitive() {
        // The datasource store always stores plugin ids in lowercase
        assert_eq!(
            BackendType::from_str("Prometheus"),
            BackendType::Other("Prometheus".to_string())
        );
    }

    #[test]
    fn test_backend_type_other_keeps_value() {
        let t = BackendType::from_str("elasticsearch");
        assert_eq!(t.as_str(), "elasticsearch");
        assert_eq!(t.to_string(), "elasticsearch");
    }

    #[test]
    fn test_backend_type_serde() {
        let json = serde_json::to_string(&BackendType::Loki).unwrap();
        assert_eq!(json, "\"loki\"");

        let parsed: BackendType = serde_json::from_str("\"influxdb\"").unwrap();
        assert_eq!(parsed, BackendType::Other("influxdb".to_string()));
    }

    #[test]
    fn test_supported_contains_no_other() {
        assert!(BackendType::SUPPORTED
            .iter()
            .all(|t| !matches!(t, BackendType::Other(_))));
    }

    #[test]
    fn test_route_pair_path_for() {
        let pair = RoutePair {
            rules: "/r",
            alerts: "/a",
        };
        assert_eq!(pair.path_for(Operation::Rules), "/r");
        assert_eq!(pair.path_for(Operation::Alerts), "/a");
    }

    #[test]
    fn test_datasource_ref_display() {
        assert_eq!(DatasourceRef::ById(7).to_string(), "id=7");
        assert_eq!(
            DatasourceRef::ByUid("abc".to_string()).to_string(),
            "uid=abc"
        );
    }
}
