//! Route Registry
//!
//! Static mapping from backend type to the paths it exposes for rule and
//! alert listing, and the pure path builder on top of it.

use crate::domain::entities::Datasource;
use crate::domain::errors::RelayError;
use crate::domain::value_objects::{BackendType, Operation, RoutePair};

const PROMETHEUS_ROUTES: RoutePair = RoutePair {
    rules: "/api/v1/rules",
    alerts: "/api/v1/alerts",
};

const LOKI_ROUTES: RoutePair = RoutePair {
    rules: "/prometheus/api/v1/rules",
    alerts: "/prometheus/api/v1/alerts",
};

/// Route registry - pure lookup, no state.
pub struct RouteRegistry;

impl RouteRegistry {
    /// Look up the routes for a backend type.
    ///
    /// Returns None for types the relay cannot route.
    pub fn lookup(backend_type: &BackendType) -> Option<RoutePair> {
        match backend_type {
            BackendType::Prometheus => Some(PROMETHEUS_ROUTES),
            BackendType::Loki => Some(LOKI_ROUTES),
            BackendType::Other(_) => None,
        }
    }

    /// Build the backend path for an operation on a datasource.
    pub fn build_path(ds: &Datasource, op: Operation) -> Result<&'static str, RelayError> {
        let routes = Self::lookup(&ds.backend_type)
            .ok_or_else(|| RelayError::UnsupportedBackendType(ds.backend_type.to_string()))?;
        Ok(routes.path_for(op))
    }
}
