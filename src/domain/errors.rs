//! Relay error taxonomy
//!
//! Every failure is terminal for the call and maps to a status code the
//! HTTP adapter hands back to the caller.

use thiserror::Error;

/// Errors returned by the datasource store port.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("data source not found")]
    NotFound,
    #[error("access denied to data source")]
    AccessDenied,
    #[error("data source store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Status code to surface to the caller, when the store implies one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::AccessDenied => Some(403),
            _ => None,
        }
    }
}

/// Transport-level failures from the upstream client port.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("request to backend timed out")]
    Timeout,
    #[error("failed to connect to backend: {0}")]
    Connect(String),
    #[error("request to backend failed: {0}")]
    Request(String),
}

/// Errors that end a relay call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// Neither a numeric id nor a unique identifier was supplied
    #[error("DatasourceID or DatasourceUID is required")]
    MissingIdentifier,

    /// The numeric id is not a base-10 integer
    #[error("DatasourceID is invalid")]
    InvalidIdentifier,

    /// The datasource store could not produce the backend
    #[error("{message}")]
    BackendNotFound { status: Option<u16>, message: String },

    /// The backend descriptor cannot be forwarded to
    #[error("{0}")]
    BackendMisconfigured(String),

    /// The backend type has no entry in the route registry
    #[error("unexpected datasource type '{0}', expecting a supported backend type")]
    UnsupportedBackendType(String),

    /// Transport failure or non-2xx reply from the backend
    #[error("{message}")]
    ForwardingFailure { status: Option<u16>, message: String },

    /// The backend replied 2xx with a body that does not match the schema
    #[error("failed to decode backend response")]
    InvalidBackendResponse,
}

impl RelayError {
    /// Map error variant to the HTTP status code returned to the caller.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::MissingIdentifier
            | RelayError::InvalidIdentifier
            | RelayError::BackendMisconfigured(_)
            | RelayError::UnsupportedBackendType(_)
            | RelayError::InvalidBackendResponse => 500,
            RelayError::BackendNotFound { status, .. } => status.unwrap_or(500),
            RelayError::ForwardingFailure { status, .. } => status.unwrap_or(502),
        }
    }

    /// Stable error type string for JSON responses.
    pub fn error_type(&self) -> &'static str {
        match self {
            RelayError::MissingIdentifier => "missing_identifier",
            RelayError::InvalidIdentifier => "invalid_identifier",
            RelayError::BackendNotFound { .. } => "backend_not_found",
            RelayError::BackendMisconfigured(_) => "backend_misconfigured",
            RelayError::UnsupportedBackendType(_) => "unsupported_backend_type",
            RelayError::ForwardingFailure { .. } => "forwarding_failure",
            RelayError::InvalidBackendResponse => "invalid_backend_response",
        }
    }
}

impl From<StoreError> for RelayError {
    fn from(err: StoreError) -> Self {
        RelayError::BackendNotFound {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<UpstreamError> for RelayError {
    fn from(err: UpstreamError) -> Self {
        let status = match err {
            UpstreamError::Timeout => Some(504),
            _ => None,
        };
        RelayError::ForwardingFailure {
            status,
            message: err.to_string(),
        }
    }
}
