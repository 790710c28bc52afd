//! Upstream Client Port
//!
//! Defines the interface for issuing HTTP requests to backends.

use crate::domain::entities::{OutboundRequest, UpstreamResponse};
use crate::domain::errors::UpstreamError;
use async_trait::async_trait;

/// HTTP execution against a resolved backend.
///
/// Any reply carrying a status code is returned as `Ok`, whatever the code;
/// `Err` is reserved for transport failures. Dropping the returned future
/// must abort the in-flight request.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<UpstreamResponse, UpstreamError>;
}
