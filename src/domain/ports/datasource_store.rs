//! Datasource Store Port
//!
//! Defines the interface for looking up backend datasources.
//! Implementations may use SQLite or in-memory storage.

use crate::domain::entities::{CallerIdentity, Datasource};
use crate::domain::errors::StoreError;
use async_trait::async_trait;

/// Store for accessing configured datasources.
///
/// This is an outbound port that abstracts where datasource definitions
/// live and how they are cached. Lookups are scoped to the caller: a
/// datasource outside the caller's organisation is reported as not found.
#[async_trait]
pub trait DatasourceStore: Send + Sync {
    /// Get a datasource by its numeric id.
    ///
    /// When `skip_cache` is set the implementation must read from its
    /// source of truth instead of any cached copy.
    async fn get_by_id(
        &self,
        id: i64,
        caller: &CallerIdentity,
        skip_cache: bool,
    ) -> Result<Datasource, StoreError>;

    /// Get a datasource by its unique string identifier.
    async fn get_by_uid(
        &self,
        uid: &str,
        caller: &CallerIdentity,
        skip_cache: bool,
    ) -> Result<Datasource, StoreError>;
}
