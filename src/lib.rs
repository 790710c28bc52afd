//! rules-relay Library
//!
//! This module exposes the relay components for use in integration tests
//! and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;

// Re-export commonly used types
pub use application::RelayService;
pub use config::load_config;
pub use domain::entities::{CallerIdentity, Datasource, InboundRequest};
pub use domain::errors::RelayError;
pub use domain::models::{AlertResponse, RuleResponse};
pub use domain::ports::{DatasourceStore, UpstreamClient};
pub use domain::services::RouteRegistry;
pub use domain::value_objects::{BackendType, Operation};
