//! rules-relay - Prometheus/Loki rules and alerts relay
//!
//! This is the composition root that wires together all the components.

use rules_relay::adapters::inbound::ApiServer;
use rules_relay::adapters::outbound::{ReqwestUpstreamClient, SqliteDatasourceStore};
use rules_relay::{load_config, RelayService};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting rules-relay listen={} db={}",
        cfg.listen_addr,
        cfg.db_path
    );

    // ===== COMPOSITION ROOT =====

    // 1. Outbound adapters
    let datasources = Arc::new(SqliteDatasourceStore::new(cfg.db_path.clone()));
    if let Err(e) = datasources.reload().await {
        tracing::warn!("initial datasource load failed: {:?}", e);
    }
    datasources.start_sync(cfg.db_reload_secs);

    let upstream = Arc::new(ReqwestUpstreamClient::new(Duration::from_secs(
        cfg.upstream_timeout_secs,
    ))?);

    // 2. Application service
    let relay = Arc::new(RelayService::new(datasources, upstream));

    // 3. Inbound adapter
    let server = ApiServer::new(cfg.listen_addr, relay);
    server.run().await
}
