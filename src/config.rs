use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // HTTP API settings
    pub listen_addr: String,

    // Datasource store settings
    pub db_path: String,
    pub db_reload_secs: u64,

    // Forwarding settings
    pub upstream_timeout_secs: u64,

    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9095".to_string(),
            db_path: "datasources.db".to_string(),
            db_reload_secs: 10,
            upstream_timeout_secs: 30,
            debug: false,
        }
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary variable source.
///
/// Absent, unparseable or zero values fall back to the defaults.
pub fn load_config_from(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
    let defaults = Config::default();

    let listen_addr = var("RELAY_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

    let db_path = var("RELAY_DB_PATH").unwrap_or(defaults.db_path);

    let db_reload_secs = var("RELAY_DB_RELOAD_SECS")
        .and_then(|v| v.parse().ok())
        .filter(|secs: &u64| *secs > 0)
        .unwrap_or(defaults.db_reload_secs);

    let upstream_timeout_secs = var("RELAY_UPSTREAM_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .filter(|secs: &u64| *secs > 0)
        .unwrap_or(defaults.upstream_timeout_secs);

    let debug = var("DEBUG").is_some();

    Ok(Config {
        listen_addr,
        db_path,
        db_reload_secs,
        upstream_timeout_secs,
        debug,
    })
}
