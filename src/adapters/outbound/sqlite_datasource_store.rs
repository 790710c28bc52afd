//! SQLite Datasource Store
//!
//! Implements DatasourceStore using SQLite for storage.
//! Lookups are served from an in-memory snapshot that is reloaded
//! periodically; `skip_cache` reads the database file directly.

use crate::domain::entities::{CallerIdentity, Datasource};
use crate::domain::errors::StoreError;
use crate::domain::ports::DatasourceStore;
use crate::domain::value_objects::BackendType;
use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

const SELECT_COLUMNS: &str = "SELECT id, uid, org_id, name, type, url FROM datasources";

/// Schema expected in the database file.
pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS datasources (
    id      INTEGER PRIMARY KEY,
    uid     TEXT NOT NULL UNIQUE,
    org_id  INTEGER NOT NULL DEFAULT 1,
    name    TEXT NOT NULL DEFAULT '',
    type    TEXT NOT NULL,
    url     TEXT NOT NULL DEFAULT '',
    deleted INTEGER
)";

enum Lookup {
    Id(i64),
    Uid(String),
}

/// SQLite-backed datasource store.
pub struct SqliteDatasourceStore {
    db_path: String,
    datasources: Arc<RwLock<Vec<Datasource>>>,
    version: Arc<AtomicU64>,
}

impl SqliteDatasourceStore {
    /// Create a new store (empty until the first reload).
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            datasources: Arc::new(RwLock::new(Vec::new())),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Reload the snapshot once. Returns the number of datasources loaded.
    pub async fn reload(&self) -> Result<usize> {
        Self::reload_into(&self.db_path, &self.datasources, &self.version).await
    }

    /// Start the background sync task.
    ///
    /// This spawns a Tokio task that reloads datasources from the SQLite
    /// database file every `interval_secs`. Call `reload` first if the
    /// snapshot must be populated before serving. An interval of zero is
    /// raised to one second.
    pub fn start_sync(&self, interval_secs: u64) {
        let db_path = self.db_path.clone();
        let datasources = self.datasources.clone();
        let version = self.version.clone();
        let interval = Duration::from_secs(interval_secs.max(1));

        tokio::spawn(async move {
            loop {
                sleep(interval).await;
                if let Err(e) = Self::reload_into(&db_path, &datasources, &version).await {
                    tracing::error!("error reading datasources: {:?}", e);
                }
            }
        });
    }

    /// Current snapshot revision, bumped on every successful reload.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    async fn reload_into(
        db_path: &str,
        datasources: &RwLock<Vec<Datasource>>,
        version: &AtomicU64,
    ) -> Result<usize> {
        let path = db_path.to_string();
        let loaded = tokio::task::spawn_blocking(move || Self::load_from_sqlite(&path)).await??;

        let count = loaded.len();
        *datasources.write().await = loaded;
        let new_version = version.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            "datasource reload ok, version={} datasources={}",
            new_version,
            count
        );
        Ok(count)
    }

    /// Load all live datasources from the SQLite database file.
    fn load_from_sqlite(db_path: &str) -> Result<Vec<Datasource>> {
        let conn = Connection::open(db_path)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE deleted IS NULL OR deleted = 0",
            SELECT_COLUMNS
        ))?;

        let datasources = stmt
            .query_map([], Self::row_to_datasource)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(datasources)
    }

    /// Read a single datasource straight from the database file.
    fn query_one(db_path: &str, lookup: &Lookup) -> Result<Option<Datasource>> {
        let conn = Connection::open(db_path)?;
        let live = "(deleted IS NULL OR deleted = 0)";

        let ds = match lookup {
            Lookup::Id(id) => conn
                .query_row(
                    &format!("{} WHERE id = ?1 AND {}", SELECT_COLUMNS, live),
                    params![id],
                    Self::row_to_datasource,
                )
                .optional()?,
            Lookup::Uid(uid) => conn
                .query_row(
                    &format!("{} WHERE uid = ?1 AND {}", SELECT_COLUMNS, live),
                    params![uid],
                    Self::row_to_datasource,
                )
                .optional()?,
        };

        Ok(ds)
    }

    /// Convert a SQLite row to a Datasource entity.
    fn row_to_datasource(row: &Row) -> rusqlite::Result<Datasource> {
        Ok(Datasource {
            id: row.get(0)?,
            uid: row.get(1)?,
            org_id: row.get(2)?,
            name: row.get(3)?,
            backend_type: BackendType::from_str(&row.get::<_, String>(4)?),
            url: row.get(5)?,
        })
    }

    async fn lookup(
        &self,
        lookup: Lookup,
        caller: &CallerIdentity,
        skip_cache: bool,
    ) -> Result<Datasource, StoreError> {
        let found = if skip_cache {
            let path = self.db_path.clone();
            tokio::task::spawn_blocking(move || Self::query_one(&path, &lookup))
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
        } else {
            self.datasources
                .read()
                .await
                .iter()
                .find(|ds| match &lookup {
                    Lookup::Id(id) => ds.id == *id,
                    Lookup::Uid(uid) => &ds.uid == uid,
                })
                .cloned()
        };

        found
            .filter(|ds| ds.org_id == caller.org_id)
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl DatasourceStore for SqliteDatasourceStore {
    async fn get_by_id(
        &self,
        id: i64,
        caller: &CallerIdentity,
        skip_cache: bool,
    ) -> Result<Datasource, StoreError> {
        self.lookup(Lookup::Id(id), caller, skip_cache).await
    }

    async fn get_by_uid(
        &self,
        uid: &str,
        caller: &CallerIdentity,
        skip_cache: bool,
    ) -> Result<Datasource, StoreError> {
        self.lookup(Lookup::Uid(uid.to_string()), caller, skip_cache)
            .await
    }
}
