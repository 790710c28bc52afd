//! In-Memory Datasource Store
//!
//! Implements DatasourceStore using DashMap for lock-free concurrent access.
//! Useful for static setups and tests; there is no cache to bypass, so
//! `skip_cache` has no effect.

use crate::domain::entities::{CallerIdentity, Datasource};
use crate::domain::errors::StoreError;
use crate::domain::ports::DatasourceStore;
use async_trait::async_trait;
use dashmap::DashMap;

/// DashMap-backed datasource store.
pub struct MemoryDatasourceStore {
    by_id: DashMap<i64, Datasource>,
    /// uid -> id
    uids: DashMap<String, i64>,
}

impl MemoryDatasourceStore {
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
            uids: DashMap::new(),
        }
    }

    /// Build a store holding the given datasources.
    pub fn with_datasources(datasources: impl IntoIterator<Item = Datasource>) -> Self {
        let store = Self::new();
        for ds in datasources {
            store.upsert(ds);
        }
        store
    }

    /// Insert or replace a datasource.
    pub fn upsert(&self, ds: Datasource) {
        if let Some(old) = self.by_id.insert(ds.id, ds.clone()) {
            if old.uid != ds.uid {
                self.uids.remove(&old.uid);
            }
        }
        self.uids.insert(ds.uid.clone(), ds.id);
    }

    /// Remove a datasource by id.
    pub fn remove(&self, id: i64) -> bool {
        match self.by_id.remove(&id) {
            Some((_, ds)) => {
                self.uids.remove(&ds.uid);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn visible(ds: Option<Datasource>, caller: &CallerIdentity) -> Result<Datasource, StoreError> {
        ds.filter(|ds| ds.org_id == caller.org_id)
            .ok_or(StoreError::NotFound)
    }
}

impl Default for MemoryDatasourceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasourceStore for MemoryDatasourceStore {
    async fn get_by_id(
        &self,
        id: i64,
        caller: &CallerIdentity,
        _skip_cache: bool,
    ) -> Result<Datasource, StoreError> {
        Self::visible(self.by_id.get(&id).map(|e| e.value().clone()), caller)
    }

    async fn get_by_uid(
        &self,
        uid: &str,
        caller: &CallerIdentity,
        _skip_cache: bool,
    ) -> Result<Datasource, StoreError> {
        let id = self.uids.get(uid).map(|e| *e.value());
        let ds = id.and_then(|id| self.by_id.get(&id).map(|e| e.value().clone()));
        Self::visible(ds, caller)
    }
}
