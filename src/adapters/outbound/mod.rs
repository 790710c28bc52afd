mod memory_datasource_store;
mod reqwest_upstream_client;
mod sqlite_datasource_store;

pub use memory_datasource_store::MemoryDatasourceStore;
pub use reqwest_upstream_client::ReqwestUpstreamClient;
pub use sqlite_datasource_store::{SqliteDatasourceStore, SCHEMA as DATASOURCE_SCHEMA};
