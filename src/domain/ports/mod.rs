mod datasource_store;
mod upstream_client;

pub use datasource_store::DatasourceStore;
pub use upstream_client::UpstreamClient;
