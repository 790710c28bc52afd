mod api_server;

pub use api_server::ApiServer;

// Re-export for external use (e.g., integration tests)
#[allow(unused_imports)]
pub use api_server::{ApiState, HEADER_CACHE_SKIP, HEADER_ORG_ID, HEADER_USER_LOGIN};
