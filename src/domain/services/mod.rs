mod route_registry;

pub use route_registry::RouteRegistry;
