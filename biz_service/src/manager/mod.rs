pub mod access_resolver;
pub mod sidebar_defaults;
