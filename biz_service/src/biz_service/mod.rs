pub mod cache_service;
pub mod permission_service;
pub mod sidebar_service;
pub mod sidebar_validate;
