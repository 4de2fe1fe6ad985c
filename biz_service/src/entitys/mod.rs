pub mod permission_entity;
pub mod role_entity;
pub mod sidebar_entity;
