use crate::middleware::Principal;
use actix_web::web;
use common::errors::AppError;

pub mod common_handler;
pub mod permission_handler;
pub mod sidebar_handler;
pub mod swagger;

pub fn configure(cfg: &mut web::ServiceConfig) {
    common_handler::configure(cfg);
    sidebar_handler::configure(cfg);
    permission_handler::configure(cfg);
    swagger::configure(cfg);
}

/// 后台管理接口仅管理员可用
pub(crate) fn require_admin(principal: &Principal) -> Result<(), AppError> {
    if principal.role.is_admin() { Ok(()) } else { Err(AppError::Forbidden) }
}
