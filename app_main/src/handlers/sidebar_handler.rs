use crate::handlers::require_admin;
use crate::middleware::Principal;
use crate::result::{result_data, result_list};
use actix_web::web::Json;
use actix_web::{Responder, get, post, web};
use biz_service::Services;
use biz_service::entitys::role_entity::RoleEnum;
use biz_service::entitys::sidebar_entity::{SidebarConfigEntity, SidebarConfigQueryDto, SidebarItem};
use common::errors::AppError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(sidebar_me);
    cfg.service(sidebar_config);
    cfg.service(sidebar_config_list);
    cfg.service(override_save);
    cfg.service(override_reset);
    cfg.service(default_save);
    cfg.service(item_visibility);
}

#[derive(Serialize, Deserialize, Debug, Validate, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSaveDto {
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
    pub role: RoleEnum,
    pub items: Vec<SidebarItem>,
    /// 首次保存传 0
    #[serde(default)]
    pub version: i64,
}

#[derive(Serialize, Deserialize, Debug, Validate, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OverrideResetDto {
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
    pub role: RoleEnum,
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSaveDto {
    pub role: RoleEnum,
    #[serde(default)]
    pub name: Option<String>,
    pub items: Vec<SidebarItem>,
    #[serde(default)]
    pub version: i64,
}

#[derive(Serialize, Deserialize, Debug, Validate, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ItemVisibilityDto {
    #[validate(length(min = 1, message = "configId is required"))]
    pub config_id: String,
    #[validate(length(min = 1, message = "itemId is required"))]
    pub item_id: String,
    pub visible: bool,
    pub version: i64,
}

#[utoipa::path(
    get,
    path = "/sidebar/me",
    tag = "Sidebar",
    summary = "Sidebar tree visible to the caller",
    responses(
        (status = 200, description = "Resolved sidebar tree"),
        (status = 403, description = "Role has no admin sidebar")
    )
)]
#[get("/sidebar/me")]
pub async fn sidebar_me(services: web::Data<Services>, principal: web::ReqData<Principal>) -> Result<impl Responder, AppError> {
    let sidebar = services.sidebar.resolve_sidebar(&principal.user_id, principal.role).await?;
    Ok(Json(result_data(sidebar)))
}

#[utoipa::path(
    get,
    path = "/sidebar/config/{user_id}/{role}",
    tag = "Sidebar",
    summary = "Effective sidebar configuration of a user",
    params(
        ("user_id" = String, Path, description = "User id"),
        ("role" = RoleEnum, Path, description = "Role of the user")
    ),
    responses(
        (status = 200, description = "Effective configuration", body = SidebarConfigEntity),
        (status = 400, description = "Role has no admin sidebar")
    )
)]
#[get("/sidebar/config/{user_id}/{role}")]
pub async fn sidebar_config(
    services: web::Data<Services>,
    principal: web::ReqData<Principal>,
    path: web::Path<(String, RoleEnum)>,
) -> Result<impl Responder, AppError> {
    require_admin(&principal)?;
    let (user_id, role) = path.into_inner();
    if !role.is_admin_area() {
        return Err(AppError::Validation(format!("role {} has no admin sidebar", role)));
    }
    let config = services.sidebar.resolve_config(&user_id, role).await?;
    Ok(Json(result_data(config)))
}

#[utoipa::path(
    post,
    path = "/sidebar/config/list",
    tag = "Sidebar",
    request_body = SidebarConfigQueryDto,
    responses(
        (status = 200, description = "Matching configurations", body = [SidebarConfigEntity])
    )
)]
#[post("/sidebar/config/list")]
pub async fn sidebar_config_list(
    services: web::Data<Services>,
    principal: web::ReqData<Principal>,
    dto: Json<SidebarConfigQueryDto>,
) -> Result<impl Responder, AppError> {
    require_admin(&principal)?;
    let list = services.sidebar.list_configs(&dto).await?;
    Ok(Json(result_list(list)))
}

#[utoipa::path(
    post,
    path = "/sidebar/override/save",
    tag = "Sidebar",
    request_body = OverrideSaveDto,
    responses(
        (status = 200, description = "Saved override", body = SidebarConfigEntity),
        (status = 400, description = "Invalid items"),
        (status = 409, description = "Stale version")
    )
)]
#[post("/sidebar/override/save")]
pub async fn override_save(
    services: web::Data<Services>,
    principal: web::ReqData<Principal>,
    dto: Json<OverrideSaveDto>,
) -> Result<impl Responder, AppError> {
    require_admin(&principal)?;
    dto.validate()?;
    let dto = dto.into_inner();
    let saved = services.sidebar.save_user_override(&dto.user_id, dto.role, dto.items, dto.version).await?;
    Ok(Json(result_data(saved)))
}

#[utoipa::path(
    post,
    path = "/sidebar/override/reset",
    tag = "Sidebar",
    request_body = OverrideResetDto,
    responses(
        (status = 200, description = "Whether an override was removed")
    )
)]
#[post("/sidebar/override/reset")]
pub async fn override_reset(
    services: web::Data<Services>,
    principal: web::ReqData<Principal>,
    dto: Json<OverrideResetDto>,
) -> Result<impl Responder, AppError> {
    require_admin(&principal)?;
    dto.validate()?;
    let removed = services.sidebar.reset_user_override(&dto.user_id, dto.role).await?;
    Ok(Json(result_data(serde_json::json!({ "removed": removed }))))
}

#[utoipa::path(
    post,
    path = "/sidebar/default/save",
    tag = "Sidebar",
    request_body = DefaultSaveDto,
    responses(
        (status = 200, description = "Saved role default", body = SidebarConfigEntity),
        (status = 409, description = "Stale version")
    )
)]
#[post("/sidebar/default/save")]
pub async fn default_save(
    services: web::Data<Services>,
    principal: web::ReqData<Principal>,
    dto: Json<DefaultSaveDto>,
) -> Result<impl Responder, AppError> {
    require_admin(&principal)?;
    let dto = dto.into_inner();
    let saved = services.sidebar.save_default(dto.role, dto.name, dto.items, dto.version).await?;
    Ok(Json(result_data(saved)))
}

#[utoipa::path(
    post,
    path = "/sidebar/item/visibility",
    tag = "Sidebar",
    request_body = ItemVisibilityDto,
    responses(
        (status = 200, description = "Updated configuration", body = SidebarConfigEntity),
        (status = 404, description = "Unknown config or item")
    )
)]
#[post("/sidebar/item/visibility")]
pub async fn item_visibility(
    services: web::Data<Services>,
    principal: web::ReqData<Principal>,
    dto: Json<ItemVisibilityDto>,
) -> Result<impl Responder, AppError> {
    require_admin(&principal)?;
    dto.validate()?;
    let saved = services.sidebar.set_item_visibility(&dto.config_id, &dto.item_id, dto.visible, dto.version).await?;
    Ok(Json(result_data(saved)))
}
