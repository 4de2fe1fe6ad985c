use crate::handlers::require_admin;
use crate::middleware::Principal;
use crate::result::{result_data, result_list};
use actix_web::web::Json;
use actix_web::{Responder, get, post, web};
use biz_service::Services;
use common::errors::AppError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // catalog 必须先于 {user_id} 注册
    cfg.service(permission_catalog);
    cfg.service(permission_get);
    cfg.service(permission_set);
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSetDto {
    pub permissions: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/permission/catalog",
    tag = "Permission",
    summary = "Known permission tokens",
    responses(
        (status = 200, description = "Permission catalog", body = [String])
    )
)]
#[get("/permission/catalog")]
pub async fn permission_catalog(
    services: web::Data<Services>,
    principal: web::ReqData<Principal>,
) -> Result<impl Responder, AppError> {
    require_admin(&principal)?;
    Ok(Json(result_list(services.permission.catalog())))
}

#[utoipa::path(
    get,
    path = "/permission/{user_id}",
    tag = "Permission",
    params(("user_id" = String, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Granted permission tokens", body = [String])
    )
)]
#[get("/permission/{user_id}")]
pub async fn permission_get(
    services: web::Data<Services>,
    principal: web::ReqData<Principal>,
    user_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    require_admin(&principal)?;
    let permissions = services.permission.get_permissions(&user_id).await?;
    Ok(Json(result_list(permissions.to_vec())))
}

#[utoipa::path(
    post,
    path = "/permission/{user_id}",
    tag = "Permission",
    params(("user_id" = String, Path, description = "Employee id")),
    request_body = PermissionSetDto,
    responses(
        (status = 200, description = "Stored permission tokens", body = [String])
    )
)]
#[post("/permission/{user_id}")]
pub async fn permission_set(
    services: web::Data<Services>,
    principal: web::ReqData<Principal>,
    user_id: web::Path<String>,
    dto: Json<PermissionSetDto>,
) -> Result<impl Responder, AppError> {
    require_admin(&principal)?;
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::Validation("user id is required".to_string()));
    }
    let permissions = services.permission.set_permissions(user_id, &dto.permissions).await?;
    Ok(Json(result_data(permissions.to_vec())))
}

#[cfg(test)]
mod tests {
    use crate::handlers::configure;
    use crate::middleware::AuthMiddleware;
    use crate::middleware::auth_middleware::{USER_ID_HEADER, USER_ROLE_HEADER};
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use biz_service::Services;
    use common::config::CacheConfig;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn admin_sets_and_reads_normalized_permissions() {
        let services = web::Data::new(Services::in_memory(&CacheConfig::default()));
        let app = test::init_service(App::new().app_data(services).wrap(AuthMiddleware).configure(configure)).await;

        let set = test::TestRequest::post()
            .uri("/permission/e1")
            .insert_header((USER_ID_HEADER, "a1"))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .set_json(json!({"permissions": [" view_users", "view_users", "", "edit_settings"]}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, set).await;
        assert_eq!(body["data"], json!(["edit_settings", "view_users"]));

        let get = test::TestRequest::get()
            .uri("/permission/e1")
            .insert_header((USER_ID_HEADER, "a1"))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, get).await;
        assert_eq!(body["total"], 2);
    }

    #[actix_web::test]
    async fn catalog_is_not_shadowed_by_user_route() {
        let services = web::Data::new(Services::in_memory(&CacheConfig::default()));
        let app = test::init_service(App::new().app_data(services).wrap(AuthMiddleware).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/permission/catalog")
            .insert_header((USER_ID_HEADER, "a1"))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"].as_array().unwrap().iter().any(|t| t == "view_statistics"));
    }

    #[actix_web::test]
    async fn employees_cannot_grant_themselves_permissions() {
        let services = web::Data::new(Services::in_memory(&CacheConfig::default()));
        let app = test::init_service(App::new().app_data(services).wrap(AuthMiddleware).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/permission/e1")
            .insert_header((USER_ID_HEADER, "e1"))
            .insert_header((USER_ROLE_HEADER, "employee"))
            .set_json(json!({"permissions": ["edit_settings"]}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
