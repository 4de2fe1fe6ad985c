use crate::handlers::common_handler::*;
use crate::handlers::permission_handler::*;
use crate::handlers::sidebar_handler::*;
use actix_web::{HttpResponse, Responder, get, web};
use biz_service::entitys::role_entity::RoleEnum;
use biz_service::entitys::sidebar_entity::{ConfigScope, SidebarConfigEntity, SidebarConfigQueryDto, SidebarItem};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        status,
        sidebar_me,
        sidebar_config,
        sidebar_config_list,
        override_save,
        override_reset,
        default_save,
        item_visibility,
        permission_catalog,
        permission_get,
        permission_set,
    ),
    components(schemas(
        RoleEnum,
        ConfigScope,
        SidebarItem,
        SidebarConfigEntity,
        SidebarConfigQueryDto,
        OverrideSaveDto,
        OverrideResetDto,
        DefaultSaveDto,
        ItemVisibilityDto,
        PermissionSetDto,
    )),
    tags(
        (name = "Common", description = "Service status"),
        (name = "Sidebar", description = "Admin sidebar resolution and configuration"),
        (name = "Permission", description = "Employee permission grants")
    )
)]
struct ApiDoc;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(openapi_json);
}

#[get("/openapi.json")]
async fn openapi_json() -> impl Responder {
    match ApiDoc::openapi().to_json() {
        Ok(json) => HttpResponse::Ok().content_type("application/json").body(json),
        Err(e) => {
            log::error!("render openapi document failed: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn openapi_document_lists_sidebar_routes() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/openapi.json").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["paths"].get("/sidebar/me").is_some());
        assert!(body["paths"].get("/permission/{user_id}").is_some());
    }
}
