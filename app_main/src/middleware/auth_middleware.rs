use crate::result::result_error_msg;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::HeaderMap,
};
use biz_service::entitys::role_entity::RoleEnum;
use common::UserId;
use futures_util::future::{LocalBoxFuture, Ready, ok};
use std::rc::Rc;
use std::str::FromStr;
use std::task::{Context, Poll};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// 免鉴权路径
const PUBLIC_PATHS: [&str; 2] = ["/status", "/openapi.json"];

/// 网关鉴权后透传的调用者身份
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: RoleEnum,
}

impl Principal {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = headers.get(USER_ID_HEADER)?.to_str().ok()?.trim();
        if user_id.is_empty() {
            return None;
        }
        let role = headers.get(USER_ROLE_HEADER)?.to_str().ok()?.trim().to_ascii_lowercase();
        let role = RoleEnum::from_str(&role).ok()?;
        Some(Self { user_id: user_id.to_string(), role })
    }
}

/// 解析调用者身份并放入请求扩展，缺失或非法时返回 401
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService { service: Rc::new(service) })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);
        if PUBLIC_PATHS.contains(&req.path()) {
            return Box::pin(async move {
                let res = srv.call(req).await?;
                Ok(res.map_into_left_body())
            });
        }
        match Principal::from_headers(req.headers()) {
            Some(principal) => {
                req.extensions_mut().insert(principal);
                Box::pin(async move {
                    let res = srv.call(req).await?;
                    Ok(res.map_into_left_body())
                })
            }
            None => {
                log::warn!("rejecting {} {}: missing or invalid principal headers", req.method(), req.path());
                Box::pin(async move {
                    Ok(req.into_response(
                        HttpResponse::Unauthorized().json(result_error_msg("Unauthorized")).map_into_right_body(),
                    ))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn principal_requires_both_headers() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "e1"))
            .insert_header((USER_ROLE_HEADER, "Employee"))
            .to_http_request();
        let principal = Principal::from_headers(req.headers()).unwrap();
        assert_eq!(principal, Principal { user_id: "e1".into(), role: RoleEnum::Employee });

        let missing_role = TestRequest::default().insert_header((USER_ID_HEADER, "e1")).to_http_request();
        assert!(Principal::from_headers(missing_role.headers()).is_none());
    }

    #[test]
    fn unknown_role_or_blank_user_is_rejected() {
        let bad_role = TestRequest::default()
            .insert_header((USER_ID_HEADER, "e1"))
            .insert_header((USER_ROLE_HEADER, "root"))
            .to_http_request();
        assert!(Principal::from_headers(bad_role.headers()).is_none());

        let blank_user = TestRequest::default()
            .insert_header((USER_ID_HEADER, "  "))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .to_http_request();
        assert!(Principal::from_headers(blank_user.headers()).is_none());
    }
}
