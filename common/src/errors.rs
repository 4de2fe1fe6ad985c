use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use mongodb::error::Error as MongoError;
use serde::Serialize;
use std::io;
use thiserror::Error;

/// HTTP 错误响应结构
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    // ==== 常规业务错误 ====
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    Validation(String),

    #[error("Unauthorized access: {0}")]
    Unauthorized(String),

    #[error("Forbidden access")]
    Forbidden,

    /// 乐观锁版本不一致
    #[error("Conflict: {0}")]
    Conflict(String),

    // ==== 系统错误 ====
    #[error("MongoDB error: {0}")]
    Mongo(#[from] MongoError),
    #[error("BSON error: {0}")]
    Bson(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Internal server error")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}
impl From<mongodb::bson::ser::Error> for AppError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        AppError::Bson(e.to_string())
    }
}
impl From<mongodb::bson::de::Error> for AppError {
    fn from(e: mongodb::bson::de::Error) -> Self {
        AppError::Bson(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let msg = match self {
            AppError::NotFound(_)
            | AppError::Validation(_)
            | AppError::Unauthorized(_)
            | AppError::Forbidden
            | AppError::Conflict(_) => self.to_string(),
            e => {
                error!("{:?}", e);
                "Service error".to_string()
            }
        };

        HttpResponse::build(status).json(ErrorResponse { code: status.as_u16(), message: msg })
    }
}
