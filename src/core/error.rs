use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

const NOT_FOUND_HTML: &str = "<!DOCTYPE html><html><head><title>Not Found</title></head>\
<body><h1>Not Found</h1><p>The requested resource was not found on this server.</p>\
<p><a href=\"/\">Home</a></p></body></html>";

const BAD_REQUEST_HTML: &str = "<!DOCTYPE html><html><head><title>Bad Request</title></head>\
<body><h1>Bad Request (400)</h1></body></html>";

const SERVER_ERROR_HTML: &str = "<!DOCTYPE html><html><head><title>Server Error</title></head>\
<body><h1>Server Error (500)</h1></body></html>";

/// 请求处理过程中的错误
#[derive(Error, Debug)]
pub enum AppError {
    /// 对象不存在，或属于其他用户
    #[error("未找到: {0}")]
    NotFound(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("模板渲染失败: {0}")]
    Template(#[from] tera::Error),

    /// 请求体无法解析，例如损坏的 multipart
    #[error("请求无效: {0}")]
    BadRequest(String),

    #[error("上传处理失败: {0}")]
    Upload(String),

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::NotFound(what) => {
                debug!("Not found: {}", what);
                (StatusCode::NOT_FOUND, Html(NOT_FOUND_HTML)).into_response()
            }
            AppError::BadRequest(reason) => {
                debug!("Bad request: {}", reason);
                (StatusCode::BAD_REQUEST, Html(BAD_REQUEST_HTML)).into_response()
            }
            other => {
                error!("Request failed: {:?}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_HTML)).into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// 把 `Option` 转换为 NotFound
pub trait OrNotFound<T> {
    fn or_not_found(self, what: impl Into<String>) -> Result<T>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self, what: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| AppError::not_found(what))
    }
}
