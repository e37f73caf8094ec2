//! HTTP 层错误类型定义
//!
//! 把账本错误映射为 HTTP 状态码和统一响应体

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use points_management::{ErrorKind, LedgerError};
use serde_json::json;

/// HTTP 层错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("未授权: {0}")]
    Unauthorized(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Ledger(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Authorization => StatusCode::UNAUTHORIZED,
                ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 存储层错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Ledger(e) if e.kind() == ErrorKind::Storage => {
                tracing::error!(error = %e, "存储层操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// HTTP 层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(LedgerError::Validation("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(LedgerError::UserNotFound("alice".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(LedgerError::OutOfStock(1)),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(LedgerError::Unauthorized),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::from(LedgerError::Internal("pool timed out".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status);
        }
    }

    #[test]
    fn test_error_code_passthrough() {
        let error = ApiError::from(LedgerError::InsufficientPoints {
            required: 10,
            available: Some(0),
        });
        assert_eq!(error.error_code(), "INSUFFICIENT_POINTS");
        assert!(error.to_string().contains("10"));
    }
}
