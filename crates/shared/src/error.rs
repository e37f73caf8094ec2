//! 基础设施错误类型
//!
//! 连接池、迁移、配置加载等启动阶段的错误，业务错误由各服务自行定义。

use thiserror::Error;

/// 基础设施错误
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 基础设施 Result 类型别名
pub type Result<T> = std::result::Result<T, InfraError>;

impl InfraError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Migration(_) => "MIGRATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为可重试错误（仅连接类错误）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database(sqlx::Error::PoolTimedOut) | Self::Database(sqlx::Error::Io(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = InfraError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert_eq!(InfraError::Internal("x".into()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_is_retryable() {
        assert!(InfraError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!InfraError::Database(sqlx::Error::RowNotFound).is_retryable());
        assert!(!InfraError::Internal("boom".into()).is_retryable());
    }
}
