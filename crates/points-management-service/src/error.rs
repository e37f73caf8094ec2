//! 积分服务错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;

/// 错误分类
///
/// 请求层据此映射响应状态，所有错误都同步返回，不做内部重试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 参数缺失或格式错误，无副作用
    Validation,
    /// 引用的用户、流水或奖品不存在
    NotFound,
    /// 业务规则冲突（不可兑换、积分不足、库存不足等）
    Conflict,
    /// 管理密钥缺失或错误
    Authorization,
    /// 存储层故障
    Storage,
}

/// 积分服务错误类型
#[derive(Debug, Error)]
pub enum LedgerError {
    // === 引用不存在 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("积分流水不存在: {0}")]
    EventNotFound(i64),

    #[error("奖品不存在: {0}")]
    RewardNotFound(i64),

    // === 兑换冲突 ===
    #[error("奖品不可兑换: reward_id={0}")]
    RewardUnavailable(i64),

    /// available 为 None 表示余额在检查之后被并发扣减，当前值未知
    #[error("积分不足: 需要 {required}{}", describe_available(.available))]
    InsufficientPoints {
        required: i64,
        available: Option<i64>,
    },

    #[error("奖品库存不足: reward_id={0}")]
    OutOfStock(i64),

    #[error("奖品已有兑换记录，无法删除: reward_id={0}")]
    RewardInUse(i64),

    // === 校验与认证 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("未授权的管理操作")]
    Unauthorized,

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 积分服务 Result 类型别名
pub type Result<T> = std::result::Result<T, LedgerError>;

fn describe_available(available: &Option<i64>) -> String {
    available
        .map(|points| format!(", 可用 {}", points))
        .unwrap_or_default()
}

impl LedgerError {
    /// 错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::UserNotFound(_) | Self::EventNotFound(_) | Self::RewardNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::RewardUnavailable(_)
            | Self::InsufficientPoints { .. }
            | Self::OutOfStock(_)
            | Self::RewardInUse(_) => ErrorKind::Conflict,
            Self::Unauthorized => ErrorKind::Authorization,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Storage,
        }
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        self.kind() != ErrorKind::Storage
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::EventNotFound(_) => "EVENT_NOT_FOUND",
            Self::RewardNotFound(_) => "REWARD_NOT_FOUND",
            Self::RewardUnavailable(_) => "REWARD_UNAVAILABLE",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::OutOfStock(_) => "OUT_OF_STOCK",
            Self::RewardInUse(_) => "REWARD_IN_USE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(
            LedgerError::Validation("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(LedgerError::EventNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(LedgerError::OutOfStock(1).kind(), ErrorKind::Conflict);
        assert_eq!(
            LedgerError::InsufficientPoints {
                required: 10,
                available: Some(0)
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(LedgerError::Unauthorized.kind(), ErrorKind::Authorization);
        assert_eq!(
            LedgerError::Database(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_error_is_business_error() {
        assert!(LedgerError::RewardUnavailable(1).is_business_error());
        assert!(LedgerError::UserNotFound("alice".into()).is_business_error());
        assert!(!LedgerError::Internal("panic".into()).is_business_error());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            LedgerError::RewardUnavailable(1).error_code(),
            "REWARD_UNAVAILABLE"
        );
        assert_eq!(
            LedgerError::InsufficientPoints {
                required: 10,
                available: Some(3)
            }
            .error_code(),
            "INSUFFICIENT_POINTS"
        );
        assert_eq!(LedgerError::OutOfStock(7).error_code(), "OUT_OF_STOCK");
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientPoints {
            required: 10,
            available: Some(3),
        };
        assert_eq!(err.to_string(), "积分不足: 需要 10, 可用 3");

        let err = LedgerError::InsufficientPoints {
            required: 10,
            available: None,
        };
        assert_eq!(err.to_string(), "积分不足: 需要 10");

        let err = LedgerError::UserNotFound("alice".to_string());
        assert!(err.to_string().contains("alice"));
    }
}
