//! 用户实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// 用户名最大长度（字符数）
pub const USERNAME_MAX_LEN: usize = 64;

/// 用户
///
/// 首次按用户名引用时创建，不会被删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// 管理端用户列表项，附带缓存余额
///
/// 余额直接读取缓存，未经对账；从未对账过的用户为 None
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub cached_points: Option<i64>,
}

/// 规范化用户名
///
/// 去除首尾空白后不能为空、不能超长、不能包含空白或控制字符
pub fn normalize_username(raw: &str) -> Result<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(LedgerError::Validation("用户名不能为空".to_string()));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(LedgerError::Validation(format!(
            "用户名长度不能超过 {} 个字符",
            USERNAME_MAX_LEN
        )));
    }
    if username
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(LedgerError::Validation(
            "用户名不能包含空白或控制字符".to_string(),
        ));
    }
    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_username_trims() {
        assert_eq!(normalize_username("  alice ").unwrap(), "alice");
        assert_eq!(normalize_username("张三").unwrap(), "张三");
    }

    #[test]
    fn test_normalize_username_rejects_invalid() {
        assert!(normalize_username("").is_err());
        assert!(normalize_username("   ").is_err());
        assert!(normalize_username("a b").is_err());
        assert!(normalize_username("tab\there").is_err());
        assert!(normalize_username(&"x".repeat(USERNAME_MAX_LEN + 1)).is_err());
        assert!(normalize_username(&"x".repeat(USERNAME_MAX_LEN)).is_ok());
    }
}
