//! 积分流水实体
//!
//! 流水是余额的唯一事实来源，只追加不修改；
//! 唯一的删除路径是管理端的补偿性删除

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// 流水标题最大长度（字符数）
pub const TITLE_MAX_LEN: usize = 200;

/// 单条流水积分绝对值上限
pub const MAX_EVENT_POINTS: i64 = 1_000_000_000;

/// 无原因管理员调整写入账本时使用的标题
pub const DEFAULT_ADJUSTMENT_TITLE: &str = "管理员调整";

/// 积分流水
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointEvent {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    /// 积分变动，可以为 0 或负数
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

/// 待写入的积分流水，时间戳由存储层分配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPointEvent {
    pub user_id: i64,
    pub title: String,
    pub points: i64,
}

impl NewPointEvent {
    /// 用户获得积分
    pub fn earned(user_id: i64, title: &str, points: i64) -> Result<Self> {
        if points <= 0 {
            return Err(LedgerError::Validation("获得的积分必须为正数".to_string()));
        }
        check_points_range(points)?;
        Ok(Self {
            user_id,
            title: normalize_title(title)?,
            points,
        })
    }

    /// 管理员调整
    ///
    /// 没有原因时使用默认标题
    pub fn adjustment(user_id: i64, reason: Option<&str>, delta: i64) -> Result<Self> {
        check_points_range(delta)?;
        let title = match reason {
            Some(reason) => normalize_title(reason)?,
            None => DEFAULT_ADJUSTMENT_TITLE.to_string(),
        };
        Ok(Self {
            user_id,
            title,
            points: delta,
        })
    }

    /// 兑换备注，积分为 0，不影响余额
    pub fn redemption_note(user_id: i64, reward_name: &str) -> Self {
        let title: String = format!("兑换: {}", reward_name)
            .chars()
            .take(TITLE_MAX_LEN)
            .collect();
        Self {
            user_id,
            title,
            points: 0,
        }
    }
}

fn normalize_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(LedgerError::Validation("流水标题不能为空".to_string()));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(LedgerError::Validation(format!(
            "流水标题长度不能超过 {} 个字符",
            TITLE_MAX_LEN
        )));
    }
    Ok(title.to_string())
}

/// 校验单条流水积分的绝对值不超过 [`MAX_EVENT_POINTS`]
pub fn check_points_range(points: i64) -> Result<()> {
    if points.unsigned_abs() > MAX_EVENT_POINTS as u64 {
        return Err(LedgerError::Validation(format!(
            "单条流水积分绝对值不能超过 {}",
            MAX_EVENT_POINTS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earned_requires_positive_points() {
        assert!(NewPointEvent::earned(1, "签到", 0).is_err());
        assert!(NewPointEvent::earned(1, "签到", -5).is_err());

        let event = NewPointEvent::earned(1, "  签到 ", 5).unwrap();
        assert_eq!(event.title, "签到");
        assert_eq!(event.points, 5);
    }

    #[test]
    fn test_earned_rejects_blank_title() {
        assert!(NewPointEvent::earned(1, "  ", 5).is_err());
        assert!(NewPointEvent::earned(1, &"长".repeat(TITLE_MAX_LEN + 1), 5).is_err());
    }

    #[test]
    fn test_adjustment_default_title() {
        let event = NewPointEvent::adjustment(1, None, -30).unwrap();
        assert_eq!(event.title, DEFAULT_ADJUSTMENT_TITLE);
        assert_eq!(event.points, -30);

        let event = NewPointEvent::adjustment(1, Some("客诉补偿"), 100).unwrap();
        assert_eq!(event.title, "客诉补偿");
    }

    #[test]
    fn test_points_range_limit() {
        assert!(NewPointEvent::earned(1, "签到", MAX_EVENT_POINTS).is_ok());
        assert!(NewPointEvent::earned(1, "签到", MAX_EVENT_POINTS + 1).is_err());
        assert!(NewPointEvent::earned(1, "签到", i64::MAX).is_err());

        assert!(NewPointEvent::adjustment(1, None, -MAX_EVENT_POINTS).is_ok());
        assert!(NewPointEvent::adjustment(1, Some("x"), i64::MIN).is_err());
        assert!(NewPointEvent::adjustment(1, Some("x"), i64::MAX).is_err());
    }

    #[test]
    fn test_redemption_note_is_zero_points() {
        let event = NewPointEvent::redemption_note(7, "咖啡券");
        assert_eq!(event.points, 0);
        assert_eq!(event.title, "兑换: 咖啡券");

        let long = NewPointEvent::redemption_note(7, &"x".repeat(TITLE_MAX_LEN * 2));
        assert_eq!(long.title.chars().count(), TITLE_MAX_LEN);
    }
}
