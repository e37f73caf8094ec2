//! 兑换记录实体
//!
//! 兑换记录只追加，cost_points 是兑换时的价格快照

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reward::Reward;

/// 兑换状态
///
/// 目前只有 approved；对账只统计 approved 的记录
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum RedemptionStatus {
    /// 已批准，积分已扣减
    #[default]
    Approved,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
        }
    }
}

/// 兑换记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: i64,
    pub user_id: i64,
    pub reward_id: i64,
    pub cost_points: i64,
    pub status: RedemptionStatus,
    pub created_at: DateTime<Utc>,
}

/// 待写入的兑换记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRedemption {
    pub user_id: i64,
    pub reward_id: i64,
    pub cost_points: i64,
    pub status: RedemptionStatus,
}

impl NewRedemption {
    /// 以奖品当前价格生成已批准的兑换
    pub fn approved(user_id: i64, reward: &Reward) -> Self {
        Self {
            user_id,
            reward_id: reward.id,
            cost_points: reward.cost_points,
            status: RedemptionStatus::Approved,
        }
    }
}

/// 扣减积分并写入兑换记录的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitedRedemption {
    pub redemption: Redemption,
    /// 扣减后的余额
    pub balance_after: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approved_snapshots_cost() {
        let reward = Reward {
            id: 3,
            name: "电影票".to_string(),
            cost_points: 120,
            stock: None,
            description: None,
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let new = NewRedemption::approved(9, &reward);
        assert_eq!(new.reward_id, 3);
        assert_eq!(new.cost_points, 120);
        assert_eq!(new.status, RedemptionStatus::Approved);
        assert_eq!(new.status.as_str(), "approved");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&RedemptionStatus::Approved).unwrap();
        assert_eq!(json, "\"APPROVED\"");
    }
}
