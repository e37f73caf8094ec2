//! 奖品目录实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// 奖品名称最大长度（字符数）
pub const REWARD_NAME_MAX_LEN: usize = 100;

/// 奖品
///
/// 库存为 None 表示不限量；enabled 为 false 时不可兑换
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: i64,
    pub name: String,
    /// 兑换所需积分，恒大于 0
    pub cost_points: i64,
    /// 剩余库存（null 表示不限量）
    #[sqlx(default)]
    pub stock: Option<i64>,
    #[sqlx(default)]
    pub description: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    /// 检查是否有库存
    pub fn has_stock(&self) -> bool {
        match self.stock {
            Some(remaining) => remaining > 0,
            None => true,
        }
    }

    /// 是否限量，限量奖品兑换时需要扣减库存
    pub fn is_limited(&self) -> bool {
        self.stock.is_some()
    }

    /// 是否对用户展示为可兑换
    pub fn is_redeemable(&self) -> bool {
        self.enabled && self.has_stock()
    }
}

/// 新建奖品
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReward {
    pub name: String,
    pub cost_points: i64,
    pub stock: Option<i64>,
    pub description: Option<String>,
    pub enabled: bool,
}

impl NewReward {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_cost(self.cost_points)?;
        validate_stock(self.stock)
    }
}

/// 奖品部分更新
///
/// 外层 None 表示不修改；stock/description 的内层 None 表示置空（不限量/无描述）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardPatch {
    pub name: Option<String>,
    pub cost_points: Option<i64>,
    pub stock: Option<Option<i64>>,
    pub description: Option<Option<String>>,
    pub enabled: Option<bool>,
}

impl RewardPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(cost) = self.cost_points {
            validate_cost(cost)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cost_points.is_none()
            && self.stock.is_none()
            && self.description.is_none()
            && self.enabled.is_none()
    }

    /// 应用到已有奖品（内存存储使用，PostgreSQL 在单条 UPDATE 中完成）
    pub fn apply_to(&self, reward: &mut Reward) {
        if let Some(name) = &self.name {
            reward.name = name.trim().to_string();
        }
        if let Some(cost) = self.cost_points {
            reward.cost_points = cost;
        }
        if let Some(stock) = self.stock {
            reward.stock = stock;
        }
        if let Some(description) = &self.description {
            reward.description = description.clone();
        }
        if let Some(enabled) = self.enabled {
            reward.enabled = enabled;
        }
        reward.updated_at = Utc::now();
    }
}

fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::Validation("奖品名称不能为空".to_string()));
    }
    if name.chars().count() > REWARD_NAME_MAX_LEN {
        return Err(LedgerError::Validation(format!(
            "奖品名称长度不能超过 {} 个字符",
            REWARD_NAME_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_cost(cost_points: i64) -> Result<()> {
    if cost_points <= 0 {
        return Err(LedgerError::Validation("兑换积分必须大于 0".to_string()));
    }
    Ok(())
}

fn validate_stock(stock: Option<i64>) -> Result<()> {
    match stock {
        Some(s) if s < 0 => Err(LedgerError::Validation("库存不能为负数".to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward(stock: Option<i64>, enabled: bool) -> Reward {
        Reward {
            id: 1,
            name: "咖啡券".to_string(),
            cost_points: 10,
            stock,
            description: None,
            enabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_reward_has_stock() {
        assert!(reward(None, true).has_stock());
        assert!(reward(Some(1), true).has_stock());
        assert!(!reward(Some(0), true).has_stock());
    }

    #[test]
    fn test_reward_is_redeemable() {
        assert!(reward(None, true).is_redeemable());
        assert!(!reward(None, false).is_redeemable());
        assert!(!reward(Some(0), true).is_redeemable());
    }

    #[test]
    fn test_new_reward_validate() {
        let mut new = NewReward {
            name: "咖啡券".to_string(),
            cost_points: 10,
            stock: Some(5),
            description: None,
            enabled: true,
        };
        assert!(new.validate().is_ok());

        new.cost_points = 0;
        assert!(new.validate().is_err());

        new.cost_points = 10;
        new.stock = Some(-1);
        assert!(new.validate().is_err());

        new.stock = None;
        new.name = " ".to_string();
        assert!(new.validate().is_err());
    }

    #[test]
    fn test_patch_apply_clears_stock() {
        let mut r = reward(Some(3), true);
        let patch = RewardPatch {
            stock: Some(None),
            enabled: Some(false),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        patch.apply_to(&mut r);
        assert_eq!(r.stock, None);
        assert!(!r.enabled);
        assert_eq!(r.cost_points, 10);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(RewardPatch::default().is_empty());
        assert!(
            !RewardPatch {
                cost_points: Some(5),
                ..Default::default()
            }
            .is_empty()
        );
        assert!(
            RewardPatch {
                cost_points: Some(-5),
                ..Default::default()
            }
            .validate()
            .is_err()
        );
    }
}
