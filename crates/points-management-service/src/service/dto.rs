//! 服务层数据传输对象

use serde::Serialize;

use crate::models::{PointEvent, Redemption, Reward, User};

/// 用户概览：对账后的余额、最近流水、可兑换奖品
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverview {
    pub user: User,
    pub balance: i64,
    pub recent_events: Vec<PointEvent>,
    pub rewards: Vec<Reward>,
}

/// 获得积分结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnOutcome {
    pub event: PointEvent,
    pub balance: i64,
}

/// 兑换结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemOutcome {
    pub redemption: Redemption,
    /// 扣减后的余额
    pub new_balance: i64,
}

/// 管理员积分调整结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentOutcome {
    /// 写入账本的流水，仅修改缓存时为 None
    pub event: Option<PointEvent>,
    pub balance: i64,
    pub recorded_in_ledger: bool,
}

/// 删除流水结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDeletion {
    pub event: PointEvent,
    /// 扣回后的缓存余额
    pub balance: i64,
}

/// 分页结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }
}
