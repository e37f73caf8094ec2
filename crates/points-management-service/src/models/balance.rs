//! 余额缓存与对账结果

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// 余额缓存
///
/// 由流水和兑换记录推导出的物化视图，随时可以重算
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub user_id: i64,
    pub points: i64,
    pub updated_at: DateTime<Utc>,
}

/// 一次对账的计算结果
///
/// effective = ledger_total - redeemed_total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub user_id: i64,
    /// 对账前的缓存值，缓存不存在时为 None
    pub previous: Option<i64>,
    /// 流水积分合计
    pub ledger_total: i64,
    /// 已批准兑换的积分合计
    pub redeemed_total: i64,
    pub effective: i64,
}

impl Reconciliation {
    /// 差值超出 i64 范围时返回校验错误
    pub fn compute(
        user_id: i64,
        previous: Option<i64>,
        ledger_total: i64,
        redeemed_total: i64,
    ) -> Result<Self> {
        let effective = ledger_total
            .checked_sub(redeemed_total)
            .ok_or_else(|| LedgerError::Validation("积分合计超出范围".to_string()))?;
        Ok(Self {
            user_id,
            previous,
            ledger_total,
            redeemed_total,
            effective,
        })
    }

    /// 缓存缺失或与计算值不一致
    ///
    /// 对账路径下为 true 表示缓存已被覆盖；只读核对时仅表示存在偏差
    pub fn drifted(&self) -> bool {
        self.previous != Some(self.effective)
    }

    /// 缓存偏差（effective - previous），缓存缺失按 0 计
    pub fn drift(&self) -> i64 {
        self.effective.saturating_sub(self.previous.unwrap_or(0))
    }
}
