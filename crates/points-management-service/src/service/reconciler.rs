//! 余额对账
//!
//! 所有依赖余额的读取和判断之前都先对账：
//! effective = Σ 流水积分 − Σ 已批准兑换积分，缓存缺失或不一致时覆盖

use std::sync::Arc;

use loyalty_shared::observability::metrics::record_reconciliation;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::models::Reconciliation;
use crate::repository::{
    BalanceRepositoryTrait, PointEventRepositoryTrait, RedemptionRepositoryTrait,
};

/// 余额对账器
pub struct BalanceReconciler {
    balances: Arc<dyn BalanceRepositoryTrait>,
    events: Arc<dyn PointEventRepositoryTrait>,
    redemptions: Arc<dyn RedemptionRepositoryTrait>,
}

impl BalanceReconciler {
    pub fn new(
        balances: Arc<dyn BalanceRepositoryTrait>,
        events: Arc<dyn PointEventRepositoryTrait>,
        redemptions: Arc<dyn RedemptionRepositoryTrait>,
    ) -> Self {
        Self {
            balances,
            events,
            redemptions,
        }
    }

    /// 对账并返回有效余额
    ///
    /// 幂等：两次调用之间没有写入时返回相同的值，第二次不修改缓存
    pub async fn reconcile(&self, user_id: i64) -> Result<i64> {
        Ok(self.reconcile_detailed(user_id).await?.effective)
    }

    /// 对账并返回完整的计算结果
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn reconcile_detailed(&self, user_id: i64) -> Result<Reconciliation> {
        let reconciliation = self.balances.reconcile(user_id).await?;

        if reconciliation.drifted() {
            match reconciliation.previous {
                Some(previous) => warn!(
                    previous,
                    effective = reconciliation.effective,
                    drift = reconciliation.drift(),
                    "余额缓存与账本不一致，已按账本修复"
                ),
                None => debug!(effective = reconciliation.effective, "初始化余额缓存"),
            }
        }
        record_reconciliation(reconciliation.drifted(), reconciliation.drift());

        Ok(reconciliation)
    }

    /// 只读核对，不修改缓存
    ///
    /// 汇总与缓存分别读取，并发写入期间的结果只作参考
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn audit(&self, user_id: i64) -> Result<Reconciliation> {
        let previous = self
            .balances
            .get_balance(user_id)
            .await?
            .map(|b| b.points);
        let ledger_total = self.events.sum_points(user_id).await?;
        let redeemed_total = self.redemptions.sum_approved_cost(user_id).await?;

        Reconciliation::compute(user_id, previous, ledger_total, redeemed_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{
        MockBalanceRepositoryTrait, MockPointEventRepositoryTrait, MockRedemptionRepositoryTrait,
    };

    fn reconciler(balances: MockBalanceRepositoryTrait) -> BalanceReconciler {
        BalanceReconciler::new(
            Arc::new(balances),
            Arc::new(MockPointEventRepositoryTrait::new()),
            Arc::new(MockRedemptionRepositoryTrait::new()),
        )
    }

    #[tokio::test]
    async fn test_reconcile_returns_effective() {
        let mut balances = MockBalanceRepositoryTrait::new();
        balances
            .expect_reconcile()
            .withf(|user_id| *user_id == 7)
            .times(1)
            .returning(|user_id| Reconciliation::compute(user_id, Some(999), 50, 10));

        let balance = reconciler(balances).reconcile(7).await.unwrap();
        assert_eq!(balance, 40);
    }

    #[tokio::test]
    async fn test_audit_does_not_write() {
        let mut balances = MockBalanceRepositoryTrait::new();
        balances.expect_get_balance().returning(|user_id| {
            Ok(Some(crate::models::Balance {
                user_id,
                points: 100,
                updated_at: chrono::Utc::now(),
            }))
        });
        balances.expect_reconcile().never();
        balances.expect_credit().never();

        let mut events = MockPointEventRepositoryTrait::new();
        events.expect_sum_points().returning(|_| Ok(30));
        let mut redemptions = MockRedemptionRepositoryTrait::new();
        redemptions.expect_sum_approved_cost().returning(|_| Ok(10));

        let reconciler =
            BalanceReconciler::new(Arc::new(balances), Arc::new(events), Arc::new(redemptions));
        let audit = reconciler.audit(3).await.unwrap();
        assert_eq!(audit.previous, Some(100));
        assert_eq!(audit.effective, 20);
        // 只读核对只报告偏差，不改写缓存
        assert!(audit.drifted());
    }
}
