//! 兑换引擎
//!
//! 处理奖品兑换的核心流程，严格按以下顺序执行：
//!
//! 1. 加载奖品，不存在或已停用 -> reward_unavailable
//! 2. 对账
//! 3. 余额不足 -> insufficient_points
//! 4. 限量且库存 <= 0 -> out_of_stock
//! 5. 条件扣减库存，未命中 -> out_of_stock
//! 6. 条件扣减余额并写入兑换记录，未命中 -> 归还库存后 insufficient_points
//! 7. 追加 0 积分的兑换备注流水
//! 8. 返回扣减后的余额
//!
//! 1-4 步没有副作用。竞争失败直接返回，不排队、不重试。

use std::sync::Arc;
use std::time::Instant;

use loyalty_shared::observability::metrics::{record_redemption, record_stock_compensation};
use tracing::{error, info, instrument, warn};

use super::dto::RedeemOutcome;
use super::reconciler::BalanceReconciler;
use crate::error::{LedgerError, Result};
use crate::models::{NewPointEvent, NewRedemption};
use crate::repository::{
    PointEventRepositoryTrait, RedemptionRepositoryTrait, RewardRepositoryTrait,
};

/// 兑换引擎
pub struct RedemptionEngine {
    rewards: Arc<dyn RewardRepositoryTrait>,
    redemptions: Arc<dyn RedemptionRepositoryTrait>,
    events: Arc<dyn PointEventRepositoryTrait>,
    reconciler: Arc<BalanceReconciler>,
}

impl RedemptionEngine {
    pub fn new(
        rewards: Arc<dyn RewardRepositoryTrait>,
        redemptions: Arc<dyn RedemptionRepositoryTrait>,
        events: Arc<dyn PointEventRepositoryTrait>,
        reconciler: Arc<BalanceReconciler>,
    ) -> Self {
        Self {
            rewards,
            redemptions,
            events,
            reconciler,
        }
    }

    /// 兑换奖品
    #[instrument(skip(self), fields(user_id = %user_id, reward_id = %reward_id))]
    pub async fn redeem(&self, user_id: i64, reward_id: i64) -> Result<RedeemOutcome> {
        let start = Instant::now();
        let result = self.execute(user_id, reward_id).await;
        record_redemption(outcome_label(&result), start.elapsed().as_secs_f64());
        result
    }

    async fn execute(&self, user_id: i64, reward_id: i64) -> Result<RedeemOutcome> {
        let reward = self
            .rewards
            .get_reward(reward_id)
            .await?
            .filter(|r| r.enabled)
            .ok_or(LedgerError::RewardUnavailable(reward_id))?;

        let balance = self.reconciler.reconcile(user_id).await?;
        if balance < reward.cost_points {
            return Err(LedgerError::InsufficientPoints {
                required: reward.cost_points,
                available: Some(balance),
            });
        }

        if !reward.has_stock() {
            return Err(LedgerError::OutOfStock(reward_id));
        }

        let stock_reserved = reward.is_limited();
        if stock_reserved && !self.rewards.try_reserve_stock(reward_id).await? {
            info!("库存扣减未命中，兑换失败");
            return Err(LedgerError::OutOfStock(reward_id));
        }

        // 存储错误直接返回且不归还库存：扣减可能已经生效，少卖优于超卖
        let debited = match self
            .redemptions
            .debit_and_record(&NewRedemption::approved(user_id, &reward))
            .await?
        {
            Some(debited) => debited,
            None => {
                if stock_reserved {
                    self.compensate_stock(user_id, reward_id).await;
                }
                info!("余额扣减未命中，兑换失败");
                // 对账时的余额已被并发扣减，不再代表可用积分
                return Err(LedgerError::InsufficientPoints {
                    required: reward.cost_points,
                    available: None,
                });
            }
        };

        // 备注流水积分为 0，不影响余额；写入失败不撤销已提交的兑换
        if let Err(e) = self
            .events
            .append(&NewPointEvent::redemption_note(user_id, &reward.name))
            .await
        {
            warn!(
                redemption_id = debited.redemption.id,
                error = %e,
                "兑换备注流水写入失败"
            );
        }

        info!(
            redemption_id = debited.redemption.id,
            cost_points = reward.cost_points,
            new_balance = debited.balance_after,
            "兑换成功"
        );

        Ok(RedeemOutcome {
            redemption: debited.redemption,
            new_balance: debited.balance_after,
        })
    }

    /// 归还第 5 步扣减的库存
    ///
    /// 失败时只记录，调用方的结果仍是 insufficient_points
    async fn compensate_stock(&self, user_id: i64, reward_id: i64) {
        match self.rewards.release_stock(reward_id).await {
            Ok(true) => {
                record_stock_compensation(true);
                info!(reward_id, user_id, "已归还库存");
            }
            Ok(false) => {
                record_stock_compensation(false);
                error!(reward_id, user_id, "库存归还未命中任何奖品，库存少计 1");
            }
            Err(e) => {
                record_stock_compensation(false);
                error!(reward_id, user_id, error = %e, "库存归还失败，库存少计 1");
            }
        }
    }
}

fn outcome_label(result: &Result<RedeemOutcome>) -> &'static str {
    match result {
        Ok(_) => "approved",
        Err(LedgerError::RewardUnavailable(_)) => "reward_unavailable",
        Err(LedgerError::InsufficientPoints { .. }) => "insufficient_points",
        Err(LedgerError::OutOfStock(_)) => "out_of_stock",
        Err(_) => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DebitedRedemption, Reconciliation, Redemption, RedemptionStatus, Reward};
    use crate::repository::{
        MockBalanceRepositoryTrait, MockPointEventRepositoryTrait, MockRedemptionRepositoryTrait,
        MockRewardRepositoryTrait,
    };
    use chrono::Utc;

    fn reward(stock: Option<i64>, enabled: bool) -> Reward {
        Reward {
            id: 5,
            name: "咖啡券".to_string(),
            cost_points: 10,
            stock,
            description: None,
            enabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// 对账固定返回给定余额
    fn reconciler_with_balance(balance: i64) -> Arc<BalanceReconciler> {
        let mut balances = MockBalanceRepositoryTrait::new();
        balances
            .expect_reconcile()
            .returning(move |user_id| Reconciliation::compute(user_id, Some(balance), balance, 0));
        Arc::new(BalanceReconciler::new(
            Arc::new(balances),
            Arc::new(MockPointEventRepositoryTrait::new()),
            Arc::new(MockRedemptionRepositoryTrait::new()),
        ))
    }

    fn engine(
        rewards: MockRewardRepositoryTrait,
        redemptions: MockRedemptionRepositoryTrait,
        events: MockPointEventRepositoryTrait,
        balance: i64,
    ) -> RedemptionEngine {
        RedemptionEngine::new(
            Arc::new(rewards),
            Arc::new(redemptions),
            Arc::new(events),
            reconciler_with_balance(balance),
        )
    }

    #[tokio::test]
    async fn test_disabled_reward_is_unavailable() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_reward()
            .returning(|_| Ok(Some(reward(None, false))));
        rewards.expect_try_reserve_stock().never();

        let err = engine(
            rewards,
            MockRedemptionRepositoryTrait::new(),
            MockPointEventRepositoryTrait::new(),
            100,
        )
        .redeem(1, 5)
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::RewardUnavailable(5)));
    }

    #[tokio::test]
    async fn test_missing_reward_is_unavailable() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards.expect_get_reward().returning(|_| Ok(None));

        let err = engine(
            rewards,
            MockRedemptionRepositoryTrait::new(),
            MockPointEventRepositoryTrait::new(),
            100,
        )
        .redeem(1, 5)
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::RewardUnavailable(5)));
    }

    #[tokio::test]
    async fn test_insufficient_points_has_no_side_effects() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_reward()
            .returning(|_| Ok(Some(reward(Some(3), true))));
        rewards.expect_try_reserve_stock().never();
        let mut redemptions = MockRedemptionRepositoryTrait::new();
        redemptions.expect_debit_and_record().never();

        let err = engine(rewards, redemptions, MockPointEventRepositoryTrait::new(), 9)
            .redeem(1, 5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientPoints {
                required: 10,
                available: Some(9)
            }
        ));
    }

    #[tokio::test]
    async fn test_zero_stock_is_out_of_stock() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_reward()
            .returning(|_| Ok(Some(reward(Some(0), true))));
        rewards.expect_try_reserve_stock().never();

        let err = engine(
            rewards,
            MockRedemptionRepositoryTrait::new(),
            MockPointEventRepositoryTrait::new(),
            1_000,
        )
        .redeem(1, 5)
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::OutOfStock(5)));
    }

    #[tokio::test]
    async fn test_lost_stock_race_is_out_of_stock() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_reward()
            .returning(|_| Ok(Some(reward(Some(1), true))));
        rewards
            .expect_try_reserve_stock()
            .times(1)
            .returning(|_| Ok(false));
        rewards.expect_release_stock().never();
        let mut redemptions = MockRedemptionRepositoryTrait::new();
        redemptions.expect_debit_and_record().never();

        let err = engine(rewards, redemptions, MockPointEventRepositoryTrait::new(), 100)
            .redeem(1, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::OutOfStock(5)));
    }

    #[tokio::test]
    async fn test_lost_balance_race_restores_stock() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_reward()
            .returning(|_| Ok(Some(reward(Some(1), true))));
        rewards
            .expect_try_reserve_stock()
            .times(1)
            .returning(|_| Ok(true));
        rewards
            .expect_release_stock()
            .withf(|id| *id == 5)
            .times(1)
            .returning(|_| Ok(true));
        let mut redemptions = MockRedemptionRepositoryTrait::new();
        redemptions
            .expect_debit_and_record()
            .times(1)
            .returning(|_| Ok(None));
        let mut events = MockPointEventRepositoryTrait::new();
        events.expect_append().never();

        let err = engine(rewards, redemptions, events, 10)
            .redeem(1, 5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientPoints {
                required: 10,
                available: None
            }
        ));
        assert!(!err.to_string().contains("可用"));
    }

    #[tokio::test]
    async fn test_failed_compensation_still_reports_insufficient_points() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_reward()
            .returning(|_| Ok(Some(reward(Some(1), true))));
        rewards.expect_try_reserve_stock().returning(|_| Ok(true));
        rewards
            .expect_release_stock()
            .times(1)
            .returning(|_| Err(LedgerError::Internal("连接断开".to_string())));
        let mut redemptions = MockRedemptionRepositoryTrait::new();
        redemptions.expect_debit_and_record().returning(|_| Ok(None));

        let err = engine(rewards, redemptions, MockPointEventRepositoryTrait::new(), 10)
            .redeem(1, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientPoints { .. }));
    }

    #[tokio::test]
    async fn test_unlimited_reward_skips_stock() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_reward()
            .returning(|_| Ok(Some(reward(None, true))));
        rewards.expect_try_reserve_stock().never();
        rewards.expect_release_stock().never();
        let mut redemptions = MockRedemptionRepositoryTrait::new();
        redemptions.expect_debit_and_record().returning(|new| {
            Ok(Some(DebitedRedemption {
                redemption: Redemption {
                    id: 11,
                    user_id: new.user_id,
                    reward_id: new.reward_id,
                    cost_points: new.cost_points,
                    status: RedemptionStatus::Approved,
                    created_at: Utc::now(),
                },
                balance_after: 15,
            }))
        });
        let mut events = MockPointEventRepositoryTrait::new();
        events
            .expect_append()
            .withf(|e| e.points == 0 && e.title.contains("咖啡券"))
            .times(1)
            .returning(|e| {
                Ok(crate::models::PointEvent {
                    id: 1,
                    user_id: e.user_id,
                    title: e.title.clone(),
                    points: e.points,
                    created_at: Utc::now(),
                })
            });

        let outcome = engine(rewards, redemptions, events, 25)
            .redeem(1, 5)
            .await
            .unwrap();
        assert_eq!(outcome.new_balance, 15);
        assert_eq!(outcome.redemption.cost_points, 10);
    }

    #[tokio::test]
    async fn test_storage_error_does_not_compensate() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_reward()
            .returning(|_| Ok(Some(reward(Some(2), true))));
        rewards.expect_try_reserve_stock().returning(|_| Ok(true));
        rewards.expect_release_stock().never();
        let mut redemptions = MockRedemptionRepositoryTrait::new();
        redemptions
            .expect_debit_and_record()
            .returning(|_| Err(LedgerError::Database(sqlx::Error::PoolTimedOut)));

        let err = engine(rewards, redemptions, MockPointEventRepositoryTrait::new(), 50)
            .redeem(1, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Database(_)));
    }

    #[test]
    fn test_outcome_label() {
        assert_eq!(
            outcome_label(&Err(LedgerError::OutOfStock(1))),
            "out_of_stock"
        );
        assert_eq!(
            outcome_label(&Err(LedgerError::Internal("x".into()))),
            "error"
        );
    }
}
