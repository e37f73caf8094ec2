//! 管理端服务
//!
//! 奖品目录维护、积分调整、流水删除、强制对账和各类列表。
//! 每个操作都要求 [`AdminCapability`]，核心层不接触原始密钥。

use std::sync::Arc;

use loyalty_shared::observability::metrics::record_admin_adjustment;
use tracing::{info, instrument, warn};

use super::dto::{AdjustmentOutcome, EventDeletion, Page};
use super::reconciler::BalanceReconciler;
use crate::auth::AdminCapability;
use crate::error::{LedgerError, Result};
use crate::models::{
    NewPointEvent, NewReward, PointEvent, Reconciliation, Redemption, Reward, RewardPatch, User,
    UserSummary, check_points_range, normalize_username,
};
use crate::repository::{
    BalanceRepositoryTrait, PointEventRepositoryTrait, RedemptionRepositoryTrait,
    RewardRepositoryTrait, UserRepositoryTrait,
};

/// 管理端服务
pub struct AdminService {
    users: Arc<dyn UserRepositoryTrait>,
    events: Arc<dyn PointEventRepositoryTrait>,
    rewards: Arc<dyn RewardRepositoryTrait>,
    redemptions: Arc<dyn RedemptionRepositoryTrait>,
    balances: Arc<dyn BalanceRepositoryTrait>,
    reconciler: Arc<BalanceReconciler>,
    /// 无原因的调整是否也写入账本
    record_unreasoned_adjustments: bool,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserRepositoryTrait>,
        events: Arc<dyn PointEventRepositoryTrait>,
        rewards: Arc<dyn RewardRepositoryTrait>,
        redemptions: Arc<dyn RedemptionRepositoryTrait>,
        balances: Arc<dyn BalanceRepositoryTrait>,
        reconciler: Arc<BalanceReconciler>,
        record_unreasoned_adjustments: bool,
    ) -> Self {
        Self {
            users,
            events,
            rewards,
            redemptions,
            balances,
            reconciler,
            record_unreasoned_adjustments,
        }
    }

    // ==================== 奖品目录 ====================

    pub async fn list_rewards(&self, _capability: &AdminCapability) -> Result<Vec<Reward>> {
        self.rewards.list_rewards(false).await
    }

    #[instrument(skip(self, _capability, reward), fields(name = %reward.name))]
    pub async fn create_reward(
        &self,
        _capability: &AdminCapability,
        reward: NewReward,
    ) -> Result<Reward> {
        reward.validate()?;
        let created = self.rewards.create_reward(&reward).await?;
        info!(reward_id = created.id, "奖品已创建");
        Ok(created)
    }

    #[instrument(skip(self, _capability, patch))]
    pub async fn update_reward(
        &self,
        _capability: &AdminCapability,
        reward_id: i64,
        patch: RewardPatch,
    ) -> Result<Reward> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(LedgerError::Validation("没有需要更新的字段".to_string()));
        }
        let updated = self
            .rewards
            .update_reward(reward_id, &patch)
            .await?
            .ok_or(LedgerError::RewardNotFound(reward_id))?;
        info!(enabled = updated.enabled, stock = ?updated.stock, "奖品已更新");
        Ok(updated)
    }

    /// 删除奖品，已有兑换记录的奖品只能停用
    #[instrument(skip(self, _capability))]
    pub async fn delete_reward(&self, _capability: &AdminCapability, reward_id: i64) -> Result<()> {
        if !self.rewards.delete_reward(reward_id).await? {
            return Err(LedgerError::RewardNotFound(reward_id));
        }
        info!("奖品已删除");
        Ok(())
    }

    // ==================== 积分 ====================

    /// 调整用户积分
    ///
    /// 有原因时写入一条流水再增量修改缓存；没有原因时按配置决定
    /// 使用默认标题写入账本，或只修改缓存（下一次对账会还原）
    #[instrument(skip(self, _capability, reason), fields(delta = %delta))]
    pub async fn adjust_points(
        &self,
        _capability: &AdminCapability,
        username: &str,
        delta: i64,
        reason: Option<&str>,
    ) -> Result<AdjustmentOutcome> {
        if delta == 0 {
            return Err(LedgerError::Validation("调整积分不能为 0".to_string()));
        }
        check_points_range(delta)?;
        let user = self.require_user(username).await?;
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());

        let event = if reason.is_some() || self.record_unreasoned_adjustments {
            let event = self
                .events
                .append(&NewPointEvent::adjustment(user.id, reason, delta)?)
                .await?;
            Some(event)
        } else {
            warn!(
                user_id = user.id,
                "无原因的积分调整只修改余额缓存，下一次对账会被还原"
            );
            None
        };

        let balance = self.balances.credit(user.id, delta).await?;
        let recorded_in_ledger = event.is_some();
        record_admin_adjustment(recorded_in_ledger);
        info!(user_id = user.id, balance, recorded_in_ledger, "积分已调整");

        Ok(AdjustmentOutcome {
            event,
            balance,
            recorded_in_ledger,
        })
    }

    /// 删除流水并从缓存中扣回该流水的积分，不做完整对账
    #[instrument(skip(self, _capability))]
    pub async fn delete_event(
        &self,
        _capability: &AdminCapability,
        event_id: i64,
    ) -> Result<EventDeletion> {
        let event = self
            .events
            .delete_event(event_id)
            .await?
            .ok_or(LedgerError::EventNotFound(event_id))?;
        let reversal = event
            .points
            .checked_neg()
            .ok_or_else(|| LedgerError::Validation("流水积分超出范围".to_string()))?;
        let balance = self.balances.credit(event.user_id, reversal).await?;

        info!(
            user_id = event.user_id,
            points = event.points,
            balance,
            "积分流水已删除"
        );

        Ok(EventDeletion { event, balance })
    }

    /// 强制对账
    #[instrument(skip(self, _capability))]
    pub async fn reconcile_user(
        &self,
        _capability: &AdminCapability,
        username: &str,
    ) -> Result<Reconciliation> {
        let user = self.require_user(username).await?;
        self.reconciler.reconcile_detailed(user.id).await
    }

    /// 只读核对缓存与账本
    pub async fn audit_user(
        &self,
        _capability: &AdminCapability,
        username: &str,
    ) -> Result<Reconciliation> {
        let user = self.require_user(username).await?;
        self.reconciler.audit(user.id).await
    }

    // ==================== 列表 ====================

    pub async fn list_users(
        &self,
        _capability: &AdminCapability,
        offset: i64,
        limit: i64,
    ) -> Result<Page<UserSummary>> {
        let items = self.users.list_users(offset, limit).await?;
        let total = self.users.count_users().await?;
        Ok(Page::new(items, total))
    }

    pub async fn list_events(
        &self,
        _capability: &AdminCapability,
        offset: i64,
        limit: i64,
    ) -> Result<Page<PointEvent>> {
        let items = self.events.list_events(offset, limit).await?;
        let total = self.events.count_events().await?;
        Ok(Page::new(items, total))
    }

    pub async fn list_redemptions(
        &self,
        _capability: &AdminCapability,
        offset: i64,
        limit: i64,
    ) -> Result<Page<Redemption>> {
        let items = self.redemptions.list_redemptions(offset, limit).await?;
        let total = self.redemptions.count_redemptions().await?;
        Ok(Page::new(items, total))
    }

    async fn require_user(&self, username: &str) -> Result<User> {
        let username = normalize_username(username)?;
        self.users
            .get_user_by_username(&username)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(username.clone()))
    }
}
