//! 用户账户服务
//!
//! 面向终端用户的操作：初始化、查看概览、获得积分、兑换奖品、查看兑换历史。
//! 返回余额的操作都先对账

use std::sync::Arc;

use tracing::{info, instrument};

use super::dto::{AccountOverview, EarnOutcome, RedeemOutcome};
use super::reconciler::BalanceReconciler;
use super::redemption_engine::RedemptionEngine;
use crate::error::{LedgerError, Result};
use crate::models::{NewPointEvent, Redemption, Reward, User, normalize_username};
use crate::repository::{
    PointEventRepositoryTrait, RedemptionRepositoryTrait, RewardRepositoryTrait,
    UserRepositoryTrait,
};

/// 兑换历史的默认条数上限
pub const REDEMPTION_HISTORY_LIMIT: i64 = 100;

/// 用户账户服务
pub struct AccountService {
    users: Arc<dyn UserRepositoryTrait>,
    events: Arc<dyn PointEventRepositoryTrait>,
    rewards: Arc<dyn RewardRepositoryTrait>,
    redemptions: Arc<dyn RedemptionRepositoryTrait>,
    reconciler: Arc<BalanceReconciler>,
    engine: Arc<RedemptionEngine>,
    recent_events_limit: i64,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepositoryTrait>,
        events: Arc<dyn PointEventRepositoryTrait>,
        rewards: Arc<dyn RewardRepositoryTrait>,
        redemptions: Arc<dyn RedemptionRepositoryTrait>,
        reconciler: Arc<BalanceReconciler>,
        engine: Arc<RedemptionEngine>,
        recent_events_limit: i64,
    ) -> Self {
        Self {
            users,
            events,
            rewards,
            redemptions,
            reconciler,
            engine,
            recent_events_limit,
        }
    }

    /// 初始化用户（不存在则创建）并返回概览
    #[instrument(skip(self))]
    pub async fn init_user(&self, username: &str) -> Result<AccountOverview> {
        let username = normalize_username(username)?;
        let user = self.users.get_or_create_user(&username).await?;
        self.build_overview(user).await
    }

    /// 查看用户概览
    #[instrument(skip(self))]
    pub async fn overview(&self, username: &str) -> Result<AccountOverview> {
        let user = self.require_user(username).await?;
        self.build_overview(user).await
    }

    /// 获得积分，返回对账后的余额
    ///
    /// 用户首次被引用时自动创建
    #[instrument(skip(self), fields(points = %points))]
    pub async fn earn(&self, username: &str, title: &str, points: i64) -> Result<EarnOutcome> {
        let username = normalize_username(username)?;
        let user = self.users.get_or_create_user(&username).await?;
        let event = self
            .events
            .append(&NewPointEvent::earned(user.id, title, points)?)
            .await?;
        let balance = self.reconciler.reconcile(user.id).await?;

        info!(user_id = user.id, event_id = event.id, balance, "积分入账");

        Ok(EarnOutcome { event, balance })
    }

    /// 兑换奖品
    #[instrument(skip(self), fields(reward_id = %reward_id))]
    pub async fn redeem(&self, username: &str, reward_id: i64) -> Result<RedeemOutcome> {
        let user = self.require_user(username).await?;
        self.engine.redeem(user.id, reward_id).await
    }

    /// 用户兑换历史，按时间倒序
    #[instrument(skip(self))]
    pub async fn redemptions(&self, username: &str) -> Result<Vec<Redemption>> {
        let user = self.require_user(username).await?;
        self.redemptions
            .list_by_user(user.id, REDEMPTION_HISTORY_LIMIT)
            .await
    }

    /// 可兑换的奖品目录
    pub async fn active_rewards(&self) -> Result<Vec<Reward>> {
        self.rewards.list_rewards(true).await
    }

    async fn require_user(&self, username: &str) -> Result<User> {
        let username = normalize_username(username)?;
        self.users
            .get_user_by_username(&username)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(username.clone()))
    }

    async fn build_overview(&self, user: User) -> Result<AccountOverview> {
        let balance = self.reconciler.reconcile(user.id).await?;
        let recent_events = self
            .events
            .list_by_user(user.id, self.recent_events_limit)
            .await?;
        let rewards = self.active_rewards().await?;

        Ok(AccountOverview {
            user,
            balance,
            recent_events,
            rewards,
        })
    }
}
