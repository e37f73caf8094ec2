//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试。
//! PostgreSQL 与内存两种实现必须提供相同的原子语义：
//! 条件扣减是单次原子写，对账是单行原子计算并覆盖。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Balance, DebitedRedemption, NewPointEvent, NewRedemption, NewReward, PointEvent,
    Reconciliation, Redemption, Reward, RewardPatch, User, UserSummary,
};

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// 按用户名查找，不存在则创建
    async fn get_or_create_user(&self, username: &str) -> Result<User>;
    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserSummary>>;
    async fn count_users(&self) -> Result<i64>;
}

/// 积分流水仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointEventRepositoryTrait: Send + Sync {
    async fn append(&self, event: &NewPointEvent) -> Result<PointEvent>;
    async fn get_event(&self, id: i64) -> Result<Option<PointEvent>>;
    /// 删除流水并返回被删除的记录，不存在时返回 None
    async fn delete_event(&self, id: i64) -> Result<Option<PointEvent>>;
    /// 按时间倒序列出用户最近的流水
    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<PointEvent>>;
    async fn sum_points(&self, user_id: i64) -> Result<i64>;
    async fn list_events(&self, offset: i64, limit: i64) -> Result<Vec<PointEvent>>;
    async fn count_events(&self) -> Result<i64>;
}

/// 奖品目录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepositoryTrait: Send + Sync {
    async fn get_reward(&self, id: i64) -> Result<Option<Reward>>;
    async fn list_rewards(&self, enabled_only: bool) -> Result<Vec<Reward>>;
    async fn create_reward(&self, reward: &NewReward) -> Result<Reward>;
    async fn update_reward(&self, id: i64, patch: &RewardPatch) -> Result<Option<Reward>>;
    /// 删除奖品，不存在时返回 false；已有兑换记录时返回 RewardInUse
    async fn delete_reward(&self, id: i64) -> Result<bool>;

    // 库存
    /// 条件扣减库存：stock = stock - 1 WHERE stock > 0，未命中返回 false
    async fn try_reserve_stock(&self, id: i64) -> Result<bool>;
    /// 归还一件库存（补偿），未命中返回 false
    async fn release_stock(&self, id: i64) -> Result<bool>;
}

/// 兑换记录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedemptionRepositoryTrait: Send + Sync {
    /// 条件扣减余额并写入兑换记录，作为一次原子写
    ///
    /// points = points - cost WHERE points >= cost；未命中时不写入任何记录并返回 None
    async fn debit_and_record(
        &self,
        redemption: &NewRedemption,
    ) -> Result<Option<DebitedRedemption>>;
    /// 按时间倒序列出用户的兑换记录
    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Redemption>>;
    /// 已批准兑换的积分合计
    async fn sum_approved_cost(&self, user_id: i64) -> Result<i64>;
    async fn list_redemptions(&self, offset: i64, limit: i64) -> Result<Vec<Redemption>>;
    async fn count_redemptions(&self) -> Result<i64>;
}

/// 余额缓存仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceRepositoryTrait: Send + Sync {
    async fn get_balance(&self, user_id: i64) -> Result<Option<Balance>>;
    /// 在单行原子单元内重算余额，缓存缺失或不一致时覆盖
    async fn reconcile(&self, user_id: i64) -> Result<Reconciliation>;
    /// 增量修改缓存并返回修改后的值，缓存缺失时以 delta 初始化
    async fn credit(&self, user_id: i64, delta: i64) -> Result<i64>;
}
