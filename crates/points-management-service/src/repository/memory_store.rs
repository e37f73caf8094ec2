//! 内存账本存储
//!
//! 使用 DashMap 实现的进程内存储，适用于测试和开发环境。
//! 条件写在单个 entry 锁内完成，语义与 PostgreSQL 实现一致。
//!
//! 锁顺序：balances 先于 events / redemptions，反向持锁会死锁

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::traits::{
    BalanceRepositoryTrait, PointEventRepositoryTrait, RedemptionRepositoryTrait,
    RewardRepositoryTrait, UserRepositoryTrait,
};
use crate::error::{LedgerError, Result};
use crate::models::{
    Balance, DebitedRedemption, NewPointEvent, NewRedemption, NewReward, PointEvent,
    Reconciliation, Redemption, RedemptionStatus, Reward, RewardPatch, User, UserSummary,
};

/// 内存账本存储
///
/// 同时实现全部仓储接口，一个实例即一套完整的账本
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    users: DashMap<i64, User>,
    usernames: DashMap<String, i64>,
    events: DashMap<i64, PointEvent>,
    rewards: DashMap<i64, Reward>,
    redemptions: DashMap<i64, Redemption>,
    balances: DashMap<i64, Balance>,
    user_seq: AtomicI64,
    event_seq: AtomicI64,
    reward_seq: AtomicI64,
    redemption_seq: AtomicI64,
}

/// 自增主键，从 1 开始
fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::SeqCst) + 1
}

/// 按 offset/limit 截取，负数视为 0
fn page<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// 求和，溢出时返回校验错误（与 PostgreSQL 的 BIGINT 溢出报错对应）
fn checked_total(mut values: impl Iterator<Item = i64>) -> Result<i64> {
    values
        .try_fold(0i64, i64::checked_add)
        .ok_or_else(|| LedgerError::Validation("积分合计超出范围".to_string()))
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger_total(&self, user_id: i64) -> Result<i64> {
        checked_total(
            self.events
                .iter()
                .filter(|e| e.user_id == user_id)
                .map(|e| e.points),
        )
    }

    fn redeemed_total(&self, user_id: i64) -> Result<i64> {
        checked_total(
            self.redemptions
                .iter()
                .filter(|r| r.user_id == user_id && r.status == RedemptionStatus::Approved)
                .map(|r| r.cost_points),
        )
    }

    /// 按 id 倒序（即创建时间倒序）收集
    fn newest_first<T: Clone>(map: &DashMap<i64, T>, filter: impl Fn(&T) -> bool) -> Vec<T> {
        let mut items: Vec<(i64, T)> = map
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        items.sort_by(|a, b| b.0.cmp(&a.0));
        items.into_iter().map(|(_, item)| item).collect()
    }
}

#[async_trait]
impl UserRepositoryTrait for MemoryLedgerStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let Some(id) = self.usernames.get(username).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_or_create_user(&self, username: &str) -> Result<User> {
        // usernames 的 entry 锁保证同名并发创建只有一个生效
        let id = *self
            .usernames
            .entry(username.to_string())
            .or_insert_with(|| {
                let id = next_id(&self.user_seq);
                self.users.insert(
                    id,
                    User {
                        id,
                        username: username.to_string(),
                        created_at: Utc::now(),
                    },
                );
                id
            });

        self.users
            .get(&id)
            .map(|u| u.clone())
            .ok_or_else(|| LedgerError::Internal(format!("用户索引损坏: {}", username)))
    }

    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserSummary>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by_key(|u| u.id);

        Ok(page(users, offset, limit)
            .into_iter()
            .map(|u| UserSummary {
                cached_points: self.balances.get(&u.id).map(|b| b.points),
                id: u.id,
                username: u.username,
                created_at: u.created_at,
            })
            .collect())
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.users.len() as i64)
    }
}

#[async_trait]
impl PointEventRepositoryTrait for MemoryLedgerStore {
    async fn append(&self, event: &NewPointEvent) -> Result<PointEvent> {
        let created = PointEvent {
            id: next_id(&self.event_seq),
            user_id: event.user_id,
            title: event.title.clone(),
            points: event.points,
            created_at: Utc::now(),
        };
        self.events.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_event(&self, id: i64) -> Result<Option<PointEvent>> {
        Ok(self.events.get(&id).map(|e| e.clone()))
    }

    async fn delete_event(&self, id: i64) -> Result<Option<PointEvent>> {
        Ok(self.events.remove(&id).map(|(_, e)| e))
    }

    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<PointEvent>> {
        let events = Self::newest_first(&self.events, |e| e.user_id == user_id);
        Ok(page(events, 0, limit))
    }

    async fn sum_points(&self, user_id: i64) -> Result<i64> {
        self.ledger_total(user_id)
    }

    async fn list_events(&self, offset: i64, limit: i64) -> Result<Vec<PointEvent>> {
        Ok(page(Self::newest_first(&self.events, |_| true), offset, limit))
    }

    async fn count_events(&self) -> Result<i64> {
        Ok(self.events.len() as i64)
    }
}

#[async_trait]
impl RewardRepositoryTrait for MemoryLedgerStore {
    async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        Ok(self.rewards.get(&id).map(|r| r.clone()))
    }

    async fn list_rewards(&self, enabled_only: bool) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|r| !enabled_only || r.enabled)
            .map(|r| r.clone())
            .collect();
        rewards.sort_by_key(|r| (r.cost_points, r.id));
        Ok(rewards)
    }

    async fn create_reward(&self, reward: &NewReward) -> Result<Reward> {
        let now = Utc::now();
        let created = Reward {
            id: next_id(&self.reward_seq),
            name: reward.name.trim().to_string(),
            cost_points: reward.cost_points,
            stock: reward.stock,
            description: reward.description.clone(),
            enabled: reward.enabled,
            created_at: now,
            updated_at: now,
        };
        self.rewards.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_reward(&self, id: i64, patch: &RewardPatch) -> Result<Option<Reward>> {
        Ok(self.rewards.get_mut(&id).map(|mut reward| {
            patch.apply_to(&mut reward);
            reward.clone()
        }))
    }

    async fn delete_reward(&self, id: i64) -> Result<bool> {
        match self.rewards.entry(id) {
            Entry::Vacant(_) => Ok(false),
            Entry::Occupied(entry) => {
                if self.redemptions.iter().any(|r| r.reward_id == id) {
                    return Err(LedgerError::RewardInUse(id));
                }
                entry.remove();
                Ok(true)
            }
        }
    }

    async fn try_reserve_stock(&self, id: i64) -> Result<bool> {
        let Some(mut reward) = self.rewards.get_mut(&id) else {
            return Ok(false);
        };
        match reward.stock {
            Some(stock) if stock > 0 => {
                reward.stock = Some(stock - 1);
                reward.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_stock(&self, id: i64) -> Result<bool> {
        let Some(mut reward) = self.rewards.get_mut(&id) else {
            return Ok(false);
        };
        match reward.stock {
            Some(stock) => {
                reward.stock = Some(stock + 1);
                reward.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RedemptionRepositoryTrait for MemoryLedgerStore {
    async fn debit_and_record(
        &self,
        redemption: &NewRedemption,
    ) -> Result<Option<DebitedRedemption>> {
        let Some(mut balance) = self.balances.get_mut(&redemption.user_id) else {
            return Ok(None);
        };
        if balance.points < redemption.cost_points {
            return Ok(None);
        }

        // 持有余额锁写入兑换记录，对账不会看到只扣了余额的中间状态
        let recorded = Redemption {
            id: next_id(&self.redemption_seq),
            user_id: redemption.user_id,
            reward_id: redemption.reward_id,
            cost_points: redemption.cost_points,
            status: redemption.status,
            created_at: Utc::now(),
        };
        self.redemptions.insert(recorded.id, recorded.clone());
        balance.points -= redemption.cost_points;
        balance.updated_at = Utc::now();

        Ok(Some(DebitedRedemption {
            redemption: recorded,
            balance_after: balance.points,
        }))
    }

    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Redemption>> {
        let redemptions = Self::newest_first(&self.redemptions, |r| r.user_id == user_id);
        Ok(page(redemptions, 0, limit))
    }

    async fn sum_approved_cost(&self, user_id: i64) -> Result<i64> {
        self.redeemed_total(user_id)
    }

    async fn list_redemptions(&self, offset: i64, limit: i64) -> Result<Vec<Redemption>> {
        Ok(page(
            Self::newest_first(&self.redemptions, |_| true),
            offset,
            limit,
        ))
    }

    async fn count_redemptions(&self) -> Result<i64> {
        Ok(self.redemptions.len() as i64)
    }
}

#[async_trait]
impl BalanceRepositoryTrait for MemoryLedgerStore {
    async fn get_balance(&self, user_id: i64) -> Result<Option<Balance>> {
        Ok(self.balances.get(&user_id).map(|b| b.clone()))
    }

    async fn reconcile(&self, user_id: i64) -> Result<Reconciliation> {
        // entry 锁覆盖汇总与覆盖写，与 debit_and_record 互斥
        let entry = self.balances.entry(user_id);
        let previous = match &entry {
            Entry::Occupied(occupied) => Some(occupied.get().points),
            Entry::Vacant(_) => None,
        };

        let reconciliation = Reconciliation::compute(
            user_id,
            previous,
            self.ledger_total(user_id)?,
            self.redeemed_total(user_id)?,
        )?;

        if reconciliation.drifted() {
            let balance = Balance {
                user_id,
                points: reconciliation.effective,
                updated_at: Utc::now(),
            };
            match entry {
                Entry::Occupied(mut occupied) => {
                    occupied.insert(balance);
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(balance);
                }
            }
        }

        Ok(reconciliation)
    }

    async fn credit(&self, user_id: i64, delta: i64) -> Result<i64> {
        match self.balances.entry(user_id) {
            Entry::Occupied(mut occupied) => {
                let balance = occupied.get_mut();
                balance.points = balance
                    .points
                    .checked_add(delta)
                    .ok_or_else(|| LedgerError::Validation("余额超出范围".to_string()))?;
                balance.updated_at = Utc::now();
                Ok(balance.points)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Balance {
                    user_id,
                    points: delta,
                    updated_at: Utc::now(),
                });
                Ok(delta)
            }
        }
    }
}
