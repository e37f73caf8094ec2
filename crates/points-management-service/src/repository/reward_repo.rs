//! 奖品目录仓储
//!
//! 库存只能通过条件写修改：扣减要求 stock > 0，不限量（NULL）的奖品不参与

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::RewardRepositoryTrait;
use crate::error::{LedgerError, Result};
use crate::models::{NewReward, Reward, RewardPatch};

/// 奖品目录仓储
pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, name, cost_points, stock, description, enabled, created_at, updated_at
            FROM rewards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }

    /// 列出奖品，enabled_only 为 true 时只返回启用的
    pub async fn list_rewards(&self, enabled_only: bool) -> Result<Vec<Reward>> {
        let rewards = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, name, cost_points, stock, description, enabled, created_at, updated_at
            FROM rewards
            WHERE ($1 = false OR enabled = true)
            ORDER BY cost_points ASC, id ASC
            "#,
        )
        .bind(enabled_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rewards)
    }

    pub async fn create_reward(&self, reward: &NewReward) -> Result<Reward> {
        let created = sqlx::query_as::<_, Reward>(
            r#"
            INSERT INTO rewards (name, cost_points, stock, description, enabled)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, cost_points, stock, description, enabled, created_at, updated_at
            "#,
        )
        .bind(reward.name.trim())
        .bind(reward.cost_points)
        .bind(reward.stock)
        .bind(&reward.description)
        .bind(reward.enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// 部分更新
    ///
    /// 单条 UPDATE 完成，未出现在补丁中的列保持数据库中的当前值，
    /// 不会覆盖并发的库存扣减
    pub async fn update_reward(&self, id: i64, patch: &RewardPatch) -> Result<Option<Reward>> {
        let updated = sqlx::query_as::<_, Reward>(
            r#"
            UPDATE rewards SET
                name = COALESCE($2, name),
                cost_points = COALESCE($3, cost_points),
                stock = CASE WHEN $4 THEN $5 ELSE stock END,
                description = CASE WHEN $6 THEN $7 ELSE description END,
                enabled = COALESCE($8, enabled),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, cost_points, stock, description, enabled, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(patch.cost_points)
        .bind(patch.stock.is_some())
        .bind(patch.stock.flatten())
        .bind(patch.description.is_some())
        .bind(patch.description.clone().flatten())
        .bind(patch.enabled)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    /// 删除奖品
    ///
    /// redemptions 外键保护历史记录，被引用时返回 RewardInUse
    pub async fn delete_reward(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rewards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(LedgerError::RewardInUse(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 条件扣减库存
    pub async fn try_reserve_stock(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE rewards
            SET stock = stock - 1, updated_at = NOW()
            WHERE id = $1 AND stock IS NOT NULL AND stock > 0
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 归还库存
    pub async fn release_stock(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE rewards
            SET stock = stock + 1, updated_at = NOW()
            WHERE id = $1 AND stock IS NOT NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl RewardRepositoryTrait for RewardRepository {
    async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        self.get_reward(id).await
    }

    async fn list_rewards(&self, enabled_only: bool) -> Result<Vec<Reward>> {
        self.list_rewards(enabled_only).await
    }

    async fn create_reward(&self, reward: &NewReward) -> Result<Reward> {
        self.create_reward(reward).await
    }

    async fn update_reward(&self, id: i64, patch: &RewardPatch) -> Result<Option<Reward>> {
        self.update_reward(id, patch).await
    }

    async fn delete_reward(&self, id: i64) -> Result<bool> {
        self.delete_reward(id).await
    }

    async fn try_reserve_stock(&self, id: i64) -> Result<bool> {
        self.try_reserve_stock(id).await
    }

    async fn release_stock(&self, id: i64) -> Result<bool> {
        self.release_stock(id).await
    }
}
