//! 兑换记录仓储
//!
//! 余额扣减与兑换记录在同一条语句中写入：
//! 对账任何时候看到扣减后的余额，也一定能看到对应的兑换记录

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::RedemptionRepositoryTrait;
use crate::error::Result;
use crate::models::{DebitedRedemption, NewRedemption, Redemption, RedemptionStatus};

/// debit_and_record 返回行
#[derive(sqlx::FromRow)]
struct DebitedRow {
    id: i64,
    user_id: i64,
    reward_id: i64,
    cost_points: i64,
    status: RedemptionStatus,
    created_at: DateTime<Utc>,
    balance_after: i64,
}

impl From<DebitedRow> for DebitedRedemption {
    fn from(row: DebitedRow) -> Self {
        Self {
            redemption: Redemption {
                id: row.id,
                user_id: row.user_id,
                reward_id: row.reward_id,
                cost_points: row.cost_points,
                status: row.status,
                created_at: row.created_at,
            },
            balance_after: row.balance_after,
        }
    }
}

/// 兑换记录仓储
pub struct RedemptionRepository {
    pool: PgPool,
}

impl RedemptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 条件扣减余额并写入兑换记录
    ///
    /// 余额不足（或余额行不存在）时 UPDATE 不命中，INSERT 也不会执行，返回 None
    pub async fn debit_and_record(
        &self,
        redemption: &NewRedemption,
    ) -> Result<Option<DebitedRedemption>> {
        let row = sqlx::query_as::<_, DebitedRow>(
            r#"
            WITH debit AS (
                UPDATE balances
                SET points = points - $3, updated_at = NOW()
                WHERE user_id = $1 AND points >= $3
                RETURNING user_id, points
            ), recorded AS (
                INSERT INTO redemptions (user_id, reward_id, cost_points, status)
                SELECT user_id, $2, $3, $4 FROM debit
                RETURNING id, user_id, reward_id, cost_points, status, created_at
            )
            SELECT recorded.id, recorded.user_id, recorded.reward_id, recorded.cost_points,
                   recorded.status, recorded.created_at, debit.points AS balance_after
            FROM recorded
            JOIN debit ON debit.user_id = recorded.user_id
            "#,
        )
        .bind(redemption.user_id)
        .bind(redemption.reward_id)
        .bind(redemption.cost_points)
        .bind(redemption.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Redemption>> {
        let redemptions = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT id, user_id, reward_id, cost_points, status, created_at
            FROM redemptions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(redemptions)
    }

    pub async fn sum_approved_cost(&self, user_id: i64) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(cost_points), 0)::BIGINT
            FROM redemptions
            WHERE user_id = $1 AND status = $2
            "#,
        )
        .bind(user_id)
        .bind(RedemptionStatus::Approved)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    pub async fn list_redemptions(&self, offset: i64, limit: i64) -> Result<Vec<Redemption>> {
        let redemptions = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT id, user_id, reward_id, cost_points, status, created_at
            FROM redemptions
            ORDER BY created_at DESC, id DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(redemptions)
    }

    pub async fn count_redemptions(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redemptions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl RedemptionRepositoryTrait for RedemptionRepository {
    async fn debit_and_record(
        &self,
        redemption: &NewRedemption,
    ) -> Result<Option<DebitedRedemption>> {
        self.debit_and_record(redemption).await
    }

    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Redemption>> {
        self.list_by_user(user_id, limit).await
    }

    async fn sum_approved_cost(&self, user_id: i64) -> Result<i64> {
        self.sum_approved_cost(user_id).await
    }

    async fn list_redemptions(&self, offset: i64, limit: i64) -> Result<Vec<Redemption>> {
        self.list_redemptions(offset, limit).await
    }

    async fn count_redemptions(&self) -> Result<i64> {
        self.count_redemptions().await
    }
}
