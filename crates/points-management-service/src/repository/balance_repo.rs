//! 余额缓存仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::BalanceRepositoryTrait;
use crate::error::Result;
use crate::models::{Balance, Reconciliation, RedemptionStatus};

/// 余额缓存仓储
pub struct BalanceRepository {
    pool: PgPool,
}

impl BalanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_balance(&self, user_id: i64) -> Result<Option<Balance>> {
        let balance = sqlx::query_as::<_, Balance>(
            r#"
            SELECT user_id, points, updated_at
            FROM balances
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance)
    }

    /// 对账
    ///
    /// 先以 FOR UPDATE 锁住余额行，再汇总流水与兑换记录：
    /// 并发的 debit_and_record 要么在锁前提交（汇总能看到它的兑换记录），
    /// 要么等到本事务提交后再按新值判断条件
    pub async fn reconcile(&self, user_id: i64) -> Result<Reconciliation> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<i64> =
            sqlx::query_scalar("SELECT points FROM balances WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let ledger_total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0)::BIGINT FROM point_events WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let redeemed_total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(cost_points), 0)::BIGINT
            FROM redemptions
            WHERE user_id = $1 AND status = $2
            "#,
        )
        .bind(user_id)
        .bind(RedemptionStatus::Approved)
        .fetch_one(&mut *tx)
        .await?;

        let reconciliation =
            Reconciliation::compute(user_id, previous, ledger_total, redeemed_total)?;

        if reconciliation.drifted() {
            sqlx::query(
                r#"
                INSERT INTO balances (user_id, points, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (user_id) DO UPDATE
                SET points = EXCLUDED.points, updated_at = NOW()
                "#,
            )
            .bind(user_id)
            .bind(reconciliation.effective)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(reconciliation)
    }

    /// 增量修改缓存
    pub async fn credit(&self, user_id: i64, delta: i64) -> Result<i64> {
        let points: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO balances (user_id, points, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET points = balances.points + EXCLUDED.points, updated_at = NOW()
            RETURNING points
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;

        Ok(points)
    }
}

#[async_trait]
impl BalanceRepositoryTrait for BalanceRepository {
    async fn get_balance(&self, user_id: i64) -> Result<Option<Balance>> {
        self.get_balance(user_id).await
    }

    async fn reconcile(&self, user_id: i64) -> Result<Reconciliation> {
        self.reconcile(user_id).await
    }

    async fn credit(&self, user_id: i64, delta: i64) -> Result<i64> {
        self.credit(user_id, delta).await
    }
}
