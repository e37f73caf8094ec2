//! 积分流水仓储
//!
//! point_events 只追加；删除只服务于管理端的补偿操作

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::PointEventRepositoryTrait;
use crate::error::Result;
use crate::models::{NewPointEvent, PointEvent};

/// 积分流水仓储
pub struct PointLedgerRepository {
    pool: PgPool,
}

impl PointLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 追加流水，时间戳由数据库分配
    pub async fn append(&self, event: &NewPointEvent) -> Result<PointEvent> {
        let created = sqlx::query_as::<_, PointEvent>(
            r#"
            INSERT INTO point_events (user_id, title, points)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, points, created_at
            "#,
        )
        .bind(event.user_id)
        .bind(&event.title)
        .bind(event.points)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn get_event(&self, id: i64) -> Result<Option<PointEvent>> {
        let event = sqlx::query_as::<_, PointEvent>(
            r#"
            SELECT id, user_id, title, points, created_at
            FROM point_events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// 删除流水，RETURNING 保证返回的就是被删除的那一行
    pub async fn delete_event(&self, id: i64) -> Result<Option<PointEvent>> {
        let deleted = sqlx::query_as::<_, PointEvent>(
            r#"
            DELETE FROM point_events
            WHERE id = $1
            RETURNING id, user_id, title, points, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deleted)
    }

    pub async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<PointEvent>> {
        let events = sqlx::query_as::<_, PointEvent>(
            r#"
            SELECT id, user_id, title, points, created_at
            FROM point_events
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn sum_points(&self, user_id: i64) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0)::BIGINT FROM point_events WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    pub async fn list_events(&self, offset: i64, limit: i64) -> Result<Vec<PointEvent>> {
        let events = sqlx::query_as::<_, PointEvent>(
            r#"
            SELECT id, user_id, title, points, created_at
            FROM point_events
            ORDER BY created_at DESC, id DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn count_events(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM point_events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl PointEventRepositoryTrait for PointLedgerRepository {
    async fn append(&self, event: &NewPointEvent) -> Result<PointEvent> {
        self.append(event).await
    }

    async fn get_event(&self, id: i64) -> Result<Option<PointEvent>> {
        self.get_event(id).await
    }

    async fn delete_event(&self, id: i64) -> Result<Option<PointEvent>> {
        self.delete_event(id).await
    }

    async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<PointEvent>> {
        self.list_by_user(user_id, limit).await
    }

    async fn sum_points(&self, user_id: i64) -> Result<i64> {
        self.sum_points(user_id).await
    }

    async fn list_events(&self, offset: i64, limit: i64) -> Result<Vec<PointEvent>> {
        self.list_events(offset, limit).await
    }

    async fn count_events(&self) -> Result<i64> {
        self.count_events().await
    }
}
