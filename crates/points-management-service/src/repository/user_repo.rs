//! 用户仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::UserRepositoryTrait;
use crate::error::Result;
use crate::models::{User, UserSummary};

/// 用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// 按用户名查找或创建
    ///
    /// ON CONFLICT DO UPDATE 保证并发首次引用时两边都能拿到同一行
    pub async fn get_or_create_user(&self, username: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username)
            VALUES ($1)
            ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
            RETURNING id, username, created_at
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// 分页列出用户及其缓存余额
    pub async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.created_at, b.points AS cached_points
            FROM users u
            LEFT JOIN balances b ON b.user_id = u.id
            ORDER BY u.id ASC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.get_user(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username(username).await
    }

    async fn get_or_create_user(&self, username: &str) -> Result<User> {
        self.get_or_create_user(username).await
    }

    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<UserSummary>> {
        self.list_users(offset, limit).await
    }

    async fn count_users(&self) -> Result<i64> {
        self.count_users().await
    }
}
