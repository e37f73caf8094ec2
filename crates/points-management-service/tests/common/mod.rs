//! 集成测试公共工具

#![allow(dead_code)]

use std::sync::Arc;

use points_management::{
    AdminAuthenticator, AdminCapability, LedgerOptions, LedgerRepositories, LedgerServices,
    MemoryLedgerStore, NewReward, Reward,
};

pub struct TestLedger {
    pub store: Arc<MemoryLedgerStore>,
    pub services: LedgerServices,
    pub capability: AdminCapability,
}

impl TestLedger {
    pub fn new() -> Self {
        Self::with_options(LedgerOptions::default())
    }

    pub fn with_options(options: LedgerOptions) -> Self {
        let store = Arc::new(MemoryLedgerStore::new());
        let services = LedgerServices::new(&LedgerRepositories::from_store(store.clone()), options);
        let capability = AdminAuthenticator::new(Some("test-admin-token"))
            .verify(Some("test-admin-token"))
            .expect("admin token must verify");
        Self {
            store,
            services,
            capability,
        }
    }

    pub async fn reward(&self, cost_points: i64, stock: Option<i64>) -> Reward {
        self.services
            .admin
            .create_reward(
                &self.capability,
                NewReward {
                    name: format!("奖品-{}", cost_points),
                    cost_points,
                    stock,
                    description: None,
                    enabled: true,
                },
            )
            .await
            .expect("create reward")
    }

    /// 创建用户并入账，返回用户 id
    pub async fn user_with_points(&self, username: &str, points: i64) -> i64 {
        let overview = self
            .services
            .accounts
            .init_user(username)
            .await
            .expect("init user");
        if points > 0 {
            self.services
                .accounts
                .earn(username, "初始积分", points)
                .await
                .expect("earn");
        }
        overview.user.id
    }
}
