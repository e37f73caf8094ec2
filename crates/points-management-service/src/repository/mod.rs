//! 数据库仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 使用 SQLx 进行数据库操作，条件写保持为单条语句
//! - 不开启跨语句的业务事务，唯一的事务是单行对账
//! - 定义 trait 接口以支持 mock 测试和内存实现

mod balance_repo;
mod ledger_repo;
mod memory_store;
mod redemption_repo;
mod reward_repo;
mod traits;
mod user_repo;

use std::sync::Arc;

use sqlx::PgPool;

pub use balance_repo::BalanceRepository;
pub use ledger_repo::PointLedgerRepository;
pub use memory_store::MemoryLedgerStore;
pub use redemption_repo::RedemptionRepository;
pub use reward_repo::RewardRepository;
pub use traits::*;
pub use user_repo::UserRepository;

/// 一套完整的仓储实现
///
/// 服务层只依赖 trait 对象，存储后端在启动时选定
#[derive(Clone)]
pub struct LedgerRepositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub events: Arc<dyn PointEventRepositoryTrait>,
    pub rewards: Arc<dyn RewardRepositoryTrait>,
    pub redemptions: Arc<dyn RedemptionRepositoryTrait>,
    pub balances: Arc<dyn BalanceRepositoryTrait>,
}

impl LedgerRepositories {
    /// PostgreSQL 后端
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            events: Arc::new(PointLedgerRepository::new(pool.clone())),
            rewards: Arc::new(RewardRepository::new(pool.clone())),
            redemptions: Arc::new(RedemptionRepository::new(pool.clone())),
            balances: Arc::new(BalanceRepository::new(pool)),
        }
    }

    /// 内存后端
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryLedgerStore::new()))
    }

    /// 共享同一个内存存储，测试中可以直接观察存储状态
    pub fn from_store(store: Arc<MemoryLedgerStore>) -> Self {
        Self {
            users: store.clone(),
            events: store.clone(),
            rewards: store.clone(),
            redemptions: store.clone(),
            balances: store,
        }
    }
}
