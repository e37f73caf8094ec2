//! 积分账本服务
//!
//! 以只追加的积分流水为事实来源维护用户余额，并处理奖品兑换。
//!
//! ## 核心功能
//!
//! - **积分流水**：记录每一次积分变动，余额可随时从流水重算
//! - **余额对账**：所有依赖余额的操作前，用流水和兑换记录校正余额缓存
//! - **奖品兑换**：条件扣减库存与余额，并发下不超卖、不重复扣分，失败时归还库存
//! - **管理操作**：奖品目录维护、积分调整、流水删除、强制对账
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 仓储层（PostgreSQL 与内存两种实现）
//! - `service`: 业务服务层
//! - `auth`: 管理能力凭证

pub mod auth;
pub mod error;
pub mod models;
pub mod repository;
pub mod service;

pub use auth::{AdminAuthenticator, AdminCapability};
pub use error::{ErrorKind, LedgerError, Result};
pub use models::*;
pub use repository::{LedgerRepositories, MemoryLedgerStore};
pub use service::{
    AccountService, AdminService, BalanceReconciler, LedgerOptions, LedgerServices,
    RedemptionEngine, dto,
};
