//! 服务层
//!
//! 实现积分账本的业务逻辑，协调仓储层。
//!
//! ## 模块结构
//!
//! - `reconciler`: 余额对账，所有依赖余额的判断之前调用
//! - `redemption_engine`: 兑换流程（条件扣减库存、条件扣减余额、补偿）
//! - `account_service`: 面向用户的账户操作
//! - `admin_service`: 管理端操作，要求管理能力凭证
//! - `dto`: 数据传输对象定义

pub mod account_service;
pub mod admin_service;
pub mod dto;
pub mod reconciler;
pub mod redemption_engine;

use std::sync::Arc;

pub use account_service::AccountService;
pub use admin_service::AdminService;
pub use dto::*;
pub use reconciler::BalanceReconciler;
pub use redemption_engine::RedemptionEngine;

use loyalty_shared::config::AppConfig;

use crate::repository::LedgerRepositories;

/// 服务层选项
#[derive(Debug, Clone, Copy)]
pub struct LedgerOptions {
    /// 用户概览中返回的最近流水条数
    pub recent_events_limit: i64,
    /// 无原因的管理员调整是否写入账本
    pub record_unreasoned_adjustments: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            recent_events_limit: 20,
            record_unreasoned_adjustments: true,
        }
    }
}

impl From<&AppConfig> for LedgerOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            recent_events_limit: config.ledger.recent_events_limit.max(1),
            record_unreasoned_adjustments: config.admin.record_unreasoned_adjustments,
        }
    }
}

/// 组装好的全部服务
#[derive(Clone)]
pub struct LedgerServices {
    pub reconciler: Arc<BalanceReconciler>,
    pub engine: Arc<RedemptionEngine>,
    pub accounts: Arc<AccountService>,
    pub admin: Arc<AdminService>,
}

impl LedgerServices {
    pub fn new(repos: &LedgerRepositories, options: LedgerOptions) -> Self {
        let reconciler = Arc::new(BalanceReconciler::new(
            repos.balances.clone(),
            repos.events.clone(),
            repos.redemptions.clone(),
        ));
        let engine = Arc::new(RedemptionEngine::new(
            repos.rewards.clone(),
            repos.redemptions.clone(),
            repos.events.clone(),
            reconciler.clone(),
        ));
        let accounts = Arc::new(AccountService::new(
            repos.users.clone(),
            repos.events.clone(),
            repos.rewards.clone(),
            repos.redemptions.clone(),
            reconciler.clone(),
            engine.clone(),
            options.recent_events_limit,
        ));
        let admin = Arc::new(AdminService::new(
            repos.users.clone(),
            repos.events.clone(),
            repos.rewards.clone(),
            repos.redemptions.clone(),
            repos.balances.clone(),
            reconciler.clone(),
            options.record_unreasoned_adjustments,
        ));

        Self {
            reconciler,
            engine,
            accounts,
            admin,
        }
    }
}
