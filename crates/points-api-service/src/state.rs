//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use loyalty_shared::config::AdminConfig;
use loyalty_shared::database::Database;
use points_management::{AccountService, AdminAuthenticator, AdminService, LedgerServices};

/// 管理密钥的携带方式
#[derive(Debug, Clone)]
pub struct AdminTokenSource {
    pub header_name: String,
    pub cookie_name: String,
}

impl Default for AdminTokenSource {
    fn default() -> Self {
        let config = AdminConfig::default();
        Self {
            header_name: config.header_name,
            cookie_name: config.cookie_name,
        }
    }
}

/// Axum 应用共享状态
///
/// 服务通过 Arc 在 handler 间共享；内存后端时没有数据库连接
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub admin: Arc<AdminService>,
    pub authenticator: Arc<AdminAuthenticator>,
    pub token_source: Arc<AdminTokenSource>,
    pub database: Option<Database>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(services: &LedgerServices, authenticator: AdminAuthenticator) -> Self {
        Self {
            accounts: services.accounts.clone(),
            admin: services.admin.clone(),
            authenticator: Arc::new(authenticator),
            token_source: Arc::new(AdminTokenSource::default()),
            database: None,
        }
    }

    pub fn with_token_source(mut self, token_source: AdminTokenSource) -> Self {
        self.token_source = Arc::new(token_source);
        self
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}
