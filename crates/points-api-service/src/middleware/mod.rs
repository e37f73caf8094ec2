//! 中间件模块
//!
//! 提供管理端认证中间件

mod admin_auth;

pub use admin_auth::require_admin;
