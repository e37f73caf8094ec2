//! 积分 API 服务
//!
//! 对外提供积分账本的 REST API。
//!
//! ## 核心功能
//!
//! - **用户侧**：初始化用户、查看概览、获得积分、兑换奖品、查看兑换历史
//! - **管理端**：奖品目录管理、积分调整、流水删除、强制对账、分页列表
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型定义与 HTTP 状态码映射
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 管理端密钥认证
//! - `routes`: 路由配置
//! - `state`: 应用状态
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use dto::{ApiResponse, PageResponse, PaginationParams};
pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::{AdminTokenSource, AppState};
