//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{delete, get, post, put},
};
use loyalty_shared::observability::middleware as obs_middleware;

use crate::{handlers, middleware::require_admin, state::AppState};

/// 构建用户侧路由（公开）
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/users/init", post(handlers::account::init_user))
        .route(
            "/users/{username}/overview",
            get(handlers::account::get_overview),
        )
        .route(
            "/users/{username}/events",
            post(handlers::account::earn_points),
        )
        .route(
            "/users/{username}/redemptions",
            post(handlers::account::redeem).get(handlers::account::list_redemptions),
        )
        .route("/rewards", get(handlers::reward::list_active_rewards))
}

/// 构建管理端路由
///
/// 所有路由都经过 require_admin 中间件
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // 奖品目录
        .route(
            "/rewards",
            get(handlers::admin::list_rewards).post(handlers::admin::create_reward),
        )
        .route("/rewards/{id}", put(handlers::admin::update_reward))
        .route("/rewards/{id}", delete(handlers::admin::delete_reward))
        // 积分
        .route(
            "/users/{username}/adjustments",
            post(handlers::admin::adjust_points),
        )
        .route(
            "/users/{username}/reconcile",
            post(handlers::admin::reconcile_user),
        )
        .route("/users/{username}/audit", get(handlers::admin::audit_user))
        .route("/events/{id}", delete(handlers::admin::delete_event))
        // 列表
        .route("/users", get(handlers::admin::list_users))
        .route("/events", get(handlers::admin::list_events))
        .route("/redemptions", get(handlers::admin::list_redemptions))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// 构建完整的应用路由
///
/// 返回带状态的 Router，CORS 和超时等外层 layer 由 main.rs 叠加
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/admin", admin_routes(state.clone()))
        .nest("/api", account_routes())
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "points-api-service"
    }))
}

/// 就绪探针：PostgreSQL 后端时检查数据库连接
async fn readiness_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match &state.database {
        Some(db) if db.health_check().await.is_ok() => "ok",
        Some(_) => "fail",
        None => "skipped",
    };

    Json(serde_json::json!({
        "status": if database == "fail" { "degraded" } else { "ok" },
        "service": "points-api-service",
        "checks": {
            "database": database
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use points_management::{AdminAuthenticator, LedgerOptions, LedgerRepositories, LedgerServices};

    #[test]
    fn test_routes_construction() {
        let services =
            LedgerServices::new(&LedgerRepositories::in_memory(), LedgerOptions::default());
        let state = AppState::new(&services, AdminAuthenticator::new(Some("secret")));

        let _account = account_routes();
        let _admin = admin_routes(state.clone());
        let _app = build_router(state);
    }
}
