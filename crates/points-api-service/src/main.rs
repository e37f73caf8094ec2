//! 积分 API 服务
//!
//! 加载配置、选择存储后端、组装服务后启动 HTTP 服务。

use std::time::Duration;

use axum::http::HeaderValue;
use loyalty_shared::{
    config::{AppConfig, StorageBackend},
    database::Database,
    observability,
};
use points_api::{AdminTokenSource, AppState, build_router};
use points_management::{AdminAuthenticator, LedgerOptions, LedgerRepositories, LedgerServices};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("points-api-service")?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(
        environment = %config.environment,
        backend = ?config.storage.backend,
        "Starting points-api-service on {}",
        config.server_addr()
    );

    // 存储后端：生产使用 PostgreSQL，开发和测试可用内存
    let (repositories, database) = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = Database::connect(&config.database).await?;
            if config.database.run_migrations {
                db.run_migrations().await?;
            }
            (LedgerRepositories::postgres(db.pool().clone()), Some(db))
        }
        StorageBackend::Memory => {
            warn!("使用内存存储，服务停止后数据会丢失");
            (LedgerRepositories::in_memory(), None)
        }
    };

    let services = LedgerServices::new(&repositories, LedgerOptions::from(&config));

    let authenticator = AdminAuthenticator::new(config.admin.token.as_deref());
    if !authenticator.is_configured() {
        if config.is_production() {
            warn!("LOYALTY_ADMIN__TOKEN 未设置，生产环境下所有管理接口将不可用");
        } else {
            warn!("管理密钥未设置，所有管理接口请求都会被拒绝");
        }
    }

    let mut state = AppState::new(&services, authenticator).with_token_source(AdminTokenSource {
        header_name: config.admin.header_name.clone(),
        cookie_name: config.admin.cookie_name.clone(),
    });
    if let Some(db) = database.clone() {
        state = state.with_database(db);
    }

    let app = build_router(state)
        .layer(cors_layer(&config))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 收到 SIGTERM 或 Ctrl+C 后停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }

    info!("Server shutdown complete");

    Ok(())
}

/// 根据 server.cors_origins 构建 CORS 配置
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let allowed_origins = config.server.cors_origins.trim();

    if allowed_origins == "*" {
        if config.is_production() {
            warn!("cors_origins=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        info!("CORS allowed_origins: * (all origins)");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        info!("CORS allowed_origins: {}", allowed_origins);
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 任一信号后返回，触发 axum 的优雅关闭流程。
/// 信号处理器注册失败时只记录日志，对应分支永不完成。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
