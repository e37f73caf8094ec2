//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。
//! 未安装 recorder 时（如单元测试）所有记录函数都是空操作。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册业务指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("redemptions_total", "Total number of redemption attempts");
    metrics::describe_histogram!(
        "redemption_duration_seconds",
        "Redemption duration in seconds"
    );

    metrics::describe_counter!(
        "balance_reconciliations_total",
        "Total number of balance reconciliations"
    );
    metrics::describe_counter!(
        "balance_reconciliation_drift_points",
        "Absolute points corrected by reconciliation"
    );

    metrics::describe_counter!(
        "stock_compensations_total",
        "Stock rollbacks issued after a lost balance race"
    );
    metrics::describe_counter!(
        "stock_compensation_failures_total",
        "Stock rollbacks that failed and left stock under-counted"
    );

    metrics::describe_counter!("admin_adjustments_total", "Administrative point adjustments");

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录兑换结果
///
/// outcome 取值：approved / reward_unavailable / insufficient_points / out_of_stock / error
#[inline]
pub fn record_redemption(outcome: &str, duration_secs: f64) {
    metrics::counter!("redemptions_total", "outcome" => outcome.to_string()).increment(1);

    metrics::histogram!("redemption_duration_seconds", "outcome" => outcome.to_string())
        .record(duration_secs);
}

/// 记录一次对账，repaired 表示缓存被改写
#[inline]
pub fn record_reconciliation(repaired: bool, drift: i64) {
    let result = if repaired { "repaired" } else { "clean" };
    metrics::counter!("balance_reconciliations_total", "result" => result).increment(1);

    if repaired {
        metrics::counter!("balance_reconciliation_drift_points").increment(drift.unsigned_abs());
    }
}

/// 记录库存回滚
#[inline]
pub fn record_stock_compensation(succeeded: bool) {
    if succeeded {
        metrics::counter!("stock_compensations_total").increment(1);
    } else {
        metrics::counter!("stock_compensation_failures_total").increment(1);
    }
}

/// 记录管理员积分调整
#[inline]
pub fn record_admin_adjustment(recorded_in_ledger: bool) {
    let mode = if recorded_in_ledger { "ledger" } else { "cache_only" };
    metrics::counter!("admin_adjustments_total", "mode" => mode).increment(1);
}
