//! 管理端 API 处理器
//!
//! 所有 handler 都从请求扩展中取 AdminCapability，
//! 由 require_admin 中间件在密钥校验通过后注入

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use points_management::dto::{AdjustmentOutcome, EventDeletion};
use points_management::{
    AdminCapability, PointEvent, Reconciliation, Redemption, Reward, UserSummary,
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        AdjustPointsRequest, ApiResponse, CreateRewardRequest, PageResponse, PaginationParams,
        UpdateRewardRequest,
    },
    error::ApiError,
    state::AppState,
};

// ==================== 奖品目录 ====================

/// 奖品列表（含已停用）
///
/// GET /api/admin/rewards
pub async fn list_rewards(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
) -> Result<Json<ApiResponse<Vec<Reward>>>, ApiError> {
    let rewards = state.admin.list_rewards(&capability).await?;
    Ok(Json(ApiResponse::success(rewards)))
}

/// 创建奖品
///
/// POST /api/admin/rewards
pub async fn create_reward(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Json(req): Json<CreateRewardRequest>,
) -> Result<Json<ApiResponse<Reward>>, ApiError> {
    req.validate()?;

    let reward = state.admin.create_reward(&capability, req.into()).await?;
    Ok(Json(ApiResponse::success(reward)))
}

/// 更新奖品
///
/// PUT /api/admin/rewards/{id}
pub async fn update_reward(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRewardRequest>,
) -> Result<Json<ApiResponse<Reward>>, ApiError> {
    req.validate()?;

    let reward = state
        .admin
        .update_reward(&capability, id, req.into())
        .await?;
    Ok(Json(ApiResponse::success(reward)))
}

/// 删除奖品
///
/// DELETE /api/admin/rewards/{id}
pub async fn delete_reward(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.admin.delete_reward(&capability, id).await?;
    Ok(Json(ApiResponse::<()>::success_empty()))
}

// ==================== 积分 ====================

/// 调整用户积分
///
/// POST /api/admin/users/{username}/adjustments
pub async fn adjust_points(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Path(username): Path<String>,
    Json(req): Json<AdjustPointsRequest>,
) -> Result<Json<ApiResponse<AdjustmentOutcome>>, ApiError> {
    req.validate()?;

    let outcome = state
        .admin
        .adjust_points(&capability, &username, req.delta, req.reason.as_deref())
        .await?;
    info!(username = %username, delta = req.delta, "管理员调整积分");

    Ok(Json(ApiResponse::success(outcome)))
}

/// 强制对账
///
/// POST /api/admin/users/{username}/reconcile
pub async fn reconcile_user(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Reconciliation>>, ApiError> {
    let reconciliation = state.admin.reconcile_user(&capability, &username).await?;
    Ok(Json(ApiResponse::success(reconciliation)))
}

/// 只读核对
///
/// GET /api/admin/users/{username}/audit
pub async fn audit_user(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Reconciliation>>, ApiError> {
    let reconciliation = state.admin.audit_user(&capability, &username).await?;
    Ok(Json(ApiResponse::success(reconciliation)))
}

/// 删除积分流水
///
/// DELETE /api/admin/events/{id}
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<EventDeletion>>, ApiError> {
    let deletion = state.admin.delete_event(&capability, id).await?;
    Ok(Json(ApiResponse::success(deletion)))
}

// ==================== 列表 ====================

/// 用户列表
///
/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<UserSummary>>>, ApiError> {
    let page = state
        .admin
        .list_users(&capability, pagination.offset(), pagination.limit())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        page.items,
        page.total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 积分流水列表
///
/// GET /api/admin/events
pub async fn list_events(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<PointEvent>>>, ApiError> {
    let page = state
        .admin
        .list_events(&capability, pagination.offset(), pagination.limit())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        page.items,
        page.total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 兑换记录列表
///
/// GET /api/admin/redemptions
pub async fn list_redemptions(
    State(state): State<AppState>,
    Extension(capability): Extension<AdminCapability>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Redemption>>>, ApiError> {
    let page = state
        .admin
        .list_redemptions(&capability, pagination.offset(), pagination.limit())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        page.items,
        page.total,
        pagination.page,
        pagination.limit(),
    ))))
}
