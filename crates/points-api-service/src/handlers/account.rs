//! 用户账户 API 处理器
//!
//! 初始化用户、查看概览、获得积分、兑换奖品、查看兑换历史

use axum::{
    Json,
    extract::{Path, State},
};
use points_management::Redemption;
use points_management::dto::AccountOverview;
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, BalanceResponse, EarnPointsRequest, InitUserRequest, RedeemRequest,
        RedeemResponse,
    },
    error::ApiError,
    state::AppState,
};

/// 初始化用户
///
/// POST /api/users/init
pub async fn init_user(
    State(state): State<AppState>,
    Json(req): Json<InitUserRequest>,
) -> Result<Json<ApiResponse<AccountOverview>>, ApiError> {
    req.validate()?;

    let overview = state.accounts.init_user(&req.username).await?;
    Ok(Json(ApiResponse::success(overview)))
}

/// 用户概览
///
/// GET /api/users/{username}/overview
pub async fn get_overview(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<AccountOverview>>, ApiError> {
    let overview = state.accounts.overview(&username).await?;
    Ok(Json(ApiResponse::success(overview)))
}

/// 获得积分
///
/// POST /api/users/{username}/events
pub async fn earn_points(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<EarnPointsRequest>,
) -> Result<Json<ApiResponse<BalanceResponse>>, ApiError> {
    req.validate()?;

    let outcome = state
        .accounts
        .earn(&username, &req.title, req.points)
        .await?;
    Ok(Json(ApiResponse::success(BalanceResponse {
        balance: outcome.balance,
    })))
}

/// 兑换奖品
///
/// POST /api/users/{username}/redemptions
pub async fn redeem(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<ApiResponse<RedeemResponse>>, ApiError> {
    req.validate()?;

    let outcome = state.accounts.redeem(&username, req.reward_id).await?;
    info!(
        username = %username,
        reward_id = req.reward_id,
        redemption_id = outcome.redemption.id,
        "兑换请求完成"
    );

    Ok(Json(ApiResponse::success(RedeemResponse {
        redemption: outcome.redemption,
        balance: outcome.new_balance,
    })))
}

/// 兑换历史
///
/// GET /api/users/{username}/redemptions
pub async fn list_redemptions(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<Redemption>>>, ApiError> {
    let redemptions = state.accounts.redemptions(&username).await?;
    Ok(Json(ApiResponse::success(redemptions)))
}
