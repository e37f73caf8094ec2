//! 奖品目录 API 处理器（公开）

use axum::{Json, extract::State};
use points_management::Reward;

use crate::{dto::ApiResponse, error::ApiError, state::AppState};

/// 可兑换的奖品列表
///
/// GET /api/rewards
pub async fn list_active_rewards(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Reward>>>, ApiError> {
    let rewards = state.accounts.active_rewards().await?;
    Ok(Json(ApiResponse::success(rewards)))
}
