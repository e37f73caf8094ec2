//! 请求 DTO 定义
//!
//! 所有 REST API 的请求参数和请求体结构

use points_management::{NewReward, RewardPatch};
use serde::{Deserialize, Deserializer};
use validator::Validate;

/// 初始化用户请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitUserRequest {
    #[validate(length(min = 1, max = 64, message = "用户名长度必须在1-64个字符之间"))]
    pub username: String,
}

/// 获得积分请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EarnPointsRequest {
    #[validate(length(min = 1, max = 200, message = "标题长度必须在1-200个字符之间"))]
    pub title: String,
    #[validate(range(min = 1, max = 1_000_000_000, message = "积分必须在1-1000000000之间"))]
    pub points: i64,
}

/// 兑换请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    #[validate(range(min = 1, message = "奖品 ID 无效"))]
    pub reward_id: i64,
}

/// 创建奖品请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRewardRequest {
    #[validate(length(min = 1, max = 100, message = "奖品名称长度必须在1-100个字符之间"))]
    pub name: String,
    #[validate(range(min = 1, message = "兑换积分必须大于0"))]
    pub cost_points: i64,
    /// 不传表示不限量
    #[validate(range(min = 0, message = "库存不能为负数"))]
    pub stock: Option<i64>,
    #[validate(length(max = 500, message = "描述不能超过500个字符"))]
    pub description: Option<String>,
    pub enabled: Option<bool>,
}

impl From<CreateRewardRequest> for NewReward {
    fn from(req: CreateRewardRequest) -> Self {
        Self {
            name: req.name,
            cost_points: req.cost_points,
            stock: req.stock,
            description: req.description,
            enabled: req.enabled.unwrap_or(true),
        }
    }
}

/// 更新奖品请求
///
/// 字段缺省表示不修改；stock / description 显式传 null 表示置空
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRewardRequest {
    #[validate(length(min = 1, max = 100, message = "奖品名称长度必须在1-100个字符之间"))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "兑换积分必须大于0"))]
    pub cost_points: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub stock: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub enabled: Option<bool>,
}

impl From<UpdateRewardRequest> for RewardPatch {
    fn from(req: UpdateRewardRequest) -> Self {
        Self {
            name: req.name,
            cost_points: req.cost_points,
            stock: req.stock,
            description: req.description,
            enabled: req.enabled,
        }
    }
}

/// 区分"字段缺省"与"显式 null"
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 管理员积分调整请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustPointsRequest {
    #[validate(range(
        min = -1_000_000_000,
        max = 1_000_000_000,
        message = "调整积分绝对值不能超过1000000000"
    ))]
    pub delta: i64,
    #[validate(length(max = 200, message = "原因不能超过200个字符"))]
    pub reason: Option<String>,
}

/// 分页参数
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// 计算查询的 offset
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0) * self.limit()
    }

    /// 获取限制条数（最大100）
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let params = PaginationParams {
            page: 3,
            page_size: 500,
        };
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 200);

        let params = PaginationParams {
            page: 0,
            page_size: 0,
        };
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_update_reward_distinguishes_null() {
        let req: UpdateRewardRequest = serde_json::from_str(r#"{"stock": null}"#).unwrap();
        assert_eq!(req.stock, Some(None));
        assert_eq!(req.description, None);

        let req: UpdateRewardRequest = serde_json::from_str(r#"{"stock": 5}"#).unwrap();
        assert_eq!(req.stock, Some(Some(5)));

        let patch = RewardPatch::from(
            serde_json::from_str::<UpdateRewardRequest>(r#"{"costPoints": 30}"#).unwrap(),
        );
        assert_eq!(patch.cost_points, Some(30));
        assert!(patch.stock.is_none());
    }

    #[test]
    fn test_request_validation() {
        let req = EarnPointsRequest {
            title: "签到".to_string(),
            points: 0,
        };
        assert!(req.validate().is_err());

        let req = CreateRewardRequest {
            name: "咖啡券".to_string(),
            cost_points: 10,
            stock: Some(-1),
            description: None,
            enabled: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_points_bounds() {
        let req = EarnPointsRequest {
            title: "签到".to_string(),
            points: i64::MAX,
        };
        assert!(req.validate().is_err());

        for delta in [i64::MIN, -1_000_000_001, 1_000_000_001, i64::MAX] {
            let req = AdjustPointsRequest {
                delta,
                reason: Some("x".to_string()),
            };
            assert!(req.validate().is_err(), "delta {delta} should be rejected");
        }

        let req = AdjustPointsRequest {
            delta: -1_000_000_000,
            reason: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_reward_defaults_enabled() {
        let req: CreateRewardRequest =
            serde_json::from_str(r#"{"name": "咖啡券", "costPoints": 10}"#).unwrap();
        let reward = NewReward::from(req);
        assert!(reward.enabled);
        assert_eq!(reward.stock, None);
    }
}
