//! 积分账本领域模型
//!
//! 包含用户、积分流水、奖品、兑换记录和余额缓存的实体定义

pub mod balance;
pub mod event;
pub mod redemption;
pub mod reward;
pub mod user;

// 重新导出常用类型
pub use balance::{Balance, Reconciliation};
pub use event::{
    DEFAULT_ADJUSTMENT_TITLE, MAX_EVENT_POINTS, NewPointEvent, PointEvent, TITLE_MAX_LEN,
    check_points_range,
};
pub use redemption::{DebitedRedemption, NewRedemption, Redemption, RedemptionStatus};
pub use reward::{NewReward, Reward, RewardPatch};
pub use user::{USERNAME_MAX_LEN, User, UserSummary, normalize_username};
