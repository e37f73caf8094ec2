//! 数据传输对象
//!
//! 请求体使用 validator 校验，响应统一包装为 ApiResponse

mod request;
mod response;

pub use request::*;
pub use response::*;
