//! 管理端认证中间件
//!
//! 从请求头（默认 X-Admin-Token）或 Cookie（默认 admin_token）读取管理密钥，
//! 校验通过后把 AdminCapability 注入请求扩展，handler 通过 Extension 取用

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// 管理端认证中间件
///
/// 请求头优先于 Cookie；两者都没有或不匹配时返回 401
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = extract_token(&state, &request);

    let capability = state
        .authenticator
        .verify(presented.as_deref())
        .map_err(|_| {
            if !state.authenticator.is_configured() {
                warn!(path = %request.uri().path(), "管理密钥未配置，拒绝管理请求");
            } else if presented.is_none() {
                warn!(path = %request.uri().path(), "缺少管理密钥");
            } else {
                warn!(path = %request.uri().path(), "管理密钥错误");
            }
            ApiError::Unauthorized("管理密钥缺失或错误".to_string())
        })?;

    request.extensions_mut().insert(capability);
    Ok(next.run(request).await)
}

fn extract_token(state: &AppState, request: &Request<Body>) -> Option<String> {
    let source = &state.token_source;

    if let Some(value) = request.headers().get(source.header_name.as_str())
        && let Ok(token) = value.to_str()
    {
        return Some(token.to_string());
    }

    CookieJar::from_headers(request.headers())
        .get(&source.cookie_name)
        .map(|cookie| cookie.value().to_string())
}
