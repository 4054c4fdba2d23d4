//! 会话认证中间件
//!
//! 从 Cookie 中提取会话令牌，验证后将 SessionClaims 注入请求扩展。
//! 过期/篡改/缺失的会话统一返回 401，响应体不区分三种情况。

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::auth::SessionClaims;
use crate::error::ApiError;
use crate::state::AppState;

/// 会话认证中间件
///
/// 对于公开路由（登录、OAuth 回调、健康检查），跳过验证。
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();

    // 公开路由列表（不需要认证）
    let public_paths = [
        "/api/auth/login",
        "/api/auth/kakao",
        "/api/auth/logout",
        "/health",
        "/ready",
    ];

    if public_paths.iter().any(|p| path.starts_with(p)) {
        return next.run(request).await;
    }

    // Cookie 头中提取会话令牌
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| state.sessions.token_from_cookie_header(h));

    let token = match token {
        Some(t) => t,
        None => return unauthorized_response(),
    };

    match state.sessions.verify(&token) {
        Ok(claims) => {
            // 将 Claims 注入请求扩展，供后续处理器使用
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        // 验证失败与缺失 Cookie 返回完全相同的响应
        Err(_) => unauthorized_response(),
    }
}

/// 生成 401 未授权响应
fn unauthorized_response() -> Response {
    let body = json!({
        "success": false,
        "code": "UNAUTHORIZED",
        "message": "로그인이 필요합니다",
        "data": null
    });

    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}

/// 管理员权限检查（处理器内调用）
pub fn require_admin(claims: &SessionClaims) -> Result<(), ApiError> {
    if !claims.is_admin() {
        return Err(ApiError::Forbidden("관리자 전용 기능입니다".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn test_require_admin() {
        let admin = SessionClaims {
            sub: "1".into(),
            role: Role::Admin,
            display_name: "관리자".into(),
            onboarded: true,
            iat: 0,
            exp: i64::MAX,
        };
        assert!(require_admin(&admin).is_ok());

        let client = SessionClaims {
            sub: "2".into(),
            role: Role::Client,
            display_name: "업체".into(),
            onboarded: true,
            iat: 0,
            exp: i64::MAX,
        };
        assert!(matches!(require_admin(&client), Err(ApiError::Forbidden(_))));
    }
}
