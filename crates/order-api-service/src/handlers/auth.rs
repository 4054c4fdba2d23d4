//! 认证 API 处理器
//!
//! 管理员走用户名/密码登录，客户走 Kakao OAuth 回调。
//! 两者成功后都签发同一种会话 Cookie。

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    auth::{Role, SessionClaims, verify_password},
    dto::{AdminLoginRequest, ApiResponse, SessionUserDto},
    error::{ApiError, Result},
    state::AppState,
};

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i64,
    username: String,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct ClientAuthRow {
    id: i64,
    company_name: String,
    is_active: bool,
    onboarded: bool,
}

/// 管理员登录
///
/// POST /api/auth/login
///
/// 用户名不存在与密码错误返回同一错误，不泄露账号是否存在。
pub async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;

    let admin: Option<AdminRow> =
        sqlx::query_as("SELECT id, username, password_hash FROM admin_users WHERE username = $1")
            .bind(&req.username)
            .fetch_optional(&state.pool)
            .await?;

    let admin = admin.ok_or(ApiError::InvalidCredentials)?;
    if !verify_password(&req.password, &admin.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let (token, _) = state
        .sessions
        .issue(admin.id, Role::Admin, &admin.username, true)?;

    info!(admin_id = admin.id, "관리자 로그인");

    let user = SessionUserDto {
        id: admin.id,
        role: Role::Admin.as_str().to_string(),
        display_name: admin.username,
        onboarded: true,
    };

    Ok((
        AppendHeaders([(SET_COOKIE, state.sessions.build_cookie(&token))]),
        Json(ApiResponse::success(user)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct KakaoCallbackQuery {
    pub code: String,
}

/// Kakao OAuth 回调（客户登录入口）
///
/// GET /api/auth/kakao/callback?code=...
///
/// 首次登录自动建档（onboarded=false），停用账号拒绝登录。
pub async fn kakao_callback(
    State(state): State<AppState>,
    Query(query): Query<KakaoCallbackQuery>,
) -> Result<impl IntoResponse> {
    let kakao = state
        .kakao
        .as_ref()
        .ok_or_else(|| ApiError::Internal("Kakao OAuth 未配置".to_string()))?;

    let profile = kakao.fetch_user(&query.code).await?;

    let existing: Option<ClientAuthRow> = sqlx::query_as(
        "SELECT id, company_name, is_active, onboarded FROM clients WHERE kakao_id = $1",
    )
    .bind(profile.kakao_id)
    .fetch_optional(&state.pool)
    .await?;

    let client = match existing {
        Some(row) => row,
        None => {
            // 首次登录自动建档，업체 정보는 온보딩에서 채운다
            let display = profile
                .nickname
                .clone()
                .unwrap_or_else(|| format!("kakao_{}", profile.kakao_id));
            sqlx::query_as::<_, ClientAuthRow>(
                r#"
                INSERT INTO clients (kakao_id, company_name, contact_email, points, is_active, onboarded)
                VALUES ($1, $2, $3, 0, TRUE, FALSE)
                RETURNING id, company_name, is_active, onboarded
                "#,
            )
            .bind(profile.kakao_id)
            .bind(&display)
            .bind(profile.email.as_deref().unwrap_or(""))
            .fetch_one(&state.pool)
            .await?
        }
    };

    if !client.is_active {
        return Err(ApiError::ClientDisabled);
    }

    let (token, _) = state.sessions.issue(
        client.id,
        Role::Client,
        &client.company_name,
        client.onboarded,
    )?;

    info!(client_id = client.id, "고객 로그인 (kakao)");

    let user = SessionUserDto {
        id: client.id,
        role: Role::Client.as_str().to_string(),
        display_name: client.company_name,
        onboarded: client.onboarded,
    };

    Ok((
        AppendHeaders([(SET_COOKIE, state.sessions.build_cookie(&token))]),
        Json(ApiResponse::success(user)),
    ))
}

/// 登出
///
/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok((
        AppendHeaders([(SET_COOKIE, state.sessions.clear_cookie())]),
        Json(ApiResponse::<()>::success_empty()),
    ))
}

/// 当前会话用户
///
/// GET /api/auth/me
pub async fn me(
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<ApiResponse<SessionUserDto>>> {
    let user = SessionUserDto {
        id: claims.user_id()?,
        role: claims.role.as_str().to_string(),
        display_name: claims.display_name,
        onboarded: claims.onboarded,
    };
    Ok(Json(ApiResponse::success(user)))
}
