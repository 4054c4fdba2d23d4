//! 客户管理 API 处理器
//!
//! 管理员侧的客户档案管理与积分充值，客户侧的온보딩完成。

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use tracing::info;
use validator::Validate;

use crate::{
    auth::SessionClaims,
    dto::{
        ApiResponse, ChargePointsRequest, ClientDto, ClientFilter, CreateClientRequest,
        PageResponse, PaginationParams, UpdateClientStatusRequest,
    },
    error::{ApiError, Result},
    middleware::require_admin,
    notify::NotificationKind,
    state::AppState,
};

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: i64,
    company_name: String,
    contact_email: String,
    contact_phone: Option<String>,
    points: i64,
    is_active: bool,
    onboarded: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ClientRow> for ClientDto {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            company_name: row.company_name,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            points: row.points,
            is_active: row.is_active,
            onboarded: row.onboarded,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CLIENT_COLUMNS: &str = "id, company_name, contact_email, contact_phone, points, \
                              is_active, onboarded, created_at, updated_at";

/// 客户列表（管理员）
///
/// GET /api/admin/clients
pub async fn list_clients(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Query(filter): Query<ClientFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<ClientDto>>>> {
    require_admin(&claims)?;

    let keyword = filter.keyword.map(|k| format!("%{}%", k));

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM clients
        WHERE ($1::text IS NULL OR company_name ILIKE $1)
          AND ($2::boolean IS NULL OR is_active = $2)
        "#,
    )
    .bind(&keyword)
    .bind(filter.is_active)
    .fetch_one(&state.pool)
    .await?;

    let rows: Vec<ClientRow> = sqlx::query_as(&format!(
        r#"
        SELECT {CLIENT_COLUMNS} FROM clients
        WHERE ($1::text IS NULL OR company_name ILIKE $1)
          AND ($2::boolean IS NULL OR is_active = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(&keyword)
    .bind(filter.is_active)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.pool)
    .await?;

    let items = rows.into_iter().map(ClientDto::from).collect();
    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 客户详情（管理员或本人）
///
/// GET /api/clients/{id}
pub async fn get_client(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ClientDto>>> {
    super::ensure_owner_or_admin(&claims, id)?;

    let row: Option<ClientRow> =
        sqlx::query_as(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"))
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;

    let row = row.ok_or(ApiError::ClientNotFound(id))?;
    Ok(Json(ApiResponse::success(row.into())))
}

/// 创建客户（管理员手工建档，无 Kakao 绑定）
///
/// POST /api/admin/clients
pub async fn create_client(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<CreateClientRequest>,
) -> Result<Json<ApiResponse<ClientDto>>> {
    require_admin(&claims)?;
    req.validate()?;

    let row: ClientRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO clients (company_name, contact_email, contact_phone, business_license_url,
                             points, is_active, onboarded)
        VALUES ($1, $2, $3, $4, 0, TRUE, TRUE)
        RETURNING {CLIENT_COLUMNS}
        "#
    ))
    .bind(&req.company_name)
    .bind(&req.contact_email)
    .bind(&req.contact_phone)
    .bind(&req.business_license_url)
    .fetch_one(&state.pool)
    .await?;

    info!(client_id = row.id, company = %row.company_name, "클라이언트 생성");
    Ok(Json(ApiResponse::success(row.into())))
}

/// 客户온보딩（本人补全업체 정보）
///
/// PUT /api/clients/me/onboarding
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<CreateClientRequest>,
) -> Result<Json<ApiResponse<ClientDto>>> {
    req.validate()?;
    let client_id = claims.user_id()?;

    let row: Option<ClientRow> = sqlx::query_as(&format!(
        r#"
        UPDATE clients
        SET company_name = $2, contact_email = $3, contact_phone = $4,
            business_license_url = $5, onboarded = TRUE, updated_at = NOW()
        WHERE id = $1
        RETURNING {CLIENT_COLUMNS}
        "#
    ))
    .bind(client_id)
    .bind(&req.company_name)
    .bind(&req.contact_email)
    .bind(&req.contact_phone)
    .bind(&req.business_license_url)
    .fetch_optional(&state.pool)
    .await?;

    let row = row.ok_or(ApiError::ClientNotFound(client_id))?;
    info!(client_id, "온보딩 완료");
    Ok(Json(ApiResponse::success(row.into())))
}

/// 启用/停用客户（管理员）
///
/// PATCH /api/admin/clients/{id}/status
pub async fn update_client_status(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateClientStatusRequest>,
) -> Result<Json<ApiResponse<ClientDto>>> {
    require_admin(&claims)?;

    let row: Option<ClientRow> = sqlx::query_as(&format!(
        r#"
        UPDATE clients SET is_active = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {CLIENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(req.is_active)
    .fetch_optional(&state.pool)
    .await?;

    let row = row.ok_or(ApiError::ClientNotFound(id))?;
    info!(client_id = id, is_active = req.is_active, "클라이언트 상태 변경");
    Ok(Json(ApiResponse::success(row.into())))
}

/// 积分充值（管理员）
///
/// POST /api/admin/clients/{id}/charge
pub async fn charge_points(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    Json(req): Json<ChargePointsRequest>,
) -> Result<Json<ApiResponse<points_ledger::PointTransaction>>> {
    require_admin(&claims)?;
    req.validate()?;

    let record = state
        .ledger
        .charge(id, req.amount, req.description.as_deref())
        .await?;

    state
        .notifier
        .emit(
            id,
            NotificationKind::PointsCharged,
            "포인트 충전 완료",
            &format!("{}P가 충전되었습니다", req.amount),
            None,
        )
        .await;

    Ok(Json(ApiResponse::success(record)))
}
