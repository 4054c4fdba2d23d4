//! 일별 진행 기록 API 处理器
//!
//! 管理员按日上报交付量，首条记录把订单从 pending 翻到 in_progress。

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::NaiveDate;
use validator::Validate;

use submission_lifecycle::ProductType;

use crate::{
    auth::SessionClaims,
    dto::{ApiResponse, DailyRecordDto, DailyRecordRequest, SubmissionDto},
    error::Result,
    middleware::require_admin,
    orders,
    state::AppState,
};

/// 上报某日交付量（管理员，同日重复上报覆盖）
///
/// PUT /api/admin/orders/{product}/{id}/daily/{date}
pub async fn record_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id, date)): Path<(String, i64, NaiveDate)>,
    Json(req): Json<DailyRecordRequest>,
) -> Result<Json<ApiResponse<SubmissionDto>>> {
    require_admin(&claims)?;
    req.validate()?;
    let product: ProductType = product.parse()?;

    let updated =
        orders::record_daily_progress(&state, product, id, date, req.completed_count).await?;

    Ok(Json(ApiResponse::success(updated.into_dto(product))))
}

/// 日进度列表（归属客户或管理员）
///
/// GET /api/orders/{product}/{id}/daily
pub async fn list_daily_records(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<Vec<DailyRecordDto>>>> {
    let product: ProductType = product.parse()?;
    let core = orders::fetch_core(&state.pool, product, id).await?;
    super::ensure_owner_or_admin(&claims, core.client_id)?;

    let rows: Vec<(i64, NaiveDate, i32)> = sqlx::query_as(
        r#"
        SELECT submission_id, record_date, completed_count
        FROM submission_daily_records
        WHERE product = $1 AND submission_id = $2
        ORDER BY record_date
        "#,
    )
    .bind(product.as_str())
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|(submission_id, record_date, completed_count)| DailyRecordDto {
            submission_id,
            record_date,
            completed_count,
        })
        .collect();

    Ok(Json(ApiResponse::success(items)))
}
