//! 站内通知 API 处理器
//!
//! 客户端轮询拉取自己的通知，支持单条已读与全部已读。

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{
    auth::SessionClaims,
    dto::{ApiResponse, NotificationDto, NotificationFilter, PageResponse, PaginationParams},
    error::{ApiError, Result},
    state::AppState,
};

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    notification_type: String,
    title: String,
    body: String,
    submission_ref: Option<String>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for NotificationDto {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            notification_type: row.notification_type,
            title: row.title,
            body: row.body,
            submission_ref: row.submission_ref,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

/// 通知列表（本人，新通知在前）
///
/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Query(filter): Query<NotificationFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<NotificationDto>>>> {
    let client_id = claims.user_id()?;
    let unread_only = filter.unread_only.unwrap_or(false);

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM notifications
        WHERE client_id = $1 AND (NOT $2 OR is_read = FALSE)
        "#,
    )
    .bind(client_id)
    .bind(unread_only)
    .fetch_one(&state.pool)
    .await?;

    let rows: Vec<NotificationRow> = sqlx::query_as(
        r#"
        SELECT id, notification_type, title, body, submission_ref, is_read, created_at
        FROM notifications
        WHERE client_id = $1 AND (NOT $2 OR is_read = FALSE)
        ORDER BY created_at DESC, id DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(client_id)
    .bind(unread_only)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.pool)
    .await?;

    let items = rows.into_iter().map(NotificationDto::from).collect();
    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 单条已读
///
/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<NotificationDto>>> {
    let client_id = claims.user_id()?;

    let row: Option<NotificationRow> = sqlx::query_as(
        r#"
        UPDATE notifications SET is_read = TRUE
        WHERE id = $1 AND client_id = $2
        RETURNING id, notification_type, title, body, submission_ref, is_read, created_at
        "#,
    )
    .bind(id)
    .bind(client_id)
    .fetch_optional(&state.pool)
    .await?;

    let row = row.ok_or(ApiError::NotificationNotFound(id))?;
    Ok(Json(ApiResponse::success(row.into())))
}

/// 全部已读
///
/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let client_id = claims.user_id()?;

    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE client_id = $1 AND is_read = FALSE",
    )
    .bind(client_id)
    .execute(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(json!({
        "updated": result.rows_affected()
    }))))
}
