//! 내용条目 API 处理器
//!
//! 블로그/카페/카카오맵 订单的 원고 管理：Excel 批量上传、单条追加、
//! 客户审核（승인/수정 요청）、管理员重新提交。

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use tracing::info;
use validator::Validate;

use submission_lifecycle::ProductType;

use crate::{
    auth::SessionClaims,
    dto::{ApiResponse, ContentItemDto, CreateContentItemRequest, RevisionRequest},
    error::{ApiError, Result},
    excel,
    middleware::require_admin,
    notify::NotificationKind,
    orders,
    state::AppState,
};

/// 원고 审核状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewStatus {
    PendingReview,
    Approved,
    RevisionRequested,
}

impl ReviewStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::RevisionRequested => "revision_requested",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending_review" => Ok(Self::PendingReview),
            "approved" => Ok(Self::Approved),
            "revision_requested" => Ok(Self::RevisionRequested),
            other => Err(ApiError::Internal(format!("원고 审核状态列非法: {}", other))),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContentItemRow {
    id: i64,
    submission_id: i64,
    seq: i32,
    content: String,
    review_status: String,
    revision_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContentItemRow> for ContentItemDto {
    fn from(row: ContentItemRow) -> Self {
        Self {
            id: row.id,
            submission_id: row.submission_id,
            seq: row.seq,
            content: row.content,
            review_status: row.review_status,
            revision_reason: row.revision_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ITEM_COLUMNS: &str =
    "id, submission_id, seq, content, review_status, revision_reason, created_at, updated_at";

/// 商品必须有内容条目表（blog/cafe/kakaomap）
fn content_table(product: ProductType) -> Result<&'static str> {
    product.content_table().ok_or_else(|| {
        ApiError::Validation(format!("{} 상품은 원고 관리를 지원하지 않습니다", product))
    })
}

/// Excel 批量上传 원고（管理员）
///
/// POST /api/admin/orders/{product}/{id}/content/upload
///
/// 解析出的条目在一个事务内全部插入，序号接在已有条目之后。
/// 解析失败或中途插入失败时一条也不落库。
pub async fn upload_manuscripts(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id)): Path<(String, i64)>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<ContentItemDto>>>> {
    require_admin(&claims)?;
    let product: ProductType = product.parse()?;
    let table = content_table(product)?;

    let core = orders::fetch_core(&state.pool, product, id).await?;

    // 取第一个文件字段
    let mut file_bytes: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::FileProcessingError(format!("업로드 파싱 실패: {}", e)))?
    {
        if field.file_name().is_some() {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::FileProcessingError(format!("파일 읽기 실패: {}", e)))?;
            file_bytes = Some(bytes.to_vec());
            break;
        }
    }

    let bytes = file_bytes
        .ok_or_else(|| ApiError::FileProcessingError("업로드된 파일이 없습니다".to_string()))?;
    let manuscripts = excel::parse_manuscripts(&bytes)?;

    let mut tx = state.pool.begin().await?;

    let (max_seq,): (i32,) = sqlx::query_as(&format!(
        "SELECT COALESCE(MAX(seq), 0) FROM {table} WHERE submission_id = $1"
    ))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let mut created = Vec::with_capacity(manuscripts.len());
    for (offset, content) in manuscripts.iter().enumerate() {
        let row: ContentItemRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO {table} (submission_id, seq, content, review_status)
            VALUES ($1, $2, $3, 'pending_review')
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(max_seq + 1 + offset as i32)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;
        created.push(ContentItemDto::from(row));
    }

    tx.commit().await?;

    info!(submission_id = id, count = created.len(), "원고 일괄 업로드");

    state
        .notifier
        .emit(
            core.client_id,
            NotificationKind::ContentUploaded,
            "원고 등록 완료",
            &format!(
                "{} 주문에 원고 {}건이 등록되었습니다. 검수해 주세요",
                core.submission_number,
                created.len()
            ),
            Some(&core.submission_number),
        )
        .await;

    Ok(Json(ApiResponse::success(created)))
}

/// 单条追加 원고（管理员）
///
/// POST /api/admin/orders/{product}/{id}/content
pub async fn create_content_item(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id)): Path<(String, i64)>,
    Json(req): Json<CreateContentItemRequest>,
) -> Result<Json<ApiResponse<ContentItemDto>>> {
    require_admin(&claims)?;
    req.validate()?;
    let product: ProductType = product.parse()?;
    let table = content_table(product)?;

    // 订单存在性检查
    orders::fetch_core(&state.pool, product, id).await?;

    let row: ContentItemRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO {table} (submission_id, seq, content, review_status)
        SELECT $1, COALESCE(MAX(seq), 0) + 1, $2, 'pending_review'
        FROM {table} WHERE submission_id = $1
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&req.content)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(row.into())))
}

/// 원고 목록
///
/// GET /api/orders/{product}/{id}/content
pub async fn list_content_items(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<Vec<ContentItemDto>>>> {
    let product: ProductType = product.parse()?;
    let table = content_table(product)?;

    let core = orders::fetch_core(&state.pool, product, id).await?;
    super::ensure_owner_or_admin(&claims, core.client_id)?;

    let rows: Vec<ContentItemRow> = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM {table} WHERE submission_id = $1 ORDER BY seq"
    ))
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(ContentItemDto::from).collect(),
    )))
}

/// 审核动作公共流程：取条目 → 校验当前状态 → 更新
async fn review_item(
    state: &AppState,
    product: ProductType,
    submission_id: i64,
    item_id: i64,
    expected: ReviewStatus,
    next: ReviewStatus,
    revision_reason: Option<&str>,
    new_content: Option<&str>,
) -> Result<ContentItemRow> {
    let table = content_table(product)?;

    let row: Option<ContentItemRow> = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM {table} WHERE id = $1 AND submission_id = $2"
    ))
    .bind(item_id)
    .bind(submission_id)
    .fetch_optional(&state.pool)
    .await?;

    let row = row.ok_or(ApiError::ContentItemNotFound(item_id))?;
    let current: ReviewStatus = row.review_status.parse()?;
    if current != expected {
        return Err(ApiError::InvalidTransition {
            from: current.as_str().to_string(),
            event: next.as_str().to_string(),
        });
    }

    let updated: ContentItemRow = sqlx::query_as(&format!(
        r#"
        UPDATE {table}
        SET review_status = $2,
            revision_reason = $3,
            content = COALESCE($4, content),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(item_id)
    .bind(next.as_str())
    .bind(revision_reason)
    .bind(new_content)
    .fetch_one(&state.pool)
    .await?;

    Ok(updated)
}

/// 승인（客户）
///
/// POST /api/orders/{product}/{id}/content/{itemId}/approve
pub async fn approve_item(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id, item_id)): Path<(String, i64, i64)>,
) -> Result<Json<ApiResponse<ContentItemDto>>> {
    let product: ProductType = product.parse()?;
    let core = orders::fetch_core(&state.pool, product, id).await?;
    super::ensure_owner_or_admin(&claims, core.client_id)?;

    let updated = review_item(
        &state,
        product,
        id,
        item_id,
        ReviewStatus::PendingReview,
        ReviewStatus::Approved,
        None,
        None,
    )
    .await?;

    info!(submission_id = id, item_id, "원고 승인");
    Ok(Json(ApiResponse::success(updated.into())))
}

/// 수정 요청（客户）
///
/// POST /api/orders/{product}/{id}/content/{itemId}/revision
pub async fn request_revision(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id, item_id)): Path<(String, i64, i64)>,
    Json(req): Json<RevisionRequest>,
) -> Result<Json<ApiResponse<ContentItemDto>>> {
    req.validate()?;
    let product: ProductType = product.parse()?;
    let core = orders::fetch_core(&state.pool, product, id).await?;
    super::ensure_owner_or_admin(&claims, core.client_id)?;

    let updated = review_item(
        &state,
        product,
        id,
        item_id,
        ReviewStatus::PendingReview,
        ReviewStatus::RevisionRequested,
        Some(&req.reason),
        None,
    )
    .await?;

    info!(submission_id = id, item_id, "원고 수정 요청");

    state
        .notifier
        .emit(
            core.client_id,
            NotificationKind::RevisionRequested,
            "원고 수정 요청 접수",
            &format!("{} 주문의 원고에 수정 요청이 접수되었습니다", core.submission_number),
            Some(&core.submission_number),
        )
        .await;

    Ok(Json(ApiResponse::success(updated.into())))
}

/// 수정본 재제출（管理员）
///
/// POST /api/admin/orders/{product}/{id}/content/{itemId}/resubmit
///
/// 重新提交后回到 pending_review，等待客户再次审核。
pub async fn resubmit_item(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id, item_id)): Path<(String, i64, i64)>,
    Json(req): Json<CreateContentItemRequest>,
) -> Result<Json<ApiResponse<ContentItemDto>>> {
    require_admin(&claims)?;
    req.validate()?;
    let product: ProductType = product.parse()?;
    orders::fetch_core(&state.pool, product, id).await?;

    let updated = review_item(
        &state,
        product,
        id,
        item_id,
        ReviewStatus::RevisionRequested,
        ReviewStatus::PendingReview,
        None,
        Some(&req.content),
    )
    .await?;

    info!(submission_id = id, item_id, "원고 재제출");
    Ok(Json(ApiResponse::success(updated.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_round_trip() {
        for status in [
            ReviewStatus::PendingReview,
            ReviewStatus::Approved,
            ReviewStatus::RevisionRequested,
        ] {
            assert_eq!(status.as_str().parse::<ReviewStatus>().unwrap(), status);
        }
        assert!("published".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn test_content_table_gate() {
        assert!(content_table(ProductType::Blog).is_ok());
        assert!(content_table(ProductType::Cafe).is_ok());
        assert!(content_table(ProductType::Kakaomap).is_ok());

        assert!(content_table(ProductType::Place).is_err());
        assert!(content_table(ProductType::Receipt).is_err());
        assert!(content_table(ProductType::Experience).is_err());
    }
}
