//! 체험단 블로거 API 처리器
//!
//! 블로거 등록（管理员）→ 선택（客户）→ 阶段推进 → 발행 URL 登记。
//! 阶段序列由订单的体验团子类型决定，跳步请求一律 409。

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use submission_lifecycle::{
    ExperienceKind, ExperienceWorkflow, ProductType, SubmissionEvent, SubmissionStatus,
    WorkflowStage, transition,
};

use crate::{
    auth::SessionClaims,
    dto::{ApiResponse, BloggerDto, RegisterBloggersRequest, SelectBloggersRequest},
    error::{ApiError, Result},
    middleware::require_admin,
    notify::NotificationKind,
    orders,
    state::AppState,
};

#[derive(sqlx::FromRow)]
struct BloggerRow {
    id: i64,
    submission_id: i64,
    name: String,
    blog_url: String,
    follower_count: Option<i32>,
    selected: bool,
    publish_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BloggerRow> for BloggerDto {
    fn from(row: BloggerRow) -> Self {
        Self {
            id: row.id,
            submission_id: row.submission_id,
            name: row.name,
            blog_url: row.blog_url,
            follower_count: row.follower_count,
            selected: row.selected,
            publish_url: row.publish_url,
            created_at: row.created_at,
        }
    }
}

const BLOGGER_COLUMNS: &str =
    "id, submission_id, name, blog_url, follower_count, selected, publish_url, created_at";

/// 体验团订单的工作流字段
#[derive(sqlx::FromRow)]
struct WorkflowRow {
    client_id: i64,
    submission_number: String,
    status: String,
    experience_kind: String,
    workflow_stage: String,
}

impl WorkflowRow {
    fn workflow(&self) -> Result<ExperienceWorkflow> {
        let kind: ExperienceKind = self
            .experience_kind
            .parse()
            .map_err(|_| ApiError::Internal(format!("체험단 종류 비정상: {}", self.experience_kind)))?;
        let stage: WorkflowStage = self
            .workflow_stage
            .parse()
            .map_err(|_| ApiError::Internal(format!("워크플로 단계 비정상: {}", self.workflow_stage)))?;
        ExperienceWorkflow::from_stage(kind, stage)
            .map_err(|_| ApiError::Internal(format!("워크플로 조합 비정상: {} / {}", kind, stage)))
    }
}

async fn fetch_workflow_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: i64,
) -> Result<WorkflowRow> {
    sqlx::query_as::<_, WorkflowRow>(
        r#"
        SELECT client_id, submission_number, status, experience_kind, workflow_stage
        FROM experience_submissions WHERE id = $1 FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(ApiError::SubmissionNotFound(id))
}

/// 블로거 일괄 등록（管理员）
///
/// POST /api/admin/orders/experience/{id}/bloggers
pub async fn register_bloggers(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    Json(req): Json<RegisterBloggersRequest>,
) -> Result<Json<ApiResponse<Vec<BloggerDto>>>> {
    require_admin(&claims)?;
    req.validate()?;
    for entry in &req.bloggers {
        entry.validate()?;
    }

    let mut tx = state.pool.begin().await?;
    let row = fetch_workflow_row(&mut tx, id).await?;

    let mut created = Vec::with_capacity(req.bloggers.len());
    for entry in &req.bloggers {
        let blogger: BloggerRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO experience_bloggers (submission_id, name, blog_url, follower_count, selected)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING {BLOGGER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&entry.name)
        .bind(&entry.blog_url)
        .bind(entry.follower_count)
        .fetch_one(&mut *tx)
        .await?;
        created.push(BloggerDto::from(blogger));
    }

    tx.commit().await?;

    info!(submission_id = id, count = created.len(), "블로거 등록");

    state
        .notifier
        .emit(
            row.client_id,
            NotificationKind::BloggersRegistered,
            "블로거 후보 등록",
            &format!(
                "{} 캠페인에 블로거 {}명이 등록되었습니다",
                row.submission_number,
                created.len()
            ),
            Some(&row.submission_number),
        )
        .await;

    Ok(Json(ApiResponse::success(created)))
}

/// 블로거 목록
///
/// GET /api/orders/experience/{id}/bloggers
pub async fn list_bloggers(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<BloggerDto>>>> {
    let core = orders::fetch_core(&state.pool, ProductType::Experience, id).await?;
    super::ensure_owner_or_admin(&claims, core.client_id)?;

    let rows: Vec<BloggerRow> = sqlx::query_as(&format!(
        "SELECT {BLOGGER_COLUMNS} FROM experience_bloggers WHERE submission_id = $1 ORDER BY id"
    ))
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(BloggerDto::from).collect(),
    )))
}

/// 블로거 선택（客户）
///
/// POST /api/orders/experience/{id}/bloggers/select
///
/// 选择成功即把工作流从 registered 推到 selected；
/// 子类型不含 selected 阶段（기자단）时该端点返回 409。
pub async fn select_bloggers(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    Json(req): Json<SelectBloggersRequest>,
) -> Result<Json<ApiResponse<Vec<BloggerDto>>>> {
    req.validate()?;

    let mut tx = state.pool.begin().await?;
    let row = fetch_workflow_row(&mut tx, id).await?;
    super::ensure_owner_or_admin(&claims, row.client_id)?;

    let mut workflow = row.workflow()?;
    let new_stage = workflow.advance_to(WorkflowStage::Selected)?;

    let updated_rows: Vec<BloggerRow> = sqlx::query_as(&format!(
        r#"
        UPDATE experience_bloggers SET selected = TRUE
        WHERE submission_id = $1 AND id = ANY($2)
        RETURNING {BLOGGER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&req.blogger_ids)
    .fetch_all(&mut *tx)
    .await?;

    if updated_rows.len() != req.blogger_ids.len() {
        // 有 ID 不属于该订单，整体回滚
        return Err(ApiError::Validation(
            "선택 목록에 존재하지 않는 블로거가 포함되어 있습니다".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE experience_submissions SET workflow_stage = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(new_stage.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(submission_id = id, selected = updated_rows.len(), "블로거 선택");
    Ok(Json(ApiResponse::success(
        updated_rows.into_iter().map(BloggerDto::from).collect(),
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceStageRequest {
    /// scheduled / confirmed / published / completed
    pub stage: String,
}

/// 워크플로 단계 추进
///
/// POST /api/orders/experience/{id}/stage
///
/// confirmed（客户最终确认）由归属客户发起，其余阶段由管理员推进。
/// 只接受「恰好是下一个适用阶段」的请求。推进到 selected 请走
/// 블로거 선택 端点。到达 completed 时同步把订单状态翻到 completed。
pub async fn advance_stage(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    Json(req): Json<AdvanceStageRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let requested: WorkflowStage = req.stage.parse()?;

    let mut tx = state.pool.begin().await?;
    let row = fetch_workflow_row(&mut tx, id).await?;

    match requested {
        WorkflowStage::Confirmed => super::ensure_owner_or_admin(&claims, row.client_id)?,
        WorkflowStage::Selected => {
            return Err(ApiError::Validation(
                "블로거 선택 API를 통해 진행해 주세요".to_string(),
            ));
        }
        _ => require_admin(&claims)?,
    }

    let current_status: SubmissionStatus = row
        .status
        .parse()
        .map_err(|_| ApiError::Internal(format!("주문 상태 비정상: {}", row.status)))?;

    let mut workflow = row.workflow()?;
    let new_stage = workflow.advance_to(requested)?;
    let new_status = status_after_stage(current_status, new_stage)?;

    sqlx::query(
        r#"
        UPDATE experience_submissions
        SET workflow_stage = $2, status = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(new_stage.as_str())
    .bind(new_status.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(submission_id = id, stage = new_stage.as_str(), "워크플로 단계 추진");

    state
        .notifier
        .emit(
            row.client_id,
            NotificationKind::WorkflowAdvanced,
            "체험단 진행 상황 업데이트",
            &format!("{} 캠페인이 {} 단계로 진행되었습니다", row.submission_number, new_stage),
            Some(&row.submission_number),
        )
        .await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "stage": new_stage.as_str(),
        "status": new_status.as_str(),
        "isComplete": workflow.is_complete(),
    }))))
}

/// 단계 추진에 따른 주문 상태 연동（纯函数，便于单测）
///
/// 첫 추진은 주문을 집행 중으로, completed 단계 도달은 완료로 번역한다.
/// 완결 주문（completed/cancelled）은 어떤 단계 추진도 받지 않는다.
fn status_after_stage(
    current: SubmissionStatus,
    new_stage: WorkflowStage,
) -> Result<SubmissionStatus> {
    if current.is_terminal() {
        return Err(ApiError::InvalidTransition {
            from: current.to_string(),
            event: "advance_stage".to_string(),
        });
    }
    Ok(match (current, new_stage) {
        (SubmissionStatus::Pending, _) => transition(current, SubmissionEvent::Start)?,
        (SubmissionStatus::InProgress, WorkflowStage::Completed) => {
            transition(current, SubmissionEvent::Complete)?
        }
        (status, _) => status,
    })
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishUrlRequest {
    #[validate(length(min = 1, max = 500, message = "발행 URL을 입력하세요"))]
    pub publish_url: String,
}

/// 발행 URL 수를 주문의 delivered_units 에 동기화
///
/// 체험단의 교부량은 발행 URL 이 등록된 블로거 수로 집계한다.
/// 진행 중 취소 시 비례 환불이 이 값을 잔여량 계산에 쓴다.
pub async fn sync_delivered_units(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    submission_id: i64,
) -> Result<i64> {
    let (delivered,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM experience_bloggers
        WHERE submission_id = $1 AND publish_url IS NOT NULL
        "#,
    )
    .bind(submission_id)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        "UPDATE experience_submissions SET delivered_units = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(submission_id)
    .bind(delivered)
    .execute(&mut **tx)
    .await?;

    Ok(delivered)
}

/// 발행 URL 登记（管理员）
///
/// PATCH /api/admin/orders/experience/{id}/bloggers/{bloggerId}/publish-url
pub async fn set_publish_url(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((id, blogger_id)): Path<(i64, i64)>,
    Json(req): Json<PublishUrlRequest>,
) -> Result<Json<ApiResponse<BloggerDto>>> {
    require_admin(&claims)?;
    req.validate()?;

    let mut tx = state.pool.begin().await?;

    let row: Option<BloggerRow> = sqlx::query_as(&format!(
        r#"
        UPDATE experience_bloggers SET publish_url = $3
        WHERE id = $2 AND submission_id = $1
        RETURNING {BLOGGER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(blogger_id)
    .bind(&req.publish_url)
    .fetch_optional(&mut *tx)
    .await?;
    let row = row.ok_or(ApiError::BloggerNotFound(blogger_id))?;

    sync_delivered_units(&mut tx, id).await?;
    tx.commit().await?;

    Ok(Json(ApiResponse::success(row.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_advance_couples_order_status() {
        // 첫 추진: pending → in_progress
        assert_eq!(
            status_after_stage(SubmissionStatus::Pending, WorkflowStage::Selected).unwrap(),
            SubmissionStatus::InProgress
        );
        // 중간 단계는 상태 유지
        assert_eq!(
            status_after_stage(SubmissionStatus::InProgress, WorkflowStage::Published).unwrap(),
            SubmissionStatus::InProgress
        );
        // completed 단계 도달 시 주문도 완료
        assert_eq!(
            status_after_stage(SubmissionStatus::InProgress, WorkflowStage::Completed).unwrap(),
            SubmissionStatus::Completed
        );
    }

    #[test]
    fn test_terminal_order_rejects_stage_advance() {
        // 취소/완료된 캠페인은 단계 추진을 받지 않는다
        for status in [SubmissionStatus::Cancelled, SubmissionStatus::Completed] {
            for stage in [WorkflowStage::Published, WorkflowStage::Completed] {
                let err = status_after_stage(status, stage).unwrap_err();
                assert!(matches!(err, ApiError::InvalidTransition { .. }));
            }
        }
    }
}
