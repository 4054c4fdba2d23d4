//! 订单 API 处理器
//!
//! 六种商品各自一个下单端点（请求体不同），查询与状态流转走
//! 按商品参数化的公共端点。

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use submission_lifecycle::{ExperienceKind, OrderSpec, ProductType, SubmissionEvent};

use crate::{
    auth::SessionClaims,
    dto::{
        ApiResponse, CreateBlogOrderRequest, CreateCafeOrderRequest, CreateExperienceOrderRequest,
        CreateKakaomapOrderRequest, CreatePlaceOrderRequest, CreateReceiptOrderRequest,
        OrderCreatedDto, PageResponse, PaginationParams, StatusEventRequest, SubmissionDto,
    },
    error::{ApiError, Result},
    middleware::require_admin,
    notify::NotificationKind,
    orders,
    state::AppState,
};

/// 下单前置检查：账号必须存在且处于启用状态
async fn ensure_active_client(state: &AppState, client_id: i64) -> Result<()> {
    let row: Option<(bool,)> = sqlx::query_as("SELECT is_active FROM clients WHERE id = $1")
        .bind(client_id)
        .fetch_optional(&state.pool)
        .await?;

    match row {
        None => Err(ApiError::ClientNotFound(client_id)),
        Some((false,)) => Err(ApiError::ClientDisabled),
        Some((true,)) => Ok(()),
    }
}

/// 下单公共流程：前置检查 → 订单引擎 → 下单通知
async fn place_order(
    state: &AppState,
    claims: &SessionClaims,
    spec: OrderSpec,
    submitted_total: i64,
    details: serde_json::Value,
    experience_kind: Option<ExperienceKind>,
) -> Result<OrderCreatedDto> {
    let client_id = claims.user_id()?;
    ensure_active_client(state, client_id).await?;

    let created = orders::create_submission(
        state,
        client_id,
        &spec,
        submitted_total,
        details,
        experience_kind,
    )
    .await?;

    state
        .notifier
        .emit(
            client_id,
            NotificationKind::OrderCreated,
            "주문 접수 완료",
            &format!("{} 주문이 접수되었습니다", created.submission_number),
            Some(&created.submission_number),
        )
        .await;

    Ok(created)
}

/// 플레이스 트래픽 주문
///
/// POST /api/orders/place
pub async fn create_place_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<CreatePlaceOrderRequest>,
) -> Result<Json<ApiResponse<OrderCreatedDto>>> {
    req.validate()?;

    let spec = OrderSpec::Place {
        daily_count: req.daily_count,
        days: req.days,
    };
    let details = orders::details_with_business_name(
        &req.business_name,
        json!({
            "placeUrl": req.place_url,
            "keywords": req.keywords,
            "dailyCount": req.daily_count,
            "days": req.days,
        }),
    );

    let created = place_order(&state, &claims, spec, req.total_points, details, None).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// 영수증 리뷰 주문
///
/// POST /api/orders/receipt
pub async fn create_receipt_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<CreateReceiptOrderRequest>,
) -> Result<Json<ApiResponse<OrderCreatedDto>>> {
    req.validate()?;

    let spec = OrderSpec::Receipt {
        review_count: req.review_count,
    };
    let details = orders::details_with_business_name(
        &req.business_name,
        json!({
            "reviewCount": req.review_count,
            "guideText": req.guide_text,
        }),
    );

    let created = place_order(&state, &claims, spec, req.total_points, details, None).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// 카카오맵 리뷰 주문
///
/// POST /api/orders/kakaomap
pub async fn create_kakaomap_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<CreateKakaomapOrderRequest>,
) -> Result<Json<ApiResponse<OrderCreatedDto>>> {
    req.validate()?;

    let spec = OrderSpec::Kakaomap {
        review_count: req.review_count,
    };
    let details = orders::details_with_business_name(
        &req.business_name,
        json!({
            "mapUrl": req.map_url,
            "reviewCount": req.review_count,
        }),
    );

    let created = place_order(&state, &claims, spec, req.total_points, details, None).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// 블로그 배포 주문
///
/// POST /api/orders/blog
pub async fn create_blog_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<CreateBlogOrderRequest>,
) -> Result<Json<ApiResponse<OrderCreatedDto>>> {
    req.validate()?;

    let spec = OrderSpec::Blog {
        daily_count: req.daily_count,
        total_count: req.total_count,
    };
    let details = orders::details_with_business_name(
        &req.business_name,
        json!({
            "keywords": req.keywords,
            "dailyCount": req.daily_count,
            "totalCount": req.total_count,
        }),
    );

    let created = place_order(&state, &claims, spec, req.total_points, details, None).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// 카페 마케팅 주문
///
/// POST /api/orders/cafe
pub async fn create_cafe_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<CreateCafeOrderRequest>,
) -> Result<Json<ApiResponse<OrderCreatedDto>>> {
    req.validate()?;

    let spec = OrderSpec::Cafe {
        post_count: req.post_count,
    };
    let details = orders::details_with_business_name(
        &req.business_name,
        json!({
            "cafeUrl": req.cafe_url,
            "postCount": req.post_count,
        }),
    );

    let created = place_order(&state, &claims, spec, req.total_points, details, None).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// 체험단 주문
///
/// POST /api/orders/experience
pub async fn create_experience_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<CreateExperienceOrderRequest>,
) -> Result<Json<ApiResponse<OrderCreatedDto>>> {
    req.validate()?;

    let kind: ExperienceKind = req.experience_kind.parse()?;
    let spec = OrderSpec::Experience {
        blogger_count: req.blogger_count,
    };
    let details = orders::details_with_business_name(
        &req.business_name,
        json!({
            "experienceKind": kind.as_str(),
            "bloggerCount": req.blogger_count,
            "campaignBrief": req.campaign_brief,
        }),
    );

    let created =
        place_order(&state, &claims, spec, req.total_points, details, Some(kind)).await?;
    Ok(Json(ApiResponse::success(created)))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

/// 订单列表
///
/// GET /api/orders/{product}
///
/// 客户只看到自己的订单，管理员看到全部。
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(product): Path<String>,
    Query(filter): Query<OrderFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<SubmissionDto>>>> {
    let product: ProductType = product.parse()?;

    let client_filter = if claims.is_admin() {
        None
    } else {
        Some(claims.user_id()?)
    };

    let (rows, total) = orders::list_cores(
        &state.pool,
        product,
        client_filter,
        filter.status.as_deref(),
        pagination.limit(),
        pagination.offset(),
    )
    .await?;

    let items = rows.into_iter().map(|c| c.into_dto(product)).collect();
    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 订单详情
///
/// GET /api/orders/{product}/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<SubmissionDto>>> {
    let product: ProductType = product.parse()?;
    let core = orders::fetch_core(&state.pool, product, id).await?;
    super::ensure_owner_or_admin(&claims, core.client_id)?;

    Ok(Json(ApiResponse::success(core.into_dto(product))))
}

/// 状态流转
///
/// POST /api/orders/{product}/{id}/events
///
/// start/complete 仅管理员；cancel 允许订单归属客户自助发起。
/// 取消触发的退款与状态翻转在同一事务内生效。
pub async fn apply_status_event(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path((product, id)): Path<(String, i64)>,
    Json(req): Json<StatusEventRequest>,
) -> Result<Json<ApiResponse<SubmissionDto>>> {
    let product: ProductType = product.parse()?;
    let event: SubmissionEvent = req.event.parse()?;

    let core = orders::fetch_core(&state.pool, product, id).await?;
    match event {
        SubmissionEvent::Cancel => super::ensure_owner_or_admin(&claims, core.client_id)?,
        SubmissionEvent::Start | SubmissionEvent::Complete => require_admin(&claims)?,
    }

    let (updated, refunded) = orders::apply_event(&state, product, id, event).await?;

    let (kind, title, body) = match event {
        SubmissionEvent::Cancel => (
            NotificationKind::OrderCancelled,
            "주문 취소",
            format!(
                "{} 주문이 취소되었습니다 (환불 {}P)",
                updated.submission_number, refunded
            ),
        ),
        _ => (
            NotificationKind::StatusChanged,
            "주문 상태 변경",
            format!(
                "{} 주문이 {} 상태가 되었습니다",
                updated.submission_number, updated.status
            ),
        ),
    };
    state
        .notifier
        .emit(
            updated.client_id,
            kind,
            title,
            &body,
            Some(&updated.submission_number),
        )
        .await;

    Ok(Json(ApiResponse::success(updated.into_dto(product))))
}
