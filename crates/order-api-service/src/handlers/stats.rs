//! 운영 통계 API 处理器

use axum::{Extension, Json, extract::State};

use submission_lifecycle::ProductType;

use crate::{
    auth::SessionClaims,
    dto::{ApiResponse, ProductStatsDto, StatsOverview},
    error::Result,
    middleware::require_admin,
    state::AppState,
};

/// 运营总览（管理员）
///
/// GET /api/admin/stats/overview
///
/// 客户规模、各商品订单状态分布、积分三类流水总额。
pub async fn overview(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<ApiResponse<StatsOverview>>> {
    require_admin(&claims)?;

    let (total_clients, active_clients): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM clients",
    )
    .fetch_one(&state.pool)
    .await?;

    let mut products = Vec::with_capacity(ProductType::ALL.len());
    for product in ProductType::ALL {
        let sql = format!(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE status = 'in_progress'),
                COUNT(*) FILTER (WHERE status = 'completed'),
                COUNT(*) FILTER (WHERE status = 'cancelled')
            FROM {}
            "#,
            product.submission_table()
        );
        let (pending, in_progress, completed, cancelled): (i64, i64, i64, i64) =
            sqlx::query_as(&sql).fetch_one(&state.pool).await?;

        products.push(ProductStatsDto {
            product: product.as_str().to_string(),
            pending,
            in_progress,
            completed,
            cancelled,
        });
    }

    let (points_charged, points_deducted, points_refunded): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'charge'), 0),
            COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'deduct'), 0),
            COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'refund'), 0)
        FROM point_transactions
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(StatsOverview {
        total_clients,
        active_clients,
        products,
        points_charged,
        points_deducted,
        points_refunded,
    })))
}
