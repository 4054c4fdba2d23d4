//! 积分余额与流水 API 处理器

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde_json::json;

use points_ledger::{PointTransaction, TransactionType};

use crate::{
    auth::SessionClaims,
    dto::{ApiResponse, PageResponse, PaginationParams, TransactionFilter},
    error::{ApiError, Result},
    middleware::require_admin,
    state::AppState,
};

fn parse_type_filter(filter: &TransactionFilter) -> Result<Option<TransactionType>> {
    match filter.transaction_type.as_deref() {
        None => Ok(None),
        Some("charge") => Ok(Some(TransactionType::Charge)),
        Some("deduct") => Ok(Some(TransactionType::Deduct)),
        Some("refund") => Ok(Some(TransactionType::Refund)),
        Some(other) => Err(ApiError::Validation(format!("未知流水类型: {}", other))),
    }
}

/// 本人余额
///
/// GET /api/points/balance
pub async fn my_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let client_id = claims.user_id()?;
    let balance = state.ledger.balance(client_id).await?;
    Ok(Json(ApiResponse::success(json!({ "balance": balance }))))
}

/// 本人流水
///
/// GET /api/points/transactions
pub async fn my_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Query(filter): Query<TransactionFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<PointTransaction>>>> {
    let client_id = claims.user_id()?;
    let type_filter = parse_type_filter(&filter)?;

    let (items, total) = state
        .ledger
        .history(client_id, type_filter, pagination.limit(), pagination.offset())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 指定客户流水（管理员）
///
/// GET /api/admin/clients/{id}/transactions
pub async fn client_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<i64>,
    Query(filter): Query<TransactionFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<PointTransaction>>>> {
    require_admin(&claims)?;
    let type_filter = parse_type_filter(&filter)?;

    let (items, total) = state
        .ledger
        .history(id, type_filter, pagination.limit(), pagination.offset())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_filter() {
        let ok = TransactionFilter { transaction_type: Some("refund".into()) };
        assert_eq!(parse_type_filter(&ok).unwrap(), Some(TransactionType::Refund));

        let none = TransactionFilter { transaction_type: None };
        assert_eq!(parse_type_filter(&none).unwrap(), None);

        let bad = TransactionFilter { transaction_type: Some("bonus".into()) };
        assert!(parse_type_filter(&bad).is_err());
    }
}
