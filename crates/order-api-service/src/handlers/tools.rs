//! 보조 도구 API 处理器

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::json;

use crate::{dto::ApiResponse, error::Result, state::AppState};

#[derive(Debug, Deserialize)]
pub struct BusinessNameQuery {
    pub url: String,
}

/// 지도 URL에서 상호명 추출
///
/// GET /api/tools/business-name?url=...
///
/// 下单表单的辅助功能：抓取失败返回 502，前端退回手工输入。
pub async fn business_name(
    State(state): State<AppState>,
    Query(query): Query<BusinessNameQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let name = state.scraper.fetch_business_name(&query.url).await?;
    Ok(Json(ApiResponse::success(json!({ "businessName": name }))))
}
