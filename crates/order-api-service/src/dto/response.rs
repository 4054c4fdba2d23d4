//! API 服务响应 DTO 定义
//!
//! 所有 REST API 的响应体结构

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 分页响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    /// 创建分页响应
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    /// 创建空分页响应
    pub fn empty(page: i64, page_size: i64) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            page_size,
            total_pages: 0,
        }
    }
}

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（无数据）
    pub fn success_empty() -> ApiResponse<()> {
        ApiResponse {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: None,
        }
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

/// 会话用户信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserDto {
    pub id: i64,
    /// client / admin
    pub role: String,
    pub display_name: String,
    /// 客户是否已完成 onboarding（管理员恒为 true）
    pub onboarded: bool,
}

/// 客户响应 DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    pub id: i64,
    pub company_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub points: i64,
    pub is_active: bool,
    pub onboarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 订单公共字段 DTO（各商品列表/详情共用）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDto {
    pub id: i64,
    pub submission_number: String,
    pub product: String,
    pub client_id: i64,
    pub status: String,
    pub total_points: i64,
    pub total_units: i64,
    pub delivered_units: i64,
    /// 商品特有字段（keywords、URL 등）
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 下单结果 DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedDto {
    pub submission_id: i64,
    pub submission_number: String,
    pub product: String,
    pub charged_points: i64,
    pub balance_after: i64,
}

/// 内容条目 DTO
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemDto {
    pub id: i64,
    pub submission_id: i64,
    pub seq: i32,
    pub content: String,
    /// pending_review / approved / revision_requested
    pub review_status: String,
    pub revision_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 日进度记录 DTO
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecordDto {
    pub submission_id: i64,
    pub record_date: NaiveDate,
    pub completed_count: i32,
}

/// 블로거 DTO
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloggerDto {
    pub id: i64,
    pub submission_id: i64,
    pub name: String,
    pub blog_url: String,
    pub follower_count: Option<i32>,
    pub selected: bool,
    pub publish_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 通知 DTO
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: i64,
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub submission_ref: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// 单商品统计
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStatsDto {
    pub product: String,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

/// 统计总览
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub total_clients: i64,
    pub active_clients: i64,
    pub products: Vec<ProductStatsDto>,
    pub points_charged: i64,
    pub points_deducted: i64,
    pub points_refunded: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_response_total_pages() {
        let page: PageResponse<i32> = PageResponse::new(vec![1, 2, 3], 45, 1, 20);
        assert_eq!(page.total_pages, 3);

        let exact: PageResponse<i32> = PageResponse::new(vec![], 40, 1, 20);
        assert_eq!(exact.total_pages, 2);

        let empty: PageResponse<i32> = PageResponse::empty(1, 20);
        assert_eq!(empty.total, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_api_response_serialization() {
        let resp = ApiResponse::success(serde_json::json!({"id": 1}));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"code\":\"SUCCESS\""));

        // 无数据时 data 字段整体省略
        let empty = ApiResponse::<()>::success_empty();
        let json = serde_json::to_string(&empty).unwrap();
        assert!(!json.contains("\"data\""));
    }

    #[test]
    fn test_submission_dto_camel_case() {
        let dto = SubmissionDto {
            id: 1,
            submission_number: "AP-20260830-0001".to_string(),
            product: "blog".to_string(),
            client_id: 42,
            status: "pending".to_string(),
            total_points: 600_000,
            total_units: 20,
            delivered_units: 0,
            details: serde_json::json!({"keywords": ["강남 카페"]}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.contains("\"submissionNumber\":\"AP-20260830-0001\""));
        assert!(json.contains("\"totalUnits\":20"));
    }
}
