//! API 服务请求 DTO 定义
//!
//! 所有 REST API 的请求参数和请求体结构。
//! 数量范围的业务校验在 submission-lifecycle 中进行，
//! validator 只拦截明显非法的输入（空串、负数、超长）。

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 分页参数
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationParams {
    pub page: i64,
    pub page_size: i64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl PaginationParams {
    /// 查询偏移量（page 从 1 开始）
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    /// 单页条数（1~100 截断）
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }
}

/// 管理员登录请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    #[validate(length(min = 1, max = 50, message = "用户名长度必须在1-50个字符之间"))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "密码不能为空"))]
    pub password: String,
}

/// 创建客户请求（管理员）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 100, message = "업체명长度必须在1-100个字符之间"))]
    pub company_name: String,
    #[validate(email(message = "邮箱格式无效"))]
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub business_license_url: Option<String>,
}

/// 更新客户状态请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientStatusRequest {
    pub is_active: bool,
}

/// 客户查询过滤
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFilter {
    /// 업체명模糊搜索
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
}

/// 积分充值请求（管理员）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargePointsRequest {
    #[validate(range(min = 1, message = "充值金额必须为正数"))]
    pub amount: i64,
    #[validate(length(max = 200, message = "备注不超过200字符"))]
    pub description: Option<String>,
}

/// 流水查询过滤
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// charge / deduct / refund
    pub transaction_type: Option<String>,
}

/// 플레이스 트래픽下单请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaceOrderRequest {
    #[validate(length(min = 1, max = 200, message = "플레이스 URL을 입력하세요"))]
    pub place_url: String,
    #[validate(length(min = 1, max = 100))]
    pub business_name: String,
    #[validate(length(min = 1, max = 10, message = "키워드는 1~10개"))]
    pub keywords: Vec<String>,
    pub daily_count: u32,
    pub days: u32,
    /// 客户端计算的订单金额，服务端按 ±1 容差复核
    pub total_points: i64,
}

/// 영수증 리뷰下单请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub business_name: String,
    pub review_count: u32,
    #[validate(length(max = 1000))]
    pub guide_text: Option<String>,
    pub total_points: i64,
}

/// 카카오맵 리뷰下单请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateKakaomapOrderRequest {
    #[validate(length(min = 1, max = 200))]
    pub map_url: String,
    #[validate(length(min = 1, max = 100))]
    pub business_name: String,
    pub review_count: u32,
    pub total_points: i64,
}

/// 블로그 배포下单请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub business_name: String,
    #[validate(length(min = 1, max = 10))]
    pub keywords: Vec<String>,
    pub daily_count: u32,
    pub total_count: u32,
    pub total_points: i64,
}

/// 카페 마케팅下单请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCafeOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub business_name: String,
    #[validate(length(min = 1, max = 200))]
    pub cafe_url: String,
    pub post_count: u32,
    pub total_points: i64,
}

/// 체험단下单请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExperienceOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub business_name: String,
    /// blog_experience / xiaohongshu / journalist / influencer
    #[validate(length(min = 1, max = 30))]
    pub experience_kind: String,
    pub blogger_count: u32,
    #[validate(length(max = 2000))]
    pub campaign_brief: Option<String>,
    pub total_points: i64,
}

/// 状态流转请求（管理员）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEventRequest {
    /// start / complete / cancel
    pub event: String,
}

/// 日进度记录请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecordRequest {
    #[validate(range(min = 0, message = "完成量不能为负"))]
    pub completed_count: i32,
}

/// 内容条目单条创建请求（管理员）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentItemRequest {
    #[validate(length(min = 1, message = "원고 내용을 입력하세요"))]
    pub content: String,
}

/// 修改请求（客户审核驳回）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRequest {
    #[validate(length(min = 1, max = 1000, message = "수정 사유를 입력하세요"))]
    pub reason: String,
}

/// 블로거登记请求（管理员）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBloggersRequest {
    #[validate(length(min = 1, message = "최소 1명의 블로거를 등록하세요"))]
    pub bloggers: Vec<BloggerEntry>,
}

/// 단일 블로거 항目
///
/// validator 的 length 规则要求集合元素可序列化（校验失败时
/// 会把违规值嵌入错误参数），故同时派生 Serialize。
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BloggerEntry {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(min = 1, max = 300))]
    pub blog_url: String,
    pub follower_count: Option<i32>,
}

/// 블로거选择请求（客户）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectBloggersRequest {
    #[validate(length(min = 1, message = "최소 1명을 선택하세요"))]
    pub blogger_ids: Vec<i64>,
}

/// 通知查询过滤
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    pub unread_only: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = PaginationParams::default();
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn test_pagination_clamps() {
        let p = PaginationParams { page: 0, page_size: 1000 };
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 100);

        let p = PaginationParams { page: 3, page_size: 50 };
        assert_eq!(p.offset(), 100);
    }

    #[test]
    fn test_charge_request_validation() {
        let valid = ChargePointsRequest { amount: 100_000, description: None };
        assert!(valid.validate().is_ok());

        let invalid = ChargePointsRequest { amount: 0, description: None };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_blog_order_request_deserialization() {
        let json = r#"{
            "businessName": "카페 봄날",
            "keywords": ["강남 카페"],
            "dailyCount": 2,
            "totalCount": 20,
            "totalPoints": 600000
        }"#;
        let req: CreateBlogOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.daily_count, 2);
        assert_eq!(req.total_points, 600_000);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_bloggers_requires_at_least_one() {
        let empty = RegisterBloggersRequest { bloggers: vec![] };
        assert!(empty.validate().is_err());

        let one = RegisterBloggersRequest {
            bloggers: vec![BloggerEntry {
                name: "봄날블로거".to_string(),
                blog_url: "https://blog.naver.com/bomnal".to_string(),
                follower_count: Some(1200),
            }],
        };
        assert!(one.validate().is_ok());
    }
}
