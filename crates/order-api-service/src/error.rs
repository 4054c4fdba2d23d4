//! API 服务错误类型定义
//!
//! 包含所有 order-api-service 特有的错误类型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use points_ledger::LedgerError;
use submission_lifecycle::LifecycleError;

/// API 服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),
    #[error("禁止访问: {0}")]
    Forbidden(String),
    #[error("用户名或密码错误")]
    InvalidCredentials,
    #[error("账号已停用")]
    ClientDisabled,

    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),
    #[error("订单金额不符: 应为 {expected}, 提交 {submitted}")]
    CostMismatch { expected: i64, submitted: i64 },

    // 资源不存在
    #[error("客户不存在: {0}")]
    ClientNotFound(i64),
    #[error("订单不存在: {0}")]
    SubmissionNotFound(i64),
    #[error("内容条目不存在: {0}")]
    ContentItemNotFound(i64),
    #[error("블로거不存在: {0}")]
    BloggerNotFound(i64),
    #[error("通知不存在: {0}")]
    NotificationNotFound(i64),
    #[error("资源不存在: {0}")]
    NotFound(String),

    // 业务冲突
    #[error("积分余额不足: 需要 {required}, 实际 {actual}")]
    InsufficientBalance { required: i64, actual: i64 },
    #[error("非法状态转换: {from} 状态下不允许 {event}")]
    InvalidTransition { from: String, event: String },
    #[error("工作流阶段错误: 当前 {current}, 请求 {requested}")]
    InvalidWorkflowStage { current: String, requested: String },

    // 文件处理
    #[error("文件处理失败: {0}")]
    FileProcessingError(String),

    // 外部服务
    #[error("外部服务错误: {service} - {message}")]
    ExternalService { service: String, message: String },

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::ClientDisabled => StatusCode::FORBIDDEN,

            Self::Validation(_) | Self::CostMismatch { .. } | Self::InsufficientBalance { .. } => {
                StatusCode::BAD_REQUEST
            }

            Self::ClientNotFound(_)
            | Self::SubmissionNotFound(_)
            | Self::ContentItemNotFound(_)
            | Self::BloggerNotFound(_)
            | Self::NotificationNotFound(_)
            | Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::InvalidTransition { .. } | Self::InvalidWorkflowStage { .. } => {
                StatusCode::CONFLICT
            }

            Self::FileProcessingError(_) => StatusCode::UNPROCESSABLE_ENTITY,

            Self::ExternalService { .. } => StatusCode::BAD_GATEWAY,

            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::ClientDisabled => "CLIENT_DISABLED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CostMismatch { .. } => "COST_MISMATCH",
            Self::ClientNotFound(_) => "CLIENT_NOT_FOUND",
            Self::SubmissionNotFound(_) => "SUBMISSION_NOT_FOUND",
            Self::ContentItemNotFound(_) => "CONTENT_ITEM_NOT_FOUND",
            Self::BloggerNotFound(_) => "BLOGGER_NOT_FOUND",
            Self::NotificationNotFound(_) => "NOTIFICATION_NOT_FOUND",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidWorkflowStage { .. } => "INVALID_WORKFLOW_STAGE",
            Self::FileProcessingError(_) => "FILE_PROCESSING_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 从 JSON 序列化错误转换
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON 处理错误: {}", err))
    }
}

/// 从账本错误转换
///
/// 余额不足与客户不存在保留原语义，其余回退到系统错误。
impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ClientNotFound(id) => Self::ClientNotFound(id),
            LedgerError::InsufficientBalance { required, actual } => {
                Self::InsufficientBalance { required, actual }
            }
            LedgerError::NonPositiveAmount(v) => {
                Self::Validation(format!("金额必须为正数: {}", v))
            }
            LedgerError::AmountExceedsCap(v) => {
                Self::Validation(format!("金额超出单笔上限: {}", v))
            }
            LedgerError::Database(e) => Self::Database(e),
        }
    }
}

/// 从生命周期规则错误转换
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidOrder { field, message } => {
                Self::Validation(format!("{}: {}", field, message))
            }
            LifecycleError::CostMismatch { expected, submitted } => {
                Self::CostMismatch { expected, submitted }
            }
            LifecycleError::InvalidTransition { from, event } => Self::InvalidTransition {
                from: from.to_string(),
                event: event.to_string(),
            },
            LifecycleError::InvalidWorkflowStage { current, requested } => {
                Self::InvalidWorkflowStage {
                    current: current.to_string(),
                    requested: requested.to_string(),
                }
            }
            LifecycleError::WorkflowComplete => {
                Self::Validation("工作流已完成，无法继续推进".to_string())
            }
            other @ (LifecycleError::UnknownStatus(_)
            | LifecycleError::UnknownProduct(_)
            | LifecycleError::UnknownStage(_)) => Self::Validation(other.to_string()),
        }
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    /// 构造所有可简单构造的错误变体及其期望的 (StatusCode, error_code) 映射。
    /// 表驱动方式保证新增变体时只需在一处维护。
    fn all_error_variants() -> Vec<(ApiError, StatusCode, &'static str)> {
        vec![
            (ApiError::Unauthorized("token expired".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (ApiError::Forbidden("admin only".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            (ApiError::ClientDisabled, StatusCode::FORBIDDEN, "CLIENT_DISABLED"),
            (ApiError::Validation("daily_count".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (ApiError::CostMismatch { expected: 90000, submitted: 80000 }, StatusCode::BAD_REQUEST, "COST_MISMATCH"),
            (ApiError::ClientNotFound(10), StatusCode::NOT_FOUND, "CLIENT_NOT_FOUND"),
            (ApiError::SubmissionNotFound(20), StatusCode::NOT_FOUND, "SUBMISSION_NOT_FOUND"),
            (ApiError::ContentItemNotFound(30), StatusCode::NOT_FOUND, "CONTENT_ITEM_NOT_FOUND"),
            (ApiError::BloggerNotFound(40), StatusCode::NOT_FOUND, "BLOGGER_NOT_FOUND"),
            (ApiError::NotificationNotFound(50), StatusCode::NOT_FOUND, "NOTIFICATION_NOT_FOUND"),
            (ApiError::NotFound("some resource".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (ApiError::InsufficientBalance { required: 100, actual: 20 }, StatusCode::BAD_REQUEST, "INSUFFICIENT_BALANCE"),
            (ApiError::InvalidTransition { from: "completed".into(), event: "cancel".into() }, StatusCode::CONFLICT, "INVALID_TRANSITION"),
            (ApiError::InvalidWorkflowStage { current: "registered".into(), requested: "published".into() }, StatusCode::CONFLICT, "INVALID_WORKFLOW_STAGE"),
            (ApiError::FileProcessingError("원고 없음".into()), StatusCode::UNPROCESSABLE_ENTITY, "FILE_PROCESSING_ERROR"),
            (ApiError::ExternalService { service: "kakao".into(), message: "timeout".into() }, StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR"),
            (ApiError::Internal("unexpected state".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ]
    }

    /// 状态码错误会导致前端误判请求结果，逐一验证。
    #[test]
    fn test_all_variants_status_code() {
        for (error, expected_status, label) in all_error_variants() {
            assert_eq!(error.status_code(), expected_status, "状态码不匹配: variant={label}");
        }
    }

    /// 错误码是 API 契约的一部分，客户端用它做条件分支，必须逐一锁定。
    #[test]
    fn test_all_variants_error_code() {
        for (error, _status, expected_code) in all_error_variants() {
            assert_eq!(error.error_code(), expected_code, "错误码不匹配: expected={expected_code}");
        }
    }

    /// 系统级错误的响应消息不应泄露内部细节，只返回通用提示。
    #[tokio::test]
    async fn test_system_errors_hide_internal_details() {
        let error = ApiError::Internal("stack overflow at module X".into());
        let response = error.into_response();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("读取响应体失败");
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        let message = body["message"].as_str().unwrap();

        assert!(!message.contains("stack overflow"), "泄露了内部细节: {message}");
        assert!(message.contains("服务内部错误"));
    }

    /// 业务错误的响应消息应保留原始描述，帮助用户理解问题。
    #[tokio::test]
    async fn test_business_errors_preserve_display_message() {
        let error = ApiError::InsufficientBalance { required: 45_000, actual: 30_000 };
        let response = error.into_response();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("读取响应体失败");
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("INSUFFICIENT_BALANCE"));
        assert!(body["message"].as_str().unwrap().contains("45000"));
        assert!(body["data"].is_null());
    }

    /// 账本错误映射：余额不足必须保留 required/actual 上下文。
    #[test]
    fn test_from_ledger_error() {
        let err: ApiError = LedgerError::InsufficientBalance { required: 100, actual: 20 }.into();
        assert!(matches!(err, ApiError::InsufficientBalance { required: 100, actual: 20 }));

        let err: ApiError = LedgerError::ClientNotFound(7).into();
        assert!(matches!(err, ApiError::ClientNotFound(7)));

        let err: ApiError = LedgerError::Database(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, ApiError::Database(_)));
    }

    /// 生命周期错误映射：转移冲突用 409，数量校验用 400。
    #[test]
    fn test_from_lifecycle_error() {
        use submission_lifecycle::{SubmissionEvent, SubmissionStatus};

        let err: ApiError = LifecycleError::InvalidTransition {
            from: SubmissionStatus::Completed,
            event: SubmissionEvent::Cancel,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");

        let err: ApiError = LifecycleError::InvalidOrder {
            field: "daily_count".into(),
            message: "일 발행수는 1~3건".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = LifecycleError::CostMismatch { expected: 90_000, submitted: 80_000 }.into();
        assert!(matches!(err, ApiError::CostMismatch { expected: 90_000, submitted: 80_000 }));
    }
}
