//! 站内通知
//!
//! 业务事件（订单状态变化、内容审核、充值到账等）向客户推送站内通知。
//! 通知写入失败只记录日志，不影响主业务流程。

use sqlx::PgPool;
use tracing::warn;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    OrderCreated,
    StatusChanged,
    OrderCancelled,
    PointsCharged,
    ContentUploaded,
    RevisionRequested,
    BloggersRegistered,
    WorkflowAdvanced,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCreated => "order_created",
            Self::StatusChanged => "status_changed",
            Self::OrderCancelled => "order_cancelled",
            Self::PointsCharged => "points_charged",
            Self::ContentUploaded => "content_uploaded",
            Self::RevisionRequested => "revision_requested",
            Self::BloggersRegistered => "bloggers_registered",
            Self::WorkflowAdvanced => "workflow_advanced",
        }
    }
}

/// 通知发送器
#[derive(Clone)]
pub struct NotificationEmitter {
    pool: PgPool,
}

impl NotificationEmitter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 写入一条站内通知
    ///
    /// 通知是辅助功能：插入失败记录 warn 日志后吞掉，
    /// 绝不让通知问题导致订单/扣款等主流程回滚。
    pub async fn emit(
        &self,
        client_id: i64,
        kind: NotificationKind,
        title: &str,
        body: &str,
        submission_ref: Option<&str>,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (client_id, notification_type, title, body, submission_ref)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(client_id)
        .bind(kind.as_str())
        .bind(title)
        .bind(body)
        .bind(submission_ref)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(client_id, kind = kind.as_str(), error = %e, "通知写入失败");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_kind_strings() {
        assert_eq!(NotificationKind::OrderCreated.as_str(), "order_created");
        assert_eq!(NotificationKind::RevisionRequested.as_str(), "revision_requested");
        assert_eq!(NotificationKind::WorkflowAdvanced.as_str(), "workflow_advanced");
    }
}
