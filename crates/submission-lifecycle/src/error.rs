//! 生命周期规则错误类型定义

use thiserror::Error;

use crate::status::{SubmissionEvent, SubmissionStatus};
use crate::workflow::WorkflowStage;

/// 生命周期规则错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("下单参数无效: {field} - {message}")]
    InvalidOrder { field: String, message: String },

    #[error("订单金额不符: 应为 {expected}, 提交 {submitted}")]
    CostMismatch { expected: i64, submitted: i64 },

    #[error("非法状态转换: {from} 状态下不允许 {event}")]
    InvalidTransition {
        from: SubmissionStatus,
        event: SubmissionEvent,
    },

    #[error("工作流阶段错误: 当前 {current}, 请求 {requested}")]
    InvalidWorkflowStage {
        current: WorkflowStage,
        requested: WorkflowStage,
    },

    #[error("工作流已完成，无法继续推进")]
    WorkflowComplete,

    #[error("未知的订单状态: {0}")]
    UnknownStatus(String),

    #[error("未知的商品类型: {0}")]
    UnknownProduct(String),

    #[error("未知的工作流阶段: {0}")]
    UnknownStage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_mismatch_display_contains_both_amounts() {
        let err = LifecycleError::CostMismatch {
            expected: 90000,
            submitted: 85000,
        };
        let msg = err.to_string();
        assert!(msg.contains("90000"));
        assert!(msg.contains("85000"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = LifecycleError::InvalidTransition {
            from: SubmissionStatus::Completed,
            event: SubmissionEvent::Cancel,
        };
        assert!(err.to_string().contains("completed"));
        assert!(err.to_string().contains("cancel"));
    }
}
