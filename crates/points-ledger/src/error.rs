//! 账本服务错误类型定义

use thiserror::Error;

/// 账本错误
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("客户不存在: {0}")]
    ClientNotFound(i64),

    #[error("积分余额不足: 需要 {required}, 实际 {actual}")]
    InsufficientBalance { required: i64, actual: i64 },

    #[error("金额必须为正数: {0}")]
    NonPositiveAmount(i64),

    #[error("金额超出单笔上限: {0}")]
    AmountExceedsCap(i64),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
}

/// 账本 Result 类型别名
pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::ClientNotFound(_) => "CLIENT_NOT_FOUND",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::AmountExceedsCap(_) => "AMOUNT_EXCEEDS_CAP",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::ClientNotFound(7).code(), "CLIENT_NOT_FOUND");
        assert_eq!(
            LedgerError::InsufficientBalance {
                required: 100,
                actual: 20
            }
            .code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(LedgerError::AmountExceedsCap(i64::MAX).code(), "AMOUNT_EXCEEDS_CAP");
    }

    #[test]
    fn test_display_contains_context() {
        let err = LedgerError::InsufficientBalance {
            required: 45_000,
            actual: 30_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("45000"));
        assert!(msg.contains("30000"));
    }
}
