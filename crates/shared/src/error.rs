//! 统一错误处理模块
//!
//! 基础设施层共享的错误类型。业务错误由各服务自己的错误类型承载，
//! 这里只收敛连接层故障。

use thiserror::Error;

/// 平台级错误类型
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, PlatformError>;

impl PlatformError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// 是否为可重试错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_wrapping() {
        let err = PlatformError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("数据库错误"));
    }
}
