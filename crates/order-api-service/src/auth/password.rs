//! 密码散列处理
//!
//! 管理员账号使用 bcrypt 散列存储

use crate::error::ApiError;

/// 散列密码（注册/重置时使用）
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("密码散列失败: {}", e)))
}

/// 校验密码
///
/// 散列串损坏按「密码错误」处理，不向调用方暴露存储异常。
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_corrupt_hash_is_rejected() {
        assert!(!verify_password("s3cret!", "not-a-bcrypt-hash"));
    }
}
