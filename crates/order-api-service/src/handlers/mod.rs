//! HTTP 请求处理器模块

pub mod auth;
pub mod blogger;
pub mod client;
pub mod content;
pub mod daily_record;
pub mod notification;
pub mod order;
pub mod stats;
pub mod tools;
pub mod transaction;

use crate::auth::SessionClaims;
use crate::error::{ApiError, Result};

/// 资源归属检查：客户只能访问自己的资源，管理员放行
pub(crate) fn ensure_owner_or_admin(claims: &SessionClaims, owner_id: i64) -> Result<()> {
    if claims.is_admin() {
        return Ok(());
    }
    if claims.user_id()? != owner_id {
        return Err(ApiError::Forbidden("본인 자원만 접근할 수 있습니다".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn claims(id: i64, role: Role) -> SessionClaims {
        SessionClaims {
            sub: id.to_string(),
            role,
            display_name: "t".into(),
            onboarded: true,
            iat: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn test_ensure_owner_or_admin() {
        assert!(ensure_owner_or_admin(&claims(1, Role::Client), 1).is_ok());
        assert!(ensure_owner_or_admin(&claims(1, Role::Client), 2).is_err());
        // 管理员不受归属限制
        assert!(ensure_owner_or_admin(&claims(9, Role::Admin), 2).is_ok());
    }
}
