//! 会话令牌处理
//!
//! 会话通过 HttpOnly Cookie（`adsense_session`）携带，值为 HS256 签名的
//! 紧凑令牌。过期与篡改都在服务端验证，二者对 API 表面不可区分，
//! 一律等同于未携带 Cookie（401）。

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub use adpoint_shared::config::SessionConfig;

/// 会话角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Admin => "admin",
        }
    }
}

/// 会话载荷
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// 用户 ID（客户或管理员）
    pub sub: String,
    pub role: Role,
    /// 显示名（업체명 또는 관리자명）
    pub display_name: String,
    /// 客户是否已完成 onboarding
    pub onboarded: bool,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
}

impl SessionClaims {
    /// 用户 ID
    pub fn user_id(&self) -> Result<i64, ApiError> {
        self.sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("无效的会话".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// 会话管理器
#[derive(Clone)]
pub struct SessionManager {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 签发会话令牌，返回 (token, 过期时间戳)
    pub fn issue(
        &self,
        user_id: i64,
        role: Role,
        display_name: &str,
        onboarded: bool,
    ) -> Result<(String, i64), ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.expires_in_secs);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            role,
            display_name: display_name.to_string(),
            onboarded,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("会话令牌生成失败: {}", e)))?;

        Ok((token, exp.timestamp()))
    }

    /// 验证并解析会话令牌
    ///
    /// 过期、篡改、格式错误统一返回 Unauthorized，不暴露具体原因差异。
    pub fn verify(&self, token: &str) -> Result<SessionClaims, ApiError> {
        let validation = Validation::default();

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthorized("会话无效或已过期".to_string()))
    }

    /// 构造 Set-Cookie 头的值
    pub fn build_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite=Lax",
            self.config.cookie_name, token, self.config.expires_in_secs
        )
    }

    /// 清除会话的 Set-Cookie 头值（登出）
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; Secure; SameSite=Lax",
            self.config.cookie_name
        )
    }

    /// 从 Cookie 头中提取会话令牌
    pub fn token_from_cookie_header(&self, cookie_header: &str) -> Option<String> {
        cookie_header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == self.config.cookie_name).then(|| value.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(SessionConfig {
            secret: "test-secret".to_string(),
            expires_in_secs: 3600,
            cookie_name: "adsense_session".to_string(),
        })
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let mgr = manager();
        let (token, exp) = mgr.issue(42, Role::Client, "카페 봄날", true).unwrap();
        assert!(exp > Utc::now().timestamp());

        let claims = mgr.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.role, Role::Client);
        assert_eq!(claims.display_name, "카페 봄날");
        assert!(!claims.is_admin());
    }

    /// 过期会话必须与未携带 Cookie 等同处理（都是 401）。
    #[test]
    fn test_expired_token_rejected() {
        let mgr = SessionManager::new(SessionConfig {
            secret: "test-secret".to_string(),
            // 负有效期：签出的令牌立即过期
            expires_in_secs: -3600,
            cookie_name: "adsense_session".to_string(),
        });
        let (token, _) = mgr.issue(1, Role::Client, "x", false).unwrap();

        let err = manager().verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    /// 篡改令牌与过期令牌返回同一错误类型，不泄露验证失败的具体原因。
    #[test]
    fn test_tampered_token_rejected_identically() {
        let mgr = manager();
        let (token, _) = mgr.issue(1, Role::Admin, "관리자", true).unwrap();
        let tampered = format!("{}x", token);

        let err = mgr.verify(&tampered).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_cookie_flags() {
        let mgr = manager();
        let cookie = mgr.build_cookie("abc");
        assert!(cookie.starts_with("adsense_session=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));

        let cleared = mgr.clear_cookie();
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn test_token_extraction_from_cookie_header() {
        let mgr = manager();
        let header = "theme=dark; adsense_session=tok123; lang=ko";
        assert_eq!(mgr.token_from_cookie_header(header), Some("tok123".to_string()));
        assert_eq!(mgr.token_from_cookie_header("theme=dark"), None);
    }
}
