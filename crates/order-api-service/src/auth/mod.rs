//! 认证模块
//!
//! 会话令牌签发/验证、密码散列、Kakao OAuth 对接

pub mod kakao;
pub mod password;
pub mod session;

pub use kakao::{KakaoClient, KakaoConfig, KakaoUser};
pub use password::{hash_password, verify_password};
pub use session::{Role, SessionClaims, SessionConfig, SessionManager};
