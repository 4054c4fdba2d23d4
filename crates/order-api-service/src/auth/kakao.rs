//! Kakao OAuth 对接
//!
//! 客户通过 Kakao 账号登录：授权码换取 access token，再拉取用户资料。
//! Kakao API 视为黑盒，失败一律映射为 ExternalService（502）。

use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::error::ApiError;

const TOKEN_URL: &str = "https://kauth.kakao.com/oauth/token";
const PROFILE_URL: &str = "https://kapi.kakao.com/v2/user/me";

/// Kakao OAuth 配置（环境变量注入）
#[derive(Debug, Clone)]
pub struct KakaoConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl KakaoConfig {
    /// 从环境变量加载；未配置时返回 None，Kakao 登录功能不可用但服务正常启动
    pub fn from_env() -> Option<Self> {
        Some(Self {
            client_id: std::env::var("KAKAO_CLIENT_ID").ok()?,
            client_secret: std::env::var("KAKAO_CLIENT_SECRET").ok()?,
            redirect_uri: std::env::var("KAKAO_REDIRECT_URI").ok()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: i64,
    kakao_account: Option<KakaoAccount>,
}

#[derive(Debug, Deserialize)]
struct KakaoAccount {
    email: Option<String>,
    profile: Option<KakaoProfile>,
}

#[derive(Debug, Deserialize)]
struct KakaoProfile {
    nickname: Option<String>,
}

/// Kakao 用户资料
#[derive(Debug, Clone)]
pub struct KakaoUser {
    pub kakao_id: i64,
    pub email: Option<String>,
    pub nickname: Option<String>,
}

/// Kakao OAuth 客户端
#[derive(Clone)]
pub struct KakaoClient {
    http: reqwest::Client,
    config: KakaoConfig,
}

impl KakaoClient {
    pub fn new(config: KakaoConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Internal(format!("HTTP 客户端构建失败: {}", e)))?;
        Ok(Self { http, config })
    }

    /// 授权码换取用户资料
    #[instrument(skip(self, code))]
    pub async fn fetch_user(&self, code: &str) -> Result<KakaoUser, ApiError> {
        let token: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| external("token exchange", e))?
            .error_for_status()
            .map_err(|e| external("token exchange", e))?
            .json()
            .await
            .map_err(|e| external("token response", e))?;

        let profile: ProfileResponse = self
            .http
            .get(PROFILE_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| external("profile fetch", e))?
            .error_for_status()
            .map_err(|e| external("profile fetch", e))?
            .json()
            .await
            .map_err(|e| external("profile response", e))?;

        let account = profile.kakao_account;
        Ok(KakaoUser {
            kakao_id: profile.id,
            email: account.as_ref().and_then(|a| a.email.clone()),
            nickname: account
                .and_then(|a| a.profile)
                .and_then(|p| p.nickname),
        })
    }
}

fn external(phase: &str, err: reqwest::Error) -> ApiError {
    ApiError::ExternalService {
        service: "kakao".to_string(),
        message: format!("{}: {}", phase, err),
    }
}
