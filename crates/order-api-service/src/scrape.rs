//! 상호명（商号）自动抓取
//!
//! 客户填了플레이스/카카오맵 URL 之后，从落地页抓取 og:title 或
//! <title> 推断业务名称，减少手工输入。抓取只是辅助功能：
//! 任何失败都返回 ExternalService，前端退回手工输入。

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ApiError, Result};

const FETCH_TIMEOUT_SECS: u64 = 8;
const MAX_BODY_BYTES: usize = 512 * 1024;

fn og_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<meta[^>]+property="og:title"[^>]+content="([^"]+)""#)
            .unwrap_or_else(|_| unreachable!("og:title 正则为常量"))
    })
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<title[^>]*>([^<]+)</title>")
            .unwrap_or_else(|_| unreachable!("title 正则为常量"))
    })
}

/// 상호명抓取器
#[derive(Clone)]
pub struct BusinessNameScraper {
    http: reqwest::Client,
}

impl BusinessNameScraper {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (compatible; AdpointBot/1.0)")
            .build()
            .map_err(|e| ApiError::Internal(format!("HTTP 客户端构建失败: {}", e)))?;
        Ok(Self { http })
    }

    /// 抓取落地页并提取业务名称
    #[instrument(skip(self))]
    pub async fn fetch_business_name(&self, url: &str) -> Result<String> {
        validate_place_url(url)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| external(e.to_string()))?
            .error_for_status()
            .map_err(|e| external(e.to_string()))?;

        let body = response.text().await.map_err(|e| external(e.to_string()))?;
        // 截断点必须落在字符边界上（页面多为多字节韩文）
        let mut cut = body.len().min(MAX_BODY_BYTES);
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        let truncated = &body[..cut];

        extract_business_name(truncated)
            .ok_or_else(|| external("페이지에서 상호명을 찾을 수 없습니다".to_string()))
    }
}

/// 只接受 Naver/Kakao 地图域名，防止把服务当成任意 URL 抓取代理
fn validate_place_url(url: &str) -> Result<()> {
    const ALLOWED_HOSTS: [&str; 4] = [
        "map.naver.com",
        "m.place.naver.com",
        "place.map.kakao.com",
        "map.kakao.com",
    ];

    let host = url
        .strip_prefix("https://")
        .map(|rest| rest.split(['/', '?', '#']).next().unwrap_or(""))
        .unwrap_or("");
    let host = host.strip_prefix("www.").unwrap_or(host);

    if !ALLOWED_HOSTS.contains(&host) {
        return Err(ApiError::Validation(
            "네이버/카카오 지도 URL만 지원합니다".to_string(),
        ));
    }
    Ok(())
}

/// 从 HTML 中提取业务名称（纯函数，便于单测）
///
/// 优先 og:title，退回 <title>。站点 title 常带「: 네이버 플레이스」
/// 之类的后缀，按分隔符截掉。
pub fn extract_business_name(html: &str) -> Option<String> {
    let raw = og_title_re()
        .captures(html)
        .or_else(|| title_re().captures(html))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())?;

    let name = raw
        .split([':', '|', '-'])
        .next()
        .unwrap_or(raw)
        .trim()
        .to_string();

    if name.is_empty() { None } else { Some(name) }
}

fn external(message: String) -> ApiError {
    ApiError::ExternalService {
        service: "place_page".to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_og_title() {
        let html = r#"<html><head>
            <meta property="og:title" content="카페 봄날 : 네이버 플레이스" />
            <title>다른 제목</title>
        </head></html>"#;
        assert_eq!(extract_business_name(html), Some("카페 봄날".to_string()));
    }

    #[test]
    fn test_falls_back_to_title_tag() {
        let html = "<html><head><title>봄날식당 | 카카오맵</title></head></html>";
        assert_eq!(extract_business_name(html), Some("봄날식당".to_string()));
    }

    #[test]
    fn test_no_title_returns_none() {
        assert_eq!(extract_business_name("<html><body>내용 없음</body></html>"), None);
        // 제목이 구분자만으로 이루어진 경우
        assert_eq!(extract_business_name("<title> : </title>"), None);
    }

    #[test]
    fn test_url_allowlist() {
        assert!(validate_place_url("https://map.naver.com/p/entry/place/123").is_ok());
        assert!(validate_place_url("https://place.map.kakao.com/456").is_ok());

        assert!(validate_place_url("https://evil.example.com/").is_err());
        assert!(validate_place_url("http://map.naver.com/p/1").is_err());
        assert!(validate_place_url("https://map.naver.com.evil.com/").is_err());
    }
}
