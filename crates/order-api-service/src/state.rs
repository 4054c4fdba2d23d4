//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use sqlx::PgPool;

use points_ledger::LedgerService;
use submission_lifecycle::PriceTable;

use crate::auth::{KakaoClient, SessionManager};
use crate::error::Result;
use crate::notify::NotificationEmitter;
use crate::scrape::BusinessNameScraper;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL 连接池
    pub pool: PgPool,
    /// 会话管理器
    pub sessions: SessionManager,
    /// 积分账本服务
    pub ledger: LedgerService,
    /// 商品单价表
    pub prices: PriceTable,
    /// 站内通知发送器
    pub notifier: NotificationEmitter,
    /// 상호명抓取器
    pub scraper: BusinessNameScraper,
    /// Kakao OAuth 客户端（未配置时为 None，Kakao 登录不可用）
    pub kakao: Option<KakaoClient>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(pool: PgPool, sessions: SessionManager, kakao: Option<KakaoClient>) -> Result<Self> {
        let ledger = LedgerService::new(pool.clone());
        let notifier = NotificationEmitter::new(pool.clone());
        let scraper = BusinessNameScraper::new()?;
        Ok(Self {
            pool,
            sessions,
            ledger,
            prices: PriceTable::default(),
            notifier,
            scraper,
            kakao,
        })
    }
}
