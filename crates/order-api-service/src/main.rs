//! 营销服务订单平台 API 服务入口
//!
//! 客户下单与管理员履约的统一 REST 入口。

use axum::{
    Json, Router, extract::Request, http::HeaderValue, middleware, middleware::Next,
    response::Response, routing::get,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use adpoint_shared::{config::AppConfig, database::Database, observability};
use order_api_service::{
    auth::{KakaoClient, KakaoConfig, SessionManager},
    middleware::session_middleware,
    routes,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 统一加载配置：config/*.toml + ADPOINT_ 前缀环境变量
    let config = AppConfig::load("order-api-service").unwrap_or_default();
    observability::init(&config.observability)?;

    info!("Starting order-api-service on {}", config.server_addr());

    let db = Database::connect(&config.database).await?;

    // 会话密钥：生产环境禁止使用默认值
    let session_config = config.session.clone();
    if config.is_production()
        && session_config.secret == adpoint_shared::config::SessionConfig::default().secret
    {
        anyhow::bail!("ADPOINT_SESSION_SECRET must be set in production environment");
    }
    if !config.is_production()
        && session_config.secret == adpoint_shared::config::SessionConfig::default().secret
    {
        warn!("Using default session secret - set ADPOINT_SESSION_SECRET for production");
    }
    let sessions = SessionManager::new(session_config);

    // Kakao OAuth 未配置时服务照常启动，客户登录不可用
    let kakao = match KakaoConfig::from_env() {
        Some(cfg) => Some(KakaoClient::new(cfg).map_err(|e| anyhow::anyhow!("{}", e))?),
        None => {
            warn!("Kakao OAuth 환경 변수 미설정 - 고객 로그인 비활성화");
            None
        }
    };

    let state = AppState::new(db.pool().clone(), sessions, kakao)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // CORS：ADPOINT_CORS_ORIGINS 控制允许来源，默认本地开发地址
    let allowed_origins = std::env::var("ADPOINT_CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    let cors = if allowed_origins == "*" {
        if config.is_production() {
            warn!("ADPOINT_CORS_ORIGINS=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .nest("/api", routes::api_routes())
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db.clone();
                move || readiness_check(db_for_ready.clone())
            }),
        )
        // HTTP 安全头：即使反向代理未配置也确保基本安全策略生效
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        // 会话认证：公开路由内部跳过
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：SIGTERM（K8s）或 Ctrl+C 时停止接收新连接
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// 为所有响应注入 HTTP 安全头
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    // 禁止浏览器猜测 Content-Type
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    // 禁止页面被嵌入 iframe，防止点击劫持
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    // 强制后续访问只走 HTTPS
    headers.insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert("x-xss-protection", HeaderValue::from_static("0"));
    response
}

/// 监听关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "order-api-service"
    }))
}

/// 就绪探针：数据库连接可用才对外提供服务
async fn readiness_check(db: Database) -> Json<serde_json::Value> {
    let db_ok = db.health_check().await.is_ok();

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "order-api-service",
        "checks": {
            "database": if db_ok { "ok" } else { "fail" }
        }
    }))
}
