//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射。
//! 管理员专属端点挂在 /api/admin 之下，权限在处理器内二次校验。

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::{handlers, state::AppState};

/// 认证路由（登录/回调为公开路由）
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::admin_login))
        .route("/auth/kakao/callback", get(handlers::auth::kakao_callback))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// 客户侧路由（需要会话）
fn client_routes() -> Router<AppState> {
    Router::new()
        // 본인 정보
        .route("/clients/{id}", get(handlers::client::get_client))
        .route(
            "/clients/me/onboarding",
            put(handlers::client::complete_onboarding),
        )
        // 포인트
        .route("/points/balance", get(handlers::transaction::my_balance))
        .route(
            "/points/transactions",
            get(handlers::transaction::my_transactions),
        )
        // 알림
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/read-all",
            post(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::notification::mark_read),
        )
        // 보조 도구
        .route("/tools/business-name", get(handlers::tools::business_name))
}

/// 下单路由（六种商品各一个端点）
fn order_creation_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/place", post(handlers::order::create_place_order))
        .route(
            "/orders/receipt",
            post(handlers::order::create_receipt_order),
        )
        .route(
            "/orders/kakaomap",
            post(handlers::order::create_kakaomap_order),
        )
        .route("/orders/blog", post(handlers::order::create_blog_order))
        .route("/orders/cafe", post(handlers::order::create_cafe_order))
        .route(
            "/orders/experience",
            post(handlers::order::create_experience_order),
        )
}

/// 订单查询与流转路由（商品参数化）
///
/// 体验团专属路由必须注册在 {product} 通配路由之前。
fn order_routes() -> Router<AppState> {
    Router::new()
        // 체험단 워크플로
        .route(
            "/orders/experience/{id}/bloggers",
            get(handlers::blogger::list_bloggers),
        )
        .route(
            "/orders/experience/{id}/bloggers/select",
            post(handlers::blogger::select_bloggers),
        )
        .route(
            "/orders/experience/{id}/stage",
            post(handlers::blogger::advance_stage),
        )
        // 공통 조회/流转
        .route("/orders/{product}", get(handlers::order::list_orders))
        .route("/orders/{product}/{id}", get(handlers::order::get_order))
        .route(
            "/orders/{product}/{id}/events",
            post(handlers::order::apply_status_event),
        )
        .route(
            "/orders/{product}/{id}/content",
            get(handlers::content::list_content_items),
        )
        .route(
            "/orders/{product}/{id}/content/{item_id}/approve",
            post(handlers::content::approve_item),
        )
        .route(
            "/orders/{product}/{id}/content/{item_id}/revision",
            post(handlers::content::request_revision),
        )
        .route(
            "/orders/{product}/{id}/daily",
            get(handlers::daily_record::list_daily_records),
        )
}

/// 管理员路由
fn admin_routes() -> Router<AppState> {
    Router::new()
        // 클라이언트 관리
        .route("/clients", get(handlers::client::list_clients))
        .route("/clients", post(handlers::client::create_client))
        .route(
            "/clients/{id}/status",
            patch(handlers::client::update_client_status),
        )
        .route("/clients/{id}/charge", post(handlers::client::charge_points))
        .route(
            "/clients/{id}/transactions",
            get(handlers::transaction::client_transactions),
        )
        // 원고 관리
        .route(
            "/orders/{product}/{id}/content/upload",
            post(handlers::content::upload_manuscripts),
        )
        .route(
            "/orders/{product}/{id}/content",
            post(handlers::content::create_content_item),
        )
        .route(
            "/orders/{product}/{id}/content/{item_id}/resubmit",
            post(handlers::content::resubmit_item),
        )
        // 일별 진행
        .route(
            "/orders/{product}/{id}/daily/{date}",
            put(handlers::daily_record::record_progress),
        )
        // 체험단
        .route(
            "/orders/experience/{id}/bloggers",
            post(handlers::blogger::register_bloggers),
        )
        .route(
            "/orders/experience/{id}/bloggers/{blogger_id}/publish-url",
            patch(handlers::blogger::set_publish_url),
        )
        // 통계
        .route("/stats/overview", get(handlers::stats::overview))
}

/// 组装完整 API 路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(client_routes())
        .merge(order_creation_routes())
        .merge(order_routes())
        .nest("/admin", admin_routes())
}
