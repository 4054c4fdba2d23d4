//! 营销服务订单平台 API 服务
//!
//! 客户下单（积分支付）与管理员履约的 REST API。
//!
//! ## 核心功能
//!
//! - **下单**：六类营销商品的订单创建，扣款与订单插入同事务
//! - **状态流转**：共享转移表驱动的状态变更与取消退款
//! - **内容条目**：Excel 批量上传、审核/修改请求工作流
//! - **日进度**：按日交付记录，首条记录触发订单开工
//! - **体验团**：博主登记到发布完成的有序工作流
//! - **通知**：订单事件的站内通知（客户端轮询读取）
//!
//! ## 模块结构
//!
//! - `auth`: 会话令牌、密码散列、Kakao OAuth
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型定义
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 会话认证中间件
//! - `orders`: 下单/取消/状态流转的共享引擎
//! - `excel`: 원고 일괄 업로드 파서
//! - `scrape`: 地图页商号名提取
//! - `notify`: 通知发射器
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod auth;
pub mod dto;
pub mod error;
pub mod excel;
pub mod handlers;
pub mod middleware;
pub mod notify;
pub mod orders;
pub mod routes;
pub mod scrape;
pub mod state;

pub use dto::{ApiResponse, PageResponse, PaginationParams};
pub use error::{ApiError, Result};
pub use state::AppState;
