//! 中间件模块

pub mod auth;

pub use auth::{require_admin, session_middleware};
