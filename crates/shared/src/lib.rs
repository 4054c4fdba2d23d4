//! 共享库
//!
//! 包含各 crate 共用的配置加载、错误处理、数据库连接池和日志初始化。

pub mod config;
pub mod database;
pub mod error;
pub mod observability;

pub use config::{AppConfig, DatabaseConfig, ObservabilityConfig, ServerConfig, SessionConfig};
pub use database::Database;
pub use error::{PlatformError, Result};
