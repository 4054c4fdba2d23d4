//! 积分账本服务
//!
//! 平台内部货币（积分）的唯一出入口。余额变动与流水写入在同一个
//! 数据库事务内完成，客户行上加 `SELECT ... FOR UPDATE` 行锁，
//! 并发扣款串行化，余额不可能为负。
//!
//! ## 核心功能
//!
//! - **charge**：管理员充值
//! - **deduct**：下单扣款（余额校验在行锁内进行）
//! - **refund**：取消退款（金额为 0 时不写流水）
//! - **in_tx 变体**：在调用方事务内执行，订单插入与扣款同提交同回滚
//! - **balance / history**：余额与流水查询

pub mod error;
pub mod models;
pub mod service;

pub use error::{LedgerError, Result};
pub use models::{PointTransaction, TransactionType};
pub use service::{LedgerService, MAX_TRANSACTION_AMOUNT};
