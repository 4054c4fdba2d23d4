//! 订单生命周期规则库
//!
//! 将营销商品订单的纯业务规则集中在一个 crate 中。
//! 不做任何 I/O，所有服务共享同一套规则。
//!
//! ## 核心功能
//!
//! - **商品目录**：商品单价与下单数量校验规则
//! - **状态机**：全商品共用的显式状态转移表
//! - **退款政策**：按商品参数化的退款公式，统一到单一政策类型
//! - **体验团工作流**：子类型跳步规则在构造时固定的有序阶段状态
//!
//! ## 技术栈
//!
//! - 序列化：serde
//! - 错误处理：thiserror

pub mod error;
pub mod product;
pub mod refund;
pub mod status;
pub mod workflow;

pub use error::LifecycleError;
pub use product::{COST_TOLERANCE, OrderSpec, PriceTable, ProductType, check_cost};
pub use refund::RefundPolicy;
pub use status::{SubmissionEvent, SubmissionStatus, transition};
pub use workflow::{ExperienceKind, ExperienceWorkflow, WorkflowStage};
