//! 订单状态机
//!
//! 所有商品共用一张显式状态转移表：`(当前状态, 事件) -> 目标状态`。
//! 转移合法性只在这里判断，路由处理器不做重复校验。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// 订单状态
///
/// 数据库中以小写字符串持久化（CHECK 约束保证枚举完备）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// 是否为终态（终态不接受任何事件）
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(LifecycleError::UnknownStatus(other.to_string())),
        }
    }
}

/// 状态转移事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionEvent {
    /// 开始执行（首条日记录写入时触发）
    Start,
    /// 全部交付完成
    Complete,
    /// 取消（客户或管理员发起，可能触发退款）
    Cancel,
}

impl SubmissionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for SubmissionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionEvent {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "complete" => Ok(Self::Complete),
            "cancel" => Ok(Self::Cancel),
            other => Err(LifecycleError::UnknownStatus(other.to_string())),
        }
    }
}

/// 状态转移表
///
/// 合法转移：
/// - pending --start--> in_progress
/// - pending --cancel--> cancelled
/// - in_progress --complete--> completed
/// - in_progress --cancel--> cancelled
///
/// 其余一律拒绝，终态不可离开。
pub fn transition(
    from: SubmissionStatus,
    event: SubmissionEvent,
) -> Result<SubmissionStatus, LifecycleError> {
    use SubmissionEvent as E;
    use SubmissionStatus as S;

    match (from, event) {
        (S::Pending, E::Start) => Ok(S::InProgress),
        (S::Pending, E::Cancel) => Ok(S::Cancelled),
        (S::InProgress, E::Complete) => Ok(S::Completed),
        (S::InProgress, E::Cancel) => Ok(S::Cancelled),
        (from, event) => Err(LifecycleError::InvalidTransition { from, event }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 全量转移表：每条合法边与非法边逐一锁定。
    /// 转移表是 API 契约的一部分，任何改动都会影响全部商品类型。
    #[test]
    fn test_transition_table_exhaustive() {
        use SubmissionEvent as E;
        use SubmissionStatus as S;

        let legal = [
            (S::Pending, E::Start, S::InProgress),
            (S::Pending, E::Cancel, S::Cancelled),
            (S::InProgress, E::Complete, S::Completed),
            (S::InProgress, E::Cancel, S::Cancelled),
        ];
        for (from, event, to) in legal {
            assert_eq!(transition(from, event), Ok(to), "{from} --{event}--> {to}");
        }

        let illegal = [
            (S::Pending, E::Complete),
            (S::InProgress, E::Start),
            (S::Completed, E::Start),
            (S::Completed, E::Complete),
            (S::Completed, E::Cancel),
            (S::Cancelled, E::Start),
            (S::Cancelled, E::Complete),
            (S::Cancelled, E::Cancel),
        ];
        for (from, event) in illegal {
            assert_eq!(
                transition(from, event),
                Err(LifecycleError::InvalidTransition { from, event }),
                "{from} --{event}-- 应被拒绝"
            );
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SubmissionStatus::Pending.is_terminal());
        assert!(!SubmissionStatus::InProgress.is_terminal());
        assert!(SubmissionStatus::Completed.is_terminal());
        assert!(SubmissionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::InProgress,
            SubmissionStatus::Completed,
            SubmissionStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<SubmissionStatus>(), Ok(status));
        }
        assert!("approved".parse::<SubmissionStatus>().is_err());
    }
}
