//! 体验团（체험단）工作流
//!
//! 进度用单一有序阶段状态表示：每个子类型在构造时固定适用阶段序列，
//! 处理器只能按序推进，不能跳步或回退，不存在非法的标志组合。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// 体验团子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceKind {
    /// 블로그 체험단：完整流程
    BlogExperience,
    /// 샤오홍슈（小红书）：不做日程确认
    Xiaohongshu,
    /// 기자단（记者团）：博主由运营直接指派，跳过选择与日程
    Journalist,
    /// 인플루언서：无客户最终确认环节
    Influencer,
}

impl ExperienceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlogExperience => "blog_experience",
            Self::Xiaohongshu => "xiaohongshu",
            Self::Journalist => "journalist",
            Self::Influencer => "influencer",
        }
    }

    /// 该子类型的适用阶段序列（构造时固定，运行期不再分支判断）
    fn stage_sequence(&self) -> &'static [WorkflowStage] {
        use WorkflowStage as W;
        match self {
            Self::BlogExperience => &[
                W::Registered,
                W::Selected,
                W::Scheduled,
                W::Confirmed,
                W::Published,
                W::Completed,
            ],
            Self::Xiaohongshu => &[
                W::Registered,
                W::Selected,
                W::Confirmed,
                W::Published,
                W::Completed,
            ],
            Self::Journalist => &[W::Registered, W::Confirmed, W::Published, W::Completed],
            Self::Influencer => &[
                W::Registered,
                W::Selected,
                W::Scheduled,
                W::Published,
                W::Completed,
            ],
        }
    }
}

impl fmt::Display for ExperienceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceKind {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blog_experience" => Ok(Self::BlogExperience),
            "xiaohongshu" => Ok(Self::Xiaohongshu),
            "journalist" => Ok(Self::Journalist),
            "influencer" => Ok(Self::Influencer),
            other => Err(LifecycleError::UnknownProduct(other.to_string())),
        }
    }
}

/// 工作流阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// 博主已登记
    Registered,
    /// 客户已选定博主
    Selected,
    /// 日程已确认
    Scheduled,
    /// 客户最终确认
    Confirmed,
    /// 全部已发布
    Published,
    /// 活动完成
    Completed,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Selected => "selected",
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Published => "published",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "selected" => Ok(Self::Selected),
            "scheduled" => Ok(Self::Scheduled),
            "confirmed" => Ok(Self::Confirmed),
            "published" => Ok(Self::Published),
            "completed" => Ok(Self::Completed),
            other => Err(LifecycleError::UnknownStage(other.to_string())),
        }
    }
}

/// 体验团工作流状态
///
/// 持久化时只存 `(kind, current_stage)` 两个字段，
/// 序列本身由子类型推导，数据库中不存在非法组合。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceWorkflow {
    kind: ExperienceKind,
    /// 当前阶段在序列中的下标
    position: usize,
}

impl ExperienceWorkflow {
    /// 新建工作流，起点为 Registered
    pub fn new(kind: ExperienceKind) -> Self {
        Self { kind, position: 0 }
    }

    /// 从持久化的阶段恢复工作流
    ///
    /// 阶段不在该子类型的序列中（如 journalist 的 selected）视为数据损坏。
    pub fn from_stage(kind: ExperienceKind, stage: WorkflowStage) -> Result<Self, LifecycleError> {
        let position = kind
            .stage_sequence()
            .iter()
            .position(|s| *s == stage)
            .ok_or(LifecycleError::InvalidWorkflowStage {
                current: WorkflowStage::Registered,
                requested: stage,
            })?;
        Ok(Self { kind, position })
    }

    pub fn kind(&self) -> ExperienceKind {
        self.kind
    }

    pub fn current_stage(&self) -> WorkflowStage {
        self.kind.stage_sequence()[self.position]
    }

    /// 该子类型的完整阶段序列
    pub fn stages(&self) -> &'static [WorkflowStage] {
        self.kind.stage_sequence()
    }

    /// 下一个适用阶段（已完成时返回 None）
    pub fn next_stage(&self) -> Option<WorkflowStage> {
        self.kind.stage_sequence().get(self.position + 1).copied()
    }

    /// 推进到下一阶段，返回新阶段
    pub fn advance(&mut self) -> Result<WorkflowStage, LifecycleError> {
        if self.next_stage().is_none() {
            return Err(LifecycleError::WorkflowComplete);
        }
        self.position += 1;
        Ok(self.current_stage())
    }

    /// 请求推进到指定阶段
    ///
    /// 只接受「恰好是下一个适用阶段」的请求，跳步和重复提交都拒绝，
    /// 处理器不需要各自判断哪些阶段对当前子类型适用。
    pub fn advance_to(&mut self, requested: WorkflowStage) -> Result<WorkflowStage, LifecycleError> {
        match self.next_stage() {
            Some(next) if next == requested => self.advance(),
            _ => Err(LifecycleError::InvalidWorkflowStage {
                current: self.current_stage(),
                requested,
            }),
        }
    }

    /// 活动是否完成（派生值，不单独存储）
    pub fn is_complete(&self) -> bool {
        self.current_stage() == WorkflowStage::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 各子类型的阶段序列逐一锁定：序列即业务契约。
    #[test]
    fn test_stage_sequences_per_kind() {
        use WorkflowStage as W;

        let cases: Vec<(ExperienceKind, Vec<W>)> = vec![
            (
                ExperienceKind::BlogExperience,
                vec![W::Registered, W::Selected, W::Scheduled, W::Confirmed, W::Published, W::Completed],
            ),
            (
                ExperienceKind::Xiaohongshu,
                vec![W::Registered, W::Selected, W::Confirmed, W::Published, W::Completed],
            ),
            (
                ExperienceKind::Journalist,
                vec![W::Registered, W::Confirmed, W::Published, W::Completed],
            ),
            (
                ExperienceKind::Influencer,
                vec![W::Registered, W::Selected, W::Scheduled, W::Published, W::Completed],
            ),
        ];

        for (kind, expected) in cases {
            let mut flow = ExperienceWorkflow::new(kind);
            let mut visited = vec![flow.current_stage()];
            while !flow.is_complete() {
                visited.push(flow.advance().unwrap());
            }
            assert_eq!(visited, expected, "kind={kind}");
        }
    }

    #[test]
    fn test_advance_to_rejects_skipping() {
        let mut flow = ExperienceWorkflow::new(ExperienceKind::BlogExperience);
        // Registered 状态下直接请求 Published 应拒绝
        let err = flow.advance_to(WorkflowStage::Published).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidWorkflowStage {
                current: WorkflowStage::Registered,
                requested: WorkflowStage::Published,
            }
        );
        // 状态未被污染
        assert_eq!(flow.current_stage(), WorkflowStage::Registered);
    }

    #[test]
    fn test_advance_to_rejects_repeat() {
        let mut flow = ExperienceWorkflow::new(ExperienceKind::Xiaohongshu);
        flow.advance_to(WorkflowStage::Selected).unwrap();
        // 重复提交同一阶段应拒绝
        assert!(flow.advance_to(WorkflowStage::Selected).is_err());
    }

    #[test]
    fn test_skipped_stage_unreachable() {
        let mut flow = ExperienceWorkflow::new(ExperienceKind::Journalist);
        // journalist 序列中不存在 Selected
        assert!(flow.advance_to(WorkflowStage::Selected).is_err());
        // 正确的下一步是 Confirmed
        assert_eq!(flow.advance_to(WorkflowStage::Confirmed).unwrap(), WorkflowStage::Confirmed);
    }

    #[test]
    fn test_completed_flow_cannot_advance() {
        let mut flow = ExperienceWorkflow::new(ExperienceKind::Journalist);
        while !flow.is_complete() {
            flow.advance().unwrap();
        }
        assert_eq!(flow.advance(), Err(LifecycleError::WorkflowComplete));
    }

    #[test]
    fn test_from_stage_rejects_inapplicable_stage() {
        // journalist 子类型不可能处于 scheduled 阶段
        assert!(
            ExperienceWorkflow::from_stage(ExperienceKind::Journalist, WorkflowStage::Scheduled)
                .is_err()
        );
        // 合法恢复
        let flow =
            ExperienceWorkflow::from_stage(ExperienceKind::Influencer, WorkflowStage::Scheduled)
                .unwrap();
        assert_eq!(flow.current_stage(), WorkflowStage::Scheduled);
        assert_eq!(flow.next_stage(), Some(WorkflowStage::Published));
    }

    #[test]
    fn test_is_complete_only_at_final_stage() {
        let mut flow = ExperienceWorkflow::new(ExperienceKind::Influencer);
        assert!(!flow.is_complete());
        flow.advance_to(WorkflowStage::Selected).unwrap();
        flow.advance_to(WorkflowStage::Scheduled).unwrap();
        flow.advance_to(WorkflowStage::Published).unwrap();
        assert!(!flow.is_complete());
        flow.advance_to(WorkflowStage::Completed).unwrap();
        assert!(flow.is_complete());
    }
}
