//! 取消退款政策
//!
//! 各商品的退款公式统一为按商品参数化的单一政策类型。
//! 全部使用整数运算，比例公式向下取整。

use serde::{Deserialize, Serialize};

use crate::product::ProductType;
use crate::status::SubmissionStatus;

/// 退款公式种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RefundKind {
    /// pending 全额，in_progress 半额，其余为 0（영수증 리뷰 규칙）
    FullThenHalf,
    /// 任何状态都不退款（리워드형 상품）
    NoRefund,
    /// pending/in_progress 按剩余量比例退款
    Proportional,
}

/// 商品退款政策
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicy {
    kind: RefundKind,
}

impl RefundPolicy {
    /// 按商品类型取政策
    ///
    /// - receipt: 전액/반액 규칙
    /// - place: 리워드형, 환불 없음
    /// - 其余: 剩余量比例
    pub fn for_product(product: ProductType) -> Self {
        let kind = match product {
            ProductType::Receipt => RefundKind::FullThenHalf,
            ProductType::Place => RefundKind::NoRefund,
            ProductType::Kakaomap
            | ProductType::Blog
            | ProductType::Cafe
            | ProductType::Experience => RefundKind::Proportional,
        };
        Self { kind }
    }

    /// 取消时的退款金额
    ///
    /// `remaining_units` 超出 `[0, total_units]` 时按边界截断，
    /// 进度数据异常不会导致超额退款。
    pub fn refund_amount(
        &self,
        status: SubmissionStatus,
        total_points: i64,
        remaining_units: i64,
        total_units: i64,
    ) -> i64 {
        match self.kind {
            RefundKind::NoRefund => 0,
            RefundKind::FullThenHalf => match status {
                SubmissionStatus::Pending => total_points,
                SubmissionStatus::InProgress => total_points / 2,
                _ => 0,
            },
            RefundKind::Proportional => match status {
                SubmissionStatus::Pending => total_points,
                SubmissionStatus::InProgress => {
                    if total_units <= 0 {
                        return 0;
                    }
                    let remaining = remaining_units.clamp(0, total_units);
                    total_points * remaining / total_units
                }
                _ => 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_pending_refunds_exactly_full_amount() {
        let policy = RefundPolicy::for_product(ProductType::Receipt);
        // 规则要求精确等值，不是近似
        assert_eq!(
            policy.refund_amount(SubmissionStatus::Pending, 45_000, 3, 3),
            45_000
        );
    }

    #[test]
    fn test_receipt_in_progress_refunds_half() {
        let policy = RefundPolicy::for_product(ProductType::Receipt);
        assert_eq!(
            policy.refund_amount(SubmissionStatus::InProgress, 45_000, 2, 3),
            22_500
        );
        // 奇数金额向下取整
        assert_eq!(
            policy.refund_amount(SubmissionStatus::InProgress, 15_001, 1, 1),
            7_500
        );
    }

    #[test]
    fn test_place_never_refunds() {
        let policy = RefundPolicy::for_product(ProductType::Place);
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::InProgress,
            SubmissionStatus::Completed,
            SubmissionStatus::Cancelled,
        ] {
            assert_eq!(policy.refund_amount(status, 100_000, 500, 500), 0);
        }
    }

    #[test]
    fn test_proportional_refund() {
        let policy = RefundPolicy::for_product(ProductType::Blog);

        // pending 即全额
        assert_eq!(
            policy.refund_amount(SubmissionStatus::Pending, 600_000, 20, 20),
            600_000
        );
        // 已交付 5/20，退 15/20
        assert_eq!(
            policy.refund_amount(SubmissionStatus::InProgress, 600_000, 15, 20),
            450_000
        );
        // 整数除法向下取整
        assert_eq!(
            policy.refund_amount(SubmissionStatus::InProgress, 100, 1, 3),
            33
        );
        // 已完成不退
        assert_eq!(
            policy.refund_amount(SubmissionStatus::Completed, 600_000, 0, 20),
            0
        );
    }

    #[test]
    fn test_proportional_clamps_bad_progress_data() {
        let policy = RefundPolicy::for_product(ProductType::Cafe);
        // remaining > total 时按 total 截断，不会超额退款
        assert_eq!(
            policy.refund_amount(SubmissionStatus::InProgress, 200_000, 99, 10),
            200_000
        );
        // 负的 remaining 按 0 处理
        assert_eq!(
            policy.refund_amount(SubmissionStatus::InProgress, 200_000, -5, 10),
            0
        );
        // total_units 为 0 时不退款也不 panic
        assert_eq!(
            policy.refund_amount(SubmissionStatus::InProgress, 200_000, 0, 0),
            0
        );
    }
}
