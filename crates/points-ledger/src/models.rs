//! 账本实体模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 流水类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// 充值（管理员操作）
    Charge,
    /// 扣款（下单）
    Deduct,
    /// 退款（取消订单）
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Charge => "charge",
            Self::Deduct => "deduct",
            Self::Refund => "refund",
        }
    }
}

/// 积分流水（仅追加，不修改不删除）
///
/// `balance_after` 是变动后余额的快照，与余额更新在同一事务内写入，
/// 流水与余额不会出现不一致。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointTransaction {
    pub id: i64,
    pub client_id: i64,
    /// 关联订单号（充值时为空）
    pub submission_ref: Option<String>,
    pub transaction_type: TransactionType,
    /// 变动金额（恒为正数，方向由 transaction_type 表达）
    pub amount: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_serialization() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Charge).unwrap(),
            "\"charge\""
        );
        assert_eq!(
            serde_json::from_str::<TransactionType>("\"refund\"").unwrap(),
            TransactionType::Refund
        );
    }

    #[test]
    fn test_point_transaction_camel_case() {
        let tx = PointTransaction {
            id: 1,
            client_id: 42,
            submission_ref: Some("AP-20260830-0001".to_string()),
            transaction_type: TransactionType::Deduct,
            amount: 45_000,
            balance_after: 55_000,
            description: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains("\"clientId\":42"));
        assert!(json.contains("\"balanceAfter\":55000"));
        assert!(json.contains("\"transactionType\":\"deduct\""));
    }
}
