//! 账本服务实现
//!
//! 所有余额变动走同一条路径：行锁 → 校验 → 更新余额 → 写流水 → 提交。
//! 不存在「先改余额、失败再手工回补」的补偿代码。

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument, warn};

use crate::error::{LedgerError, Result};
use crate::models::{PointTransaction, TransactionType};

/// 单笔流水金额上限
///
/// 防止异常请求制造天文数字余额。
pub const MAX_TRANSACTION_AMOUNT: i64 = 1_000_000_000_000;

/// 金额前置校验（纯函数，便于单测）
fn validate_amount(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    if amount > MAX_TRANSACTION_AMOUNT {
        return Err(LedgerError::AmountExceedsCap(amount));
    }
    Ok(())
}

/// 积分账本服务
#[derive(Clone)]
pub struct LedgerService {
    pool: PgPool,
}

impl LedgerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 充值
    #[instrument(skip(self, description))]
    pub async fn charge(
        &self,
        client_id: i64,
        amount: i64,
        description: Option<&str>,
    ) -> Result<PointTransaction> {
        validate_amount(amount)?;

        let mut tx = self.pool.begin().await?;
        let record = apply(&mut tx, client_id, amount, TransactionType::Charge, None, description)
            .await?;
        tx.commit().await?;

        info!(client_id, amount, balance_after = record.balance_after, "积分充值完成");
        Ok(record)
    }

    /// 扣款
    ///
    /// 余额校验在行锁内进行：并发扣款串行化，
    /// 余额恰好够一笔时至多一笔成功。
    #[instrument(skip(self, description))]
    pub async fn deduct(
        &self,
        client_id: i64,
        amount: i64,
        submission_ref: Option<&str>,
        description: Option<&str>,
    ) -> Result<PointTransaction> {
        validate_amount(amount)?;

        let mut tx = self.pool.begin().await?;
        let record = apply(
            &mut tx,
            client_id,
            -amount,
            TransactionType::Deduct,
            submission_ref,
            description,
        )
        .await?;
        tx.commit().await?;

        info!(client_id, amount, balance_after = record.balance_after, "积分扣款完成");
        Ok(record)
    }

    /// 退款
    ///
    /// 退款额为 0（如리워드형 상품取消）时不产生任何变动，返回 None。
    #[instrument(skip(self, description))]
    pub async fn refund(
        &self,
        client_id: i64,
        amount: i64,
        submission_ref: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<PointTransaction>> {
        if amount == 0 {
            return Ok(None);
        }
        validate_amount(amount)?;

        let mut tx = self.pool.begin().await?;
        let record = apply(
            &mut tx,
            client_id,
            amount,
            TransactionType::Refund,
            submission_ref,
            description,
        )
        .await?;
        tx.commit().await?;

        info!(client_id, amount, balance_after = record.balance_after, "积分退款完成");
        Ok(Some(record))
    }

    /// 在调用方事务内扣款
    ///
    /// 下单处理器用它把扣款与订单插入放进同一个事务：
    /// 订单插入失败时事务回滚，扣款自动作废。
    pub async fn deduct_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        client_id: i64,
        amount: i64,
        submission_ref: Option<&str>,
        description: Option<&str>,
    ) -> Result<PointTransaction> {
        validate_amount(amount)?;
        apply(tx, client_id, -amount, TransactionType::Deduct, submission_ref, description).await
    }

    /// 在调用方事务内退款（与状态翻转同事务）
    pub async fn refund_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        client_id: i64,
        amount: i64,
        submission_ref: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<PointTransaction>> {
        if amount == 0 {
            return Ok(None);
        }
        validate_amount(amount)?;
        apply(tx, client_id, amount, TransactionType::Refund, submission_ref, description)
            .await
            .map(Some)
    }

    /// 当前余额
    pub async fn balance(&self, client_id: i64) -> Result<i64> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT points FROM clients WHERE id = $1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(points,)| points)
            .ok_or(LedgerError::ClientNotFound(client_id))
    }

    /// 流水查询（分页，新记录在前）
    pub async fn history(
        &self,
        client_id: i64,
        transaction_type: Option<TransactionType>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PointTransaction>, i64)> {
        let type_str = transaction_type.map(|t| t.as_str());

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM point_transactions
            WHERE client_id = $1
              AND ($2::transaction_type IS NULL OR transaction_type = $2::transaction_type)
            "#,
        )
        .bind(client_id)
        .bind(type_str)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, PointTransaction>(
            r#"
            SELECT id, client_id, submission_ref, transaction_type, amount,
                   balance_after, description, created_at
            FROM point_transactions
            WHERE client_id = $1
              AND ($2::transaction_type IS NULL OR transaction_type = $2::transaction_type)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(client_id)
        .bind(type_str)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total.0))
    }
}

/// 在给定事务内执行一次余额变动
///
/// 流程：行锁读余额 → 扣款校验 → 更新余额 → 写流水（带 balance_after 快照）。
/// `signed_delta` 为正表示入账，为负表示出账。
async fn apply(
    tx: &mut Transaction<'_, Postgres>,
    client_id: i64,
    signed_delta: i64,
    transaction_type: TransactionType,
    submission_ref: Option<&str>,
    description: Option<&str>,
) -> Result<PointTransaction> {
    // 行锁：同一客户的并发变动在此串行化
    let row: Option<(i64,)> = sqlx::query_as("SELECT points FROM clients WHERE id = $1 FOR UPDATE")
        .bind(client_id)
        .fetch_optional(&mut **tx)
        .await?;

    let balance = row.ok_or(LedgerError::ClientNotFound(client_id))?.0;
    let new_balance = balance + signed_delta;

    if new_balance < 0 {
        warn!(client_id, required = -signed_delta, actual = balance, "扣款余额不足");
        return Err(LedgerError::InsufficientBalance {
            required: -signed_delta,
            actual: balance,
        });
    }

    sqlx::query("UPDATE clients SET points = $2, updated_at = NOW() WHERE id = $1")
        .bind(client_id)
        .bind(new_balance)
        .execute(&mut **tx)
        .await?;

    let record = sqlx::query_as::<_, PointTransaction>(
        r#"
        INSERT INTO point_transactions
            (client_id, submission_ref, transaction_type, amount, balance_after, description)
        VALUES ($1, $2, $3::transaction_type, $4, $5, $6)
        RETURNING id, client_id, submission_ref, transaction_type, amount,
                  balance_after, description, created_at
        "#,
    )
    .bind(client_id)
    .bind(submission_ref)
    .bind(transaction_type.as_str())
    .bind(signed_delta.abs())
    .bind(new_balance)
    .bind(description)
    .fetch_one(&mut **tx)
    .await?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount_boundaries() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(MAX_TRANSACTION_AMOUNT).is_ok());

        assert!(matches!(validate_amount(0), Err(LedgerError::NonPositiveAmount(0))));
        assert!(matches!(validate_amount(-5), Err(LedgerError::NonPositiveAmount(-5))));
        assert!(matches!(
            validate_amount(MAX_TRANSACTION_AMOUNT + 1),
            Err(LedgerError::AmountExceedsCap(_))
        ));
    }
}
