//! 订单引擎
//!
//! 六种商品共用的下单/查询/状态流转实现。每种商品一张订单表，
//! 公共列结构一致，商品特有字段收敛在 details JSONB 列中，
//! 因此这里的 SQL 可以按表名参数化复用。
//!
//! 下单与扣款在同一事务内完成：订单插入失败时扣款随事务回滚；
//! 取消与退款同理。不存在任何手工回补代码。

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};

use points_ledger::LedgerService;
use submission_lifecycle::{
    ExperienceKind, OrderSpec, ProductType, RefundPolicy, SubmissionEvent, SubmissionStatus,
    check_cost, transition,
};

use crate::dto::{OrderCreatedDto, SubmissionDto};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 六表共用的订单公共列
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubmissionCore {
    pub id: i64,
    pub submission_number: String,
    pub client_id: i64,
    pub status: String,
    pub total_points: i64,
    pub total_units: i64,
    pub delivered_units: i64,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionCore {
    /// 解析持久化的状态字符串
    ///
    /// 状态列有 CHECK 约束，解析失败意味着数据损坏，按内部错误处理。
    pub fn parsed_status(&self) -> Result<SubmissionStatus> {
        self.status
            .parse::<SubmissionStatus>()
            .map_err(|_| ApiError::Internal(format!("订单 {} 状态列非法: {}", self.id, self.status)))
    }

    pub fn remaining_units(&self) -> i64 {
        self.total_units - self.delivered_units
    }

    pub fn into_dto(self, product: ProductType) -> SubmissionDto {
        SubmissionDto {
            id: self.id,
            submission_number: self.submission_number,
            product: product.as_str().to_string(),
            client_id: self.client_id,
            status: self.status,
            total_points: self.total_points,
            total_units: self.total_units,
            delivered_units: self.delivered_units,
            details: self.details,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const CORE_COLUMNS: &str = "id, submission_number, client_id, status, total_points, \
                            total_units, delivered_units, details, created_at, updated_at";

/// 生成当日递增的订单号，形如 AP-20260830-0001
///
/// 计数器走 upsert 行锁，同一天内并发下单不会拿到重复序号。
pub async fn next_submission_number(tx: &mut Transaction<'_, Postgres>) -> Result<String> {
    let today = Utc::now().format("%Y%m%d").to_string();

    let (seq,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO submission_counters (counter_date, last_seq)
        VALUES ($1, 1)
        ON CONFLICT (counter_date)
        DO UPDATE SET last_seq = submission_counters.last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(&today)
    .fetch_one(&mut **tx)
    .await?;

    Ok(format!("AP-{}-{:04}", today, seq))
}

/// 下单
///
/// 数量校验 → 金额容差复核 → 事务内（取订单号 → 扣款 → 插入订单）→
/// 提交。任何一步失败整体回滚，客户余额不变。
#[instrument(skip(state, details), fields(product = %spec.product()))]
pub async fn create_submission(
    state: &AppState,
    client_id: i64,
    spec: &OrderSpec,
    submitted_total: i64,
    details: serde_json::Value,
    experience_kind: Option<ExperienceKind>,
) -> Result<OrderCreatedDto> {
    let product = spec.product();
    let cost = check_cost(spec, &state.prices, submitted_total)?;
    let total_units = spec.total_units();

    let mut tx = state.pool.begin().await?;

    let number = next_submission_number(&mut tx).await?;
    let deduction = LedgerService::deduct_in_tx(
        &mut tx,
        client_id,
        cost,
        Some(&number),
        Some(&format!("{} 주문 결제", product)),
    )
    .await?;

    let submission_id: i64 = match experience_kind {
        None => {
            let sql = format!(
                r#"
                INSERT INTO {} (submission_number, client_id, status, total_points,
                                total_units, delivered_units, details)
                VALUES ($1, $2, 'pending', $3, $4, 0, $5)
                RETURNING id
                "#,
                product.submission_table()
            );
            let (id,): (i64,) = sqlx::query_as(&sql)
                .bind(&number)
                .bind(client_id)
                .bind(cost)
                .bind(total_units)
                .bind(&details)
                .fetch_one(&mut *tx)
                .await?;
            id
        }
        // 체험단은 워크플로 컬럼이 추가로 필요하다
        Some(kind) => {
            let (id,): (i64,) = sqlx::query_as(
                r#"
                INSERT INTO experience_submissions
                    (submission_number, client_id, status, total_points, total_units,
                     delivered_units, details, experience_kind, workflow_stage)
                VALUES ($1, $2, 'pending', $3, $4, 0, $5, $6, 'registered')
                RETURNING id
                "#,
            )
            .bind(&number)
            .bind(client_id)
            .bind(cost)
            .bind(total_units)
            .bind(&details)
            .bind(kind.as_str())
            .fetch_one(&mut *tx)
            .await?;
            id
        }
    };

    tx.commit().await?;

    info!(client_id, submission_id, number = %number, cost, "주문 생성 완료");

    Ok(OrderCreatedDto {
        submission_id,
        submission_number: number,
        product: product.as_str().to_string(),
        charged_points: cost,
        balance_after: deduction.balance_after,
    })
}

/// 单条订单查询
pub async fn fetch_core(pool: &PgPool, product: ProductType, id: i64) -> Result<SubmissionCore> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = $1",
        CORE_COLUMNS,
        product.submission_table()
    );

    sqlx::query_as::<_, SubmissionCore>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::SubmissionNotFound(id))
}

/// 订单列表（可按客户、状态过滤，新订单在前）
pub async fn list_cores(
    pool: &PgPool,
    product: ProductType,
    client_id: Option<i64>,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<SubmissionCore>, i64)> {
    let table = product.submission_table();

    let count_sql = format!(
        r#"
        SELECT COUNT(*) FROM {table}
        WHERE ($1::bigint IS NULL OR client_id = $1)
          AND ($2::text IS NULL OR status = $2)
        "#
    );
    let (total,): (i64,) = sqlx::query_as(&count_sql)
        .bind(client_id)
        .bind(status)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        r#"
        SELECT {CORE_COLUMNS} FROM {table}
        WHERE ($1::bigint IS NULL OR client_id = $1)
          AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC, id DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let rows = sqlx::query_as::<_, SubmissionCore>(&list_sql)
        .bind(client_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// 状态流转
///
/// 事务内行锁读订单 → 查转移表 → cancel 时按退款政策在同事务退款 →
/// 更新状态 → 提交。退款与状态翻转要么同时生效要么同时作废。
#[instrument(skip(state))]
pub async fn apply_event(
    state: &AppState,
    product: ProductType,
    id: i64,
    event: SubmissionEvent,
) -> Result<(SubmissionCore, i64)> {
    let table = product.submission_table();
    let mut tx = state.pool.begin().await?;

    let lock_sql = format!("SELECT {CORE_COLUMNS} FROM {table} WHERE id = $1 FOR UPDATE");
    let core = sqlx::query_as::<_, SubmissionCore>(&lock_sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::SubmissionNotFound(id))?;

    let current = core.parsed_status()?;
    let next = transition(current, event)?;

    let mut refunded = 0i64;
    if event == SubmissionEvent::Cancel {
        let amount = RefundPolicy::for_product(product).refund_amount(
            current,
            core.total_points,
            core.remaining_units(),
            core.total_units,
        );
        if let Some(record) = LedgerService::refund_in_tx(
            &mut tx,
            core.client_id,
            amount,
            Some(&core.submission_number),
            Some(&format!("{} 주문 취소 환불", product)),
        )
        .await?
        {
            refunded = record.amount;
        }
    }

    let update_sql = format!(
        "UPDATE {table} SET status = $2, updated_at = NOW() WHERE id = $1 \
         RETURNING {CORE_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, SubmissionCore>(&update_sql)
        .bind(id)
        .bind(next.as_str())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        submission_id = id,
        from = current.as_str(),
        to = next.as_str(),
        refunded,
        "주문 상태 변경"
    );

    Ok((updated, refunded))
}

/// 日进度上报
///
/// 同日重复上报按 upsert 覆盖。首条记录把 pending 订单翻到
/// in_progress，翻转与记录写入在同一事务内。
#[instrument(skip(state))]
pub async fn record_daily_progress(
    state: &AppState,
    product: ProductType,
    id: i64,
    record_date: chrono::NaiveDate,
    completed_count: i32,
) -> Result<SubmissionCore> {
    if !product.tracks_daily_records() {
        return Err(ApiError::Validation(format!(
            "{} 상품은 일별 진행 기록을 지원하지 않습니다",
            product
        )));
    }

    let table = product.submission_table();
    let mut tx = state.pool.begin().await?;

    let lock_sql = format!("SELECT {CORE_COLUMNS} FROM {table} WHERE id = $1 FOR UPDATE");
    let core = sqlx::query_as::<_, SubmissionCore>(&lock_sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::SubmissionNotFound(id))?;

    let current = core.parsed_status()?;
    // 完结订单不再接受进度上报
    if matches!(current, SubmissionStatus::Completed | SubmissionStatus::Cancelled) {
        return Err(ApiError::InvalidTransition {
            from: current.to_string(),
            event: "record_progress".to_string(),
        });
    }

    // 同日覆盖：completed_count 取最新值
    sqlx::query(
        r#"
        INSERT INTO submission_daily_records (product, submission_id, record_date, completed_count)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (product, submission_id, record_date)
        DO UPDATE SET completed_count = EXCLUDED.completed_count
        "#,
    )
    .bind(product.as_str())
    .bind(id)
    .bind(record_date)
    .bind(completed_count)
    .execute(&mut *tx)
    .await?;

    // delivered_units 从日记录汇总重算，避免覆盖写导致的累计漂移
    let (delivered,): (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(completed_count), 0)::bigint
        FROM submission_daily_records
        WHERE product = $1 AND submission_id = $2
        "#,
    )
    .bind(product.as_str())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    // 首条进度把 pending 翻到 in_progress
    let next_status = if current == SubmissionStatus::Pending {
        transition(current, SubmissionEvent::Start)?
    } else {
        current
    };

    let update_sql = format!(
        "UPDATE {table} SET delivered_units = $2, status = $3, updated_at = NOW() \
         WHERE id = $1 RETURNING {CORE_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, SubmissionCore>(&update_sql)
        .bind(id)
        .bind(delivered)
        .bind(next_status.as_str())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(submission_id = id, %record_date, completed_count, delivered, "일별 진행 기록");
    Ok(updated)
}

/// 下单请求公共参数打包（处理器侧复用）
pub fn details_with_business_name(business_name: &str, extra: serde_json::Value) -> serde_json::Value {
    let mut details = json!({ "businessName": business_name });
    if let (Some(base), Some(more)) = (details.as_object_mut(), extra.as_object()) {
        for (k, v) in more {
            base.insert(k.clone(), v.clone());
        }
    }
    details
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_merge() {
        let details = details_with_business_name(
            "카페 봄날",
            json!({ "keywords": ["강남 카페"], "dailyCount": 2 }),
        );
        assert_eq!(details["businessName"], "카페 봄날");
        assert_eq!(details["dailyCount"], 2);
        assert_eq!(details["keywords"][0], "강남 카페");
    }

    #[test]
    fn test_remaining_units() {
        let core = SubmissionCore {
            id: 1,
            submission_number: "AP-20260830-0001".into(),
            client_id: 1,
            status: "in_progress".into(),
            total_points: 600_000,
            total_units: 20,
            delivered_units: 5,
            details: json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(core.remaining_units(), 15);
        assert_eq!(core.parsed_status().unwrap(), SubmissionStatus::InProgress);
    }

    #[test]
    fn test_bad_status_column_is_internal_error() {
        let core = SubmissionCore {
            id: 1,
            submission_number: "AP-20260830-0001".into(),
            client_id: 1,
            status: "teleported".into(),
            total_points: 0,
            total_units: 0,
            delivered_units: 0,
            details: json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(core.parsed_status(), Err(ApiError::Internal(_))));
    }
}
