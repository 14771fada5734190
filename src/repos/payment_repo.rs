/*
 * Responsibility
 * - payments の記録と一覧 (金額の計算はしない)
 * - investor_id は users(id) への FK
 */
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::RepoResult;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub investor_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub paid_on: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment<'a> {
    pub investor_id: Uuid,
    pub amount_cents: i64,
    pub currency: &'a str,
    pub paid_on: NaiveDate,
    pub note: Option<&'a str>,
}

pub async fn list_all(pool: &PgPool, limit: i64, offset: i64) -> RepoResult<Vec<PaymentRow>> {
    let rows = sqlx::query_as::<_, PaymentRow>(
        r#"
        SELECT id, investor_id, amount_cents, currency, paid_on, note, created_at
        FROM payments
        ORDER BY paid_on DESC, created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn list_for_investor(pool: &PgPool, investor_id: Uuid) -> RepoResult<Vec<PaymentRow>> {
    let rows = sqlx::query_as::<_, PaymentRow>(
        r#"
        SELECT id, investor_id, amount_cents, currency, paid_on, note, created_at
        FROM payments
        WHERE investor_id = $1
        ORDER BY paid_on DESC, created_at DESC
        "#,
    )
    .bind(investor_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert the payment and the investor's notification in one transaction.
pub async fn record_with_notification(
    pool: &PgPool,
    payment: NewPayment<'_>,
    title: &str,
    body: &str,
) -> RepoResult<PaymentRow> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, PaymentRow>(
        r#"
        INSERT INTO payments (investor_id, amount_cents, currency, paid_on, note)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, investor_id, amount_cents, currency, paid_on, note, created_at
        "#,
    )
    .bind(payment.investor_id)
    .bind(payment.amount_cents)
    .bind(payment.currency)
    .bind(payment.paid_on)
    .bind(payment.note)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, title, body)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(payment.investor_id)
    .bind(title)
    .bind(body)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row)
}
