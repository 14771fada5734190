use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::notification_repo::NotificationRow;
use crate::repos::payment_repo::PaymentRow;

pub const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePaymentRequest {
    pub investor_id: Uuid,
    pub amount_cents: i64,
    pub currency: Option<String>,
    pub paid_on: NaiveDate,
    pub note: Option<String>,
}

impl CreatePaymentRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.amount_cents <= 0 {
            return Err("amount_cents must be positive");
        }
        if let Some(c) = &self.currency
            && !(c.len() == 3 && c.chars().all(|ch| ch.is_ascii_uppercase()))
        {
            return Err("currency must be a 3-letter ISO code");
        }
        if let Some(note) = &self.note
            && note.len() > 500
        {
            return Err("note must be <= 500 chars");
        }
        Ok(())
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub investor_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub paid_on: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRow> for PaymentResponse {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            investor_id: row.investor_id,
            amount_cents: row.amount_cents,
            currency: row.currency,
            paid_on: row.paid_on,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for NotificationResponse {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            body: row.body,
            read: row.read_at.is_some(),
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

/// "1234" cents → "12.34".
pub fn format_amount(amount_cents: i64) -> String {
    format!("{}.{:02}", amount_cents / 100, (amount_cents % 100).abs())
}
