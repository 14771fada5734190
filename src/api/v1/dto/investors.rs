/*
 * Responsibility
 * - investor profile の response DTO と admin 用の更新 DTO
 * - 更新可能なフィールドはここに列挙したものだけ (未知のキーは 422)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::profile_repo::{ProfileChanges, ProfileRow};

#[derive(Debug, Serialize)]
pub struct InvestorResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bikes_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for InvestorResponse {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: row.user_id,
            email: row.email,
            role: row.role,
            full_name: row.full_name,
            phone: row.phone,
            bikes_count: row.bikes_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateInvestorRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bikes_count: Option<i32>,
}

impl UpdateInvestorRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.full_name.is_none() && self.phone.is_none() && self.bikes_count.is_none() {
            return Err("nothing to update");
        }
        if let Some(name) = &self.full_name
            && (name.trim().is_empty() || name.len() > 120)
        {
            return Err("full_name must be 1..=120 chars");
        }
        if let Some(phone) = &self.phone
            && (phone.trim().is_empty() || phone.len() > 32)
        {
            return Err("phone must be 1..=32 chars");
        }
        if let Some(count) = self.bikes_count
            && count < 0
        {
            return Err("bikes_count cannot be negative");
        }
        Ok(())
    }

    pub fn changes(&self) -> ProfileChanges<'_> {
        ProfileChanges {
            full_name: self.full_name.as_deref().map(str::trim),
            phone: self.phone.as_deref().map(str::trim),
            bikes_count: self.bikes_count,
        }
    }
}
