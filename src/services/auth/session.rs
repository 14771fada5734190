/*
 * Responsibility
 * - ロール (admin / investor) と、検証済みセッションの型
 * - handler から見える「認証済みコンテキスト」はこの SessionPayload だけ
 */
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Investor,
}

impl Role {
    pub const ADMIN: &'static [Role] = &[Role::Admin];
    pub const INVESTOR: &'static [Role] = &[Role::Investor];
    pub const ANY: &'static [Role] = &[Role::Admin, Role::Investor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Investor => "investor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    // Exact match only: "Admin" or " admin" are not roles.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "investor" => Ok(Role::Investor),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Decoded and shape-checked session claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionPayload {
    pub subject_id: Uuid,
    pub email: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
