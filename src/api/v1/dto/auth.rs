/*
 * Responsibility
 * - auth 系 (signup / login / forgot / reset / session) の request/response DTO
 * - validate() は形式チェックのみ
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::account::Identity;
use crate::services::auth::{Role, SessionPayload};

pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for this email, a password reset link has been sent.";

const MAX_EMAIL_LEN: usize = 254;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_NAME_LEN: usize = 120;

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("email is required");
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err("email is too long");
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err("email is invalid");
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err("email is invalid");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_email(&normalize_email(&self.email))?;
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err("password is too long");
        }
        if let Some(name) = &self.full_name
            && (name.trim().is_empty() || name.len() > MAX_NAME_LEN)
        {
            return Err("full_name must be 1..=120 chars");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err("email and password are required");
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err("password is too long");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.token.trim().is_empty() {
            return Err("token is required");
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err("password is too long");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Identity> for IdentityResponse {
    fn from(i: Identity) -> Self {
        Self {
            user_id: i.user_id,
            email: i.email,
            role: i.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl From<SessionPayload> for SessionResponse {
    fn from(s: SessionPayload) -> Self {
        Self {
            user_id: s.subject_id,
            email: s.email,
            role: s.role,
            expires_at: s.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@b.example").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a b@example.com").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn signup_rejects_unknown_fields() {
        let res = serde_json::from_str::<SignupRequest>(
            r#"{"email":"a@b.c","password":"longenough","role":"admin"}"#,
        );
        assert!(res.is_err());
    }
}
