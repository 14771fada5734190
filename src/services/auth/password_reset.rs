//! Forgot / reset password.
//!
//! A reset needs both halves to agree: the signed reset-purpose token and the
//! `reset_token` / `reset_token_expires` pair stored on the user row. Only a
//! sha-256 of the reset id is stored.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::user_repo::{BoxFuture, UserStore};
use crate::services::auth::password::{self, PasswordError};
use crate::services::auth::token_codec::{Claims, PURPOSE_PASSWORD_RESET, TokenCodec};

pub const RESET_PATH: &str = "reset-password";

#[derive(Debug, Error)]
#[error("reset notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivery of the reset link (mail, queue, ...).
pub trait ResetNotifier: Send + Sync {
    fn send_reset_link<'a>(
        &'a self,
        email: &'a str,
        link: &'a Url,
    ) -> BoxFuture<'a, Result<(), NotifyError>>;
}

/// Writes the event to the log. The link itself is a credential and is only
/// printed when `reveal_link` is set (development).
#[derive(Debug, Clone, Copy)]
pub struct LogResetNotifier {
    reveal_link: bool,
}

impl LogResetNotifier {
    pub fn new(reveal_link: bool) -> Self {
        Self { reveal_link }
    }
}

impl ResetNotifier for LogResetNotifier {
    fn send_reset_link<'a>(
        &'a self,
        email: &'a str,
        link: &'a Url,
    ) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(async move {
            if self.reveal_link {
                info!(email = %email, link = %link, "password reset link issued");
            } else {
                info!(email = %email, "password reset link issued");
            }
            Ok(())
        })
    }
}

#[derive(Debug, Error)]
pub enum ResetError {
    #[error("invalid or expired reset token")]
    InvalidToken,
    #[error(transparent)]
    WeakPassword(PasswordError),
    #[error("infrastructure failure")]
    Infrastructure,
}

impl From<RepoError> for ResetError {
    fn from(e: RepoError) -> Self {
        error!(error = ?e, "password reset store failure");
        ResetError::Infrastructure
    }
}

impl From<ResetError> for AppError {
    fn from(e: ResetError) -> Self {
        match e {
            ResetError::InvalidToken => {
                AppError::bad_request("INVALID_RESET_TOKEN", "invalid or expired reset token")
            }
            ResetError::WeakPassword(e) => AppError::bad_request("WEAK_PASSWORD", e.to_string()),
            ResetError::Infrastructure => AppError::Internal,
        }
    }
}

#[derive(Clone)]
pub struct PasswordResetService {
    users: Arc<dyn UserStore>,
    codec: Arc<TokenCodec>,
    notifier: Arc<dyn ResetNotifier>,
    ttl_seconds: u64,
    public_base_url: Url,
}

impl std::fmt::Debug for PasswordResetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordResetService")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("public_base_url", &self.public_base_url.as_str())
            .finish()
    }
}

impl PasswordResetService {
    pub fn new(
        users: Arc<dyn UserStore>,
        codec: Arc<TokenCodec>,
        notifier: Arc<dyn ResetNotifier>,
        ttl_seconds: u64,
        public_base_url: Url,
    ) -> Self {
        Self {
            users,
            codec,
            notifier,
            ttl_seconds,
            public_base_url,
        }
    }

    /// Start a reset for `email`.
    ///
    /// Returns `Ok(())` for unknown emails as well; only existing users get a
    /// stored reset record and a link. Both paths return after the lookup:
    /// storing, signing and delivery run on a spawned task.
    pub async fn request_reset(&self, email: &str) -> Result<(), ResetError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            debug!("password reset requested for unknown email");
            return Ok(());
        };

        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.issue_reset(user.id, &user.email).await {
                error!(user_id = %user.id, error = %e, "failed to issue password reset");
            }
        });

        Ok(())
    }

    async fn issue_reset(&self, user_id: Uuid, email: &str) -> Result<(), ResetError> {
        let reset_id = generate_reset_id().ok_or(ResetError::Infrastructure)?;
        let ttl = Duration::seconds(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX));
        let expires_at = Utc::now() + ttl;

        self.users
            .store_reset_token(user_id, &hash_reset_id(&reset_id), expires_at)
            .await?;

        let token = self
            .codec
            .issue(&Claims::password_reset(user_id, email, &reset_id), ttl)
            .map_err(|_| ResetError::Infrastructure)?;

        let link = self.reset_link(&token)?;

        if let Err(e) = self.notifier.send_reset_link(email, &link).await {
            error!(user_id = %user_id, error = %e, "failed to deliver reset link");
        }

        Ok(())
    }

    /// Consume a reset token and set `new_password`.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ResetError> {
        password::validate_policy(new_password).map_err(ResetError::WeakPassword)?;

        let verified = self.codec.verify(token).map_err(|e| {
            debug!(error = %e, "reset token rejected");
            ResetError::InvalidToken
        })?;
        if verified.mistyped.is_some() {
            return Err(ResetError::InvalidToken);
        }
        let claims = verified.claims;

        if claims.purpose.as_deref() != Some(PURPOSE_PASSWORD_RESET) {
            return Err(ResetError::InvalidToken);
        }
        let user_id = claims
            .sub
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(ResetError::InvalidToken)?;
        let reset_id = claims.rid.ok_or(ResetError::InvalidToken)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ResetError::InvalidToken)?;

        let now = Utc::now();
        let expected = hash_reset_id(&reset_id);
        let stored_matches = user.reset_token.as_deref() == Some(expected.as_str());
        let unexpired = user.reset_token_expires.is_some_and(|exp| exp > now);
        if !stored_matches || !unexpired {
            warn!(user_id = %user_id, "reset token does not match stored record");
            return Err(ResetError::InvalidToken);
        }

        let new_hash = password::hash(new_password).map_err(|e| {
            error!(error = %e, "failed to hash new password");
            ResetError::Infrastructure
        })?;

        // Guarded update: a concurrent reset that already cleared the row wins.
        let consumed = self
            .users
            .consume_reset_token(user_id, &expected, &new_hash, now)
            .await?;
        if !consumed {
            warn!(user_id = %user_id, "reset token consumed concurrently");
            return Err(ResetError::InvalidToken);
        }

        info!(user_id = %user_id, "password reset completed");
        Ok(())
    }

    fn reset_link(&self, token: &str) -> Result<Url, ResetError> {
        let mut link = self.public_base_url.join(RESET_PATH).map_err(|e| {
            error!(error = %e, "invalid public base url for reset link");
            ResetError::Infrastructure
        })?;
        link.query_pairs_mut().append_pair("token", token);
        Ok(link)
    }
}

fn generate_reset_id() -> Option<String> {
    // 32 bytes of entropy -> URL-safe base64 without padding.
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes).ok()?;
    Some(URL_SAFE_NO_PAD.encode(bytes))
}

pub fn hash_reset_id(reset_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reset_id.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_ids_are_unique_and_url_safe() {
        let a = generate_reset_id().unwrap();
        let b = generate_reset_id().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn reset_id_hash_is_hex_sha256() {
        let h = hash_reset_id("abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
