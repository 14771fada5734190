/*
 * Responsibility
 * - signup / login の業務ルール (handler を薄く保つ)
 * - role は profiles から発行時にだけ読む。リクエスト時はトークンが正
 */
use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::user_repo::UserStore;
use crate::services::auth::password::{self, PasswordError};
use crate::services::auth::session::Role;

/// Who just proved their credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Self-service signup always yields an investor.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<Identity, AppError> {
        password::validate_policy(password)
            .map_err(|e| AppError::bad_request("WEAK_PASSWORD", e.to_string()))?;

        let password_hash = password::hash(password).map_err(|e: PasswordError| {
            error!(error = %e, "failed to hash password");
            AppError::Internal
        })?;

        let user = self
            .users
            .create_investor(email, &password_hash, full_name)
            .await
            .map_err(|e| match e {
                RepoError::Conflict => {
                    AppError::conflict("EMAIL_TAKEN", "an account with this email already exists")
                }
                other => AppError::from(other),
            })?;

        debug!(user_id = %user.id, "investor signed up");

        Ok(Identity {
            user_id: user.id,
            email: user.email,
            role: Role::Investor,
        })
    }

    /// Unknown email, wrong password and missing profile all answer the same 401.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let user = self.users.find_by_email(email).await?;

        // Runs a full hash verify whether or not the email exists.
        let verified = password::verify_account(
            password,
            user.as_ref().map(|u| u.password_hash.as_str()),
        );

        let Some(user) = user else {
            debug!("login for unknown email");
            return Err(AppError::Unauthorized);
        };
        if !verified {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AppError::Unauthorized);
        }

        let Some(role) = user.role else {
            warn!(user_id = %user.id, "login for user without usable profile role");
            return Err(AppError::Unauthorized);
        };

        Ok(Identity {
            user_id: user.id,
            email: user.email,
            role,
        })
    }
}
