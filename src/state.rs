/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - secret を持つ TokenCodec は起動時に一度だけ作って注入する (global にしない)
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::services::account::AccountService;
use crate::services::auth::AuthService;
use crate::services::auth::password_reset::PasswordResetService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub auth: Arc<AuthService>,
    pub accounts: Arc<AccountService>,
    pub resets: Arc<PasswordResetService>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        auth: Arc<AuthService>,
        accounts: Arc<AccountService>,
        resets: Arc<PasswordResetService>,
    ) -> Self {
        Self {
            db,
            auth,
            accounts,
            resets,
        }
    }
}
