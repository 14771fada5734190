/*
 * Responsibility
 * - users / profiles テーブル向け SQLx 操作 (認証に関わる部分)
 * - role は profiles 側が正 (発行時にだけ参照する)
 * - reset_token / reset_token_expires の保存と消費
 */
use std::{future::Future, pin::Pin};

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::session::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    /// `None` when the user has no profile (or an unusable role in it).
    pub role: Option<Role>,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Point lookups and guarded updates the auth flows need.
pub trait UserStore: Send + Sync {
    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, RepoResult<Option<UserRecord>>>;

    fn find_by_id(&self, id: Uuid) -> BoxFuture<'_, RepoResult<Option<UserRecord>>>;

    /// Create a user and its investor profile. Duplicate email → `RepoError::Conflict`.
    fn create_investor<'a>(
        &'a self,
        email: &'a str,
        password_hash: &'a str,
        full_name: Option<&'a str>,
    ) -> BoxFuture<'a, RepoResult<UserRecord>>;

    fn store_reset_token<'a>(
        &'a self,
        user_id: Uuid,
        token_hash: &'a str,
        expires_at: DateTime<Utc>,
    ) -> BoxFuture<'a, RepoResult<()>>;

    /// Set the new password and clear both reset fields, only if the stored
    /// token still equals `token_hash` and has not expired at `now`.
    ///
    /// Returns false when nothing matched (already consumed, rotated, expired).
    fn consume_reset_token<'a>(
        &'a self,
        user_id: Uuid,
        token_hash: &'a str,
        new_password_hash: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, RepoResult<bool>>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: Option<String>,
    reset_token: Option<String>,
    reset_token_expires: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        let role = match row.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => Some(role),
            Some(Err(e)) => {
                warn!(user_id = %row.id, error = %e, "profile has unusable role");
                None
            }
            None => None,
        };

        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role,
            reset_token: row.reset_token,
            reset_token_expires: row.reset_token_expires,
        }
    }
}

const SELECT_USER: &str = r#"
    SELECT
        u.id, u.email, u.password_hash, p.role, u.reset_token, u.reset_token_expires
    FROM users u
    LEFT JOIN profiles p ON p.user_id = u.id
"#;

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PgUserRepo {
    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, RepoResult<Option<UserRecord>>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

            Ok(row.map(UserRecord::from))
        })
    }

    fn find_by_id(&self, id: Uuid) -> BoxFuture<'_, RepoResult<Option<UserRecord>>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

            Ok(row.map(UserRecord::from))
        })
    }

    fn create_investor<'a>(
        &'a self,
        email: &'a str,
        password_hash: &'a str,
        full_name: Option<&'a str>,
    ) -> BoxFuture<'a, RepoResult<UserRecord>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            let id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO users (email, password_hash)
                VALUES ($1, $2)
                RETURNING id
                "#,
            )
            .bind(email)
            .bind(password_hash)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO profiles (user_id, role, full_name)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(id)
            .bind(Role::Investor.as_str())
            .bind(full_name)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            Ok(UserRecord {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                role: Some(Role::Investor),
                reset_token: None,
                reset_token_expires: None,
            })
        })
    }

    fn store_reset_token<'a>(
        &'a self,
        user_id: Uuid,
        token_hash: &'a str,
        expires_at: DateTime<Utc>,
    ) -> BoxFuture<'a, RepoResult<()>> {
        Box::pin(async move {
            let done = sqlx::query(
                r#"
                UPDATE users
                SET reset_token = $2,
                    reset_token_expires = $3
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .bind(token_hash)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

            if done.rows_affected() == 0 {
                return Err(RepoError::InvalidRow("user vanished before reset token was stored"));
            }
            Ok(())
        })
    }

    fn consume_reset_token<'a>(
        &'a self,
        user_id: Uuid,
        token_hash: &'a str,
        new_password_hash: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, RepoResult<bool>> {
        Box::pin(async move {
            let done = sqlx::query(
                r#"
                UPDATE users
                SET password_hash = $3,
                    reset_token = NULL,
                    reset_token_expires = NULL
                WHERE id = $1
                    AND reset_token = $2
                    AND reset_token_expires > $4
                "#,
            )
            .bind(user_id)
            .bind(token_hash)
            .bind(new_password_hash)
            .bind(now)
            .execute(&self.pool)
            .await?;

            Ok(done.rows_affected() > 0)
        })
    }
}
