/*
 * Responsibility
 * - profiles (investor 情報) の参照・更新
 * - 更新できる列は ProfileChanges に並んでいるものだけ (allow-list)
 */
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::RepoResult;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bikes_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Updatable profile fields. `None` leaves the column untouched.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges<'a> {
    pub full_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub bikes_count: Option<i32>,
}

pub async fn list_investors(pool: &PgPool) -> RepoResult<Vec<ProfileRow>> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT
            p.user_id, u.email, p.role, p.full_name, p.phone, p.bikes_count,
            p.created_at, p.updated_at
        FROM profiles p
        JOIN users u ON u.id = p.user_id
        WHERE p.role = 'investor'
        ORDER BY p.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get(pool: &PgPool, user_id: Uuid) -> RepoResult<Option<ProfileRow>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT
            p.user_id, u.email, p.role, p.full_name, p.phone, p.bikes_count,
            p.created_at, p.updated_at
        FROM profiles p
        JOIN users u ON u.id = p.user_id
        WHERE p.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Only investor profiles are editable through this path; admin rows are left alone.
pub async fn update_investor(
    pool: &PgPool,
    user_id: Uuid,
    changes: ProfileChanges<'_>,
) -> RepoResult<Option<ProfileRow>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        WITH updated AS (
            UPDATE profiles
            SET
                full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                bikes_count = COALESCE($4, bikes_count),
                updated_at = now()
            WHERE user_id = $1 AND role = 'investor'
            RETURNING user_id, role, full_name, phone, bikes_count, created_at, updated_at
        )
        SELECT
            updated.user_id, u.email, updated.role, updated.full_name, updated.phone,
            updated.bikes_count, updated.created_at, updated.updated_at
        FROM updated
        JOIN users u ON u.id = updated.user_id
        "#,
    )
    .bind(user_id)
    .bind(changes.full_name)
    .bind(changes.phone)
    .bind(changes.bikes_count)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
