//! Account profiles (one per user)

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProfileRow {
    pub uuid: Uuid,
    pub full_name: String,
    pub avatar: Option<String>,
    pub mobile: String,
    pub secondary_mobile: Option<String>,
}

pub struct NewProfile<'a> {
    pub full_name: &'a str,
    pub avatar: Option<&'a str>,
    pub mobile: &'a str,
    pub secondary_mobile: Option<&'a str>,
}

pub async fn create(
    conn: &mut PgConnection,
    user_id: i64,
    profile: &NewProfile<'_>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO profiles (uuid, user_id, full_name, avatar, mobile, secondary_mobile, \
         created_at, created_by, modified_at, modified_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $2, $7, $2)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(profile.full_name)
    .bind(profile.avatar)
    .bind(profile.mobile)
    .bind(profile.secondary_mobile)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<ProfileRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT uuid, full_name, avatar, mobile, secondary_mobile FROM profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Update phone numbers; `None` leaves a column unchanged
pub async fn update_mobiles(
    pool: &PgPool,
    user_id: i64,
    mobile: Option<&str>,
    secondary_mobile: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE profiles SET mobile = COALESCE($1, mobile), \
         secondary_mobile = COALESCE($2, secondary_mobile), modified_at = $3, modified_by = $4 \
         WHERE user_id = $4",
    )
    .bind(mobile)
    .bind(secondary_mobile)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Display name from Google sign-in
pub async fn set_full_name(
    pool: &PgPool,
    user_id: i64,
    full_name: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE profiles SET full_name = $1, modified_at = $2, modified_by = $3 WHERE user_id = $3",
    )
    .bind(full_name)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}
