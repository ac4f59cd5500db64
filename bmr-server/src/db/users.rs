//! User accounts

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, uuid, username, email, hashed_password, is_staff, is_locked, \
     is_verified, otp_code, otp_expired_at, is_google_login, is_active";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub uuid: Uuid,
    pub username: String,
    pub email: String,
    pub hashed_password: Option<String>,
    pub is_staff: bool,
    pub is_locked: bool,
    pub is_verified: bool,
    pub otp_code: Option<String>,
    pub otp_expired_at: Option<i64>,
    pub is_google_login: bool,
    pub is_active: bool,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub hashed_password: Option<&'a str>,
    pub is_verified: bool,
    pub is_locked: bool,
    pub is_google_login: bool,
    pub otp_code: Option<&'a str>,
    pub otp_expired_at: Option<i64>,
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_uuid(pool: &PgPool, uuid: Uuid) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE uuid = $1"))
        .bind(uuid)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Case-insensitive email lookup
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
        .bind(email)
        .fetch_one(pool)
        .await
}

/// Insert a user, returning its id
pub async fn create(
    conn: &mut PgConnection,
    user: &NewUser<'_>,
    now: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO users (uuid, username, email, hashed_password, is_verified, is_locked, \
         is_google_login, otp_code, otp_expired_at, created_at, modified_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(user.username)
    .bind(user.email)
    .bind(user.hashed_password)
    .bind(user.is_verified)
    .bind(user.is_locked)
    .bind(user.is_google_login)
    .bind(user.otp_code)
    .bind(user.otp_expired_at)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Store a fresh OTP and lock the account until it is verified
pub async fn set_otp(
    pool: &PgPool,
    id: i64,
    code: &str,
    expires_at: i64,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET otp_code = $1, otp_expired_at = $2, is_locked = TRUE, modified_at = $3 \
         WHERE id = $4",
    )
    .bind(code)
    .bind(expires_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Successful OTP verification: verified, unlocked, OTP cleared
pub async fn mark_verified(pool: &PgPool, id: i64, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET is_verified = TRUE, is_locked = FALSE, otp_code = NULL, \
         otp_expired_at = NULL, modified_at = $1, modified_by = $2 WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Password reset: new hash, unlocked, OTP cleared
pub async fn reset_password(
    pool: &PgPool,
    id: i64,
    hashed_password: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET hashed_password = $1, is_locked = FALSE, otp_code = NULL, \
         otp_expired_at = NULL, modified_at = $2, modified_by = $3 WHERE id = $3",
    )
    .bind(hashed_password)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_password(
    pool: &PgPool,
    id: i64,
    hashed_password: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET hashed_password = $1, modified_at = $2, modified_by = $3 WHERE id = $3",
    )
    .bind(hashed_password)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_staff(
    conn: &mut PgConnection,
    id: i64,
    is_staff: bool,
    actor: Option<i64>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_staff = $1, modified_at = $2, modified_by = $3 WHERE id = $4")
        .bind(is_staff)
        .bind(now)
        .bind(actor)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Link an existing local account to Google sign-in
pub async fn mark_google_login(pool: &PgPool, id: i64, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET is_google_login = TRUE, is_locked = FALSE, modified_at = $1 WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<UserRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE is_active ORDER BY id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active")
        .fetch_one(pool)
        .await
}

/// Verified, active accounts for the public directory
pub async fn list_public(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<UserRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE is_active AND is_verified \
         ORDER BY username LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_public(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active AND is_verified")
        .fetch_one(pool)
        .await
}

pub async fn find_public(pool: &PgPool, uuid: Uuid) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE uuid = $1 AND is_active AND is_verified"
    ))
    .bind(uuid)
    .fetch_optional(pool)
    .await
}
