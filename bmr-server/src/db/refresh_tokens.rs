//! Refresh token storage

use shared::util::now_millis;
use sqlx::PgPool;

const REFRESH_TOKEN_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000; // 30 days

/// Issue a new refresh token for a user
pub async fn create(pool: &PgPool, user_id: i64) -> Result<String, sqlx::Error> {
    let token_id = uuid::Uuid::new_v4().to_string();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(&token_id)
    .bind(user_id)
    .bind(now + REFRESH_TOKEN_TTL_MS)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(token_id)
}

/// Validate and rotate a refresh token. Returns (user_id, new_refresh_token).
pub async fn rotate(
    pool: &PgPool,
    refresh_token: &str,
) -> Result<Option<(i64, String)>, sqlx::Error> {
    // Revoke-and-read in one statement so a token can only be used once
    let row: Option<RefreshTokenRow> = sqlx::query_as(
        "UPDATE refresh_tokens SET revoked = TRUE \
         WHERE id = $1 AND NOT revoked AND expires_at >= $2 \
         RETURNING user_id",
    )
    .bind(refresh_token)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let new_token = create(pool, row.user_id).await?;
    Ok(Some((row.user_id, new_token)))
}

/// Revoke one token owned by `user_id`. Returns false when it was not a live token.
pub async fn revoke(pool: &PgPool, user_id: i64, refresh_token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1 AND user_id = $2 AND NOT revoked",
    )
    .bind(refresh_token)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Revoke all refresh tokens for a user
pub async fn revoke_all(pool: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND NOT revoked")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    user_id: i64,
}
