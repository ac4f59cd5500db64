//! Roles and user-role assignments

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoleRow {
    #[serde(skip)]
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
}

pub async fn list(pool: &PgPool) -> Result<Vec<RoleRow>, sqlx::Error> {
    sqlx::query_as("SELECT id, uuid, name FROM roles WHERE is_active ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Active roles held by a user
pub async fn for_user(pool: &PgPool, user_id: i64) -> Result<Vec<RoleRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT r.id, r.uuid, r.name FROM roles r \
         JOIN user_roles ur ON ur.role_id = r.id \
         WHERE ur.user_id = $1 AND r.is_active ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Resolve role names (case-insensitive). Unknown names are simply absent.
pub async fn find_by_names(pool: &PgPool, names: &[String]) -> Result<Vec<RoleRow>, sqlx::Error> {
    let lowered: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
    sqlx::query_as(
        "SELECT id, uuid, name FROM roles WHERE is_active AND LOWER(name) = ANY($1) ORDER BY name",
    )
    .bind(&lowered)
    .fetch_all(pool)
    .await
}

/// Replace a user's role set
pub async fn replace_for_user(
    conn: &mut PgConnection,
    user_id: i64,
    role_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    for role_id in role_ids {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
