//! Lookup tables: education levels, institutions, membership types

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LookupRow {
    #[serde(skip)]
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MembershipTypeRow {
    #[serde(skip)]
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    #[serde(skip)]
    pub type_code: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

pub async fn list_education_levels(pool: &PgPool) -> Result<Vec<LookupRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, uuid, name, description FROM education_levels WHERE is_active ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

pub async fn list_institutions(pool: &PgPool) -> Result<Vec<LookupRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, uuid, name, description FROM institutions WHERE is_active ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_education_level(
    pool: &PgPool,
    uuid: Uuid,
) -> Result<Option<LookupRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, uuid, name, description FROM education_levels WHERE uuid = $1 AND is_active",
    )
    .bind(uuid)
    .fetch_optional(pool)
    .await
}

pub async fn find_institution(pool: &PgPool, uuid: Uuid) -> Result<Option<LookupRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, uuid, name, description FROM institutions WHERE uuid = $1 AND is_active",
    )
    .bind(uuid)
    .fetch_optional(pool)
    .await
}

pub async fn list_membership_types(pool: &PgPool) -> Result<Vec<MembershipTypeRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, uuid, name, type_code, amount, description FROM membership_types \
         WHERE is_active ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_membership_type(
    pool: &PgPool,
    uuid: Uuid,
) -> Result<Option<MembershipTypeRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, uuid, name, type_code, amount, description FROM membership_types \
         WHERE uuid = $1 AND is_active",
    )
    .bind(uuid)
    .fetch_optional(pool)
    .await
}

pub async fn find_membership_type_by_id<'e, E>(
    executor: E,
    id: i64,
) -> Result<Option<MembershipTypeRow>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, uuid, name, type_code, amount, description FROM membership_types WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}
