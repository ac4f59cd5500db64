//! Workflow status catalog

use shared::models::StatusView;
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusRow {
    pub code: String,
    pub internal_status: String,
    pub external_status: Option<String>,
    pub description: Option<String>,
    pub parent_code: Option<String>,
}

impl From<StatusRow> for StatusView {
    fn from(row: StatusRow) -> Self {
        StatusView::new(
            row.code,
            row.internal_status,
            row.external_status,
            row.description,
            row.parent_code,
        )
    }
}

pub async fn list(pool: &PgPool) -> Result<Vec<StatusRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT code, internal_status, external_status, description, parent_code \
         FROM statuses WHERE is_active ORDER BY code",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<StatusRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT code, internal_status, external_status, description, parent_code \
         FROM statuses WHERE code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await
}
