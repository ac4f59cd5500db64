//! Append-only workflow and payment logs

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub async fn insert_workflow_log(
    conn: &mut PgConnection,
    membership_id: i64,
    old_status: Option<&str>,
    new_status: &str,
    action_by: Option<i64>,
    reason: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO workflow_logs (uuid, membership_id, old_status, new_status, action_by, \
         action_time, reason, created_at, created_by, modified_at, modified_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $6, $5, $6, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(membership_id)
    .bind(old_status)
    .bind(new_status)
    .bind(action_by)
    .bind(now)
    .bind(reason)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_payment_log(
    conn: &mut PgConnection,
    payment_id: i64,
    old_status: Option<&str>,
    new_status: &str,
    note: Option<&str>,
    actor: Option<i64>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO payment_logs (uuid, payment_id, old_status, new_status, note, \
         created_at, created_by, modified_at, modified_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $6, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(payment_id)
    .bind(old_status)
    .bind(new_status)
    .bind(note)
    .bind(now)
    .bind(actor)
    .execute(conn)
    .await?;
    Ok(())
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WorkflowLogEntry {
    pub uuid: Uuid,
    pub old_status: Option<String>,
    pub new_status: Option<String>,
    pub action_by: Option<String>,
    pub action_time: i64,
    pub reason: Option<String>,
}

pub async fn list_workflow_logs(
    pool: &PgPool,
    membership_id: i64,
) -> Result<Vec<WorkflowLogEntry>, sqlx::Error> {
    sqlx::query_as(
        "SELECT l.uuid, l.old_status, l.new_status, u.username AS action_by, l.action_time, \
         l.reason FROM workflow_logs l LEFT JOIN users u ON u.id = l.action_by \
         WHERE l.membership_id = $1 ORDER BY l.id",
    )
    .bind(membership_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PaymentLogEntry {
    pub uuid: Uuid,
    pub old_status: Option<String>,
    pub new_status: String,
    pub note: Option<String>,
    pub created_by: Option<String>,
    pub created_at: i64,
}

pub async fn list_payment_logs(
    pool: &PgPool,
    payment_id: i64,
) -> Result<Vec<PaymentLogEntry>, sqlx::Error> {
    sqlx::query_as(
        "SELECT l.uuid, l.old_status, l.new_status, l.note, u.username AS created_by, \
         l.created_at FROM payment_logs l LEFT JOIN users u ON u.id = l.created_by \
         WHERE l.payment_id = $1 ORDER BY l.id",
    )
    .bind(payment_id)
    .fetch_all(pool)
    .await
}
