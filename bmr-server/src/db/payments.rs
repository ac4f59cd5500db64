//! Membership payments (sub-ledger)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "id, uuid, membership_id, method, provider, status, receipt_no, \
     external_id, reference_no, description, amount, currency, period_year, due_date, paid_at, \
     qr_code, receipt_image, raw_response, created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub uuid: Uuid,
    pub membership_id: Option<i64>,
    pub method: String,
    pub provider: Option<String>,
    pub status: String,
    pub receipt_no: String,
    pub external_id: Option<String>,
    pub reference_no: Option<String>,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub period_year: i32,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<i64>,
    pub qr_code: Option<String>,
    pub receipt_image: Option<String>,
    pub raw_response: Option<serde_json::Value>,
    pub created_at: i64,
}

pub struct NewPayment<'a> {
    pub membership_id: i64,
    pub method: &'a str,
    pub provider: Option<&'a str>,
    pub status: &'a str,
    pub external_id: Option<&'a str>,
    pub reference_no: Option<&'a str>,
    pub description: Option<&'a str>,
    pub amount: Decimal,
    pub currency: &'a str,
    pub period_year: i32,
    pub due_date: Option<NaiveDate>,
    pub qr_code: Option<&'a str>,
    pub receipt_image: Option<&'a str>,
    pub raw_response: Option<&'a serde_json::Value>,
}

/// Receipts already issued under `prefix`
pub async fn count_receipts_with_prefix(
    conn: &mut PgConnection,
    prefix: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM membership_payments WHERE receipt_no LIKE $1 || '%'")
        .bind(prefix)
        .fetch_one(conn)
        .await
}

/// Insert with a candidate receipt number.
///
/// Returns `None` when the receipt number is already taken; the caller
/// retries with the next sequence.
pub async fn try_insert(
    conn: &mut PgConnection,
    payment: &NewPayment<'_>,
    receipt_no: &str,
    actor: Option<i64>,
    now: i64,
) -> Result<Option<PaymentRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO membership_payments (uuid, membership_id, method, provider, status, \
         receipt_no, external_id, reference_no, description, amount, currency, period_year, \
         due_date, qr_code, receipt_image, raw_response, created_at, created_by, modified_at, \
         modified_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, \
         $17, $18) \
         ON CONFLICT (receipt_no) DO NOTHING RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(payment.membership_id)
    .bind(payment.method)
    .bind(payment.provider)
    .bind(payment.status)
    .bind(receipt_no)
    .bind(payment.external_id)
    .bind(payment.reference_no)
    .bind(payment.description)
    .bind(payment.amount)
    .bind(payment.currency)
    .bind(payment.period_year)
    .bind(payment.due_date)
    .bind(payment.qr_code)
    .bind(payment.receipt_image)
    .bind(payment.raw_response)
    .bind(now)
    .bind(actor)
    .fetch_optional(conn)
    .await
}

pub async fn find_by_uuid(pool: &PgPool, uuid: Uuid) -> Result<Option<PaymentRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM membership_payments WHERE uuid = $1 AND is_active"
    ))
    .bind(uuid)
    .fetch_optional(pool)
    .await
}

pub async fn lock_by_uuid(
    conn: &mut PgConnection,
    uuid: Uuid,
) -> Result<Option<PaymentRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM membership_payments WHERE uuid = $1 AND is_active FOR UPDATE"
    ))
    .bind(uuid)
    .fetch_optional(conn)
    .await
}

/// Row-lock the payment a gateway id refers to
pub async fn lock_by_external_id(
    conn: &mut PgConnection,
    external_id: &str,
    method: &str,
) -> Result<Option<PaymentRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM membership_payments \
         WHERE external_id = $1 AND method = $2 AND is_active \
         ORDER BY id DESC LIMIT 1 FOR UPDATE"
    ))
    .bind(external_id)
    .bind(method)
    .fetch_optional(conn)
    .await
}

pub async fn update_status(
    conn: &mut PgConnection,
    id: i64,
    status: &str,
    paid_at: Option<i64>,
    actor: Option<i64>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE membership_payments SET status = $1, paid_at = $2, modified_at = $3, \
         modified_by = $4 WHERE id = $5",
    )
    .bind(status)
    .bind(paid_at)
    .bind(now)
    .bind(actor)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Store the latest gateway payload verbatim
pub async fn store_raw_response(
    conn: &mut PgConnection,
    id: i64,
    raw: &serde_json::Value,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE membership_payments SET raw_response = $1, modified_at = $2 WHERE id = $3")
        .bind(raw)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn list_for_membership(
    pool: &PgPool,
    membership_id: i64,
) -> Result<Vec<PaymentRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM membership_payments \
         WHERE membership_id = $1 AND is_active ORDER BY created_at DESC, id DESC"
    ))
    .bind(membership_id)
    .fetch_all(pool)
    .await
}

pub async fn has_paid<'e, E>(executor: E, membership_id: i64) -> Result<bool, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM membership_payments \
         WHERE membership_id = $1 AND status = 'paid' AND is_active)",
    )
    .bind(membership_id)
    .fetch_one(executor)
    .await
}

pub async fn exists_for_year(
    conn: &mut PgConnection,
    membership_id: i64,
    period_year: i32,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM membership_payments \
         WHERE membership_id = $1 AND period_year = $2 AND is_active)",
    )
    .bind(membership_id)
    .bind(period_year)
    .fetch_one(conn)
    .await
}
