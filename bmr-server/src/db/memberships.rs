//! Membership aggregate root

use chrono::NaiveDate;
use sqlx::{Connection, PgConnection, PgPool};
use uuid::Uuid;

const MEMBERSHIP_COLUMNS: &str = "m.id, m.uuid, m.user_id, u.username, m.reference_no, \
     m.profile_picture, m.applied_date, m.membership_type_id, m.membership_number, \
     m.profile_info_id, m.contact_info_id, m.work_info_id, m.education_info_id, \
     m.workflow_status, m.reason, m.is_profile_completed, m.is_contact_completed, \
     m.is_education_completed, m.is_work_completed, m.is_payment_generated, m.submitted_at, \
     m.created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MembershipRow {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub reference_no: String,
    pub profile_picture: Option<String>,
    pub applied_date: NaiveDate,
    pub membership_type_id: Option<i64>,
    pub membership_number: Option<String>,
    pub profile_info_id: Option<i64>,
    pub contact_info_id: Option<i64>,
    pub work_info_id: Option<i64>,
    pub education_info_id: Option<i64>,
    pub workflow_status: Option<String>,
    pub reason: Option<String>,
    pub is_profile_completed: bool,
    pub is_contact_completed: bool,
    pub is_education_completed: bool,
    pub is_work_completed: bool,
    pub is_payment_generated: bool,
    pub submitted_at: Option<i64>,
    pub created_at: i64,
}

impl MembershipRow {
    /// Orphaned rows (user deleted) belong to nobody
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }
}

pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<MembershipRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM memberships m LEFT JOIN users u ON u.id = m.user_id \
         WHERE m.user_id = $1 AND m.is_active"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<MembershipRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM memberships m LEFT JOIN users u ON u.id = m.user_id \
         WHERE m.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_uuid(pool: &PgPool, uuid: Uuid) -> Result<Option<MembershipRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM memberships m LEFT JOIN users u ON u.id = m.user_id \
         WHERE m.uuid = $1 AND m.is_active"
    ))
    .bind(uuid)
    .fetch_optional(pool)
    .await
}

/// Load and row-lock a membership for the rest of the transaction
pub async fn lock_by_id(
    conn: &mut PgConnection,
    id: i64,
) -> Result<Option<MembershipRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM memberships m LEFT JOIN users u ON u.id = m.user_id \
         WHERE m.id = $1 FOR UPDATE OF m"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Insert a Draft membership for `user_id`.
///
/// Returns `None` when the insert hit a uniqueness conflict (the user already
/// has a membership, or the reference number was taken).
pub async fn insert_draft(
    conn: &mut PgConnection,
    user_id: i64,
    reference_no: &str,
    draft_code: &str,
    applied_date: NaiveDate,
    now: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO memberships (uuid, user_id, reference_no, applied_date, workflow_status, \
         created_at, created_by, modified_at, modified_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $2, $6, $2) ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(reference_no)
    .bind(applied_date)
    .bind(draft_code)
    .bind(now)
    .fetch_optional(conn)
    .await
}

/// Set the membership number unless the row already has one.
///
/// Runs under a savepoint so a unique violation (another membership took the
/// same number) leaves the surrounding transaction usable. Returns `false` on
/// such a conflict.
pub async fn try_assign_number(
    conn: &mut PgConnection,
    id: i64,
    number: &str,
    actor: Option<i64>,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let mut savepoint = conn.begin().await?;
    let result = sqlx::query(
        "UPDATE memberships SET membership_number = $1, modified_at = $2, modified_by = $3 \
         WHERE id = $4 AND membership_number IS NULL",
    )
    .bind(number)
    .bind(now)
    .bind(actor)
    .bind(id)
    .execute(&mut *savepoint)
    .await;
    match result {
        Ok(_) => {
            savepoint.commit().await?;
            Ok(true)
        }
        Err(e) if is_unique_violation(&e) => {
            savepoint.rollback().await?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Number of memberships already numbered under `prefix`
pub async fn count_numbers_with_prefix(
    conn: &mut PgConnection,
    prefix: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM memberships WHERE membership_number IS NOT NULL \
         AND membership_number LIKE $1 || '%'",
    )
    .bind(prefix)
    .fetch_one(conn)
    .await
}

pub async fn set_status(
    conn: &mut PgConnection,
    id: i64,
    status_code: &str,
    reason: Option<&str>,
    actor: Option<i64>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE memberships SET workflow_status = $1, reason = COALESCE($2, reason), \
         modified_at = $3, modified_by = $4 WHERE id = $5",
    )
    .bind(status_code)
    .bind(reason)
    .bind(now)
    .bind(actor)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub struct PageOneUpdate<'a> {
    pub profile_info_id: i64,
    pub contact_info_id: i64,
    pub membership_type_id: i64,
    pub profile_picture: Option<&'a str>,
}

/// Link page-1 sections and mark them complete
pub async fn save_page_one(
    conn: &mut PgConnection,
    id: i64,
    update: &PageOneUpdate<'_>,
    actor: Option<i64>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE memberships SET profile_info_id = $1, contact_info_id = $2, \
         membership_type_id = $3, profile_picture = COALESCE($4, profile_picture), \
         is_profile_completed = TRUE, is_contact_completed = TRUE, \
         modified_at = $5, modified_by = $6 WHERE id = $7",
    )
    .bind(update.profile_info_id)
    .bind(update.contact_info_id)
    .bind(update.membership_type_id)
    .bind(update.profile_picture)
    .bind(now)
    .bind(actor)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Link page-2 sections, mark them complete and stamp submission time
pub async fn save_page_two(
    conn: &mut PgConnection,
    id: i64,
    education_info_id: i64,
    work_info_id: i64,
    actor: Option<i64>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE memberships SET education_info_id = $1, work_info_id = $2, \
         is_education_completed = TRUE, is_work_completed = TRUE, submitted_at = $3, \
         modified_at = $3, modified_by = $4 WHERE id = $5",
    )
    .bind(education_info_id)
    .bind(work_info_id)
    .bind(now)
    .bind(actor)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn mark_payment_generated(
    conn: &mut PgConnection,
    id: i64,
    actor: Option<i64>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE memberships SET is_payment_generated = TRUE, modified_at = $1, modified_by = $2 \
         WHERE id = $3",
    )
    .bind(now)
    .bind(actor)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Staff listing, optionally filtered by status code
pub async fn list(
    pool: &PgPool,
    status_code: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<MembershipRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM memberships m LEFT JOIN users u ON u.id = m.user_id \
         WHERE m.is_active AND ($1::TEXT IS NULL OR m.workflow_status = $1) \
         ORDER BY m.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(status_code)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, status_code: Option<&str>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM memberships m \
         WHERE m.is_active AND ($1::TEXT IS NULL OR m.workflow_status = $1)",
    )
    .bind(status_code)
    .fetch_one(pool)
    .await
}

/// Active memberships that carry a membership type (annual billing candidates)
pub async fn list_billable(pool: &PgPool) -> Result<Vec<(i64, i64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, membership_type_id FROM memberships \
         WHERE is_active AND membership_type_id IS NOT NULL ORDER BY id",
    )
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: Option<i64>) -> MembershipRow {
        MembershipRow {
            id: 1,
            uuid: Uuid::nil(),
            user_id,
            username: None,
            reference_no: "REF-1".into(),
            profile_picture: None,
            applied_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            membership_type_id: None,
            membership_number: None,
            profile_info_id: None,
            contact_info_id: None,
            work_info_id: None,
            education_info_id: None,
            workflow_status: None,
            reason: None,
            is_profile_completed: false,
            is_contact_completed: false,
            is_education_completed: false,
            is_work_completed: false,
            is_payment_generated: false,
            submitted_at: None,
            created_at: 0,
        }
    }

    #[test]
    fn ownership_matches_only_the_applicant() {
        assert!(row(Some(7)).is_owned_by(7));
        assert!(!row(Some(7)).is_owned_by(8));
        assert!(!row(None).is_owned_by(7));
    }
}
