//! Membership workflow engine
//!
//! Every status change goes through [`transition_locked`], which runs inside
//! the caller's transaction, applies the status-specific side effects and
//! appends exactly one workflow log row. The acting user is always passed in
//! explicitly as an [`Actor`].

pub mod fees;
pub mod numbers;
pub mod submission;

use shared::error::{AppError, ErrorCode};
use shared::models::WorkflowStatus;
use shared::util::{current_year, now_millis, today};
use sqlx::{PgConnection, PgPool};

use crate::db;
use crate::db::memberships::MembershipRow;
use crate::error::ServiceResult;

/// Attempts at drawing a free reference number before giving up
const MAX_REFERENCE_ATTEMPTS: usize = 10;
/// Attempts at claiming a membership number under concurrent approvals
const MAX_NUMBER_ATTEMPTS: i64 = 20;

/// User on whose behalf a mutation is performed.
///
/// `user_id` is `None` for unauthenticated callers such as the payment
/// gateway; audit columns are then left unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<i64>,
}

impl Actor {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn system() -> Self {
        Self { user_id: None }
    }
}

/// Decision for a requested status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Already in the target status: nothing is written
    Unchanged,
    Apply {
        from: Option<WorkflowStatus>,
        to: WorkflowStatus,
        reason: Option<String>,
    },
}

fn is_allowed(from: WorkflowStatus, to: WorkflowStatus) -> bool {
    use WorkflowStatus::*;
    matches!(
        (from, to),
        (Draft | Revise, PendingPayment)
            | (Draft | PendingPayment, PendingApproval)
            | (PendingApproval, Approved | Revise | Reject)
            | (Approved, Terminated)
    )
}

/// Validate a status change against the transition table.
///
/// A membership without a status is treated as Draft, except that moving it
/// into Draft is itself a change (the creation entry of the history).
pub fn plan_transition(
    from: Option<WorkflowStatus>,
    to: WorkflowStatus,
    reason: Option<&str>,
) -> Result<TransitionPlan, AppError> {
    if from == Some(to) {
        return Ok(TransitionPlan::Unchanged);
    }

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    if to.requires_reason() && reason.is_none() {
        return Err(AppError::new(ErrorCode::ReasonRequired)
            .with_detail("reason", serde_json::json!(["This field is required."])));
    }

    let allowed = match from {
        None => to == WorkflowStatus::Draft || is_allowed(WorkflowStatus::Draft, to),
        Some(from) => is_allowed(from, to),
    };
    if !allowed {
        let from_label = from.map_or("None", |s| s.internal_label());
        return Err(AppError::with_message(
            ErrorCode::InvalidTransition,
            format!(
                "Cannot move membership from {from_label} to {}",
                to.internal_label()
            ),
        ));
    }

    Ok(TransitionPlan::Apply {
        from,
        to,
        reason: reason.map(str::to_owned),
    })
}

/// Whether moving to `to` must assign a membership number.
///
/// Only the first approval numbers a membership; an existing number is never
/// replaced.
pub fn needs_membership_number(existing: Option<&str>, to: WorkflowStatus) -> bool {
    to == WorkflowStatus::Approved && existing.is_none()
}

/// Result of a transition request
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub from: Option<WorkflowStatus>,
    pub to: WorkflowStatus,
    pub changed: bool,
    pub membership_number: Option<String>,
}

/// Current status of a row; unknown codes read as "no status".
pub fn current_status(row: &MembershipRow) -> Option<WorkflowStatus> {
    row.workflow_status
        .as_deref()
        .and_then(WorkflowStatus::from_code)
}

/// Apply a transition to a membership that is already row-locked by `conn`.
pub async fn transition_locked(
    conn: &mut PgConnection,
    row: &MembershipRow,
    to: WorkflowStatus,
    reason: Option<&str>,
    actor: Actor,
    now: i64,
) -> ServiceResult<TransitionOutcome> {
    let from = current_status(row);
    let reason = match plan_transition(from, to, reason)? {
        TransitionPlan::Unchanged => {
            return Ok(TransitionOutcome {
                from,
                to,
                changed: false,
                membership_number: row.membership_number.clone(),
            });
        }
        TransitionPlan::Apply { reason, .. } => reason,
    };

    let new_number = if needs_membership_number(row.membership_number.as_deref(), to) {
        Some(assign_membership_number(conn, row, actor, now).await?)
    } else {
        None
    };

    db::memberships::set_status(
        conn,
        row.id,
        to.code(),
        reason.as_deref(),
        actor.user_id,
        now,
    )
    .await?;
    db::logs::insert_workflow_log(
        conn,
        row.id,
        row.workflow_status.as_deref(),
        to.code(),
        actor.user_id,
        reason.as_deref(),
        now,
    )
    .await?;

    tracing::info!(
        membership_id = row.id,
        from = row.workflow_status.as_deref().unwrap_or("-"),
        to = to.code(),
        actor = ?actor.user_id,
        "Membership status changed"
    );

    Ok(TransitionOutcome {
        from,
        to,
        changed: true,
        membership_number: row.membership_number.clone().or(new_number),
    })
}

/// Lock the membership and transition it in a transaction of its own
pub async fn transition(
    pool: &PgPool,
    membership_id: i64,
    to: WorkflowStatus,
    reason: Option<&str>,
    actor: Actor,
) -> ServiceResult<TransitionOutcome> {
    let mut tx = pool.begin().await?;
    let row = db::memberships::lock_by_id(&mut tx, membership_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;
    let outcome = transition_locked(&mut tx, &row, to, reason, actor, now_millis()).await?;
    tx.commit().await?;
    Ok(outcome)
}

/// Move a membership to Pending Approval after one of its payments was paid.
///
/// Memberships at or past that stage are left alone so that replayed or
/// out-of-order gateway events never regress the workflow. Returns whether
/// the status changed.
pub async fn advance_on_payment(
    conn: &mut PgConnection,
    membership_id: i64,
    actor: Actor,
    now: i64,
) -> ServiceResult<bool> {
    let Some(row) = db::memberships::lock_by_id(conn, membership_id).await? else {
        tracing::warn!(membership_id, "Paid payment refers to a missing membership");
        return Ok(false);
    };
    let status = current_status(&row).unwrap_or(WorkflowStatus::Draft);
    if !status.advances_on_payment() {
        tracing::debug!(
            membership_id,
            status = status.code(),
            "Payment settled, membership already past payment stage"
        );
        return Ok(false);
    }
    let outcome =
        transition_locked(conn, &row, WorkflowStatus::PendingApproval, None, actor, now).await?;
    Ok(outcome.changed)
}

/// Claim `{type}{year}{seq:04}` for a membership, continuing after the
/// numbers already issued. A number taken by a concurrent approval moves on
/// to the next sequence.
async fn assign_membership_number(
    conn: &mut PgConnection,
    row: &MembershipRow,
    actor: Actor,
    now: i64,
) -> ServiceResult<String> {
    let type_code = match row.membership_type_id {
        Some(id) => db::lookups::find_membership_type_by_id(&mut *conn, id)
            .await?
            .map(|t| t.type_code),
        None => None,
    };
    let prefix = numbers::membership_number_prefix(type_code.as_deref(), current_year());
    let issued = db::memberships::count_numbers_with_prefix(&mut *conn, &prefix).await?;
    for candidate in numbers::membership_number_candidates(&prefix, issued, MAX_NUMBER_ATTEMPTS) {
        if db::memberships::try_assign_number(&mut *conn, row.id, &candidate, actor.user_id, now).await? {
            tracing::info!(membership_id = row.id, membership_number = %candidate, "Membership number assigned");
            return Ok(candidate);
        }
        tracing::debug!(%candidate, "Membership number taken, trying next");
    }
    Err(AppError::internal("Could not allocate a membership number").into())
}

/// The caller's membership, created as a Draft on first access
pub async fn get_or_create(pool: &PgPool, user_id: i64) -> ServiceResult<MembershipRow> {
    if let Some(row) = db::memberships::find_by_user(pool, user_id).await? {
        return Ok(row);
    }

    for _ in 0..MAX_REFERENCE_ATTEMPTS {
        let reference_no = numbers::generate_reference_no(&mut rand::thread_rng());
        let now = now_millis();

        let mut tx = pool.begin().await?;
        let inserted = db::memberships::insert_draft(
            &mut tx,
            user_id,
            &reference_no,
            WorkflowStatus::Draft.code(),
            today(),
            now,
        )
        .await?;

        let Some(membership_id) = inserted else {
            tx.rollback().await?;
            // Either a concurrent request created it or the reference collided
            if let Some(row) = db::memberships::find_by_user(pool, user_id).await? {
                return Ok(row);
            }
            tracing::debug!(%reference_no, "Reference number collision, retrying");
            continue;
        };

        db::logs::insert_workflow_log(
            &mut tx,
            membership_id,
            None,
            WorkflowStatus::Draft.code(),
            Some(user_id),
            None,
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(membership_id, user_id, %reference_no, "Membership draft created");
        return db::memberships::find_by_user(pool, user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound).into());
    }

    Err(AppError::internal("Could not allocate a membership reference number").into())
}
