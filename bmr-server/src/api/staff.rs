//! Staff membership operations
//!
//! Review queue, status transitions, offline payment confirmation and annual
//! billing. Every handler reloads the caller's roles and checks the matching
//! permission.

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode, Page};
use shared::models::{Permission, WorkflowStatus};
use shared::util::current_year;
use uuid::Uuid;

use super::views::{MembershipSummary, MembershipView, PaymentView, StaffPaymentView, membership_view};
use super::{ApiResult, PageQuery};
use crate::auth::CurrentUser;
use crate::auth::permissions::require_permission;
use crate::auth::user_auth::user_auth_middleware;
use crate::db;
use crate::db::logs::{PaymentLogEntry, WorkflowLogEntry};
use crate::db::memberships::MembershipRow;
use crate::error::db_err;
use crate::payments::{self, OfflinePaymentRequest};
use crate::state::AppState;
use crate::validation::normalize_currency;
use crate::workflow;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/memberships/staff/applications", get(list_applications))
        .route("/memberships/staff/applications/{uuid}", get(get_application))
        .route(
            "/memberships/staff/applications/{uuid}/transition",
            post(transition_application),
        )
        .route(
            "/memberships/staff/applications/{uuid}/logs",
            get(application_logs),
        )
        .route(
            "/memberships/staff/applications/{uuid}/payments",
            get(application_payments),
        )
        .route(
            "/memberships/staff/applications/{uuid}/offline-payment",
            post(record_offline_payment),
        )
        .route("/memberships/staff/payments/{uuid}/confirm", post(confirm_payment))
        .route("/memberships/staff/payments/{uuid}/logs", get(payment_logs))
        .route("/memberships/staff/annual-payments", post(annual_payments))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationQuery {
    /// Workflow status code filter
    pub status: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Target workflow status code
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnnualPaymentsRequest {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnnualPaymentsResponse {
    pub year: i32,
    pub created: usize,
}

/// Parse a status code from a request
fn parse_status(code: &str, field: &'static str) -> Result<WorkflowStatus, AppError> {
    WorkflowStatus::from_code(code.trim()).ok_or_else(|| {
        AppError::with_message(ErrorCode::StatusNotFound, format!("Unknown status: {code}"))
            .with_detail(field, serde_json::json!(["Unknown workflow status code."]))
    })
}

async fn load_membership(state: &AppState, uuid: Uuid) -> Result<MembershipRow, AppError> {
    db::memberships::find_by_uuid(&state.pool, uuid)
        .await
        .map_err(db_err("DB error loading membership"))?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))
}

/// GET /memberships/staff/applications
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ApplicationQuery>,
) -> ApiResult<Page<MembershipSummary>> {
    require_permission(&state.pool, &current, Permission::ViewMemberships).await?;

    let status = match query.status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(code) => Some(parse_status(code, "status")?),
        None => None,
    };
    let paging = PageQuery {
        page: query.page,
        page_size: query.page_size,
    };
    let code = status.map(|s| s.code());

    let rows = db::memberships::list(&state.pool, code, paging.page_size(), paging.offset())
        .await
        .map_err(db_err("DB error listing memberships"))?;
    let count = db::memberships::count(&state.pool, code)
        .await
        .map_err(db_err("DB error counting memberships"))?;

    Ok(ApiResponse::success(Page {
        count,
        page: paging.page(),
        page_size: paging.page_size(),
        results: rows.into_iter().map(MembershipSummary::from).collect(),
    }))
}

/// GET /memberships/staff/applications/{uuid}
pub async fn get_application(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
) -> ApiResult<MembershipView> {
    require_permission(&state.pool, &current, Permission::ViewMemberships).await?;
    let row = load_membership(&state, uuid).await?;
    let view = membership_view(&state.pool, &state.cipher, row, true).await?;
    Ok(ApiResponse::success(view))
}

/// POST /memberships/staff/applications/{uuid}/transition
pub async fn transition_application(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<MembershipView> {
    require_permission(&state.pool, &current, Permission::ReviewMemberships).await?;
    let target = parse_status(&req.status, "status")?;
    let row = load_membership(&state, uuid).await?;

    let outcome = workflow::transition(
        &state.pool,
        row.id,
        target,
        req.reason.as_deref(),
        current.actor(),
    )
    .await?;

    let message = if outcome.changed {
        "Membership status updated."
    } else {
        "Membership status unchanged."
    };
    let row = load_membership(&state, uuid).await?;
    let view = membership_view(&state.pool, &state.cipher, row, true).await?;
    Ok(ApiResponse::success_with_message(message, view))
}

/// GET /memberships/staff/applications/{uuid}/logs
pub async fn application_logs(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
) -> ApiResult<Vec<WorkflowLogEntry>> {
    require_permission(&state.pool, &current, Permission::ViewMemberships).await?;
    let row = load_membership(&state, uuid).await?;
    let logs = db::logs::list_workflow_logs(&state.pool, row.id)
        .await
        .map_err(db_err("DB error listing workflow logs"))?;
    Ok(ApiResponse::success(logs))
}

/// GET /memberships/staff/applications/{uuid}/payments
pub async fn application_payments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
) -> ApiResult<Vec<StaffPaymentView>> {
    require_permission(&state.pool, &current, Permission::ViewMemberships).await?;
    let row = load_membership(&state, uuid).await?;
    let payments = db::payments::list_for_membership(&state.pool, row.id)
        .await
        .map_err(db_err("DB error listing payments"))?;
    Ok(ApiResponse::success(
        payments.into_iter().map(StaffPaymentView::from).collect(),
    ))
}

/// POST /memberships/staff/applications/{uuid}/offline-payment
pub async fn record_offline_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<OfflinePaymentRequest>,
) -> Result<(StatusCode, ApiResponse<PaymentView>), AppError> {
    require_permission(&state.pool, &current, Permission::ConfirmPayments).await?;
    let row = load_membership(&state, uuid).await?;
    let payment = payments::create_offline(&state, &row, &req, current.actor()).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message(
            "Offline payment recorded (pending).",
            PaymentView::from(payment),
        ),
    ))
}

/// POST /memberships/staff/payments/{uuid}/confirm
pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
) -> ApiResult<PaymentView> {
    require_permission(&state.pool, &current, Permission::ConfirmPayments).await?;
    let payment = payments::confirm_offline(&state.pool, uuid, current.actor()).await?;
    tracing::info!(payment_id = payment.id, actor = current.user_id, "Offline payment confirmed");
    Ok(ApiResponse::success_with_message(
        "Payment confirmed.",
        PaymentView::from(payment),
    ))
}

/// GET /memberships/staff/payments/{uuid}/logs
pub async fn payment_logs(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
) -> ApiResult<Vec<PaymentLogEntry>> {
    require_permission(&state.pool, &current, Permission::ViewMemberships).await?;
    let payment = db::payments::find_by_uuid(&state.pool, uuid)
        .await
        .map_err(db_err("DB error loading payment"))?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    let logs = db::logs::list_payment_logs(&state.pool, payment.id)
        .await
        .map_err(db_err("DB error listing payment logs"))?;
    Ok(ApiResponse::success(logs))
}

/// POST /memberships/staff/annual-payments
pub async fn annual_payments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<AnnualPaymentsRequest>,
) -> ApiResult<AnnualPaymentsResponse> {
    require_permission(&state.pool, &current, Permission::GenerateAnnualPayments).await?;
    let year = req.year.unwrap_or_else(current_year);
    let currency = normalize_currency(req.currency.as_deref(), &state.config.default_currency)?;

    let created = payments::generate_annual(&state.pool, year, &currency, current.actor()).await?;
    Ok(ApiResponse::success_with_message(
        format!("Generated {created} payment(s) for {year}."),
        AnnualPaymentsResponse { year, created },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_status_codes_parse() {
        for status in WorkflowStatus::ALL {
            assert_eq!(parse_status(status.code(), "status").unwrap(), status);
        }
        assert_eq!(
            parse_status(&format!(" {} ", WorkflowStatus::Approved.code()), "status").unwrap(),
            WorkflowStatus::Approved
        );
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        let err = parse_status("99", "status").unwrap_err();
        assert_eq!(err.code, ErrorCode::StatusNotFound);
        assert!(err.details.unwrap().contains_key("status"));
    }

    #[test]
    fn annual_request_defaults() {
        let req: AnnualPaymentsRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(req.year, None);
        assert_eq!(req.currency, None);
    }
}
