//! Applicant membership API
//!
//! The caller's own application: two-page submission, payments and the
//! read view with their own PII unmasked.

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use uuid::Uuid;

use super::ApiResult;
use super::views::{MembershipView, PaymentView, membership_view};
use crate::auth::CurrentUser;
use crate::auth::user_auth::user_auth_middleware;
use crate::db;
use crate::db::memberships::MembershipRow;
use crate::error::db_err;
use crate::payments::{self, OfflinePaymentRequest, OnlinePaymentRequest};
use crate::state::AppState;
use crate::workflow::get_or_create;
use crate::workflow::submission::{PageOneForm, PageTwoForm, submit_page_one, submit_page_two};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/memberships", get(list_mine))
        .route("/memberships/my-membership", get(my_membership).post(my_membership))
        .route("/memberships/submit-page1", post(submit_page1))
        .route("/memberships/submit-page2", post(submit_page2))
        .route("/memberships/create-payment", post(create_online_payment))
        .route("/memberships/offline-payment", post(create_offline_payment))
        .route("/memberships/payments", get(list_payments))
        .route("/memberships/{uuid}", get(get_mine))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ))
}

#[derive(Debug, Serialize)]
pub struct PageTwoResponse {
    pub membership: MembershipView,
    pub payment: Option<PaymentView>,
    pub qr_code_url: Option<String>,
    pub payment_amount: Option<Decimal>,
    pub payment_currency: Option<String>,
}

impl PageTwoResponse {
    fn new(membership: MembershipView, payment: Option<PaymentView>) -> Self {
        Self {
            qr_code_url: payment.as_ref().and_then(|p| p.qr_code.clone()),
            payment_amount: payment.as_ref().map(|p| p.amount),
            payment_currency: payment.as_ref().map(|p| p.currency.clone()),
            membership,
            payment,
        }
    }
}

async fn own_view(state: &AppState, row: MembershipRow) -> Result<MembershipView, AppError> {
    Ok(membership_view(&state.pool, &state.cipher, row, true).await?)
}

/// GET /memberships
///
/// An applicant holds at most one membership; the list form is kept for
/// clients that expect a collection.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Vec<MembershipView>> {
    let row = db::memberships::find_by_user(&state.pool, current.user_id)
        .await
        .map_err(db_err("DB error loading membership"))?;
    let mut views = Vec::new();
    if let Some(row) = row {
        views.push(own_view(&state, row).await?);
    }
    Ok(ApiResponse::success(views))
}

/// GET|POST /memberships/my-membership
pub async fn my_membership(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<MembershipView> {
    let row = get_or_create(&state.pool, current.user_id).await?;
    Ok(ApiResponse::success_with_message(
        "Membership retrieved",
        own_view(&state, row).await?,
    ))
}

/// GET /memberships/{uuid}
pub async fn get_mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
) -> ApiResult<MembershipView> {
    let row = db::memberships::find_by_uuid(&state.pool, uuid)
        .await
        .map_err(db_err("DB error loading membership"))?
        .filter(|m| m.is_owned_by(current.user_id))
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;
    Ok(ApiResponse::success(own_view(&state, row).await?))
}

/// POST /memberships/submit-page1
pub async fn submit_page1(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(form): Json<PageOneForm>,
) -> ApiResult<MembershipView> {
    let row = submit_page_one(&state, current.user_id, &form).await?;
    Ok(ApiResponse::success_with_message(
        "Page 1 completed successfully. Please proceed to Page 2.",
        own_view(&state, row).await?,
    ))
}

/// POST /memberships/submit-page2
pub async fn submit_page2(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(form): Json<PageTwoForm>,
) -> ApiResult<PageTwoResponse> {
    let outcome = submit_page_two(&state, current.user_id, &form).await?;
    let membership = own_view(&state, outcome.membership).await?;
    Ok(ApiResponse::success_with_message(
        "Application submitted successfully! Please scan the QR code to complete payment.",
        PageTwoResponse::new(membership, outcome.payment.map(PaymentView::from)),
    ))
}

/// POST /memberships/create-payment
pub async fn create_online_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<OnlinePaymentRequest>,
) -> Result<(StatusCode, ApiResponse<PaymentView>), AppError> {
    let membership = get_or_create(&state.pool, current.user_id).await?;
    let payment = payments::create_online(&state, &membership, &req, current.actor()).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message(
            "Online payment intent created.",
            PaymentView::from(payment),
        ),
    ))
}

/// POST /memberships/offline-payment
pub async fn create_offline_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<OfflinePaymentRequest>,
) -> Result<(StatusCode, ApiResponse<PaymentView>), AppError> {
    let membership = get_or_create(&state.pool, current.user_id).await?;
    let payment = payments::create_offline(&state, &membership, &req, current.actor()).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message(
            "Offline payment recorded (pending).",
            PaymentView::from(payment),
        ),
    ))
}

/// GET /memberships/payments
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Vec<PaymentView>> {
    let membership = get_or_create(&state.pool, current.user_id).await?;
    let rows = db::payments::list_for_membership(&state.pool, membership.id)
        .await
        .map_err(db_err("DB error listing payments"))?;
    Ok(ApiResponse::success_with_message(
        "Payments",
        rows.into_iter().map(PaymentView::from).collect(),
    ))
}
