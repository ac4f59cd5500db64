//! Lookup tables for the application form (public)

use axum::routing::get;
use axum::{Router, extract::State};
use shared::models::StatusView;

use super::ApiResult;
use crate::db;
use crate::db::lookups::{LookupRow, MembershipTypeRow};
use crate::error::db_err;
use crate::state::AppState;
use shared::error::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/memberships/education-levels", get(education_levels))
        .route("/memberships/institutions", get(institutions))
        .route("/memberships/membership-types", get(membership_types))
        .route("/memberships/statuses", get(statuses))
}

/// GET /memberships/education-levels
pub async fn education_levels(State(state): State<AppState>) -> ApiResult<Vec<LookupRow>> {
    let rows = db::lookups::list_education_levels(&state.pool)
        .await
        .map_err(db_err("DB error listing education levels"))?;
    Ok(ApiResponse::success_with_message("Education levels", rows))
}

/// GET /memberships/institutions
pub async fn institutions(State(state): State<AppState>) -> ApiResult<Vec<LookupRow>> {
    let rows = db::lookups::list_institutions(&state.pool)
        .await
        .map_err(db_err("DB error listing institutions"))?;
    Ok(ApiResponse::success_with_message("Institutions", rows))
}

/// GET /memberships/membership-types
pub async fn membership_types(State(state): State<AppState>) -> ApiResult<Vec<MembershipTypeRow>> {
    let rows = db::lookups::list_membership_types(&state.pool)
        .await
        .map_err(db_err("DB error listing membership types"))?;
    Ok(ApiResponse::success_with_message("Membership types", rows))
}

/// GET /memberships/statuses
pub async fn statuses(State(state): State<AppState>) -> ApiResult<Vec<StatusView>> {
    let rows = db::statuses::list(&state.pool)
        .await
        .map_err(db_err("DB error listing statuses"))?;
    Ok(ApiResponse::success_with_message(
        "Statuses",
        rows.into_iter().map(StatusView::from).collect(),
    ))
}
