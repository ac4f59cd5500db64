//! User profile, public directory and user management API

use axum::routing::{get, post};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode, Page};
use shared::models::{Permission, Role};
use shared::util::now_millis;
use uuid::Uuid;

use super::views::{UserPrivateView, UserPublicView, user_private_view, user_public_view};
use super::{ApiResult, PageQuery};
use crate::auth::CurrentUser;
use crate::auth::permissions::require_permission;
use crate::auth::user_auth::user_auth_middleware;
use crate::db;
use crate::db::audit::{AuditAction, AuditEntry, AuditEvent};
use crate::db::roles::RoleRow;
use crate::db::users::UserRow;
use crate::error::db_err;
use crate::state::AppState;
use crate::validation::{MAX_CONTACT_LEN, validate_optional_text};

pub fn router(state: &AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/users/me", get(me).patch(update_me))
        .route("/users/manage", get(list_users))
        .route("/users/manage/{uuid}/promote", post(promote))
        .route("/users/manage/{uuid}/roles", post(assign_roles))
        .route("/users/manage/{uuid}/audit", get(user_audit))
        .route("/users/roles", get(list_roles))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    Router::new()
        .route("/users/public", get(list_public))
        .route("/users/public/{uuid}", get(get_public))
        .merge(authenticated)
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub secondary_mobile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub is_staff: bool,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRolesRequest {
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleView {
    pub uuid: Uuid,
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl From<RoleRow> for RoleView {
    fn from(row: RoleRow) -> Self {
        let permissions = Role::from_name(&row.name)
            .map(|r| r.permissions().to_vec())
            .unwrap_or_default();
        Self {
            uuid: row.uuid,
            name: row.name,
            permissions,
        }
    }
}

/// Requested role names that did not resolve to an active role
fn unknown_roles(requested: &[String], found: &[RoleRow]) -> Vec<String> {
    requested
        .iter()
        .filter(|name| !found.iter().any(|r| r.name.eq_ignore_ascii_case(name.trim())))
        .cloned()
        .collect()
}

async fn resolve_roles(state: &AppState, names: &[String]) -> Result<Vec<RoleRow>, AppError> {
    let found = db::roles::find_by_names(&state.pool, names)
        .await
        .map_err(db_err("DB error resolving roles"))?;
    let unknown = unknown_roles(names, &found);
    if !unknown.is_empty() {
        return Err(AppError::new(ErrorCode::RoleNotFound)
            .with_detail("roles", serde_json::json!(unknown)));
    }
    Ok(found)
}

async fn load_user(state: &AppState, uuid: Uuid) -> Result<UserRow, AppError> {
    db::users::find_by_uuid(&state.pool, uuid)
        .await
        .map_err(db_err("DB error loading user"))?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))
}

// ── Own account ─────────────────────────────────────────────────────

/// GET /users/me
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<UserPrivateView> {
    let user = db::users::find_by_id(&state.pool, current.user_id)
        .await
        .map_err(db_err("DB error loading user"))?
        .ok_or_else(AppError::not_authenticated)?;
    Ok(ApiResponse::success(user_private_view(&state.pool, user).await?))
}

/// PATCH /users/me
///
/// Only the phone numbers on the profile are editable here.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<UserPrivateView> {
    validate_optional_text(&req.mobile, "mobile", MAX_CONTACT_LEN)?;
    validate_optional_text(&req.secondary_mobile, "secondary_mobile", MAX_CONTACT_LEN)?;

    db::profiles::update_mobiles(
        &state.pool,
        current.user_id,
        req.mobile.as_deref().map(str::trim),
        req.secondary_mobile.as_deref().map(str::trim),
        now_millis(),
    )
    .await
    .map_err(db_err("Failed to update profile"))?;

    let user = db::users::find_by_id(&state.pool, current.user_id)
        .await
        .map_err(db_err("DB error loading user"))?
        .ok_or_else(AppError::not_authenticated)?;
    Ok(ApiResponse::success_with_message(
        "Profile updated",
        user_private_view(&state.pool, user).await?,
    ))
}

// ── Public directory ────────────────────────────────────────────────

/// GET /users/public
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<UserPublicView>> {
    let rows = db::users::list_public(&state.pool, query.page_size(), query.offset())
        .await
        .map_err(db_err("DB error listing users"))?;
    let count = db::users::count_public(&state.pool)
        .await
        .map_err(db_err("DB error counting users"))?;

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        results.push(user_public_view(&state.pool, row).await?);
    }
    Ok(ApiResponse::success(Page {
        count,
        page: query.page(),
        page_size: query.page_size(),
        results,
    }))
}

/// GET /users/public/{uuid}
pub async fn get_public(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> ApiResult<UserPublicView> {
    let user = db::users::find_public(&state.pool, uuid)
        .await
        .map_err(db_err("DB error loading user"))?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(ApiResponse::success(user_public_view(&state.pool, user).await?))
}

// ── Management ──────────────────────────────────────────────────────

/// GET /users/manage
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<UserPrivateView>> {
    require_permission(&state.pool, &current, Permission::ViewUsers).await?;

    let rows = db::users::list(&state.pool, query.page_size(), query.offset())
        .await
        .map_err(db_err("DB error listing users"))?;
    let count = db::users::count(&state.pool)
        .await
        .map_err(db_err("DB error counting users"))?;

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        results.push(user_private_view(&state.pool, row).await?);
    }
    Ok(ApiResponse::success(Page {
        count,
        page: query.page(),
        page_size: query.page_size(),
        results,
    }))
}

/// POST /users/manage/{uuid}/promote
pub async fn promote(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<PromoteRequest>,
) -> ApiResult<UserPrivateView> {
    require_permission(&state.pool, &current, Permission::ManageUsers).await?;
    let user = load_user(&state, uuid).await?;

    let roles = match &req.roles {
        Some(names) => {
            require_permission(&state.pool, &current, Permission::ManageRoles).await?;
            Some(resolve_roles(&state, names).await?)
        }
        None => None,
    };

    let now = now_millis();
    let mut tx = state.pool.begin().await.map_err(db_err("Failed to begin transaction"))?;
    db::users::set_staff(&mut tx, user.id, req.is_staff, Some(current.user_id), now)
        .await
        .map_err(db_err("Failed to update staff flag"))?;
    if let Some(roles) = &roles {
        let ids: Vec<i64> = roles.iter().map(|r| r.id).collect();
        db::roles::replace_for_user(&mut tx, user.id, &ids)
            .await
            .map_err(db_err("Failed to assign roles"))?;
    }
    tx.commit().await.map_err(db_err("Failed to commit user update"))?;

    tracing::info!(
        user_id = user.id,
        is_staff = req.is_staff,
        actor = current.user_id,
        "User staff status updated"
    );
    let detail = serde_json::json!({
        "target": user.uuid,
        "is_staff": req.is_staff,
        "roles": roles.as_ref().map(|r| r.iter().map(|r| r.name.clone()).collect::<Vec<_>>()),
    });
    db::audit::record(
        &state.pool,
        AuditEvent::by(current.user_id, user.id, AuditAction::PromoteUser).detail(detail),
    )
    .await;

    let user = load_user(&state, uuid).await?;
    Ok(ApiResponse::success_with_message(
        "User updated.",
        user_private_view(&state.pool, user).await?,
    ))
}

/// POST /users/manage/{uuid}/roles
pub async fn assign_roles(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<AssignRolesRequest>,
) -> ApiResult<UserPrivateView> {
    require_permission(&state.pool, &current, Permission::ManageRoles).await?;
    let user = load_user(&state, uuid).await?;
    let roles = resolve_roles(&state, &req.roles).await?;
    let ids: Vec<i64> = roles.iter().map(|r| r.id).collect();

    let mut tx = state.pool.begin().await.map_err(db_err("Failed to begin transaction"))?;
    db::roles::replace_for_user(&mut tx, user.id, &ids)
        .await
        .map_err(db_err("Failed to assign roles"))?;
    tx.commit().await.map_err(db_err("Failed to commit role assignment"))?;

    let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    tracing::info!(user_id = user.id, roles = ?names, actor = current.user_id, "Roles assigned");
    let detail = serde_json::json!({ "target": user.uuid, "roles": names });
    db::audit::record(
        &state.pool,
        AuditEvent::by(current.user_id, user.id, AuditAction::AssignRoles).detail(detail),
    )
    .await;

    Ok(ApiResponse::success_with_message(
        "Roles assigned.",
        user_private_view(&state.pool, user).await?,
    ))
}

/// GET /users/manage/{uuid}/audit
pub async fn user_audit(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(uuid): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Vec<AuditEntry>> {
    require_permission(&state.pool, &current, Permission::ViewUsers).await?;
    let user = load_user(&state, uuid).await?;
    let entries = db::audit::list_for_user(&state.pool, user.id, query.page_size(), query.offset())
        .await
        .map_err(db_err("DB error listing audit entries"))?;
    Ok(ApiResponse::success(entries))
}

/// GET /users/roles
pub async fn list_roles(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Vec<RoleView>> {
    require_permission(&state.pool, &current, Permission::ManageRoles).await?;
    let roles = db::roles::list(&state.pool)
        .await
        .map_err(db_err("DB error listing roles"))?;
    Ok(ApiResponse::success(
        roles.into_iter().map(RoleView::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str) -> RoleRow {
        RoleRow {
            id: 1,
            uuid: Uuid::nil(),
            name: name.to_string(),
        }
    }

    #[test]
    fn unknown_roles_are_reported() {
        let found = vec![role("Admin")];
        let requested = vec!["admin".to_string(), "Janitor".to_string()];
        assert_eq!(unknown_roles(&requested, &found), vec!["Janitor".to_string()]);
    }

    #[test]
    fn all_roles_known() {
        let found = vec![role("Support"), role("Viewer")];
        let requested = vec![" support ".to_string(), "VIEWER".to_string()];
        assert!(unknown_roles(&requested, &found).is_empty());
    }

    #[test]
    fn role_view_lists_permissions() {
        let view = RoleView::from(role("Viewer"));
        assert_eq!(
            view.permissions,
            vec![Permission::ViewUsers, Permission::ViewMemberships]
        );
        assert!(RoleView::from(role("Legacy")).permissions.is_empty());
    }
}
