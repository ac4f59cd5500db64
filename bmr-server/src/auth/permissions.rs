//! Staff permission checks
//!
//! Permissions are resolved from the database on every check so that role
//! changes and demotions apply immediately, not when the token expires.

use std::collections::BTreeSet;

use shared::error::{AppError, ErrorCode};
use shared::models::{Permission, effective_permissions};
use sqlx::PgPool;

use super::CurrentUser;
use crate::db;
use crate::db::users::UserRow;
use crate::error::ServiceResult;

/// Staff user together with the permissions granted by their roles
#[derive(Debug, Clone)]
pub struct StaffMember {
    pub user: UserRow,
    pub permissions: BTreeSet<Permission>,
}

/// Pure check: the user is staff and holds `required`
pub fn check_permission(
    is_staff: bool,
    permissions: &BTreeSet<Permission>,
    required: Permission,
) -> Result<(), AppError> {
    if !is_staff {
        return Err(AppError::new(ErrorCode::StaffRequired));
    }
    if !permissions.contains(&required) {
        return Err(AppError::permission_denied(format!(
            "Missing permission: {}",
            required.as_str()
        )));
    }
    Ok(())
}

/// Reload the caller and their roles
pub async fn load_staff(pool: &PgPool, current: &CurrentUser) -> ServiceResult<StaffMember> {
    let user = db::users::find_by_id(pool, current.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(AppError::not_authenticated)?;
    let roles = db::roles::for_user(pool, user.id).await?;
    let permissions = effective_permissions(roles.iter().map(|r| r.name.as_str()));
    Ok(StaffMember { user, permissions })
}

/// Load the caller and require staff status plus `required`
pub async fn require_permission(
    pool: &PgPool,
    current: &CurrentUser,
    required: Permission,
) -> ServiceResult<StaffMember> {
    let staff = load_staff(pool, current).await?;
    if let Err(e) = check_permission(staff.user.is_staff, &staff.permissions, required) {
        tracing::warn!(
            user_id = current.user_id,
            username = %current.username,
            token_is_staff = current.is_staff,
            permission = required.as_str(),
            "Permission denied"
        );
        return Err(e.into());
    }
    Ok(staff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Role;

    fn perms(roles: &[Role]) -> BTreeSet<Permission> {
        effective_permissions(roles.iter().map(|r| r.name()))
    }

    #[test]
    fn non_staff_is_refused_even_with_roles() {
        let err = check_permission(false, &perms(&[Role::Admin]), Permission::ViewUsers).unwrap_err();
        assert_eq!(err.code, ErrorCode::StaffRequired);
    }

    #[test]
    fn staff_without_permission_is_denied() {
        let err = check_permission(true, &BTreeSet::new(), Permission::ConfirmPayments).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn admin_role_grants_everything() {
        let admin = perms(&[Role::Admin]);
        for p in Permission::ALL {
            assert!(check_permission(true, &admin, p).is_ok(), "{p:?}");
        }
    }

    #[test]
    fn permissions_union_over_roles() {
        let combined = perms(&[Role::Viewer, Role::Support]);
        for p in Role::Viewer.permissions().iter().chain(Role::Support.permissions()) {
            assert!(check_permission(true, &combined, *p).is_ok());
        }
    }
}
