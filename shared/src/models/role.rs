//! Roles and permissions
//!
//! Permissions are a closed set. Each seeded role maps to a fixed permission
//! set; a user's effective permissions are the union over their active roles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Coarse-grained permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewUsers,
    ManageUsers,
    ManageRoles,
    ManageProfiles,
    ViewMemberships,
    ReviewMemberships,
    ConfirmPayments,
    GenerateAnnualPayments,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Self::ViewUsers,
        Self::ManageUsers,
        Self::ManageRoles,
        Self::ManageProfiles,
        Self::ViewMemberships,
        Self::ReviewMemberships,
        Self::ConfirmPayments,
        Self::GenerateAnnualPayments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewUsers => "view_users",
            Self::ManageUsers => "manage_users",
            Self::ManageRoles => "manage_roles",
            Self::ManageProfiles => "manage_profiles",
            Self::ViewMemberships => "view_memberships",
            Self::ReviewMemberships => "review_memberships",
            Self::ConfirmPayments => "confirm_payments",
            Self::GenerateAnnualPayments => "generate_annual_payments",
        }
    }
}

/// Seeded role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    Support,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Self::Admin, Self::Manager, Self::Support, Self::Viewer];

    /// Role name as stored in `roles.name`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::Support => "Support",
            Self::Viewer => "Viewer",
        }
    }

    /// Parse a role name (case-insensitive)
    pub fn from_name(s: &str) -> Option<Role> {
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s.trim()))
    }

    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Self::Admin => &Permission::ALL,
            Self::Manager => &[
                ViewUsers,
                ManageUsers,
                ManageRoles,
                ManageProfiles,
                ViewMemberships,
                ReviewMemberships,
                ConfirmPayments,
            ],
            Self::Support => &[ViewUsers, ManageProfiles, ViewMemberships, ConfirmPayments],
            Self::Viewer => &[ViewUsers, ViewMemberships],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Union of the permissions granted by a set of role names.
///
/// Unknown role names grant nothing.
pub fn effective_permissions<'a, I>(role_names: I) -> BTreeSet<Permission>
where
    I: IntoIterator<Item = &'a str>,
{
    role_names
        .into_iter()
        .filter_map(Role::from_name)
        .flat_map(|r| r.permissions().iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_permissions() {
        for p in Permission::ALL {
            assert!(Role::Admin.has_permission(p), "{:?}", p);
        }
    }

    #[test]
    fn viewer_is_read_only() {
        assert!(Role::Viewer.has_permission(Permission::ViewUsers));
        assert!(Role::Viewer.has_permission(Permission::ViewMemberships));
        assert!(!Role::Viewer.has_permission(Permission::ManageUsers));
        assert!(!Role::Viewer.has_permission(Permission::ConfirmPayments));
    }

    #[test]
    fn only_admin_generates_annual_payments() {
        for role in Role::ALL {
            assert_eq!(
                role.has_permission(Permission::GenerateAnnualPayments),
                role == Role::Admin
            );
        }
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Role::from_name("manager"), Some(Role::Manager));
        assert_eq!(Role::from_name(" SUPPORT "), Some(Role::Support));
        assert_eq!(Role::from_name("Owner"), None);
    }

    #[test]
    fn effective_permissions_is_union() {
        let perms = effective_permissions(["Viewer", "Support"]);
        assert!(perms.contains(&Permission::ConfirmPayments));
        assert!(perms.contains(&Permission::ViewUsers));
        assert!(!perms.contains(&Permission::ReviewMemberships));

        let perms = effective_permissions(["Unknown"]);
        assert!(perms.is_empty());
    }

    #[test]
    fn permission_serializes_snake_case() {
        let json = serde_json::to_string(&Permission::ReviewMemberships).unwrap();
        assert_eq!(json, "\"review_memberships\"");
        assert_eq!(Permission::ReviewMemberships.as_str(), "review_memberships");
    }
}
