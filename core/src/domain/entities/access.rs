//! Role-based access control configuration.

use serde::{Deserialize, Serialize};

use super::account::Role;

/// Capability that can be granted to a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    ManageAccounts,
    ManageAnnouncements,
    ViewQueue,
    ExportQueue,
    ManageAccessControl,
    ViewSystemLogs,
}

/// Permissions granted to one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissions {
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl RolePermissions {
    /// Whether the role holds `permission`; admins hold everything
    pub fn allows(&self, permission: Permission) -> bool {
        self.role == Role::Admin || self.permissions.contains(&permission)
    }

    /// Grants a permission, ignoring duplicates
    pub fn grant(&mut self, permission: Permission) {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
    }

    /// Revokes a permission if held
    pub fn revoke(&mut self, permission: Permission) {
        self.permissions.retain(|p| *p != permission);
    }
}
