//! Permission system for NC Ops
//!
//! Two roles, fixed grants: NC coordinates and approves, management users
//! record their own work.

use nc_contracts::UserContext;
use nc_core::error::NcError;
use nc_core::result::NcResult;
use nc_core::traits::Id;
use nc_core::types::Role;
use nc_models::User;
use serde::Serialize;

/// Operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ListUsers,
    DeleteTasks,
    SubmitWorkLogs,
    ApplyLeave,
    DecideLeave,
    ViewAllRecords,
    GenerateSummaries,
    ViewAuditLog,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ListUsers => "list_users",
            Permission::DeleteTasks => "delete_tasks",
            Permission::SubmitWorkLogs => "submit_work_logs",
            Permission::ApplyLeave => "apply_leave",
            Permission::DecideLeave => "decide_leave",
            Permission::ViewAllRecords => "view_all_records",
            Permission::GenerateSummaries => "generate_summaries",
            Permission::ViewAuditLog => "view_audit_log",
        }
    }

    pub fn granted_to(&self, role: Role) -> bool {
        match self {
            Permission::SubmitWorkLogs | Permission::ApplyLeave => role == Role::Management,
            _ => role == Role::Nc,
        }
    }
}

/// The authenticated user of a request
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Id,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn new(id: Id, email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_nc(&self) -> bool {
        self.role.is_nc()
    }

    pub fn allowed(&self, permission: Permission) -> bool {
        permission.granted_to(self.role)
    }

    /// Forbidden unless the role carries `permission`
    pub fn require(&self, permission: Permission) -> NcResult<()> {
        if self.allowed(permission) {
            Ok(())
        } else {
            tracing::debug!(user_id = self.id, permission = permission.as_str(), "Permission denied");
            Err(NcError::forbidden(format!(
                "You are not allowed to {}",
                permission.as_str().replace('_', " ")
            )))
        }
    }

    /// NC sees everyone's records, others only their own
    pub fn can_view_records_of(&self, owner_id: Id) -> bool {
        self.id == owner_id || self.allowed(Permission::ViewAllRecords)
    }

    /// Scope a requested owner filter to what the user may see
    pub fn scope_owner(&self, requested: Option<Id>) -> NcResult<Option<Id>> {
        match requested {
            _ if self.allowed(Permission::ViewAllRecords) => Ok(requested),
            Some(owner) if owner != self.id => Err(NcError::forbidden(
                "You can only view your own records",
            )),
            _ => Ok(Some(self.id)),
        }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self::new(
            user.id.unwrap_or_default(),
            user.email.clone(),
            user.display_name(),
            user.role,
        )
    }
}

impl UserContext for CurrentUser {
    fn id(&self) -> Id {
        self.id
    }

    fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nc() -> CurrentUser {
        CurrentUser::new(1, "nc@example.org", "Coordinator", Role::Nc)
    }

    fn worker() -> CurrentUser {
        CurrentUser::new(2, "worker@example.org", "Worker", Role::Management)
    }

    #[test]
    fn test_role_grants() {
        assert!(nc().allowed(Permission::DecideLeave));
        assert!(nc().allowed(Permission::DeleteTasks));
        assert!(!nc().allowed(Permission::SubmitWorkLogs));

        assert!(worker().allowed(Permission::ApplyLeave));
        assert!(!worker().allowed(Permission::ViewAuditLog));
        assert!(!worker().allowed(Permission::GenerateSummaries));
    }

    #[test]
    fn test_require() {
        let err = worker().require(Permission::DeleteTasks).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(nc().require(Permission::DeleteTasks).is_ok());
    }

    #[test]
    fn test_scope_owner() {
        assert_eq!(nc().scope_owner(None).unwrap(), None);
        assert_eq!(nc().scope_owner(Some(2)).unwrap(), Some(2));
        assert_eq!(worker().scope_owner(None).unwrap(), Some(2));
        assert_eq!(worker().scope_owner(Some(2)).unwrap(), Some(2));
        assert!(worker().scope_owner(Some(3)).is_err());
    }

    #[test]
    fn test_from_user() {
        let mut user = User::new("asha_rao@example.org", "", Role::Management);
        user.id = Some(4);
        let current = CurrentUser::from(&user);
        assert_eq!(current.id, 4);
        assert_eq!(current.name, "Asha Rao");
        assert!(current.can_view_records_of(4));
        assert!(!current.can_view_records_of(5));
    }
}
