//! Task contracts

use nc_core::error::ValidationErrors;
use nc_core::types::TaskStatus;
use nc_models::{Task, User};

use crate::base::{validate_attributes, Contract, UserContext, ValidationResult};

/// Contract for creating a task
///
/// The service resolves the assignee and parent before validation; `None`
/// means the referenced record does not exist.
pub struct CreateTaskContract<'a, U: UserContext> {
    user: &'a U,
    assignee: Option<&'a User>,
    parent: Option<&'a Task>,
}

impl<'a, U: UserContext> CreateTaskContract<'a, U> {
    pub fn new(user: &'a U, assignee: Option<&'a User>, parent: Option<&'a Task>) -> Self {
        Self {
            user,
            assignee,
            parent,
        }
    }

    fn validate_assignment(&self, task: &Task, errors: &mut ValidationErrors) {
        if !self.user.is_nc() && task.assignee_id != self.user.id() {
            errors.add_base("Management users can only assign tasks to themselves");
            return;
        }
        match self.assignee {
            None => errors.add("assignee", "does not exist"),
            Some(assignee) if !assignee.active => errors.add("assignee", "is not active"),
            Some(_) => {}
        }
    }

    fn validate_parent(&self, task: &Task, errors: &mut ValidationErrors) {
        if task.parent_id.is_none() {
            return;
        }
        match self.parent {
            None => errors.add("parent", "does not exist"),
            Some(parent) if parent.status.is_completed() => {
                errors.add("parent", "is already completed")
            }
            Some(parent) => {
                if !self.user.is_nc() && !parent.is_assigned_to(self.user.id()) {
                    errors.add("parent", "is not one of your tasks");
                }
            }
        }
    }
}

impl<'a, U: UserContext> Contract<Task> for CreateTaskContract<'a, U> {
    fn validate(&self, task: &Task) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_attributes(task, &mut errors);
        validate_dates(task, &mut errors);
        self.validate_assignment(task, &mut errors);
        self.validate_parent(task, &mut errors);

        errors.into_result()
    }
}

/// Contract for changing the status of an existing task
pub struct UpdateTaskStatusContract<'a, U: UserContext> {
    user: &'a U,
    task: &'a Task,
}

impl<'a, U: UserContext> UpdateTaskStatusContract<'a, U> {
    pub fn new(user: &'a U, task: &'a Task) -> Self {
        Self { user, task }
    }
}

impl<'a, U: UserContext> Contract<TaskStatus> for UpdateTaskStatusContract<'a, U> {
    fn validate(&self, status: &TaskStatus) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if self.user.is_nc() {
            return Ok(());
        }
        if !self.task.is_assigned_to(self.user.id()) {
            errors.add_base("You can only update tasks assigned to you");
        } else if status.is_completed() {
            errors.add("status", "can only be set to Completed by a coordinator");
        } else if self.task.status.is_completed() {
            errors.add("status", "cannot change once the task is completed");
        }

        errors.into_result()
    }
}

/// Contract for the recursive delete
pub struct DeleteTaskContract<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> DeleteTaskContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }
}

impl<'a, U: UserContext> Contract<Task> for DeleteTaskContract<'a, U> {
    fn validate(&self, _task: &Task) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        if !self.user.is_nc() {
            errors.add_base("Only a coordinator can delete tasks");
        }
        errors.into_result()
    }
}

fn validate_dates(task: &Task, errors: &mut ValidationErrors) {
    if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
        if end < start {
            errors.add("end_date", "must not precede the start date");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::testing::MockUser;
    use chrono::NaiveDate;
    use nc_core::types::Role;

    fn user(id: i64, role: Role) -> User {
        let mut u = User::new(format!("u{id}@example.org"), format!("User {id}"), role);
        u.id = Some(id);
        u
    }

    fn task(assignee: i64) -> Task {
        Task {
            title: "Prepare district report".into(),
            assignee_id: assignee,
            created_by: assignee,
            ..Default::default()
        }
    }

    #[test]
    fn test_management_can_self_assign() {
        let actor = MockUser::management(2);
        let assignee = user(2, Role::Management);
        let contract = CreateTaskContract::new(&actor, Some(&assignee), None);
        assert!(contract.validate(&task(2)).is_ok());
    }

    #[test]
    fn test_management_cannot_assign_others() {
        let actor = MockUser::management(2);
        let assignee = user(3, Role::Management);
        let contract = CreateTaskContract::new(&actor, Some(&assignee), None);

        let errors = contract.validate(&task(3)).unwrap_err();
        assert_eq!(
            errors.base_errors,
            vec!["Management users can only assign tasks to themselves"]
        );
    }

    #[test]
    fn test_nc_can_assign_anyone_but_not_inactive() {
        let actor = MockUser::nc(1);
        let mut assignee = user(3, Role::Management);
        let contract = CreateTaskContract::new(&actor, Some(&assignee), None);
        assert!(contract.validate(&task(3)).is_ok());

        assignee.active = false;
        let contract = CreateTaskContract::new(&actor, Some(&assignee), None);
        assert!(contract.validate(&task(3)).unwrap_err().has_error("assignee"));
    }

    #[test]
    fn test_dates_and_title() {
        let actor = MockUser::nc(1);
        let assignee = user(1, Role::Nc);
        let contract = CreateTaskContract::new(&actor, Some(&assignee), None);

        let mut t = task(1);
        t.title = "  ".into();
        t.start_date = NaiveDate::from_ymd_opt(2024, 5, 10);
        t.end_date = NaiveDate::from_ymd_opt(2024, 5, 9);

        let errors = contract.validate(&t).unwrap_err();
        assert_eq!(errors.get("title").unwrap()[0], "can't be blank");
        assert!(errors.has_error("end_date"));
    }

    #[test]
    fn test_missing_parent() {
        let actor = MockUser::nc(1);
        let assignee = user(1, Role::Nc);
        let contract = CreateTaskContract::new(&actor, Some(&assignee), None);

        let mut t = task(1);
        t.parent_id = Some(99);
        assert!(contract.validate(&t).unwrap_err().has_error("parent"));
    }

    #[test]
    fn test_status_update_rules() {
        let worker = MockUser::management(2);
        let own = task(2);
        let contract = UpdateTaskStatusContract::new(&worker, &own);
        assert!(contract.validate(&TaskStatus::Done).is_ok());
        assert!(contract.validate(&TaskStatus::Completed).is_err());

        let other = task(3);
        let contract = UpdateTaskStatusContract::new(&worker, &other);
        assert!(contract.validate(&TaskStatus::Running).is_err());

        let nc = MockUser::nc(1);
        let contract = UpdateTaskStatusContract::new(&nc, &other);
        assert!(contract.validate(&TaskStatus::Completed).is_ok());
    }

    #[test]
    fn test_only_nc_deletes() {
        let t = task(2);
        assert!(DeleteTaskContract::new(&MockUser::management(2)).validate(&t).is_err());
        assert!(DeleteTaskContract::new(&MockUser::nc(1)).validate(&t).is_ok());
    }
}
