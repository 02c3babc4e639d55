//! Work log contracts

use chrono::NaiveDate;
use nc_core::error::ValidationErrors;
use nc_models::{Task, WorkLog};

use crate::base::{validate_text, Contract, UserContext, ValidationResult};

/// Contract for submitting a daily work log
pub struct SubmitWorkLogContract<'a, U: UserContext> {
    user: &'a U,
    today: NaiveDate,
    /// Whether the user has approved leave on the log date
    on_leave: bool,
    /// Referenced task, resolved by the service
    task: Option<&'a Task>,
}

impl<'a, U: UserContext> SubmitWorkLogContract<'a, U> {
    pub fn new(user: &'a U, today: NaiveDate, on_leave: bool, task: Option<&'a Task>) -> Self {
        Self {
            user,
            today,
            on_leave,
            task,
        }
    }

    fn validate_task(&self, log: &WorkLog, errors: &mut ValidationErrors) {
        if log.task_id.is_none() {
            if log.status_update.is_some() {
                errors.add("status_update", "requires a task");
            }
            return;
        }
        let Some(task) = self.task else {
            errors.add("task", "does not exist");
            return;
        };
        if !task.is_assigned_to(self.user.id()) {
            errors.add("task", "is not assigned to you");
            return;
        }
        if let Some(status) = log.status_update {
            if status.is_completed() {
                errors.add("status_update", "can't be Completed from a work log");
            } else if task.status.is_completed() {
                errors.add("task", "is already completed");
            }
        }
    }
}

impl<'a, U: UserContext> Contract<WorkLog> for SubmitWorkLogContract<'a, U> {
    fn validate(&self, log: &WorkLog) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if self.user.is_nc() {
            errors.add_base("Only management users submit work logs");
        }
        validate_text("detail", &log.detail, 5000, &mut errors);
        if log.date > self.today {
            errors.add("date", "can't be in the future");
        }
        if self.on_leave {
            errors.add_base(format!("You are on approved leave on {}", log.date));
        }
        self.validate_task(log, &mut errors);

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::testing::MockUser;
    use nc_core::types::TaskStatus;
    use nc_models::{NewWorkLog, WorkLogDetails};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    fn log(task_id: Option<i64>, status: Option<TaskStatus>) -> WorkLog {
        NewWorkLog {
            date: None,
            task_id,
            detail: "Visited two schools".into(),
            details: WorkLogDetails::General,
            status_update: status,
        }
        .into_work_log(2, today())
    }

    fn own_task() -> Task {
        Task {
            id: Some(10),
            title: "School survey".into(),
            assignee_id: 2,
            created_by: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_log() {
        let user = MockUser::management(2);
        let task = own_task();
        let contract = SubmitWorkLogContract::new(&user, today(), false, Some(&task));
        assert!(contract.validate(&log(Some(10), Some(TaskStatus::Running))).is_ok());
    }

    #[test]
    fn test_rejected_on_leave_day() {
        let user = MockUser::management(2);
        let contract = SubmitWorkLogContract::new(&user, today(), true, None);
        let errors = contract.validate(&log(None, None)).unwrap_err();
        assert_eq!(
            errors.base_errors,
            vec!["You are on approved leave on 2024-07-15"]
        );
    }

    #[test]
    fn test_future_date_and_blank_detail() {
        let user = MockUser::management(2);
        let contract = SubmitWorkLogContract::new(&user, today(), false, None);
        let mut l = log(None, None);
        l.date = today().succ_opt().unwrap();
        l.detail = String::new();

        let errors = contract.validate(&l).unwrap_err();
        assert!(errors.has_error("date"));
        assert!(errors.has_error("detail"));
    }

    #[test]
    fn test_cannot_complete_from_log() {
        let user = MockUser::management(2);
        let task = own_task();
        let contract = SubmitWorkLogContract::new(&user, today(), false, Some(&task));
        let errors = contract
            .validate(&log(Some(10), Some(TaskStatus::Completed)))
            .unwrap_err();
        assert!(errors.has_error("status_update"));
    }

    #[test]
    fn test_foreign_task_and_nc_rejected() {
        let other = MockUser::management(3);
        let task = own_task();
        let contract = SubmitWorkLogContract::new(&other, today(), false, Some(&task));
        assert!(contract.validate(&log(Some(10), None)).unwrap_err().has_error("task"));

        let nc = MockUser::nc(1);
        let contract = SubmitWorkLogContract::new(&nc, today(), false, None);
        assert!(contract.validate(&log(None, None)).is_err());
    }
}
