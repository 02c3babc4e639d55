//! Notification templates
//!
//! Plain-text subject and body for each notification the services send.

use chrono::NaiveDate;
use nc_core::types::LeaveStatus;
use nc_models::{LeaveRequest, Task, User, WorkLog};

const PREFIX: &str = "[NC Ops]";

/// Rendered subject and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub subject: String,
    pub body: String,
}

fn date_or_dash(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn task_assigned(task: &Task, assignee: &User, assigned_by: &User) -> Rendered {
    let mut body = format!(
        "Hello {},\n\n{} assigned you a task.\n\nTitle: {}\nStatus: {}\nStart: {}\nEnd: {}\n",
        assignee.display_name(),
        assigned_by.display_name(),
        task.title,
        task.status,
        date_or_dash(task.start_date),
        date_or_dash(task.end_date),
    );
    if !task.description.trim().is_empty() {
        body.push_str(&format!("\n{}\n", task.description.trim()));
    }

    Rendered {
        subject: format!("{PREFIX} Task assigned: {}", task.title),
        body,
    }
}

pub fn work_log_submitted(author: &User, log: &WorkLog, task: Option<&Task>) -> Rendered {
    let mut body = format!(
        "{} submitted a work log for {}.\n\nActivity: {}\n\n{}\n",
        author.display_name(),
        log.date,
        log.kind().as_str(),
        log.detail,
    );
    if let Some(summary) = log.details.summary() {
        body.push_str(&format!("\n{summary}\n"));
    }
    if let Some(task) = task {
        body.push_str(&format!("\nTask: {}", task.title));
        if let Some(status) = log.status_update {
            body.push_str(&format!(" (status set to {status})"));
        }
        body.push('\n');
    }

    Rendered {
        subject: format!("{PREFIX} Daily log: {} - {}", author.display_name(), log.date),
        body,
    }
}

pub fn leave_applied(applicant: &User, request: &LeaveRequest) -> Rendered {
    Rendered {
        subject: format!(
            "{PREFIX} Leave request: {} ({}, {} days)",
            applicant.display_name(),
            request.leave_type,
            request.days
        ),
        body: format!(
            "{} applied for {} from {} to {} ({} days).\n\nReason: {}\n\nThe request is waiting for a decision.\n",
            applicant.display_name(),
            request.leave_type,
            request.start_date,
            request.end_date,
            request.days,
            request.reason,
        ),
    }
}

pub fn leave_decided(applicant: &User, request: &LeaveRequest, decided_by: &User) -> Rendered {
    let verdict = match request.status {
        LeaveStatus::Approved => "approved",
        LeaveStatus::Rejected => "rejected",
        LeaveStatus::Pending => "updated",
    };

    let mut body = format!(
        "Hello {},\n\nYour {} request from {} to {} ({} days) was {} by {}.\n",
        applicant.display_name(),
        request.leave_type,
        request.start_date,
        request.end_date,
        request.days,
        verdict,
        decided_by.display_name(),
    );
    if let Some(reason) = &request.rejection_reason {
        body.push_str(&format!("\nReason: {reason}\n"));
    }
    if request.override_balance {
        body.push_str("\nApproved beyond the remaining balance.\n");
    }

    Rendered {
        subject: format!(
            "{PREFIX} Leave {verdict}: {} to {}",
            request.start_date, request.end_date
        ),
        body,
    }
}

pub fn ai_task_review(name: &str, date: NaiveDate, review: &str) -> Rendered {
    Rendered {
        subject: format!("[AI Task Review] {name} – {date}"),
        body: review.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_core::types::{LeaveType, Role};
    use nc_models::NewLeaveRequest;

    fn user(email: &str, role: Role) -> User {
        User::new(email, "", role)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_task_assigned() {
        let task = Task {
            title: "Prepare district report".into(),
            end_date: Some(date(20)),
            ..Default::default()
        };
        let rendered = task_assigned(
            &task,
            &user("ravi_kumar@example.org", Role::Management),
            &user("asha@example.org", Role::Nc),
        );

        assert_eq!(rendered.subject, "[NC Ops] Task assigned: Prepare district report");
        assert!(rendered.body.contains("Hello Ravi Kumar"));
        assert!(rendered.body.contains("End: 2024-05-20"));
        assert!(rendered.body.contains("Start: -"));
    }

    #[test]
    fn test_leave_decided_rejected() {
        let mut request = NewLeaveRequest {
            leave_type: LeaveType::Sick,
            start_date: date(6),
            end_date: date(7),
            reason: "Fever".into(),
        }
        .into_request(3);
        request.status = LeaveStatus::Rejected;
        request.rejection_reason = Some("Field visit scheduled".into());

        let rendered = leave_decided(
            &user("ravi@example.org", Role::Management),
            &request,
            &user("asha@example.org", Role::Nc),
        );
        assert_eq!(rendered.subject, "[NC Ops] Leave rejected: 2024-05-06 to 2024-05-07");
        assert!(rendered.body.contains("Sick Leave"));
        assert!(rendered.body.contains("(2 days)"));
        assert!(rendered.body.contains("Reason: Field visit scheduled"));
    }

    #[test]
    fn test_ai_task_review_subject() {
        let rendered = ai_task_review("Ravi Kumar", date(3), "All good");
        assert_eq!(rendered.subject, "[AI Task Review] Ravi Kumar – 2024-05-03");
        assert_eq!(rendered.body, "All good");
    }
}
