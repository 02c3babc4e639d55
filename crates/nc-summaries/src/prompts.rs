//! Prompt templates
//!
//! Templates use `{placeholder}` markers filled by [`render`].

use std::collections::HashMap;

use nc_models::{Task, WorkLog};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const DAILY_SUMMARY: &str = "You are a National Coordinator.

Summarize the work done today by {name}.

Logs:
{logs}
";

pub const TASK_AWARE_REVIEW: &str = "You are a National Coordinator reviewing daily execution.

Person: {name}

ASSIGNED TASKS:
{tasks}

TODAY'S WORK LOGS:
{logs}

INSTRUCTIONS:
1. Identify which assigned tasks were worked on today.
2. Describe what was done.
3. Identify assigned tasks NOT worked on today.
4. Mention progress, delays, or risks.

Return under:
- ✅ Worked On Today
- ❌ Not Worked On
- ⚠️ Risks / Follow-ups
";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder pattern"));

/// Replace `{key}` markers; unknown keys are left untouched
pub fn render(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// One line per log; task titles resolved from `tasks` when available
pub fn format_logs(logs: &[WorkLog], tasks: &[Task]) -> String {
    if logs.is_empty() {
        return "(no logs)".to_string();
    }

    logs.iter()
        .map(|log| {
            let mut line = format!("- {} [{}] {}", log.date, log.kind().as_str(), log.detail);
            if let Some(summary) = log.details.summary() {
                line.push_str(&format!(" | {summary}"));
            }
            if let Some(task_id) = log.task_id {
                match tasks.iter().find(|t| t.id == Some(task_id)) {
                    Some(task) => line.push_str(&format!(" | task: {}", task.title)),
                    None => line.push_str(&format!(" | task #{task_id}")),
                }
            }
            if let Some(status) = log.status_update {
                line.push_str(&format!(" | status -> {status}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Title, status and end date of each assigned task
pub fn format_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "(no assigned tasks)".to_string();
    }

    tasks
        .iter()
        .map(|task| {
            let end = task
                .end_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "no end date".to_string());
            format!("- {} | status: {} | end date: {}", task.title, task.status, end)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn daily_summary(name: &str, logs: &[WorkLog], tasks: &[Task]) -> String {
    let values = HashMap::from([
        ("name", name.to_string()),
        ("logs", format_logs(logs, tasks)),
    ]);
    render(DAILY_SUMMARY, &values)
}

pub fn task_aware_review(name: &str, tasks: &[Task], logs: &[WorkLog]) -> String {
    let values = HashMap::from([
        ("name", name.to_string()),
        ("tasks", format_tasks(tasks)),
        ("logs", format_logs(logs, tasks)),
    ]);
    render(TASK_AWARE_REVIEW, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nc_core::types::TaskStatus;
    use nc_models::{CallDetails, WorkLogDetails};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
    }

    fn task(id: i64, title: &str, status: TaskStatus) -> Task {
        Task {
            id: Some(id),
            title: title.into(),
            status,
            end_date: Some(day()),
            ..Default::default()
        }
    }

    fn log(detail: &str, task_id: Option<i64>) -> WorkLog {
        WorkLog {
            id: Some(1),
            date: day(),
            user_id: 2,
            task_id,
            detail: detail.into(),
            details: WorkLogDetails::General,
            status_update: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let values = HashMap::from([("name", "Ravi".to_string())]);
        assert_eq!(render("Hi {name}, {other}", &values), "Hi Ravi, {other}");
    }

    #[test]
    fn test_daily_summary_prompt() {
        let prompt = daily_summary("Ravi Kumar", &[log("Visited block office", None)], &[]);
        assert!(prompt.starts_with("You are a National Coordinator."));
        assert!(prompt.contains("Summarize the work done today by Ravi Kumar."));
        assert!(prompt.contains("- 2024-05-03 [general] Visited block office"));
    }

    #[test]
    fn test_task_aware_prompt() {
        let tasks = vec![
            task(1, "District survey", TaskStatus::Running),
            task(2, "Budget draft", TaskStatus::ToDo),
        ];
        let mut call = log("Called partner", Some(1));
        call.details = WorkLogDetails::Call(CallDetails {
            contact: "Meena".into(),
            organisation: "NGO".into(),
            outcome: "Agreed".into(),
        });
        call.status_update = Some(TaskStatus::Done);

        let prompt = task_aware_review("Ravi Kumar", &tasks, &[call]);
        assert!(prompt.contains("Person: Ravi Kumar"));
        assert!(prompt.contains("- District survey | status: Running | end date: 2024-05-03"));
        assert!(prompt.contains("- Budget draft | status: To Do"));
        assert!(prompt.contains("Call with Meena (NGO): Agreed | task: District survey | status -> Done"));
        assert!(prompt.contains("- ⚠️ Risks / Follow-ups"));
        assert!(!prompt.contains("{tasks}"));
    }

    #[test]
    fn test_empty_sections() {
        assert_eq!(format_logs(&[], &[]), "(no logs)");
        assert_eq!(format_tasks(&[]), "(no assigned tasks)");
    }
}
