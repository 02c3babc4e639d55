//! Prompt filling and LLM calls for one user at a time

use std::sync::Arc;

use nc_core::traits::Id;
use nc_models::{Task, User, WorkLog};
use serde::Serialize;

use crate::llm::{LlmClient, LlmResult};
use crate::prompts;

/// Daily summary of one user's logs
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub user_id: Id,
    pub name: String,
    pub summary: String,
}

/// Task-aware review of one user's day
#[derive(Debug, Clone, Serialize)]
pub struct TaskReview {
    pub user_id: Id,
    pub name: String,
    pub review: String,
    /// Whether the review email went out
    pub emailed: bool,
}

#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn daily_summary(&self, user: &User, logs: &[WorkLog], tasks: &[Task]) -> LlmResult<UserSummary> {
        let name = user.display_name();
        let prompt = prompts::daily_summary(&name, logs, tasks);
        let summary = self.llm.complete(&prompt).await?;

        Ok(UserSummary {
            user_id: user.id.unwrap_or_default(),
            name,
            summary,
        })
    }

    /// Review text; the caller decides about emailing it
    pub async fn task_review(&self, user: &User, tasks: &[Task], logs: &[WorkLog]) -> LlmResult<TaskReview> {
        let name = user.display_name();
        let prompt = prompts::task_aware_review(&name, tasks, logs);
        let review = self.llm.complete(&prompt).await?;

        Ok(TaskReview {
            user_id: user.id.unwrap_or_default(),
            name,
            review,
            emailed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};
    use chrono::NaiveDate;
    use mockall::predicate::*;
    use nc_core::types::Role;
    use nc_models::WorkLogDetails;

    fn user() -> User {
        let mut user = User::new("ravi_kumar@example.org", "", Role::Management);
        user.id = Some(2);
        user
    }

    fn log() -> WorkLog {
        WorkLog {
            id: Some(1),
            date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            user_id: 2,
            task_id: None,
            detail: "Trained field staff".into(),
            details: WorkLogDetails::General,
            status_update: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_daily_summary_uses_completion_verbatim() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .with(function(|prompt: &str| {
                prompt.contains("Ravi Kumar") && prompt.contains("Trained field staff")
            }))
            .times(1)
            .returning(|_| Ok("  Ravi trained staff.\n".to_string()));

        let summarizer = Summarizer::new(Arc::new(llm));
        let summary = summarizer.daily_summary(&user(), &[log()], &[]).await.unwrap();

        assert_eq!(summary.user_id, 2);
        assert_eq!(summary.name, "Ravi Kumar");
        assert_eq!(summary.summary, "  Ravi trained staff.\n");
    }

    #[tokio::test]
    async fn test_task_review_propagates_errors() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .returning(|_| Err(LlmError::Status { code: 429, body: "slow down".into() }));

        let summarizer = Summarizer::new(Arc::new(llm));
        let err = summarizer.task_review(&user(), &[], &[log()]).await.unwrap_err();
        assert!(matches!(err, LlmError::Status { code: 429, .. }));
    }
}
