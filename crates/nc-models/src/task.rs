//! Task model
//!
//! Table: tasks
//!
//! Tasks form a tree through the nullable `parent_id`.

use chrono::{DateTime, NaiveDate, Utc};
use nc_core::traits::{Entity, Id, Identifiable, Timestamped};
use nc_core::types::TaskStatus;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Task {
    pub id: Option<Id>,

    #[validate(
        custom = "not_blank",
        length(max = 255, message = "is too long (maximum is 255 characters)")
    )]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub assignee_id: Id,

    pub parent_id: Option<Id>,

    pub status: TaskStatus,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub created_by: Id,

    /// Reporting stakeholders copied on notifications
    #[serde(default)]
    pub stakeholders: Vec<String>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            assignee_id: 0,
            parent_id: None,
            status: TaskStatus::ToDo,
            start_date: None,
            end_date: None,
            created_by: 0,
            stakeholders: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl Identifiable for Task {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Task {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Task {
    const TABLE_NAME: &'static str = "tasks";
    const TYPE_NAME: &'static str = "Task";
}

impl Task {
    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_assigned_to(&self, user_id: Id) -> bool {
        self.assignee_id == user_id
    }

    /// Past its end date and not finished
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_finished() && self.end_date.is_some_and(|end| end < today)
    }
}

/// Task creation parameters
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to the creator
    pub assignee_id: Option<Id>,
    pub parent_id: Option<Id>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub stakeholders: Vec<String>,
}

impl NewTask {
    pub fn into_task(self, created_by: Id) -> Task {
        Task {
            title: self.title.trim().to_string(),
            description: self.description,
            assignee_id: self.assignee_id.unwrap_or(created_by),
            parent_id: self.parent_id,
            start_date: self.start_date,
            end_date: self.end_date,
            created_by,
            stakeholders: self.stakeholders,
            ..Default::default()
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("can't be blank".into());
        return Err(error);
    }
    Ok(())
}

/// A task with its descendants, for tree views
#[derive(Debug, Clone, Serialize)]
pub struct TaskNode {
    #[serde(flatten)]
    pub task: Task,
    pub children: Vec<TaskNode>,
}

impl TaskNode {
    /// Build the subtree rooted at `root` from a flat list of its descendants
    pub fn build(root: Task, descendants: &[Task]) -> Self {
        let root_id = root.id;
        let children = descendants
            .iter()
            .filter(|t| t.parent_id.is_some() && t.parent_id == root_id)
            .map(|child| TaskNode::build(child.clone(), descendants))
            .collect();
        TaskNode {
            task: root,
            children,
        }
    }

    /// Number of nodes including this one
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TaskNode::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
