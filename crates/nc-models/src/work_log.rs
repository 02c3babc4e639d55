//! Work log model
//!
//! Table: work_logs

use chrono::{DateTime, NaiveDate, Utc};
use nc_core::traits::{Entity, Id, Identifiable, Timestamped};
use nc_core::types::{ActivityKind, TaskStatus};
use serde::{Deserialize, Serialize};

/// Daily activity record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkLog {
    pub id: Option<Id>,
    pub date: NaiveDate,
    pub user_id: Id,
    /// Cleared when the referenced task is deleted
    pub task_id: Option<Id>,
    pub detail: String,
    pub details: WorkLogDetails,
    /// Status the submitter moved the task to
    pub status_update: Option<TaskStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identifiable for WorkLog {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for WorkLog {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for WorkLog {
    const TABLE_NAME: &'static str = "work_logs";
    const TYPE_NAME: &'static str = "WorkLog";
}

impl WorkLog {
    pub fn kind(&self) -> ActivityKind {
        self.details.kind()
    }
}

/// Structured fields by activity kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WorkLogDetails {
    #[default]
    General,
    Call(CallDetails),
    Meeting(MeetingDetails),
}

impl WorkLogDetails {
    pub fn kind(&self) -> ActivityKind {
        match self {
            WorkLogDetails::General => ActivityKind::General,
            WorkLogDetails::Call(_) => ActivityKind::Call,
            WorkLogDetails::Meeting(_) => ActivityKind::Meeting,
        }
    }

    /// Metadata stored alongside the kind column; `None` for general logs
    pub fn metadata(&self) -> Option<serde_json::Value> {
        match self {
            WorkLogDetails::General => None,
            WorkLogDetails::Call(call) => serde_json::to_value(call).ok(),
            WorkLogDetails::Meeting(meeting) => serde_json::to_value(meeting).ok(),
        }
    }

    /// Rebuild from the stored kind and metadata
    pub fn from_parts(kind: ActivityKind, metadata: Option<serde_json::Value>) -> Self {
        let metadata = metadata.unwrap_or(serde_json::Value::Null);
        match kind {
            ActivityKind::General => WorkLogDetails::General,
            ActivityKind::Call => {
                WorkLogDetails::Call(serde_json::from_value(metadata).unwrap_or_default())
            }
            ActivityKind::Meeting => {
                WorkLogDetails::Meeting(serde_json::from_value(metadata).unwrap_or_default())
            }
        }
    }

    /// One-line rendering used in prompts and emails
    pub fn summary(&self) -> Option<String> {
        match self {
            WorkLogDetails::General => None,
            WorkLogDetails::Call(c) => Some(format!(
                "Call with {} ({}): {}",
                c.contact, c.organisation, c.outcome
            )),
            WorkLogDetails::Meeting(m) => Some(format!(
                "Meeting at {} with {}: {}",
                m.location,
                m.participants.join(", "),
                m.agenda
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CallDetails {
    pub contact: String,
    pub organisation: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct MeetingDetails {
    pub participants: Vec<String>,
    pub location: String,
    pub agenda: String,
}

/// Submission parameters
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkLog {
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub task_id: Option<Id>,
    pub detail: String,
    #[serde(default)]
    pub details: WorkLogDetails,
    pub status_update: Option<TaskStatus>,
}

impl NewWorkLog {
    pub fn into_work_log(self, user_id: Id, today: NaiveDate) -> WorkLog {
        WorkLog {
            id: None,
            date: self.date.unwrap_or(today),
            user_id,
            task_id: self.task_id,
            detail: self.detail.trim().to_string(),
            details: self.details,
            status_update: self.status_update,
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_round_trip_through_parts() {
        let details = WorkLogDetails::Call(CallDetails {
            contact: "District officer".into(),
            organisation: "DHO".into(),
            outcome: "Agreed on schedule".into(),
        });
        let rebuilt = WorkLogDetails::from_parts(details.kind(), details.metadata());
        assert_eq!(rebuilt, details);
        assert_eq!(WorkLogDetails::General.metadata(), None);
    }

    #[test]
    fn test_details_tagged_json() {
        let json = serde_json::json!({
            "kind": "meeting",
            "participants": ["A", "B"],
            "location": "Office"
        });
        let details: WorkLogDetails = serde_json::from_value(json).unwrap();
        assert_eq!(details.kind(), ActivityKind::Meeting);
        assert_eq!(
            details.summary().unwrap(),
            "Meeting at Office with A, B: "
        );
    }

    #[test]
    fn test_new_work_log_defaults_date() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let new = NewWorkLog {
            date: None,
            task_id: None,
            detail: " visited site ".into(),
            details: WorkLogDetails::General,
            status_update: None,
        };
        let log = new.into_work_log(3, today);
        assert_eq!(log.date, today);
        assert_eq!(log.detail, "visited site");
    }
}
