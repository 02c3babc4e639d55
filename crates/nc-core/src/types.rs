//! Common types used throughout NC Ops

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted enum value is unknown
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Convert a config/storage key to a display name ("Casual_Leave" -> "Casual Leave")
pub fn key_to_name(key: &str) -> String {
    key.replace('_', " ")
}

/// Convert a display name to a key ("Casual Leave" -> "Casual_Leave")
pub fn name_to_key(name: &str) -> String {
    name.replace(' ', "_")
}

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// National Coordinator: approver/admin role
    Nc,
    /// Worker role: logs activity and applies for leave
    Management,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Nc => "nc",
            Role::Management => "management",
        }
    }

    pub fn is_nc(&self) -> bool {
        matches!(self, Role::Nc)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nc" => Ok(Role::Nc),
            "management" | "mgmt" => Ok(Role::Management),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

/// Task lifecycle status
///
/// `Done` is set by the assignee when the work is finished; `Completed`
/// closes the task and is what the parent rollup looks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    Running,
    Done,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::Running => "Running",
            TaskStatus::Done => "Done",
            TaskStatus::Completed => "Completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Finished from the assignee's point of view
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(TaskStatus::ToDo),
            "running" | "inprogress" => Ok(TaskStatus::Running),
            "done" => Ok(TaskStatus::Done),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(ParseEnumError::new("task status", s)),
        }
    }
}

/// Leave request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, LeaveStatus::Pending)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(LeaveStatus::Pending),
            "approved" => Ok(LeaveStatus::Approved),
            "rejected" => Ok(LeaveStatus::Rejected),
            _ => Err(ParseEnumError::new("leave status", s)),
        }
    }
}

/// Leave type with a fixed annual quota
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    #[serde(alias = "Casual Leave", alias = "Casual_Leave")]
    Casual,
    #[serde(alias = "Sick Leave", alias = "Sick_Leave")]
    Sick,
    #[serde(alias = "Course Leave", alias = "Course_Leave")]
    Course,
}

impl LeaveType {
    pub const ALL: [LeaveType; 3] = [LeaveType::Casual, LeaveType::Sick, LeaveType::Course];

    /// Storage key
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Casual => "casual",
            LeaveType::Sick => "sick",
            LeaveType::Course => "course",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LeaveType::Casual => "Casual Leave",
            LeaveType::Sick => "Sick Leave",
            LeaveType::Course => "Course Leave",
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for LeaveType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = key_to_name(s.trim()).to_ascii_lowercase();
        let name = name.strip_suffix(" leave").unwrap_or(&name);
        match name {
            "casual" => Ok(LeaveType::Casual),
            "sick" => Ok(LeaveType::Sick),
            "course" => Ok(LeaveType::Course),
            _ => Err(ParseEnumError::new("leave type", s)),
        }
    }
}

/// Kind of activity recorded in a work log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    #[default]
    General,
    Call,
    Meeting,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::General => "general",
            ActivityKind::Call => "call",
            ActivityKind::Meeting => "meeting",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(ActivityKind::General),
            "call" => Ok(ActivityKind::Call),
            "meeting" => Ok(ActivityKind::Meeting),
            _ => Err(ParseEnumError::new("activity kind", s)),
        }
    }
}

/// Inclusive date range (start..=end)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.end >= self.start
    }

    /// Number of calendar days, both ends included
    pub fn days(&self) -> i64 {
        days_between(self.start, self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Inclusive day count between two dates
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_between_inclusive() {
        assert_eq!(days_between(date(2024, 3, 4), date(2024, 3, 4)), 1);
        assert_eq!(days_between(date(2024, 2, 28), date(2024, 3, 1)), 3);
    }

    #[test]
    fn test_date_range_overlap() {
        let a = DateRange::new(date(2024, 5, 1), date(2024, 5, 3));
        let b = DateRange::new(date(2024, 5, 3), date(2024, 5, 6));
        let c = DateRange::new(date(2024, 5, 7), date(2024, 5, 8));

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(b.contains(date(2024, 5, 5)));
        assert!(!DateRange::new(date(2024, 5, 2), date(2024, 5, 1)).is_valid());
    }

    #[test]
    fn test_leave_type_parsing() {
        assert_eq!("casual".parse::<LeaveType>(), Ok(LeaveType::Casual));
        assert_eq!("Casual Leave".parse::<LeaveType>(), Ok(LeaveType::Casual));
        assert_eq!("Course_Leave".parse::<LeaveType>(), Ok(LeaveType::Course));
        assert!("annual".parse::<LeaveType>().is_err());
    }

    #[test]
    fn test_leave_type_serde_aliases() {
        let parsed: LeaveType = serde_json::from_str("\"Sick Leave\"").unwrap();
        assert_eq!(parsed, LeaveType::Sick);
        assert_eq!(serde_json::to_string(&LeaveType::Sick).unwrap(), "\"sick\"");
    }

    #[test]
    fn test_task_status_round_trip_names() {
        assert_eq!("To Do".parse::<TaskStatus>(), Ok(TaskStatus::ToDo));
        assert_eq!("to_do".parse::<TaskStatus>(), Ok(TaskStatus::ToDo));
        assert_eq!(
            serde_json::to_string(&TaskStatus::ToDo).unwrap(),
            "\"To Do\""
        );
        assert!(TaskStatus::Done.is_finished());
        assert!(!TaskStatus::Done.is_completed());
    }

    #[test]
    fn test_key_name_helpers() {
        assert_eq!(key_to_name("Ravi_Kumar"), "Ravi Kumar");
        assert_eq!(name_to_key("Ravi Kumar"), "Ravi_Kumar");
    }
}
