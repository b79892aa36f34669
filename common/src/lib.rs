// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three board columns a task can live in.
///
/// The wire and column representation is kebab-case (`todo`, `in-progress`,
/// `done`), which is also the id of the matching droppable column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Column order on the board.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known enum names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value: {0:?}")]
pub struct UnknownVariant(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Member,
}

/// A person who can own, be assigned to, or comment on tasks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Membership of a user in a project, with the user joined in when known.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role: UserRole,
    pub user: Option<User>,
}

/// A comment on a task. Comments are append-only and ordered by `created_at`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub task_id: i64,
    /// Cleared when the author's account is removed.
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub author: Option<User>,
}

/// Metadata of a file attached to a task. The file itself lives elsewhere.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Attachment {
    pub id: i64,
    pub filename: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub task_id: i64,
    pub uploaded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Represents a task on the board.
///
/// `assignee_id` and `assignee` are either both set or both absent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub project_id: i64,
    pub assignee_id: Option<i64>,
    // Only the calendar day matters for due dates.
    pub due_date: Option<NaiveDate>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assignee: Option<User>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Task {
    /// Advances `updated_at` to `now` without ever moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Body of a task creation request.
/// Missing status and priority fall back to `todo` and `medium`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateTaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub project_id: i64,
    pub assignee_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub created_by: i64,
}

/// Full replacement of a task's editable fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpdateTaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
}

impl From<&Task> for UpdateTaskPayload {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            assignee_id: task.assignee_id,
            due_date: task.due_date,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct UpdateStatusPayload {
    pub status: TaskStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateCommentPayload {
    pub content: String,
    pub author_id: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateAttachmentPayload {
    pub filename: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub uploaded_by: Option<i64>,
}

/// Response body for creations that only report the new row id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CreatedId {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert!("doing".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_unknown_variant_message() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err, UnknownVariant("urgent".to_string()));
        assert_eq!(err.to_string(), "unknown value: \"urgent\"");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(UserRole::default(), UserRole::Member);
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let later = Utc::now();
        let earlier = later - chrono::Duration::minutes(5);
        let mut task = Task {
            id: 1,
            title: "Write docs".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Low,
            project_id: 1,
            assignee_id: None,
            due_date: None,
            created_by: 1,
            created_at: earlier,
            updated_at: later,
            assignee: None,
            comments: Vec::new(),
            attachments: Vec::new(),
        };

        task.touch(earlier);
        assert_eq!(task.updated_at, later);

        let newest = later + chrono::Duration::seconds(1);
        task.touch(newest);
        assert_eq!(task.updated_at, newest);
    }

    #[test]
    fn test_task_deserializes_without_collections() {
        let json = r#"{
            "id": 7, "title": "T", "description": null, "status": "done",
            "priority": "high", "project_id": 1, "assignee_id": null,
            "due_date": "2024-01-15", "created_by": 1,
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z",
            "assignee": null
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.comments.is_empty());
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }
}
