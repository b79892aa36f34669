// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Form state for the task detail, add-task and comment surfaces.
//!
//! A draft is filled in by the user and only turns into a board mutation once
//! it validates. Drafts never own task state.
use chrono::{NaiveDate, Utc};
use common::{Priority, Task, TaskStatus, User};
use thiserror::Error;

use crate::controller::NewTask;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Task title cannot be empty.")]
    EmptyTitle,
    #[error("Comment cannot be empty.")]
    EmptyComment,
}

fn optional_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Edit form for an existing task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status,
            priority: task.priority,
            assignee_id: task.assignee_id,
            due_date: task.due_date,
        }
    }

    /// The task as it looks with this draft's edits, ready for
    /// `BoardController::update_task`.
    pub fn apply(&self, task: &Task) -> Result<Task, DraftError> {
        let title = optional_text(&self.title).ok_or(DraftError::EmptyTitle)?;
        Ok(Task {
            title,
            description: optional_text(&self.description),
            status: self.status,
            priority: self.priority,
            assignee_id: self.assignee_id,
            // Resolved by the board from its known users.
            assignee: None,
            due_date: self.due_date,
            updated_at: Utc::now(),
            ..task.clone()
        })
    }
}

/// Add-task form. New drafts are assigned to the current user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
}

impl NewTaskDraft {
    pub fn for_user(user: Option<&User>) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            status: TaskStatus::default(),
            priority: Priority::default(),
            assignee_id: user.map(|u| u.id),
            due_date: None,
        }
    }

    pub fn validate(&self) -> Result<NewTask, DraftError> {
        let title = optional_text(&self.title).ok_or(DraftError::EmptyTitle)?;
        Ok(NewTask {
            title,
            description: optional_text(&self.description),
            status: Some(self.status),
            priority: Some(self.priority),
            assignee_id: self.assignee_id,
            due_date: self.due_date,
        })
    }

    /// Clears the form after a successful submit, keeping the default assignee.
    pub fn reset(&mut self, user: Option<&User>) {
        *self = Self::for_user(user);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
}

impl CommentDraft {
    /// Takes the trimmed text out of the draft, leaving it empty.
    pub fn take(&mut self) -> Result<String, DraftError> {
        let text = optional_text(&self.text).ok_or(DraftError::EmptyComment)?;
        self.text.clear();
        Ok(text)
    }
}
