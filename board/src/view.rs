// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::{Task, TaskStatus};
use serde::Serialize;

/// Case-insensitive substring match over title and description.
/// An empty query matches every task.
pub fn matches_query(task: &Task, query: &str) -> bool {
    let needle = query.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
}

/// `round(100 * done / total)`, or 0 for an empty board.
pub fn completion_percentage(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let done = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
    (100.0 * done as f64 / tasks.len() as f64).round() as u8
}

/// The board split into its three columns.
///
/// Every task that passed the search filter is in exactly one column, and
/// each column keeps the order of the underlying task list.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Columns<'a> {
    pub todo: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
}

impl<'a> Columns<'a> {
    pub fn partition(tasks: &'a [Task], query: &str) -> Self {
        let mut columns = Self::default();
        for task in tasks.iter().filter(|t| matches_query(t, query)) {
            match task.status {
                TaskStatus::Todo => columns.todo.push(task),
                TaskStatus::InProgress => columns.in_progress.push(task),
                TaskStatus::Done => columns.done.push(task),
            }
        }
        columns
    }

    pub fn get(&self, status: TaskStatus) -> &[&'a Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn titles(&self, status: TaskStatus) -> Vec<&'a str> {
        self.get(status).iter().map(|t| t.title.as_str()).collect()
    }
}

/// Column counts for display plus overall progress.
///
/// Counts follow the search filter; `total` and `completion_percentage`
/// always cover the whole board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    pub total: usize,
    pub completion_percentage: u8,
}

impl BoardSummary {
    pub fn new(tasks: &[Task], query: &str) -> Self {
        let columns = Columns::partition(tasks, query);
        Self {
            todo: columns.todo.len(),
            in_progress: columns.in_progress.len(),
            done: columns.done.len(),
            total: tasks.len(),
            completion_percentage: completion_percentage(tasks),
        }
    }
}
