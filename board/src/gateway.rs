// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use common::{Comment, CreateTaskPayload, Task, TaskStatus, UpdateTaskPayload};
use parking_lot::Mutex;

/// Persistence operations the board relies on.
///
/// Every operation may fail because the backing store is unavailable. Failures
/// come back as `Err` values; the board decides what to do with them.
pub trait TaskGateway: Send + Sync + 'static {
    fn load_tasks(&self, project_id: i64) -> impl Future<Output = Result<Vec<Task>>> + Send;

    /// Stores a new task and returns the id assigned by the store.
    fn create_task(&self, payload: CreateTaskPayload) -> impl Future<Output = Result<i64>> + Send;

    fn update_task_status(
        &self,
        task_id: i64,
        status: TaskStatus,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_task(
        &self,
        task_id: i64,
        payload: UpdateTaskPayload,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_task(&self, task_id: i64) -> impl Future<Output = Result<()>> + Send;

    fn add_comment(
        &self,
        task_id: i64,
        content: String,
        author_id: i64,
    ) -> impl Future<Output = Result<Comment>> + Send;

    /// Comments of a task, oldest first.
    fn load_comments(&self, task_id: i64) -> impl Future<Output = Result<Vec<Comment>>> + Send;
}

/// Gateway used when no backing store is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

const OFFLINE: &str = "Database not configured";

impl TaskGateway for OfflineGateway {
    async fn load_tasks(&self, _project_id: i64) -> Result<Vec<Task>> {
        Err(anyhow!(OFFLINE))
    }

    async fn create_task(&self, _payload: CreateTaskPayload) -> Result<i64> {
        Err(anyhow!(OFFLINE))
    }

    async fn update_task_status(&self, _task_id: i64, _status: TaskStatus) -> Result<()> {
        Err(anyhow!(OFFLINE))
    }

    async fn update_task(&self, _task_id: i64, _payload: UpdateTaskPayload) -> Result<()> {
        Err(anyhow!(OFFLINE))
    }

    async fn delete_task(&self, _task_id: i64) -> Result<()> {
        Err(anyhow!(OFFLINE))
    }

    async fn add_comment(&self, _task_id: i64, _content: String, _author_id: i64) -> Result<Comment> {
        Err(anyhow!(OFFLINE))
    }

    async fn load_comments(&self, _task_id: i64) -> Result<Vec<Comment>> {
        Err(anyhow!(OFFLINE))
    }
}

#[derive(Debug)]
struct MemoryStore {
    tasks: Vec<Task>,
    next_task_id: i64,
    next_comment_id: i64,
    available: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_task_id: 1,
            next_comment_id: 1,
            available: true,
        }
    }
}

impl MemoryStore {
    fn task_mut(&mut self, task_id: i64) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| anyhow!("Task with ID {} not found", task_id))
    }
}

/// Process-local store with the same semantics as the SQL gateway.
///
/// Clones share the same underlying store. The store can be switched
/// unavailable to simulate an unreachable database.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Mutex<MemoryStore>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing tasks; new ids continue after the largest one.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_task_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let next_comment_id = tasks
            .iter()
            .flat_map(|t| t.comments.iter().map(|c| c.id))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            inner: Arc::new(Mutex::new(MemoryStore {
                tasks,
                next_task_id,
                next_comment_id,
                available: true,
            })),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }

    /// Snapshot of the stored tasks.
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().tasks.clone()
    }

    pub fn task(&self, task_id: i64) -> Option<Task> {
        self.inner.lock().tasks.iter().find(|t| t.id == task_id).cloned()
    }

    // The lock is never held across an await point.
    fn with_store<T>(&self, f: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
        let mut store = self.inner.lock();
        if !store.available {
            bail!("Backing store unavailable");
        }
        f(&mut store)
    }
}

impl TaskGateway for MemoryGateway {
    async fn load_tasks(&self, project_id: i64) -> Result<Vec<Task>> {
        self.with_store(|store| {
            Ok(store
                .tasks
                .iter()
                .filter(|t| t.project_id == project_id)
                .cloned()
                .collect())
        })
    }

    async fn create_task(&self, payload: CreateTaskPayload) -> Result<i64> {
        self.with_store(|store| {
            let id = store.next_task_id;
            store.next_task_id += 1;
            let now = Utc::now();
            store.tasks.push(Task {
                id,
                title: payload.title,
                description: payload.description,
                status: payload.status.unwrap_or_default(),
                priority: payload.priority.unwrap_or_default(),
                project_id: payload.project_id,
                assignee_id: payload.assignee_id,
                due_date: payload.due_date,
                created_by: payload.created_by,
                created_at: now,
                updated_at: now,
                assignee: None,
                comments: Vec::new(),
                attachments: Vec::new(),
            });
            Ok(id)
        })
    }

    async fn update_task_status(&self, task_id: i64, status: TaskStatus) -> Result<()> {
        self.with_store(|store| {
            let task = store.task_mut(task_id)?;
            task.status = status;
            task.touch(Utc::now());
            Ok(())
        })
    }

    async fn update_task(&self, task_id: i64, payload: UpdateTaskPayload) -> Result<()> {
        self.with_store(|store| {
            let task = store.task_mut(task_id)?;
            task.title = payload.title;
            task.description = payload.description;
            task.status = payload.status;
            task.priority = payload.priority;
            task.assignee_id = payload.assignee_id;
            task.due_date = payload.due_date;
            task.touch(Utc::now());
            Ok(())
        })
    }

    async fn delete_task(&self, task_id: i64) -> Result<()> {
        self.with_store(|store| {
            let before = store.tasks.len();
            store.tasks.retain(|t| t.id != task_id);
            if store.tasks.len() == before {
                bail!("Task with ID {} not found", task_id);
            }
            Ok(())
        })
    }

    async fn add_comment(&self, task_id: i64, content: String, author_id: i64) -> Result<Comment> {
        self.with_store(|store| {
            let id = store.next_comment_id;
            let task = store.task_mut(task_id)?;
            let comment = Comment {
                id,
                content,
                task_id,
                author_id: Some(author_id),
                created_at: Utc::now(),
                author: None,
            };
            task.comments.push(comment.clone());
            store.next_comment_id += 1;
            Ok(comment)
        })
    }

    async fn load_comments(&self, task_id: i64) -> Result<Vec<Comment>> {
        self.with_store(|store| {
            let mut comments = store.task_mut(task_id)?.comments.clone();
            comments.sort_by_key(|c| c.created_at);
            Ok(comments)
        })
    }
}
