// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{ensure, Result};
use board::TaskGateway;
use common::{Comment, CreateTaskPayload, Task, TaskStatus, UpdateTaskPayload};
use sqlx::SqlitePool;

use crate::database;

/// Board persistence backed by the SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl TaskGateway for SqliteGateway {
    async fn load_tasks(&self, project_id: i64) -> Result<Vec<Task>> {
        database::get_project_tasks(&self.pool, project_id).await
    }

    async fn create_task(&self, payload: CreateTaskPayload) -> Result<i64> {
        database::create_task_in_db(&self.pool, payload).await
    }

    async fn update_task_status(&self, task_id: i64, status: TaskStatus) -> Result<()> {
        let updated = database::update_task_status_in_db(&self.pool, task_id, status).await?;
        ensure!(updated, "Task with ID {} not found", task_id);
        Ok(())
    }

    async fn update_task(&self, task_id: i64, payload: UpdateTaskPayload) -> Result<()> {
        let updated = database::update_task_in_db(&self.pool, task_id, payload).await?;
        ensure!(updated, "Task with ID {} not found", task_id);
        Ok(())
    }

    async fn delete_task(&self, task_id: i64) -> Result<()> {
        let deleted = database::delete_task_in_db(&self.pool, task_id).await?;
        ensure!(deleted, "Task with ID {} not found", task_id);
        Ok(())
    }

    async fn add_comment(&self, task_id: i64, content: String, author_id: i64) -> Result<Comment> {
        ensure!(
            database::task_exists(&self.pool, task_id).await?,
            "Task with ID {} not found",
            task_id
        );
        database::add_comment_in_db(&self.pool, task_id, &content, author_id).await
    }

    async fn load_comments(&self, task_id: i64) -> Result<Vec<Comment>> {
        database::get_task_comments(&self.pool, task_id).await
    }
}
