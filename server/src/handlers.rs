// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::database;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{
    Attachment, Comment, CreateAttachmentPayload, CreateCommentPayload, CreateTaskPayload,
    CreatedId, ProjectMember, Task, UpdateStatusPayload, UpdateTaskPayload, User,
};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

/// Shared handler state. The pool is absent when the server runs without a
/// database; data routes then answer 503 and clients fall back to demo mode.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pool: Option<SqlitePool>,
}

impl AppState {
    pub fn new(pool: Option<SqlitePool>) -> Self {
        Self { pool }
    }

    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool: Some(pool) }
    }

    fn pool(&self) -> Result<&SqlitePool, AppError> {
        self.pool.as_ref().ok_or_else(|| {
            warn!("Request rejected: no database configured.");
            AppError::new(StatusCode::SERVICE_UNAVAILABLE, "Database not configured.")
        })
    }
}

fn task_not_found(task_id: i64) -> AppError {
    error!("Task with ID {} not found.", task_id);
    AppError::new(
        StatusCode::NOT_FOUND,
        &format!("Task with ID {} not found.", task_id),
    )
}

fn require_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        error!("Validation failed: task title is empty.");
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "Task title cannot be empty.",
        ));
    }
    Ok(())
}

/// Reports whether the database answers.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match &state.pool {
        Some(pool) => match database::ping(pool).await {
            Ok(()) => "connected",
            Err(e) => {
                warn!("Health check failed: {:?}", e);
                "unavailable"
            }
        },
        None => "unavailable",
    };
    Json(serde_json::json!({ "database": database }))
}

/// Handler for listing the tasks of a project.
pub async fn list_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = database::get_project_tasks(state.pool()?, project_id).await?;
    info!(
        "Successfully retrieved {} tasks for project {}.",
        tasks.len(),
        project_id
    );
    Ok(Json(tasks))
}

pub async fn list_project_members(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<ProjectMember>>, AppError> {
    let members = database::get_project_members(state.pool()?, project_id).await?;
    Ok(Json(members))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = database::get_users(state.pool()?).await?;
    Ok(Json(users))
}

/// Handler for creating a new task. Answers with the id the database assigned.
pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<(StatusCode, Json<CreatedId>), AppError> {
    debug!(
        "Received request to create task '{}' in project {}",
        payload.title, payload.project_id
    );
    require_title(&payload.title)?;

    let id = database::create_task_in_db(state.pool()?, payload).await?;
    info!("Task created successfully with ID: {}", id);
    Ok((StatusCode::CREATED, Json(CreatedId { id })))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<StatusCode, AppError> {
    require_title(&payload.title)?;

    if database::update_task_in_db(state.pool()?, task_id, payload).await? {
        info!("Task with ID {} updated.", task_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(task_not_found(task_id))
    }
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<StatusCode, AppError> {
    debug!("Moving task {} to {}", task_id, payload.status);

    if database::update_task_status_in_db(state.pool()?, task_id, payload.status).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(task_not_found(task_id))
    }
}

/// Handler for deleting a task by ID.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete task with ID: {}", task_id);

    if database::delete_task_in_db(state.pool()?, task_id).await? {
        info!("Task with ID {} deleted successfully.", task_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(task_not_found(task_id))
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let comments = database::get_task_comments(state.pool()?, task_id).await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let content = payload.content.trim();
    if content.is_empty() {
        error!("Validation failed: comment on task {} is empty.", task_id);
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "Comment cannot be empty.",
        ));
    }

    let pool = state.pool()?;
    if !database::task_exists(pool, task_id).await? {
        return Err(task_not_found(task_id));
    }
    let comment = database::add_comment_in_db(pool, task_id, content, payload.author_id).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Records attachment metadata. File storage itself lives elsewhere.
pub async fn create_attachment(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(payload): Json<CreateAttachmentPayload>,
) -> Result<(StatusCode, Json<Attachment>), AppError> {
    if payload.filename.trim().is_empty() || payload.file_url.trim().is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "Attachment filename and URL cannot be empty.",
        ));
    }

    let pool = state.pool()?;
    if !database::task_exists(pool, task_id).await? {
        return Err(task_not_found(task_id));
    }
    let attachment = database::add_attachment_in_db(pool, task_id, payload).await?;
    info!("Attachment {} added to task {}", attachment.id, task_id);
    Ok((StatusCode::CREATED, Json(attachment)))
}

// --- Custom Error Handling ---

/// Error returned by handlers, rendered as `{"error": message}`.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
}

impl AppError {
    fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

/// Database failures become a generic 500; the cause is only logged.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal server error: {:?}", err);
        Self {
            code: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
