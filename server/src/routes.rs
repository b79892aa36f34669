// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers::{self, AppState};
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/users", get(handlers::list_users))
        .route("/api/projects/{id}/tasks", get(handlers::list_tasks))
        .route(
            "/api/projects/{id}/members",
            get(handlers::list_project_members),
        )
        .route("/api/tasks", post(handlers::create_task))
        .route(
            "/api/tasks/{id}",
            put(handlers::update_task).delete(handlers::delete_task),
        )
        .route("/api/tasks/{id}/status", patch(handlers::update_task_status))
        .route(
            "/api/tasks/{id}/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/api/tasks/{id}/attachments",
            post(handlers::create_attachment),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
