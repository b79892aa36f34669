use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{Comment, CreatedId, ProjectMember, Task, TaskStatus, User};
use http_body_util::BodyExt; // For `collect`
use serde_json::{json, Value};
use server::database;
use server::handlers::AppState;
use server::routes::create_router;
use tower::ServiceExt; // For `oneshot`

/// A router over a fresh, seeded in-memory database.
async fn setup_app() -> Router {
    let pool = database::establish_in_memory_pool()
        .await
        .expect("Failed to open in-memory SQLite");
    database::seed_initial_data(&pool)
        .await
        .expect("Failed to seed test DB");
    create_router(AppState::with_pool(pool))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn project_tasks(app: &Router) -> Vec<Task> {
    let (status, body) = send(app, "GET", "/api/projects/1/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_list_seeded_tasks() {
    let app = setup_app().await;
    let tasks = project_tasks(&app).await;

    assert_eq!(tasks.len(), 5);
    let auth = tasks.iter().find(|t| t.title == "User Authentication").unwrap();
    assert_eq!(auth.status, TaskStatus::Done);
    assert_eq!(auth.assignee.as_ref().map(|u| u.name.as_str()), Some("Carol Davis"));
}

#[tokio::test]
async fn test_create_and_list_tasks() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({
            "title": "Write release notes",
            "description": "Summarize the sprint",
            "priority": "high",
            "project_id": 1,
            "assignee_id": 2,
            "due_date": "2024-02-01",
            "created_by": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: CreatedId = serde_json::from_slice(&body).unwrap();

    let tasks = project_tasks(&app).await;
    assert_eq!(tasks.len(), 6);
    let task = tasks.iter().find(|t| t.id == created.id).unwrap();
    assert_eq!(task.title, "Write release notes");
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.assignee_id, Some(2));
}

#[tokio::test]
async fn test_create_task_empty_title() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({ "title": "   ", "project_id": 1, "created_by": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error_response: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error_response["error"], "Task title cannot be empty.");
}

#[tokio::test]
async fn test_update_status_and_task() {
    let app = setup_app().await;

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/tasks/1/status",
        Some(json!({ "status": "in-progress" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/tasks/4",
        Some(json!({
            "title": "Database Migration (phase 1)",
            "description": null,
            "status": "done",
            "priority": "high",
            "assignee_id": null,
            "due_date": null
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let tasks = project_tasks(&app).await;
    let moved = tasks.iter().find(|t| t.id == 1).unwrap();
    assert_eq!(moved.status, TaskStatus::InProgress);
    let edited = tasks.iter().find(|t| t.id == 4).unwrap();
    assert_eq!(edited.title, "Database Migration (phase 1)");
    assert_eq!(edited.status, TaskStatus::Done);
    assert!(edited.assignee.is_none());
}

#[tokio::test]
async fn test_unknown_status_is_rejected() {
    let app = setup_app().await;
    let (status, _) = send(
        &app,
        "PATCH",
        "/api/tasks/1/status",
        Some(json!({ "status": "blocked" })),
    )
    .await;
    assert!(status.is_client_error());

    let tasks = project_tasks(&app).await;
    assert_eq!(tasks.iter().find(|t| t.id == 1).unwrap().status, TaskStatus::Todo);
}

#[tokio::test]
async fn test_delete_task() {
    let app = setup_app().await;

    let (status, _) = send(&app, "DELETE", "/api/tasks/2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let tasks = project_tasks(&app).await;
    assert_eq!(tasks.len(), 4);
    assert!(tasks.iter().all(|t| t.id != 2));

    let (status, body) = send(&app, "DELETE", "/api/tasks/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error_response: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error_response["error"], "Task with ID 2 not found.");
}

#[tokio::test]
async fn test_comments() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/tasks/2/comments",
        Some(json!({ "content": "Docs reviewed", "author_id": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Comment = serde_json::from_slice(&body).unwrap();
    assert_eq!(created.author.as_ref().map(|u| u.name.as_str()), Some("David Wilson"));

    let (status, body) = send(&app, "GET", "/api/tasks/2/comments", None).await;
    assert_eq!(status, StatusCode::OK);
    let comments: Vec<Comment> = serde_json::from_slice(&body).unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].content, "Need to review the API documentation first");
    assert_eq!(comments[1].id, created.id);

    let (status, _) = send(
        &app,
        "POST",
        "/api/tasks/2/comments",
        Some(json!({ "content": "", "author_id": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_attachments_show_up_on_tasks() {
    let app = setup_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/tasks/5/attachments",
        Some(json!({
            "filename": "buttons.fig",
            "file_url": "https://files.example.com/buttons.fig",
            "file_type": "application/octet-stream",
            "file_size": 1024,
            "uploaded_by": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let tasks = project_tasks(&app).await;
    let task = tasks.iter().find(|t| t.id == 5).unwrap();
    assert_eq!(task.attachments.len(), 1);
    assert_eq!(task.attachments[0].filename, "buttons.fig");

    let (status, _) = send(
        &app,
        "POST",
        "/api/tasks/999/attachments",
        Some(json!({ "filename": "a.txt", "file_url": "https://files.example.com/a.txt" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_users_and_members() {
    let app = setup_app().await;

    let (status, body) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    let users: Vec<User> = serde_json::from_slice(&body).unwrap();
    assert_eq!(users.len(), 4);

    let (status, body) = send(&app, "GET", "/api/projects/1/members", None).await;
    assert_eq!(status, StatusCode::OK);
    let members: Vec<ProjectMember> = serde_json::from_slice(&body).unwrap();
    assert_eq!(members.len(), 4);
    assert!(members.iter().all(|m| m.user.is_some()));
}

#[tokio::test]
async fn test_without_database() {
    let app = create_router(AppState::default());

    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["database"], "unavailable");

    let (status, body) = send(&app, "GET", "/api/projects/1/tasks", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let error_response: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error_response["error"], "Database not configured.");
}

#[tokio::test]
async fn test_file_database_is_created_and_reused() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("board.db").display());

    let pool = database::establish_connection_pool(&url).await.unwrap();
    assert!(database::seed_initial_data(&pool).await.unwrap());
    pool.close().await;

    // Reopening keeps the data and does not seed twice.
    let pool = database::establish_connection_pool(&url).await.unwrap();
    assert!(!database::seed_initial_data(&pool).await.unwrap());
    let app = create_router(AppState::with_pool(pool));

    let (_, body) = send(&app, "GET", "/api/health", None).await;
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["database"], "connected");
    assert_eq!(project_tasks(&app).await.len(), 5);
}
