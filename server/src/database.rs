// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use common::{
    Attachment, Comment, CreateAttachmentPayload, CreateTaskPayload, Priority, ProjectMember, Task,
    TaskStatus, UpdateTaskPayload, User, UserRole,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::{debug, info};

/// Table definitions, in dependency order. Every statement is idempotent.
const SCHEMA: [(&str, &str); 6] = [
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            avatar_url TEXT NULL,
            role TEXT NOT NULL DEFAULT 'member',
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ),
    (
        "projects",
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NULL,
            created_by INTEGER NULL REFERENCES users(id),
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ),
    (
        "project_members",
        r#"
        CREATE TABLE IF NOT EXISTS project_members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role TEXT NOT NULL DEFAULT 'member',
            UNIQUE(project_id, user_id)
        );
        "#,
    ),
    (
        "tasks",
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NULL,
            status TEXT NOT NULL DEFAULT 'todo' CHECK (status IN ('todo', 'in-progress', 'done')),
            priority TEXT NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            assignee_id INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
            due_date DATE NULL,
            created_by INTEGER NOT NULL REFERENCES users(id),
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        );
        "#,
    ),
    (
        "comments",
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            author_id INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ),
    (
        "attachments",
        r#"
        CREATE TABLE IF NOT EXISTS attachments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            file_url TEXT NOT NULL,
            file_type TEXT NULL,
            file_size INTEGER NULL,
            task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            uploaded_by INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ),
];

/// Establishes the database connection pool.
/// If the database does not exist, it creates it.
/// It also makes sure every table exists.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if database_url.contains(":memory:") {
        return establish_in_memory_pool().await;
    }

    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    initialize_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection pool over a private in-memory database, schema included.
/// The connection is never recycled, since closing it drops the data.
pub async fn establish_in_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("Failed to open in-memory database")?;
    initialize_schema(&pool).await?;
    Ok(pool)
}

/// Creates the tables that do not exist yet.
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    for (table, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create '{}' table", table))?;
    }
    info!("Database schema is ready.");
    Ok(())
}

/// Checks that the database answers queries.
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("Database did not answer")?;
    Ok(())
}

/// Fills an empty database with demo users, a project, tasks and comments.
/// Returns false without touching anything when users already exist.
pub async fn seed_initial_data(pool: &SqlitePool) -> Result<bool> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    if user_count > 0 {
        debug!("Database already holds {} users, skipping seed.", user_count);
        return Ok(false);
    }

    info!("Seeding initial data...");
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to start seed transaction")?;

    let users = [
        ("Alice Johnson", "alice@example.com", UserRole::Admin),
        ("Bob Smith", "bob@example.com", UserRole::Member),
        ("Carol Davis", "carol@example.com", UserRole::Member),
        ("David Wilson", "david@example.com", UserRole::Member),
    ];
    let mut user_ids = Vec::with_capacity(users.len());
    for (name, email, role) in users {
        let id = sqlx::query(
            "INSERT INTO users (name, email, avatar_url, role, created_at) VALUES (?, ?, NULL, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to seed users")?
        .last_insert_rowid();
        user_ids.push(id);
    }
    let (alice, bob, carol, david) = (user_ids[0], user_ids[1], user_ids[2], user_ids[3]);

    let project_id = sqlx::query(
        "INSERT INTO projects (name, description, created_by, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind("Project Alpha")
    .bind("Main development project for the new application")
    .bind(alice)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to seed project")?
    .last_insert_rowid();

    for &user_id in &user_ids {
        let role = if user_id == alice { UserRole::Admin } else { UserRole::Member };
        sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES (?, ?, ?)")
            .bind(project_id)
            .bind(user_id)
            .bind(role)
            .execute(&mut *tx)
            .await
            .context("Failed to seed project members")?;
    }

    let tasks = [
        ("Design System Setup", "Create a comprehensive design system for the project", TaskStatus::Todo, Priority::High, alice, NaiveDate::from_ymd_opt(2024, 1, 15)),
        ("API Integration", "Integrate with third-party APIs for data synchronization", TaskStatus::InProgress, Priority::Medium, bob, NaiveDate::from_ymd_opt(2024, 1, 20)),
        ("User Authentication", "Implement secure user authentication system", TaskStatus::Done, Priority::High, carol, None),
        ("Database Migration", "Set up and migrate database schema", TaskStatus::Todo, Priority::Medium, david, NaiveDate::from_ymd_opt(2024, 1, 18)),
        ("Frontend Components", "Build reusable UI components", TaskStatus::InProgress, Priority::Low, bob, NaiveDate::from_ymd_opt(2024, 1, 25)),
    ];
    let mut task_ids = Vec::with_capacity(tasks.len());
    for (title, description, status, priority, assignee, due_date) in tasks {
        let id = sqlx::query(
            "INSERT INTO tasks (title, description, status, priority, project_id, assignee_id, due_date, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(description)
        .bind(status)
        .bind(priority)
        .bind(project_id)
        .bind(assignee)
        .bind(due_date)
        .bind(alice)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to seed tasks")?
        .last_insert_rowid();
        task_ids.push(id);
    }

    let comments = [
        ("Started working on the color palette and typography", task_ids[0], alice),
        ("Authentication system is complete and tested", task_ids[2], carol),
        ("Need to review the API documentation first", task_ids[1], bob),
        ("Database schema looks good, ready to proceed", task_ids[3], david),
    ];
    for (content, task_id, author_id) in comments {
        sqlx::query("INSERT INTO comments (content, task_id, author_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(content)
            .bind(task_id)
            .bind(author_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to seed comments")?;
    }

    tx.commit().await.context("Failed to commit seed data")?;
    info!("Database seeded with initial data successfully.");
    Ok(true)
}

/// A task row joined with its (optional) assignee.
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: Priority,
    project_id: i64,
    assignee_id: Option<i64>,
    due_date: Option<NaiveDate>,
    created_by: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
    assignee_avatar: Option<String>,
    assignee_role: Option<UserRole>,
    assignee_created_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let assignee = match (row.assignee_id, row.assignee_name, row.assignee_email) {
            (Some(id), Some(name), Some(email)) => Some(User {
                id,
                name,
                email,
                avatar_url: row.assignee_avatar,
                role: row.assignee_role.unwrap_or_default(),
                created_at: row.assignee_created_at.unwrap_or(row.created_at),
            }),
            _ => None,
        };
        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            project_id: row.project_id,
            assignee_id: assignee.as_ref().map(|u| u.id),
            due_date: row.due_date,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            assignee,
            comments: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

const TASK_SELECT: &str = r#"
    SELECT
        t.id, t.title, t.description, t.status, t.priority, t.project_id,
        t.assignee_id, t.due_date, t.created_by, t.created_at, t.updated_at,
        u.name AS assignee_name,
        u.email AS assignee_email,
        u.avatar_url AS assignee_avatar,
        u.role AS assignee_role,
        u.created_at AS assignee_created_at
    FROM tasks t
    LEFT JOIN users u ON t.assignee_id = u.id
"#;

/// Retrieves the tasks of a project, newest first, with assignees and
/// attachment metadata. Comments are loaded per task on demand.
pub async fn get_project_tasks(pool: &SqlitePool, project_id: i64) -> Result<Vec<Task>> {
    let rows = sqlx::query_as::<_, TaskRow>(&format!(
        "{} WHERE t.project_id = ? ORDER BY t.created_at DESC, t.id DESC",
        TASK_SELECT
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve project tasks from DB")?;

    let attachments = sqlx::query_as::<_, Attachment>(
        "SELECT a.* FROM attachments a JOIN tasks t ON a.task_id = t.id WHERE t.project_id = ? ORDER BY a.created_at ASC, a.id ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve attachments from DB")?;

    let mut by_task: HashMap<i64, Vec<Attachment>> = HashMap::new();
    for attachment in attachments {
        by_task.entry(attachment.task_id).or_default().push(attachment);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let mut task = Task::from(row);
            task.attachments = by_task.remove(&task.id).unwrap_or_default();
            task
        })
        .collect())
}

pub async fn get_task(pool: &SqlitePool, task_id: i64) -> Result<Option<Task>> {
    let row = sqlx::query_as::<_, TaskRow>(&format!("{} WHERE t.id = ?", TASK_SELECT))
        .bind(task_id)
        .fetch_optional(pool)
        .await
        .context(format!("Failed to retrieve task with ID: {}", task_id))?;
    Ok(row.map(Task::from))
}

pub async fn task_exists(pool: &SqlitePool, task_id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_optional(pool)
        .await
        .context(format!("Failed to look up task with ID: {}", task_id))?;
    Ok(found.is_some())
}

/// Inserts a new task and returns the id assigned by the database.
pub async fn create_task_in_db(pool: &SqlitePool, payload: CreateTaskPayload) -> Result<i64> {
    let status = payload.status.unwrap_or_default();
    let priority = payload.priority.unwrap_or_default();
    let now = Utc::now();

    debug!(
        "Insert values: title={}, status={}, priority={}, project_id={}, assignee_id={:?}, due_date={:?}, created_by={}",
        payload.title, status, priority, payload.project_id, payload.assignee_id, payload.due_date, payload.created_by
    );

    let id = sqlx::query(
        "INSERT INTO tasks (title, description, status, priority, project_id, assignee_id, due_date, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(status)
    .bind(priority)
    .bind(payload.project_id)
    .bind(payload.assignee_id)
    .bind(payload.due_date)
    .bind(payload.created_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to insert task into DB")?
    .last_insert_rowid();

    info!("Inserted task with ID: {}", id);
    Ok(id)
}

/// Returns true if a task was updated, false if no task with the given ID was found.
pub async fn update_task_status_in_db(
    pool: &SqlitePool,
    task_id: i64,
    status: TaskStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(task_id)
        .execute(pool)
        .await
        .context(format!("Failed to update status of task with ID: {}", task_id))?;

    debug!("Task {} status set to {}", task_id, status);
    Ok(result.rows_affected() > 0)
}

/// Overwrites the editable fields of a task.
/// Returns true if a task was updated, false if no task with the given ID was found.
pub async fn update_task_in_db(
    pool: &SqlitePool,
    task_id: i64,
    payload: UpdateTaskPayload,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, assignee_id = ?, due_date = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.status)
    .bind(payload.priority)
    .bind(payload.assignee_id)
    .bind(payload.due_date)
    .bind(Utc::now())
    .bind(task_id)
    .execute(pool)
    .await
    .context(format!("Failed to update task with ID: {}", task_id))?;

    Ok(result.rows_affected() > 0)
}

/// Deletes a task; its comments and attachments go with it.
/// Returns true if a task was deleted, false if no task with the given ID was found.
pub async fn delete_task_in_db(pool: &SqlitePool, task_id: i64) -> Result<bool> {
    debug!("Attempting to delete task with ID: {}", task_id);
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(pool)
        .await
        .context(format!("Failed to delete task with ID: {}", task_id))?;

    let rows_affected = result.rows_affected();
    info!("Deleted {} rows for task ID: {}", rows_affected, task_id);
    Ok(rows_affected > 0)
}

/// A comment row with its author, if the author still exists.
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    content: String,
    task_id: i64,
    author_id: Option<i64>,
    created_at: DateTime<Utc>,
    author_name: Option<String>,
    author_email: Option<String>,
    author_avatar: Option<String>,
    author_role: Option<UserRole>,
    author_created_at: Option<DateTime<Utc>>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        let author = match (row.author_id, row.author_name, row.author_email) {
            (Some(id), Some(name), Some(email)) => Some(User {
                id,
                name,
                email,
                avatar_url: row.author_avatar,
                role: row.author_role.unwrap_or_default(),
                created_at: row.author_created_at.unwrap_or(row.created_at),
            }),
            _ => None,
        };
        Comment {
            id: row.id,
            content: row.content,
            task_id: row.task_id,
            author_id: author.as_ref().map(|u| u.id),
            created_at: row.created_at,
            author,
        }
    }
}

const COMMENT_SELECT: &str = r#"
    SELECT
        c.id, c.content, c.task_id, c.author_id, c.created_at,
        u.name AS author_name,
        u.email AS author_email,
        u.avatar_url AS author_avatar,
        u.role AS author_role,
        u.created_at AS author_created_at
    FROM comments c
    LEFT JOIN users u ON c.author_id = u.id
"#;

/// Comments of a task with their authors, oldest first.
pub async fn get_task_comments(pool: &SqlitePool, task_id: i64) -> Result<Vec<Comment>> {
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "{} WHERE c.task_id = ? ORDER BY c.created_at ASC, c.id ASC",
        COMMENT_SELECT
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await
    .context(format!("Failed to retrieve comments of task with ID: {}", task_id))?;

    Ok(rows.into_iter().map(Comment::from).collect())
}

/// Inserts a comment and returns it as stored, author included.
pub async fn add_comment_in_db(
    pool: &SqlitePool,
    task_id: i64,
    content: &str,
    author_id: i64,
) -> Result<Comment> {
    let id = sqlx::query("INSERT INTO comments (content, task_id, author_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(content)
        .bind(task_id)
        .bind(author_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context(format!("Failed to insert comment for task with ID: {}", task_id))?
        .last_insert_rowid();

    let row = sqlx::query_as::<_, CommentRow>(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
        .bind(id)
        .fetch_one(pool)
        .await
        .context(format!("Failed to read back comment with ID: {}", id))?;

    info!("Comment {} added to task {}", id, task_id);
    Ok(row.into())
}

/// Records attachment metadata for a task.
pub async fn add_attachment_in_db(
    pool: &SqlitePool,
    task_id: i64,
    payload: CreateAttachmentPayload,
) -> Result<Attachment> {
    let created_at = Utc::now();
    let id = sqlx::query(
        "INSERT INTO attachments (filename, file_url, file_type, file_size, task_id, uploaded_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.filename)
    .bind(&payload.file_url)
    .bind(&payload.file_type)
    .bind(payload.file_size)
    .bind(task_id)
    .bind(payload.uploaded_by)
    .bind(created_at)
    .execute(pool)
    .await
    .context(format!("Failed to insert attachment for task with ID: {}", task_id))?
    .last_insert_rowid();

    Ok(Attachment {
        id,
        filename: payload.filename,
        file_url: payload.file_url,
        file_type: payload.file_type,
        file_size: payload.file_size,
        task_id,
        uploaded_by: payload.uploaded_by,
        created_at,
    })
}

pub async fn get_users(pool: &SqlitePool) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT id, name, email, avatar_url, role, created_at FROM users ORDER BY id ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve users from DB")
}

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: i64,
    project_id: i64,
    role: UserRole,
    user_id: i64,
    user_name: String,
    user_email: String,
    user_avatar: Option<String>,
    user_role: UserRole,
    user_created_at: DateTime<Utc>,
}

impl From<MemberRow> for ProjectMember {
    fn from(row: MemberRow) -> Self {
        ProjectMember {
            id: row.id,
            project_id: row.project_id,
            user_id: row.user_id,
            role: row.role,
            user: Some(User {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
                avatar_url: row.user_avatar,
                role: row.user_role,
                created_at: row.user_created_at,
            }),
        }
    }
}

/// Members of a project with their users, in join order.
pub async fn get_project_members(pool: &SqlitePool, project_id: i64) -> Result<Vec<ProjectMember>> {
    let rows = sqlx::query_as::<_, MemberRow>(
        r#"
        SELECT
            m.id, m.project_id, m.role, m.user_id,
            u.name AS user_name,
            u.email AS user_email,
            u.avatar_url AS user_avatar,
            u.role AS user_role,
            u.created_at AS user_created_at
        FROM project_members m
        JOIN users u ON m.user_id = u.id
        WHERE m.project_id = ?
        ORDER BY m.id ASC
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
    .context(format!("Failed to retrieve members of project with ID: {}", project_id))?;

    Ok(rows.into_iter().map(ProjectMember::from).collect())
}
