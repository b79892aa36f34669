// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! The board state controller.
//!
//! The controller owns the task list of one project. Every mutation is
//! applied to the list immediately; when the board is backed by a store the
//! matching gateway call runs as a one-shot background task whose failure is
//! logged and never undoes the local change.
//!
//! Entities created while persisted get a clock-based placeholder id. The
//! background task reports the id chosen by the store through a channel and
//! the controller swaps it in on its next operation. Edits made to a task
//! before its id arrives are replayed against the real id afterwards, and the
//! placeholder keeps resolving to the task for callers still holding it.
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use common::{Comment, CreateTaskPayload, Priority, Task, TaskStatus, UpdateTaskPayload, User};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::gateway::TaskGateway;
use crate::ids::LocalIds;
use crate::seed;
use crate::session::Session;
use crate::view::{BoardSummary, Columns, matches_query};

/// How long `load` waits for the store before switching to demo mode.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_PROJECT_ID: i64 = 1;

/// Whether board changes are being written to a backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Loading,
    Persisted,
    /// Demo mode: the board only lives in memory.
    Unpersisted,
}

/// Fields for a new task. Unset status and priority default to `todo` and
/// `medium`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

// Results reported back by background persistence tasks.
#[derive(Debug)]
enum Confirmation {
    TaskCreated { local_id: i64, id: i64 },
    TaskCreateFailed { local_id: i64 },
    CommentAdded { task_id: i64, local_id: i64, comment: Comment },
}

// A task created locally whose store id has not arrived yet.
#[derive(Debug, Default)]
struct PendingCreate {
    dirty: bool,
    deleted: bool,
    comments: Vec<i64>,
}

pub struct BoardController<G: TaskGateway> {
    gateway: Arc<G>,
    session: Session,
    users: Vec<User>,
    project_id: i64,
    tasks: Vec<Task>,
    query: String,
    persistence: Persistence,
    detail: Option<Task>,
    ids: LocalIds,
    pending: HashMap<i64, PendingCreate>,
    // Placeholder id -> store id, for creates that have been confirmed.
    aliases: HashMap<i64, i64>,
    // Local comment ids the store has not acknowledged yet.
    unconfirmed_comments: HashSet<i64>,
    confirmations_tx: mpsc::UnboundedSender<Confirmation>,
    confirmations_rx: mpsc::UnboundedReceiver<Confirmation>,
    in_flight: Vec<JoinHandle<()>>,
    load_timeout: Duration,
}

impl<G: TaskGateway> BoardController<G> {
    pub fn new(session: Session, gateway: G) -> Self {
        let (confirmations_tx, confirmations_rx) = mpsc::unbounded_channel();
        Self {
            gateway: Arc::new(gateway),
            users: vec![session.user().clone()],
            session,
            project_id: DEFAULT_PROJECT_ID,
            tasks: Vec::new(),
            query: String::new(),
            persistence: Persistence::Loading,
            detail: None,
            ids: LocalIds::new(),
            pending: HashMap::new(),
            aliases: HashMap::new(),
            unconfirmed_comments: HashSet::new(),
            confirmations_tx,
            confirmations_rx,
            in_flight: Vec::new(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn persistence(&self) -> Persistence {
        self.persistence
    }

    pub fn is_persisted(&self) -> bool {
        self.persistence == Persistence::Persisted
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks a task up by its current id or by the placeholder it was
    /// created with.
    pub fn task(&self, task_id: i64) -> Option<&Task> {
        let task_id = self.resolve(task_id);
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Users that tasks may be assigned to.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Loads the project's tasks from the store.
    ///
    /// An empty result, a failing store or no answer within the load timeout
    /// all put the board in demo mode with the onboarding tasks.
    pub async fn load(&mut self, project_id: i64) -> Persistence {
        self.project_id = project_id;
        self.persistence = Persistence::Loading;
        self.detail = None;
        self.pending.clear();
        self.aliases.clear();
        self.unconfirmed_comments.clear();

        let loaded = tokio::time::timeout(self.load_timeout, self.gateway.load_tasks(project_id)).await;
        match loaded {
            Ok(Ok(tasks)) if !tasks.is_empty() => {
                info!("Loaded {} tasks for project {}.", tasks.len(), project_id);
                for user in tasks.iter().filter_map(|t| t.assignee.as_ref()) {
                    if !self.users.iter().any(|u| u.id == user.id) {
                        self.users.push(user.clone());
                    }
                }
                self.tasks = tasks;
                self.persistence = Persistence::Persisted;
            }
            Ok(Ok(_)) => {
                warn!("No stored tasks for project {}, using onboarding tasks.", project_id);
                self.fall_back();
            }
            Ok(Err(e)) => {
                warn!("Failed to load tasks, using onboarding tasks: {:?}", e);
                self.fall_back();
            }
            Err(_) => {
                warn!(
                    "Loading tasks took longer than {:?}, using onboarding tasks.",
                    self.load_timeout
                );
                self.fall_back();
            }
        }
        self.persistence
    }

    fn fall_back(&mut self) {
        self.tasks = seed::onboarding_tasks(self.session.user(), self.project_id, Utc::now());
        self.persistence = Persistence::Unpersisted;
    }

    /// Sets the search query used by `columns` and `summary`.
    pub fn search(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Tasks matching the current search, in list order.
    pub fn filtered(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| matches_query(t, &self.query))
    }

    pub fn columns(&self) -> Columns<'_> {
        Columns::partition(&self.tasks, &self.query)
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary::new(&self.tasks, &self.query)
    }

    pub fn completion_percentage(&self) -> u8 {
        crate::view::completion_percentage(&self.tasks)
    }

    /// Moves a task to another column. Unknown ids are ignored.
    ///
    /// Returns whether the task was found.
    pub fn set_status(&mut self, task_id: i64, status: TaskStatus) -> bool {
        self.apply_confirmations();
        let task_id = self.resolve(task_id);
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            debug!("Ignoring status change for unknown task {}", task_id);
            return false;
        };
        task.status = status;
        task.touch(Utc::now());
        self.refresh_detail(task_id);
        debug!("Task {} moved to {}", task_id, status);

        if self.defer_if_pending(task_id) {
            return true;
        }
        let gateway = Arc::clone(&self.gateway);
        self.persist(async move {
            if let Err(e) = gateway.update_task_status(task_id, status).await {
                error!("Error updating status of task {}: {:?}", task_id, e);
            }
        });
        true
    }

    /// Appends a new task and returns its id.
    pub fn add_task(&mut self, fields: NewTask) -> i64 {
        self.apply_confirmations();
        let now = Utc::now();
        let id = self.ids.next(now);
        let assignee = self.known_user(fields.assignee_id);
        let task = Task {
            id,
            title: fields.title,
            description: fields.description.filter(|d| !d.trim().is_empty()),
            status: fields.status.unwrap_or_default(),
            priority: fields.priority.unwrap_or_default(),
            project_id: self.project_id,
            assignee_id: assignee.as_ref().map(|u| u.id),
            due_date: fields.due_date,
            created_by: self.session.user().id,
            created_at: now,
            updated_at: now,
            assignee,
            comments: Vec::new(),
            attachments: Vec::new(),
        };
        let payload = CreateTaskPayload {
            title: task.title.clone(),
            description: task.description.clone(),
            status: Some(task.status),
            priority: Some(task.priority),
            project_id: task.project_id,
            assignee_id: task.assignee_id,
            due_date: task.due_date,
            created_by: task.created_by,
        };
        self.tasks.push(task);
        info!("Task {} added locally.", id);

        if self.is_persisted() {
            self.pending.insert(id, PendingCreate::default());
            let gateway = Arc::clone(&self.gateway);
            let confirmations = self.confirmations_tx.clone();
            self.persist(async move {
                let confirmation = match gateway.create_task(payload).await {
                    Ok(stored_id) => Confirmation::TaskCreated { local_id: id, id: stored_id },
                    Err(e) => {
                        error!("Error creating task: {:?}", e);
                        Confirmation::TaskCreateFailed { local_id: id }
                    }
                };
                // The receiver only goes away with the controller.
                let _ = confirmations.send(confirmation);
            });
        }
        id
    }

    /// Replaces the task with the same id. Unknown ids are ignored.
    pub fn update_task(&mut self, mut task: Task) -> bool {
        self.apply_confirmations();
        task.id = self.resolve(task.id);
        let task_id = task.id;
        let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            debug!("Ignoring update for unknown task {}", task_id);
            return false;
        };

        task.assignee = self
            .users
            .iter()
            .find(|u| Some(u.id) == task.assignee_id)
            .cloned();
        task.assignee_id = task.assignee.as_ref().map(|u| u.id);
        task.updated_at = slot.updated_at.max(Utc::now());
        let payload = UpdateTaskPayload::from(&task);
        *slot = task;
        self.refresh_detail(task_id);
        info!("Task {} updated.", task_id);

        if self.defer_if_pending(task_id) {
            return true;
        }
        let gateway = Arc::clone(&self.gateway);
        self.persist(async move {
            if let Err(e) = gateway.update_task(task_id, payload).await {
                error!("Error updating task {}: {:?}", task_id, e);
            }
        });
        true
    }

    /// Removes a task, closing its detail view if open.
    pub fn delete_task(&mut self, task_id: i64) -> bool {
        self.apply_confirmations();
        let task_id = self.resolve(task_id);
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != task_id);
        if self.tasks.len() == before {
            debug!("Ignoring deletion of unknown task {}", task_id);
            return false;
        }
        if self.detail.as_ref().is_some_and(|d| d.id == task_id) {
            self.detail = None;
        }
        info!("Task {} deleted.", task_id);

        if let Some(pending) = self.pending.get_mut(&task_id) {
            pending.deleted = true;
            return true;
        }
        let gateway = Arc::clone(&self.gateway);
        self.persist(async move {
            if let Err(e) = gateway.delete_task(task_id).await {
                error!("Error deleting task {}: {:?}", task_id, e);
            }
        });
        true
    }

    /// Appends a comment by `author`. Blank text or an unknown task is a no-op.
    pub fn add_comment(&mut self, task_id: i64, text: &str, author: &User) -> Option<Comment> {
        self.apply_confirmations();
        let task_id = self.resolve(task_id);
        let content = text.trim();
        if content.is_empty() {
            debug!("Ignoring empty comment on task {}", task_id);
            return None;
        }
        let now = Utc::now();
        let local_id = self.ids.next(now);
        let task = self.tasks.iter_mut().find(|t| t.id == task_id)?;
        let comment = Comment {
            id: local_id,
            content: content.to_string(),
            task_id,
            author_id: Some(author.id),
            created_at: now,
            author: Some(author.clone()),
        };
        task.comments.push(comment.clone());
        task.touch(now);
        self.refresh_detail(task_id);
        info!("Comment {} added to task {}.", local_id, task_id);

        if self.is_persisted() {
            self.unconfirmed_comments.insert(local_id);
        }
        if let Some(pending) = self.pending.get_mut(&task_id) {
            pending.comments.push(local_id);
        } else {
            self.persist_comment(task_id, local_id, comment.content.clone(), author.id);
        }
        Some(comment)
    }

    /// The task currently shown in the detail view.
    pub fn detail(&self) -> Option<&Task> {
        self.detail.as_ref()
    }

    /// Opens the detail view for a task.
    ///
    /// When persisted the task's comments are reloaded from the store first;
    /// if that fails the comments already on the task are shown. Comments the
    /// store has not acknowledged yet are kept after the stored ones.
    pub async fn open_detail(&mut self, task_id: i64) -> Option<&Task> {
        self.apply_confirmations();
        let task_id = self.resolve(task_id);
        self.task(task_id)?;

        if self.is_persisted() && !self.pending.contains_key(&task_id) {
            match self.gateway.load_comments(task_id).await {
                Ok(stored) => {
                    // Writes may have finished while the comments loaded.
                    self.apply_confirmations();
                    let unconfirmed = &self.unconfirmed_comments;
                    if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
                        let local = std::mem::take(&mut task.comments);
                        task.comments = merge_comments(stored, local, unconfirmed);
                    }
                }
                Err(e) => warn!("Error loading comments for task {}: {:?}", task_id, e),
            }
        }
        self.detail = self.task(task_id).cloned();
        self.detail.as_ref()
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Waits for every outstanding background write and applies the ids the
    /// store reported.
    pub async fn settle(&mut self) {
        loop {
            self.apply_confirmations();
            let handles = std::mem::take(&mut self.in_flight);
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    error!("Background persistence task failed: {:?}", e);
                }
            }
        }
    }

    /// Number of background writes that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.iter().filter(|h| !h.is_finished()).count()
    }

    fn persist<F>(&mut self, write: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.is_persisted() {
            return;
        }
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(tokio::spawn(write));
    }

    fn persist_comment(&mut self, task_id: i64, local_id: i64, content: String, author_id: i64) {
        let gateway = Arc::clone(&self.gateway);
        let confirmations = self.confirmations_tx.clone();
        self.persist(async move {
            match gateway.add_comment(task_id, content, author_id).await {
                Ok(comment) => {
                    let _ = confirmations.send(Confirmation::CommentAdded {
                        task_id,
                        local_id,
                        comment,
                    });
                }
                Err(e) => error!(
                    "Error adding comment to task {}, keeping it locally: {:?}",
                    task_id, e
                ),
            }
        });
    }

    // Marks a task whose store id is still pending as changed so the edit
    // gets replayed later. Returns true when the write must wait.
    fn defer_if_pending(&mut self, task_id: i64) -> bool {
        match self.pending.get_mut(&task_id) {
            Some(pending) => {
                pending.dirty = true;
                true
            }
            None => false,
        }
    }

    fn resolve(&self, task_id: i64) -> i64 {
        self.aliases.get(&task_id).copied().unwrap_or(task_id)
    }

    fn known_user(&self, user_id: Option<i64>) -> Option<User> {
        let user_id = user_id?;
        let user = self.users.iter().find(|u| u.id == user_id).cloned();
        if user.is_none() {
            debug!("Dropping unknown assignee {}", user_id);
        }
        user
    }

    fn refresh_detail(&mut self, task_id: i64) {
        if self.detail.as_ref().is_some_and(|d| d.id == task_id) {
            self.detail = self.task(task_id).cloned();
        }
    }

    fn apply_confirmations(&mut self) {
        while let Ok(confirmation) = self.confirmations_rx.try_recv() {
            match confirmation {
                Confirmation::TaskCreated { local_id, id } => self.confirm_task(local_id, id),
                Confirmation::TaskCreateFailed { local_id } => {
                    if self.pending.remove(&local_id).is_some() {
                        warn!("Task {} is only kept locally.", local_id);
                    }
                }
                Confirmation::CommentAdded {
                    task_id,
                    local_id,
                    comment,
                } => self.confirm_comment(task_id, local_id, comment),
            }
        }
    }

    fn confirm_task(&mut self, local_id: i64, id: i64) {
        let Some(pending) = self.pending.remove(&local_id) else {
            return;
        };
        self.aliases.insert(local_id, id);
        if pending.deleted {
            debug!("Task {} was deleted before the store assigned ID {}", local_id, id);
            let gateway = Arc::clone(&self.gateway);
            self.persist(async move {
                if let Err(e) = gateway.delete_task(id).await {
                    error!("Error deleting task {}: {:?}", id, e);
                }
            });
            return;
        }
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == local_id) else {
            return;
        };
        task.id = id;
        for comment in &mut task.comments {
            comment.task_id = id;
        }
        let payload = pending.dirty.then(|| UpdateTaskPayload::from(&*task));
        let queued: Vec<(i64, String, i64)> = task
            .comments
            .iter()
            .filter(|c| pending.comments.contains(&c.id))
            .filter_map(|c| Some((c.id, c.content.clone(), c.author_id?)))
            .collect();
        if let Some(detail) = self.detail.as_mut().filter(|d| d.id == local_id) {
            detail.id = id;
        }
        self.refresh_detail(id);
        info!("Task {} stored with ID {}.", local_id, id);

        if let Some(payload) = payload {
            let gateway = Arc::clone(&self.gateway);
            self.persist(async move {
                if let Err(e) = gateway.update_task(id, payload).await {
                    error!("Error updating task {}: {:?}", id, e);
                }
            });
        }
        for (comment_id, content, author_id) in queued {
            self.persist_comment(id, comment_id, content, author_id);
        }
    }

    fn confirm_comment(&mut self, task_id: i64, local_id: i64, stored: Comment) {
        self.unconfirmed_comments.remove(&local_id);
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return;
        };
        if task.comments.iter().any(|c| c.id == stored.id) {
            // Already reloaded from the store.
            task.comments.retain(|c| c.id != local_id);
            self.refresh_detail(task_id);
            return;
        }
        let Some(comment) = task.comments.iter_mut().find(|c| c.id == local_id) else {
            return;
        };
        comment.id = stored.id;
        comment.created_at = stored.created_at;
        if stored.author.is_some() {
            comment.author = stored.author;
        }
        self.refresh_detail(task_id);
    }
}

// Stored comments first, then the local ones the store has not acknowledged,
// oldest first.
fn merge_comments(
    stored: Vec<Comment>,
    local: Vec<Comment>,
    unconfirmed: &HashSet<i64>,
) -> Vec<Comment> {
    let mut waiting: Vec<Comment> = local
        .into_iter()
        .filter(|c| unconfirmed.contains(&c.id) && !stored.iter().any(|s| s.id == c.id))
        .collect();
    waiting.sort_by_key(|c| c.created_at);
    let mut merged = stored;
    merged.extend(waiting);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryGateway, OfflineGateway};
    use common::UserRole;

    fn user(id: i64) -> User {
        User {
            id,
            name: format!("User {}", id),
            email: format!("user{}@example.com", id),
            avatar_url: None,
            role: UserRole::Member,
            created_at: Utc::now(),
        }
    }

    async fn demo_board() -> BoardController<OfflineGateway> {
        let mut board = BoardController::new(Session::new(user(1)), OfflineGateway);
        board.load(DEFAULT_PROJECT_ID).await;
        board
    }

    #[tokio::test]
    async fn test_add_task_defaults() {
        let mut board = demo_board().await;
        let id = board.add_task(NewTask::titled("X"));

        let task = board.task(id).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.created_by, 1);
        assert_eq!(board.columns().todo.last().map(|t| t.title.as_str()), Some("X"));
    }

    #[tokio::test]
    async fn test_add_task_ids_are_unique() {
        let mut board = demo_board().await;
        let a = board.add_task(NewTask::titled("A"));
        let b = board.add_task(NewTask::titled("B"));
        assert_ne!(a, b);
        assert!(board.tasks().iter().filter(|t| t.id == a || t.id == b).count() == 2);
    }

    #[tokio::test]
    async fn test_unknown_assignee_is_dropped() {
        let mut board = demo_board().await;
        let id = board.add_task(NewTask {
            assignee_id: Some(404),
            ..NewTask::titled("Nobody")
        });
        let task = board.task(id).unwrap();
        assert_eq!(task.assignee_id, None);
        assert!(task.assignee.is_none());

        let id = board.add_task(NewTask {
            assignee_id: Some(1),
            ..NewTask::titled("Mine")
        });
        assert_eq!(board.task(id).unwrap().assignee.as_ref().map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn test_set_status_unknown_task_is_noop() {
        let mut board = demo_board().await;
        let before = board.tasks().to_vec();
        assert!(!board.set_status(12345, TaskStatus::Done));
        assert_eq!(board.tasks(), before.as_slice());
    }

    #[tokio::test]
    async fn test_set_status_touches_updated_at() {
        let mut board = demo_board().await;
        let before = board.task(1).unwrap().updated_at;
        assert!(board.set_status(1, TaskStatus::InProgress));
        let task = board.task(1).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.updated_at >= before);
    }

    #[tokio::test]
    async fn test_update_task_refreshes_detail() {
        let mut board = demo_board().await;
        board.open_detail(2).await.unwrap();

        let mut edited = board.task(2).unwrap().clone();
        edited.title = "Configure nightly backups".to_string();
        assert!(board.update_task(edited));

        assert_eq!(board.detail().unwrap().title, "Configure nightly backups");
        assert_eq!(board.task(2).unwrap().title, "Configure nightly backups");
    }

    #[tokio::test]
    async fn test_update_task_keeps_updated_at_monotonic() {
        let mut board = demo_board().await;
        let current = board.task(3).unwrap().updated_at;
        let mut stale = board.task(3).unwrap().clone();
        stale.updated_at = current - chrono::Duration::days(30);
        board.update_task(stale);
        assert!(board.task(3).unwrap().updated_at >= current);
    }

    #[tokio::test]
    async fn test_update_unknown_task_is_noop() {
        let mut board = demo_board().await;
        let mut ghost = board.task(1).unwrap().clone();
        ghost.id = 777;
        assert!(!board.update_task(ghost));
        assert!(board.task(777).is_none());
    }

    #[tokio::test]
    async fn test_delete_task_closes_detail() {
        let mut board = demo_board().await;
        board.open_detail(4).await.unwrap();
        assert!(board.delete_task(4));
        assert!(board.detail().is_none());
        assert!(board.task(4).is_none());
        assert!(!board.delete_task(4));
    }

    #[tokio::test]
    async fn test_delete_other_task_keeps_detail() {
        let mut board = demo_board().await;
        board.open_detail(4).await.unwrap();
        board.delete_task(1);
        assert_eq!(board.detail().map(|t| t.id), Some(4));
    }

    #[tokio::test]
    async fn test_add_comment_rejects_blank_text() {
        let mut board = demo_board().await;
        let author = user(1);
        let before = board.task(1).unwrap().comments.len();
        assert!(board.add_comment(1, "", &author).is_none());
        assert!(board.add_comment(1, "   \n", &author).is_none());
        assert_eq!(board.task(1).unwrap().comments.len(), before);
    }

    #[tokio::test]
    async fn test_add_comment_appends_once() {
        let mut board = demo_board().await;
        let author = user(1);
        let comment = board.add_comment(1, "hello", &author).unwrap();
        let comments = &board.task(1).unwrap().comments;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "hello");
        assert_eq!(comments[0].author_id, Some(author.id));
        assert_eq!(comments[0].author.as_ref(), Some(&author));
        assert_eq!(comment.task_id, 1);
    }

    #[tokio::test]
    async fn test_add_comment_unknown_task() {
        let mut board = demo_board().await;
        assert!(board.add_comment(999, "hello", &user(1)).is_none());
    }

    #[tokio::test]
    async fn test_demo_mode_spawns_no_writes() {
        let mut board = demo_board().await;
        board.set_status(1, TaskStatus::Done);
        board.add_task(NewTask::titled("Local"));
        board.delete_task(2);
        assert_eq!(board.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_persisted_status_change_reaches_store() {
        let owner = user(1);
        let gateway = MemoryGateway::with_tasks(seed::onboarding_tasks(&owner, 1, Utc::now()));
        let mut board = BoardController::new(Session::new(owner), gateway.clone());
        assert_eq!(board.load(1).await, Persistence::Persisted);

        board.set_status(1, TaskStatus::Done);
        assert_eq!(board.task(1).unwrap().status, TaskStatus::Done);
        board.settle().await;
        assert_eq!(gateway.task(1).unwrap().status, TaskStatus::Done);
    }
}
