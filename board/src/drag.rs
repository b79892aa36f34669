// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::{Task, TaskStatus};
use tracing::debug;

use crate::controller::BoardController;
use crate::gateway::TaskGateway;

/// Pointer travel, in pixels, needed before a press turns into a drag.
/// Shorter gestures are clicks.
pub const ACTIVATION_DISTANCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// A card is pressed but the pointer has not travelled far enough yet.
    Pressed { task_id: i64, origin: Point },
    Dragging { task_id: i64 },
    Dropped { task_id: i64, target: Option<TaskStatus> },
}

/// What a pointer release did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Released before the drag activated.
    Click { task_id: i64 },
    Moved { task_id: i64, from: TaskStatus, to: TaskStatus },
    /// Released outside every column, or the task disappeared meanwhile.
    Discarded { task_id: i64 },
    /// Release without a preceding press.
    Ignored,
}

/// Pointer-driven drag and drop of task cards between columns.
#[derive(Debug, Clone)]
pub struct DragLayer {
    state: DragState,
    activation_distance: f64,
}

impl Default for DragLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl DragLayer {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            activation_distance: ACTIVATION_DISTANCE,
        }
    }

    pub fn with_activation_distance(mut self, distance: f64) -> Self {
        self.activation_distance = distance;
        self
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn press(&mut self, task_id: i64, at: Point) {
        if self.state == DragState::Idle {
            self.state = DragState::Pressed { task_id, origin: at };
        }
    }

    /// Tracks pointer movement. Returns true when this move started a drag.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        match self.state {
            DragState::Pressed { task_id, origin } if origin.distance(at) > self.activation_distance => {
                debug!("Started dragging task {}", task_id);
                self.state = DragState::Dragging { task_id };
                true
            }
            _ => false,
        }
    }

    /// Ends the gesture over the droppable with id `over`, if any.
    ///
    /// Column ids are the status names; anything else counts as no target.
    /// A drop on a column moves the task there through the board.
    pub fn release<G: TaskGateway>(
        &mut self,
        over: Option<&str>,
        board: &mut BoardController<G>,
    ) -> DropOutcome {
        let outcome = match self.state {
            DragState::Idle | DragState::Dropped { .. } => DropOutcome::Ignored,
            DragState::Pressed { task_id, .. } => DropOutcome::Click { task_id },
            DragState::Dragging { task_id } => {
                let target = over.and_then(|id| id.parse::<TaskStatus>().ok());
                self.state = DragState::Dropped { task_id, target };
                self.commit(task_id, target, board)
            }
        };
        self.state = DragState::Idle;
        outcome
    }

    fn commit<G: TaskGateway>(
        &self,
        task_id: i64,
        target: Option<TaskStatus>,
        board: &mut BoardController<G>,
    ) -> DropOutcome {
        let Some(to) = target else {
            debug!("Task {} dropped outside the board", task_id);
            return DropOutcome::Discarded { task_id };
        };
        let Some(from) = board.task(task_id).map(|t| t.status) else {
            return DropOutcome::Discarded { task_id };
        };
        if !board.set_status(task_id, to) {
            return DropOutcome::Discarded { task_id };
        }
        // The task may have received its store id while it was dragged.
        let task_id = board.task(task_id).map_or(task_id, |t| t.id);
        DropOutcome::Moved { task_id, from, to }
    }

    /// Abandons the gesture without touching the board.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// The task being dragged, once the drag has activated.
    pub fn active_task(&self) -> Option<i64> {
        match self.state {
            DragState::Dragging { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// The card to draw in the drag overlay.
    pub fn overlay<'a, G: TaskGateway>(&self, board: &'a BoardController<G>) -> Option<&'a Task> {
        board.task(self.active_task()?)
    }

    /// Whether a card's normal rendering should be hidden while it is
    /// shown in the overlay.
    pub fn is_suppressed(&self, task_id: i64) -> bool {
        self.active_task() == Some(task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;

    use crate::controller::{NewTask, DEFAULT_PROJECT_ID};
    use crate::gateway::{MemoryGateway, OfflineGateway};
    use crate::seed;
    use crate::session::{Session, SessionStore};

    async fn board() -> BoardController<OfflineGateway> {
        let mut store = SessionStore::new();
        store.demo_login();
        let session = Session::from_provider(&store).unwrap();
        let mut board = BoardController::new(session, OfflineGateway);
        board.load(DEFAULT_PROJECT_ID).await;
        board
    }

    fn drag(layer: &mut DragLayer, task_id: i64) {
        layer.press(task_id, Point::new(0.0, 0.0));
        assert!(layer.pointer_move(Point::new(20.0, 5.0)));
    }

    #[test]
    fn test_short_moves_do_not_activate() {
        let mut layer = DragLayer::new();
        layer.press(1, Point::new(10.0, 10.0));
        assert!(!layer.pointer_move(Point::new(14.0, 14.0)));
        assert_eq!(layer.active_task(), None);

        assert!(layer.pointer_move(Point::new(20.0, 10.0)));
        assert_eq!(layer.active_task(), Some(1));
        assert!(layer.is_suppressed(1));
        assert!(!layer.is_suppressed(2));
    }

    #[tokio::test]
    async fn test_drop_on_column_moves_task() {
        let mut board = board().await;
        let todo_before = board.columns().todo.len();
        let mut layer = DragLayer::new();

        drag(&mut layer, 1);
        assert_eq!(layer.overlay(&board).map(|t| t.id), Some(1));

        let outcome = layer.release(Some("done"), &mut board);
        assert_eq!(
            outcome,
            DropOutcome::Moved { task_id: 1, from: TaskStatus::Todo, to: TaskStatus::Done }
        );
        assert_eq!(layer.state(), DragState::Idle);

        let columns = board.columns();
        assert_eq!(columns.todo.len(), todo_before - 1);
        assert!(columns.done.iter().any(|t| t.id == 1));
    }

    #[tokio::test]
    async fn test_drop_outside_columns_discards() {
        let mut board = board().await;
        let before = board.tasks().to_vec();
        let mut layer = DragLayer::new();

        drag(&mut layer, 2);
        assert_eq!(layer.release(None, &mut board), DropOutcome::Discarded { task_id: 2 });
        assert_eq!(board.tasks(), before.as_slice());

        drag(&mut layer, 2);
        assert_eq!(
            layer.release(Some("backlog"), &mut board),
            DropOutcome::Discarded { task_id: 2 }
        );
        assert_eq!(board.tasks(), before.as_slice());
        assert_eq!(layer.state(), DragState::Idle);
    }

    #[tokio::test]
    async fn test_release_before_activation_is_a_click() {
        let mut board = board().await;
        let mut layer = DragLayer::new();
        layer.press(3, Point::new(0.0, 0.0));
        layer.pointer_move(Point::new(2.0, 2.0));
        assert_eq!(layer.release(Some("done"), &mut board), DropOutcome::Click { task_id: 3 });
        assert_eq!(board.task(3).unwrap().status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_cancel_and_stray_release() {
        let mut board = board().await;
        let mut layer = DragLayer::new();
        drag(&mut layer, 1);
        layer.cancel();
        assert_eq!(layer.release(Some("done"), &mut board), DropOutcome::Ignored);
        assert_eq!(board.task(1).unwrap().status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_dragged_task_deleted_meanwhile() {
        let mut board = board().await;
        let mut layer = DragLayer::new();
        drag(&mut layer, 1);
        board.delete_task(1);
        assert!(layer.overlay(&board).is_none());
        assert_eq!(
            layer.release(Some("done"), &mut board),
            DropOutcome::Discarded { task_id: 1 }
        );
    }

    #[tokio::test]
    async fn test_drop_after_store_assigned_id() {
        let mut store = SessionStore::new();
        store.demo_login();
        let session = Session::from_provider(&store).unwrap();
        let tasks = seed::onboarding_tasks(session.user(), DEFAULT_PROJECT_ID, Utc::now());
        let gateway = MemoryGateway::with_tasks(tasks);
        let mut board = BoardController::new(session, gateway.clone());
        board.load(DEFAULT_PROJECT_ID).await;

        let local = board.add_task(NewTask::titled("Fresh"));
        let mut layer = DragLayer::new();
        drag(&mut layer, local);
        // Let the create finish while the card is in the air.
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(
            layer.release(Some("done"), &mut board),
            DropOutcome::Moved { task_id: 7, from: TaskStatus::Todo, to: TaskStatus::Done }
        );
        assert_eq!(board.task(7).unwrap().status, TaskStatus::Done);

        board.settle().await;
        assert_eq!(gateway.task(7).unwrap().status, TaskStatus::Done);
    }
}
