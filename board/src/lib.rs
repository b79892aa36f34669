// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Client-side state of the task board: the task list and its columns,
//! optimistic writes to a backing store, drag and drop, and edit forms.
pub mod controller;
pub mod draft;
pub mod drag;
pub mod gateway;
pub mod ids;
pub mod seed;
pub mod session;
pub mod view;

pub use controller::{BoardController, NewTask, Persistence};
pub use drag::{DragLayer, DragState, DropOutcome, Point};
pub use gateway::{MemoryGateway, OfflineGateway, TaskGateway};
pub use session::{IdentityProvider, Session, SessionStore};
pub use view::{BoardSummary, Columns};
