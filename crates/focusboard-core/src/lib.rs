//! Focusboard Core Library
//!
//! Client-side sync engine for a task board: an ordered entity cache, the
//! mutation coordinator that keeps it in step with the remote store, read
//! views over it, and the focus timer, goals, teams and reminders built alongside.

pub mod board;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod goals;
pub mod labels;
pub mod mutation;
pub mod pomodoro;
pub mod query;
pub mod reminders;
pub mod schedule;
pub mod teams;

pub use config::ClientConfig;
pub use coordinator::{BoardCoordinator, BoardStore, MoveFailurePolicy};
pub use error::{FocusError, FocusResult};
pub use goals::GoalStore;
pub use labels::LabelStore;
pub use pomodoro::FocusTimer;
pub use query::BoardQuery;
pub use reminders::ReminderScheduler;
pub use teams::TeamStore;
