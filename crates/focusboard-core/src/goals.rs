//! Personal goals and their progress.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::board::{CardId, GoalId};
use crate::coordinator::BoardCoordinator;
use crate::error::{FocusError, FocusResult};
use crate::gateway::GoalGateway;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default)]
    pub cards_count: usize,
    #[serde(default)]
    pub completed_cards_count: usize,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Goal {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.target_date {
            Some(target) if !self.is_completed => today > target,
            _ => false,
        }
    }

    pub fn progress(&self) -> GoalProgress {
        GoalProgress::from_percentage(self.progress_percentage)
    }
}

/// Progress bucket used to group goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalProgress {
    NotStarted,
    InProgress,
    AlmostDone,
    Completed,
}

impl GoalProgress {
    pub fn from_percentage(pct: f64) -> Self {
        if pct <= 0.0 {
            Self::NotStarted
        } else if pct < 50.0 {
            Self::InProgress
        } else if pct < 100.0 {
            Self::AlmostDone
        } else {
            Self::Completed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::AlmostDone => "almost_done",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewGoal {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
}

#[derive(Default)]
struct GoalState {
    goals: Vec<Goal>,
    last_error: Option<String>,
}

/// Goal collection kept in step with the remote store.
///
/// Like the board paths, every mutation lands locally only after the
/// remote store confirms it.
#[derive(Clone)]
pub struct GoalStore {
    gateway: Arc<dyn GoalGateway>,
    state: Arc<RwLock<GoalState>>,
    board: Option<BoardCoordinator>,
}

impl GoalStore {
    pub fn new(gateway: Arc<dyn GoalGateway>) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(GoalState::default())),
            board: None,
        }
    }

    /// Keep card→goal links of the active board in step with link/unlink calls.
    pub fn with_board(mut self, board: BoardCoordinator) -> Self {
        self.board = Some(board);
        self
    }

    pub async fn fetch_goals(&self) -> FocusResult<Vec<Goal>> {
        self.clear_error();
        match self.gateway.list_goals().await {
            Ok(goals) => {
                self.write(|s| s.goals = goals.clone());
                Ok(goals)
            }
            Err(e) => self.fail("fetch goals", e),
        }
    }

    pub async fn create_goal(&self, goal: NewGoal) -> FocusResult<Goal> {
        self.clear_error();
        match self.gateway.create_goal(&goal).await {
            Ok(created) => {
                info!(goal_id = created.id, "Goal created");
                self.write(|s| s.goals.push(created.clone()));
                Ok(created)
            }
            Err(e) => self.fail("create goal", e),
        }
    }

    pub async fn update_goal(&self, id: GoalId, patch: GoalPatch) -> FocusResult<Goal> {
        self.clear_error();
        match self.gateway.update_goal(id, &patch).await {
            Ok(updated) => {
                self.replace(updated.clone());
                Ok(updated)
            }
            Err(e) => self.fail("update goal", e),
        }
    }

    /// Mark a goal completed or reopen it.
    pub async fn set_completed(&self, id: GoalId, completed: bool) -> FocusResult<Goal> {
        self.clear_error();
        let result = if completed {
            self.gateway.complete_goal(id).await
        } else {
            self.gateway.reopen_goal(id).await
        };
        match result {
            Ok(goal) => {
                self.replace(goal.clone());
                Ok(goal)
            }
            Err(e) if completed => self.fail("complete goal", e),
            Err(e) => self.fail("reopen goal", e),
        }
    }

    pub async fn delete_goal(&self, id: GoalId) -> FocusResult<()> {
        self.clear_error();
        match self.gateway.delete_goal(id).await {
            Ok(()) => {
                self.write(|s| s.goals.retain(|g| g.id != id));
                if let Some(board) = &self.board {
                    board.apply_goal_removal(id);
                }
                Ok(())
            }
            Err(e) => self.fail("delete goal", e),
        }
    }

    /// Link a card to a goal, then refresh the goal's progress.
    pub async fn link_card(&self, id: GoalId, card_id: CardId) -> FocusResult<Goal> {
        self.clear_error();
        if let Err(e) = self.gateway.link_card(id, card_id).await {
            return self.fail("link card to goal", e);
        }
        if let Some(board) = &self.board {
            board.apply_goal_link(card_id, Some(id));
        }
        self.refresh(id).await
    }

    pub async fn unlink_card(&self, id: GoalId, card_id: CardId) -> FocusResult<Goal> {
        self.clear_error();
        if let Err(e) = self.gateway.unlink_card(id, card_id).await {
            return self.fail("unlink card from goal", e);
        }
        if let Some(board) = &self.board {
            board.apply_goal_link(card_id, None);
        }
        self.refresh(id).await
    }

    async fn refresh(&self, id: GoalId) -> FocusResult<Goal> {
        match self.gateway.get_goal(id).await {
            Ok(goal) => {
                self.replace(goal.clone());
                Ok(goal)
            }
            Err(e) => self.fail("fetch goal", e),
        }
    }

    // ============================================================
    // QUERIES
    // ============================================================

    pub fn goals(&self) -> Vec<Goal> {
        self.read(|s| s.goals.clone())
    }

    pub fn goal_by_id(&self, id: GoalId) -> Option<Goal> {
        self.read(|s| s.goals.iter().find(|g| g.id == id).cloned())
    }

    pub fn active_goals(&self) -> Vec<Goal> {
        self.filtered(|g| !g.is_completed)
    }

    pub fn completed_goals(&self) -> Vec<Goal> {
        self.filtered(|g| g.is_completed)
    }

    pub fn overdue_goals(&self, today: NaiveDate) -> Vec<Goal> {
        self.filtered(|g| g.is_overdue(today))
    }

    pub fn goals_with_progress(&self, progress: GoalProgress) -> Vec<Goal> {
        self.filtered(|g| g.progress() == progress)
    }

    pub fn last_error(&self) -> Option<String> {
        self.read(|s| s.last_error.clone())
    }

    // ============================================================
    // INTERNALS
    // ============================================================

    fn filtered(&self, pred: impl Fn(&Goal) -> bool) -> Vec<Goal> {
        self.read(|s| s.goals.iter().filter(|g| pred(g)).cloned().collect())
    }

    fn replace(&self, goal: Goal) {
        self.write(|s| {
            if let Some(existing) = s.goals.iter_mut().find(|g| g.id == goal.id) {
                *existing = goal;
            }
        });
    }

    fn clear_error(&self) {
        self.write(|s| s.last_error = None);
    }

    fn fail<T>(&self, action: &str, err: FocusError) -> FocusResult<T> {
        warn!(action, error = %err, "Goal request failed");
        self.write(|s| s.last_error = Some(format!("Failed to {}: {}", action, err)));
        Err(err)
    }

    fn read<R>(&self, f: impl FnOnce(&GoalState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut GoalState) -> R) -> R {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}
