//! In-process remote store.
//!
//! Mirrors the REST backend closely enough to drive the coordinator in
//! tests and offline demos: new lists and cards are appended, moves and
//! deletions re-index the touched lists densely, unknown ids are
//! `NotFound` and malformed payloads are `Validation` errors. Calls act as
//! a single signed-in user; more accounts can be added for team invites.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use super::{BoardGateway, FocusGateway, GoalGateway, LabelGateway, ReminderGateway, TeamGateway};
use crate::board::{
    Board, BoardId, BoardPatch, BoardSummary, Card, CardId, CardPatch, Comment, CommentId,
    CommentPatch, GoalId, Label, LabelId, LabelPatch, List, ListId, ListPatch, NewBoard, NewCard,
    NewComment, NewLabel, NewList, User, UserId, DEFAULT_LISTS,
};
use crate::error::{FocusError, FocusResult};
use crate::goals::{Goal, GoalPatch, NewGoal};
use crate::pomodoro::{FocusSession, FocusStats, NewFocusSession, SessionKind, StatsWindow};
use crate::reminders::DashboardSummary;
use crate::teams::{MemberInvite, NewTeam, Team, TeamId, TeamMember, TeamPatch, TeamRole};

/// The remote store's due-soon window.
const DUE_SOON_DAYS: i64 = 3;

/// Where the store puts a moved card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveRule {
    /// At the requested position, shifting later cards.
    #[default]
    Insert,
    /// At the end of the destination list, whatever was requested.
    Append,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    boards: Vec<Board>,
    labels: Vec<Label>,
    goals: Vec<Goal>,
    sessions: Vec<FocusSession>,
    users: Vec<User>,
    signed_in: UserId,
    teams: Vec<Team>,
}

impl MemoryState {
    fn with_user(user: User) -> Self {
        Self {
            signed_in: user.id,
            users: vec![user],
            ..Self::default()
        }
    }

    fn me(&self) -> FocusResult<User> {
        self.users
            .iter()
            .find(|u| u.id == self.signed_in)
            .cloned()
            .ok_or_else(|| FocusError::Unauthorized("no signed-in user".into()))
    }

    fn comment_mut(&mut self, id: CommentId) -> FocusResult<&mut Comment> {
        self.boards
            .iter_mut()
            .flat_map(|b| b.lists.iter_mut())
            .flat_map(|l| l.cards.iter_mut())
            .flat_map(|c| c.comments.iter_mut())
            .find(|c| c.id == id)
            .ok_or_else(|| FocusError::not_found(format!("Comment: {}", id)))
    }

    /// Teams are visible to their members only.
    fn team_mut(&mut self, id: TeamId) -> FocusResult<&mut Team> {
        let me = self.signed_in;
        self.teams
            .iter_mut()
            .find(|t| t.id == id && t.member(me).is_some())
            .ok_or_else(|| FocusError::not_found(format!("Team: {}", id)))
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn board_mut(&mut self, id: BoardId) -> FocusResult<&mut Board> {
        self.boards
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| FocusError::not_found(format!("Board: {}", id)))
    }

    fn list_mut(&mut self, id: ListId) -> Option<&mut List> {
        self.boards
            .iter_mut()
            .flat_map(|b| b.lists.iter_mut())
            .find(|l| l.id == id)
    }

    fn board_of_list(&self, id: ListId) -> Option<BoardId> {
        self.boards
            .iter()
            .find(|b| b.lists.iter().any(|l| l.id == id))
            .map(|b| b.id)
    }

    fn cards(&self) -> impl Iterator<Item = &Card> {
        self.boards
            .iter()
            .flat_map(|b| b.lists.iter())
            .flat_map(|l| l.cards.iter())
    }

    fn card_mut(&mut self, id: CardId) -> FocusResult<&mut Card> {
        self.boards
            .iter_mut()
            .flat_map(|b| b.lists.iter_mut())
            .flat_map(|l| l.cards.iter_mut())
            .find(|c| c.id == id)
            .ok_or_else(|| FocusError::not_found(format!("Card: {}", id)))
    }

    /// Detach a card from whichever list holds it, re-indexing that list.
    fn take_card(&mut self, id: CardId) -> FocusResult<(ListId, Card)> {
        for list in self.boards.iter_mut().flat_map(|b| b.lists.iter_mut()) {
            if let Some(idx) = list.cards.iter().position(|c| c.id == id) {
                let card = list.cards.remove(idx);
                reindex(list);
                return Ok((list.id, card));
            }
        }
        Err(FocusError::not_found(format!("Card: {}", id)))
    }

    fn resolve_labels(&self, ids: &[LabelId]) -> FocusResult<Vec<Label>> {
        ids.iter()
            .map(|id| {
                self.labels
                    .iter()
                    .find(|l| l.id == *id)
                    .cloned()
                    .ok_or_else(|| FocusError::validation(format!("Invalid label {}", id)))
            })
            .collect()
    }

    fn goal_view(&self, goal: &Goal) -> Goal {
        let linked: Vec<&Card> = self.cards().filter(|c| c.goal == Some(goal.id)).collect();
        let completed = linked.iter().filter(|c| c.completed).count();
        let progress = if linked.is_empty() {
            0.0
        } else {
            (completed as f64 / linked.len() as f64 * 1000.0).round() / 10.0
        };
        Goal {
            cards_count: linked.len(),
            completed_cards_count: completed,
            progress_percentage: progress,
            ..goal.clone()
        }
    }

    fn goal_mut(&mut self, id: GoalId) -> FocusResult<&mut Goal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| FocusError::not_found(format!("Goal: {}", id)))
    }
}

pub struct InMemoryGateway {
    state: Mutex<MemoryState>,
    failures: Mutex<VecDeque<FocusError>>,
    latency: Mutex<Duration>,
    move_rule: MoveRule,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::with_user(User {
                id: 1,
                username: "demo".into(),
                email: "demo@example.com".into(),
                first_name: String::new(),
                last_name: String::new(),
            })),
            failures: Mutex::new(VecDeque::new()),
            latency: Mutex::new(Duration::ZERO),
            move_rule: MoveRule::Insert,
        }
    }

    /// Delay every call by `latency` before it touches the store.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    pub fn with_move_rule(mut self, rule: MoveRule) -> Self {
        self.move_rule = rule;
        self
    }

    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    /// Make the next call fail with `err`. Queued failures are consumed in order.
    pub fn fail_next(&self, err: FocusError) {
        lock(&self.failures).push_back(err);
    }

    /// Store a fully built board as-is, keeping its ids.
    pub fn seed_board(&self, board: Board) {
        let mut state = lock(&self.state);
        let max_id = board
            .lists
            .iter()
            .flat_map(|l| std::iter::once(l.id).chain(l.cards.iter().map(|c| c.id)))
            .chain(std::iter::once(board.id))
            .max()
            .unwrap_or(0);
        state.next_id = state.next_id.max(max_id);
        state.boards.retain(|b| b.id != board.id);
        state.boards.push(board);
    }

    /// Register another account, e.g. someone to invite into a team.
    pub fn add_user(&self, username: &str, email: &str) -> User {
        let mut state = lock(&self.state);
        let user = User {
            id: state.users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: username.to_string(),
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
        };
        state.users.push(user.clone());
        user
    }

    /// Current stored copy of a board, bypassing latency and failures.
    pub fn snapshot(&self, id: BoardId) -> Option<Board> {
        lock(&self.state).boards.iter().find(|b| b.id == id).cloned()
    }

    async fn enter(&self) -> FocusResult<MutexGuard<'_, MemoryState>> {
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = lock(&self.failures).pop_front() {
            return Err(err);
        }
        Ok(lock(&self.state))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn reindex(list: &mut List) {
    for (position, card) in list.cards.iter_mut().enumerate() {
        card.position = position;
    }
}

fn require_title(title: &str, what: &str) -> FocusResult<()> {
    if title.trim().is_empty() {
        return Err(FocusError::validation(format!("{} title may not be blank", what)));
    }
    Ok(())
}

/// Cards come back without their list or goal, as the REST serializer does.
fn detached(card: &Card) -> Card {
    Card {
        list_id: None,
        goal: None,
        ..card.clone()
    }
}

// ============================================================
// BOARDS, LISTS, CARDS
// ============================================================

#[async_trait]
impl BoardGateway for InMemoryGateway {
    async fn list_boards(&self) -> FocusResult<Vec<BoardSummary>> {
        let state = self.enter().await?;
        Ok(state
            .boards
            .iter()
            .filter(|b| b.is_active)
            .map(BoardSummary::from)
            .collect())
    }

    async fn get_board(&self, id: BoardId) -> FocusResult<Board> {
        let mut state = self.enter().await?;
        Ok(state.board_mut(id)?.clone())
    }

    async fn create_board(&self, board: &NewBoard) -> FocusResult<Board> {
        let mut state = self.enter().await?;
        require_title(&board.title, "Board")?;

        let now = Utc::now();
        let id = state.next_id();
        let mut lists = Vec::with_capacity(DEFAULT_LISTS.len());
        for (position, title) in DEFAULT_LISTS.iter().enumerate() {
            lists.push(List {
                id: state.next_id(),
                board_id: Some(id),
                title: title.to_string(),
                position,
                created_at: Some(now),
                updated_at: Some(now),
                cards: Vec::new(),
            });
        }
        let created = Board {
            id,
            title: board.title.clone(),
            description: board.description.clone(),
            is_active: true,
            is_template: false,
            background_color: board.background_color.clone(),
            created_at: Some(now),
            updated_at: Some(now),
            lists,
        };
        state.boards.push(created.clone());
        Ok(created)
    }

    async fn update_board(&self, id: BoardId, patch: &BoardPatch) -> FocusResult<Board> {
        let mut state = self.enter().await?;
        if let Some(title) = &patch.title {
            require_title(title, "Board")?;
        }
        let board = state.board_mut(id)?;
        if let Some(title) = &patch.title {
            board.title = title.clone();
        }
        if let Some(description) = &patch.description {
            board.description = Some(description.clone());
        }
        if let Some(is_active) = patch.is_active {
            board.is_active = is_active;
        }
        if let Some(color) = &patch.background_color {
            board.background_color = Some(color.clone());
        }
        board.updated_at = Some(Utc::now());
        Ok(board.clone())
    }

    async fn delete_board(&self, id: BoardId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        let before = state.boards.len();
        state.boards.retain(|b| b.id != id);
        if state.boards.len() == before {
            return Err(FocusError::not_found(format!("Board: {}", id)));
        }
        Ok(())
    }

    async fn create_list(&self, list: &NewList) -> FocusResult<List> {
        let mut state = self.enter().await?;
        require_title(&list.title, "List")?;
        let id = state.next_id();
        let board = state
            .board_mut(list.board_id)
            .map_err(|_| FocusError::validation("Board not found or you don't have permission"))?;

        let now = Utc::now();
        let created = List {
            id,
            board_id: Some(board.id),
            title: list.title.clone(),
            position: board.lists.len(),
            created_at: Some(now),
            updated_at: Some(now),
            cards: Vec::new(),
        };
        board.lists.push(created.clone());
        Ok(created)
    }

    async fn update_list(&self, id: ListId, patch: &ListPatch) -> FocusResult<List> {
        let mut state = self.enter().await?;
        if let Some(title) = &patch.title {
            require_title(title, "List")?;
        }
        let board_id = state.board_of_list(id);
        let list = state
            .list_mut(id)
            .ok_or_else(|| FocusError::not_found(format!("List: {}", id)))?;
        if let Some(title) = &patch.title {
            list.title = title.clone();
        }
        list.updated_at = Some(Utc::now());
        list.board_id = board_id;
        Ok(list.clone())
    }

    async fn reorder_list(&self, id: ListId, position: usize) -> FocusResult<()> {
        let mut state = self.enter().await?;
        let board_id = state
            .board_of_list(id)
            .ok_or_else(|| FocusError::not_found(format!("List: {}", id)))?;
        let board = state.board_mut(board_id)?;
        let from = board.lists.iter().position(|l| l.id == id).unwrap_or(0);
        let list = board.lists.remove(from);
        let to = position.min(board.lists.len());
        board.lists.insert(to, list);
        for (idx, list) in board.lists.iter_mut().enumerate() {
            list.position = idx;
        }
        Ok(())
    }

    async fn delete_list(&self, id: ListId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        let board_id = state
            .board_of_list(id)
            .ok_or_else(|| FocusError::not_found(format!("List: {}", id)))?;
        let board = state.board_mut(board_id)?;
        board.lists.retain(|l| l.id != id);
        for (idx, list) in board.lists.iter_mut().enumerate() {
            list.position = idx;
        }
        Ok(())
    }

    async fn create_card(&self, card: &NewCard) -> FocusResult<Card> {
        let mut state = self.enter().await?;
        require_title(&card.title, "Card")?;
        let labels = state.resolve_labels(&card.label_ids)?;
        let id = state.next_id();
        let list = state
            .list_mut(card.list_id)
            .ok_or_else(|| FocusError::validation("List not found or you don't have permission"))?;

        let now = Utc::now();
        let created = Card {
            id,
            list_id: Some(list.id),
            title: card.title.clone(),
            description: card.description.clone(),
            priority: card.priority,
            position: list.cards.len(),
            due_date: card.due_date,
            estimated_hours: card.estimated_hours,
            completed: false,
            completed_at: None,
            labels,
            goal: None,
            comments: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        list.cards.push(created.clone());
        Ok(detached(&created))
    }

    async fn update_card(&self, id: CardId, patch: &CardPatch) -> FocusResult<Card> {
        let mut state = self.enter().await?;
        if let Some(title) = &patch.title {
            require_title(title, "Card")?;
        }
        let labels = match &patch.label_ids {
            Some(ids) => Some(state.resolve_labels(ids)?),
            None => None,
        };
        let card = state.card_mut(id)?;
        if let Some(title) = &patch.title {
            card.title = title.clone();
        }
        if let Some(description) = &patch.description {
            card.description = Some(description.clone());
        }
        if let Some(priority) = patch.priority {
            card.priority = priority;
        }
        if let Some(due) = patch.due_date {
            card.due_date = Some(due);
        }
        if let Some(hours) = patch.estimated_hours {
            card.estimated_hours = Some(hours);
        }
        if let Some(completed) = patch.completed {
            card.completed = completed;
            card.completed_at = match (completed, card.completed_at) {
                (true, None) => Some(Utc::now()),
                (true, at) => at,
                (false, _) => None,
            };
        }
        if let Some(labels) = labels {
            card.labels = labels;
        }
        card.updated_at = Some(Utc::now());
        Ok(detached(card))
    }

    async fn delete_card(&self, id: CardId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        state.take_card(id)?;
        Ok(())
    }

    async fn move_card(&self, id: CardId, list_id: ListId, position: usize) -> FocusResult<Card> {
        let mut state = self.enter().await?;
        if state.list_mut(list_id).is_none() {
            return Err(FocusError::validation("List not found"));
        }
        let (_, mut card) = state.take_card(id)?;
        let rule = self.move_rule;
        let list = state
            .list_mut(list_id)
            .ok_or_else(|| FocusError::validation("List not found"))?;

        let at = match rule {
            MoveRule::Insert => position.min(list.cards.len()),
            MoveRule::Append => list.cards.len(),
        };
        card.list_id = Some(list_id);
        card.updated_at = Some(Utc::now());
        list.cards.insert(at, card);
        reindex(list);
        Ok(Card {
            goal: None,
            ..list.cards[at].clone()
        })
    }

    async fn create_comment(&self, comment: &NewComment) -> FocusResult<Comment> {
        let mut state = self.enter().await?;
        if comment.content.trim().is_empty() {
            return Err(FocusError::validation("Comment may not be blank"));
        }
        let author = state.me()?;
        let id = state.next_id();
        let card = state
            .card_mut(comment.card_id)
            .map_err(|_| FocusError::validation("Card not found or you don't have permission"))?;

        let now = Utc::now();
        let created = Comment {
            id,
            content: comment.content.clone(),
            author: Some(author),
            created_at: Some(now),
            updated_at: Some(now),
        };
        card.comments.insert(0, created.clone());
        Ok(created)
    }

    async fn update_comment(&self, id: CommentId, patch: &CommentPatch) -> FocusResult<Comment> {
        let mut state = self.enter().await?;
        if patch.content.trim().is_empty() {
            return Err(FocusError::validation("Comment may not be blank"));
        }
        let comment = state.comment_mut(id)?;
        comment.content = patch.content.clone();
        comment.updated_at = Some(Utc::now());
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: CommentId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        for card in state
            .boards
            .iter_mut()
            .flat_map(|b| b.lists.iter_mut())
            .flat_map(|l| l.cards.iter_mut())
        {
            if let Some(idx) = card.comments.iter().position(|c| c.id == id) {
                card.comments.remove(idx);
                return Ok(());
            }
        }
        Err(FocusError::not_found(format!("Comment: {}", id)))
    }
}

// ============================================================
// LABELS
// ============================================================

#[async_trait]
impl LabelGateway for InMemoryGateway {
    async fn list_labels(&self) -> FocusResult<Vec<Label>> {
        let state = self.enter().await?;
        Ok(state.labels.clone())
    }

    async fn create_label(&self, label: &NewLabel) -> FocusResult<Label> {
        let mut state = self.enter().await?;
        if label.name.trim().is_empty() {
            return Err(FocusError::validation("Label name may not be blank"));
        }
        let created = Label {
            id: state.next_id(),
            name: label.name.clone(),
            color: label.color.clone(),
            created_at: Some(Utc::now()),
        };
        state.labels.push(created.clone());
        Ok(created)
    }

    async fn update_label(&self, id: LabelId, patch: &LabelPatch) -> FocusResult<Label> {
        let mut state = self.enter().await?;
        let label = state
            .labels
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| FocusError::not_found(format!("Label: {}", id)))?;
        if let Some(name) = &patch.name {
            label.name = name.clone();
        }
        if let Some(color) = &patch.color {
            label.color = color.clone();
        }
        let updated = label.clone();

        for list in state.boards.iter_mut().flat_map(|b| b.lists.iter_mut()) {
            for card in list.cards.iter_mut() {
                if let Some(embedded) = card.labels.iter_mut().find(|l| l.id == id) {
                    *embedded = updated.clone();
                }
            }
        }
        Ok(updated)
    }

    async fn delete_label(&self, id: LabelId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        let before = state.labels.len();
        state.labels.retain(|l| l.id != id);
        if state.labels.len() == before {
            return Err(FocusError::not_found(format!("Label: {}", id)));
        }
        for list in state.boards.iter_mut().flat_map(|b| b.lists.iter_mut()) {
            for card in list.cards.iter_mut() {
                card.labels.retain(|l| l.id != id);
            }
        }
        Ok(())
    }
}

// ============================================================
// GOALS
// ============================================================

#[async_trait]
impl GoalGateway for InMemoryGateway {
    async fn list_goals(&self) -> FocusResult<Vec<Goal>> {
        let state = self.enter().await?;
        Ok(state.goals.iter().map(|g| state.goal_view(g)).collect())
    }

    async fn get_goal(&self, id: GoalId) -> FocusResult<Goal> {
        let mut state = self.enter().await?;
        let goal = state.goal_mut(id)?.clone();
        Ok(state.goal_view(&goal))
    }

    async fn create_goal(&self, goal: &NewGoal) -> FocusResult<Goal> {
        let mut state = self.enter().await?;
        require_title(&goal.title, "Goal")?;
        let now = Utc::now();
        let created = Goal {
            id: state.next_id(),
            title: goal.title.clone(),
            description: goal.description.clone(),
            target_date: goal.target_date,
            is_completed: false,
            completed_at: None,
            progress_percentage: 0.0,
            cards_count: 0,
            completed_cards_count: 0,
            created_at: Some(now),
            updated_at: Some(now),
        };
        state.goals.push(created.clone());
        Ok(created)
    }

    async fn update_goal(&self, id: GoalId, patch: &GoalPatch) -> FocusResult<Goal> {
        let mut state = self.enter().await?;
        if let Some(title) = &patch.title {
            require_title(title, "Goal")?;
        }
        let goal = state.goal_mut(id)?;
        if let Some(title) = &patch.title {
            goal.title = title.clone();
        }
        if let Some(description) = &patch.description {
            goal.description = Some(description.clone());
        }
        if let Some(target) = patch.target_date {
            goal.target_date = Some(target);
        }
        goal.updated_at = Some(Utc::now());
        let goal = goal.clone();
        Ok(state.goal_view(&goal))
    }

    async fn complete_goal(&self, id: GoalId) -> FocusResult<Goal> {
        let mut state = self.enter().await?;
        let goal = state.goal_mut(id)?;
        goal.is_completed = true;
        goal.completed_at = Some(Utc::now());
        let goal = goal.clone();
        Ok(state.goal_view(&goal))
    }

    async fn reopen_goal(&self, id: GoalId) -> FocusResult<Goal> {
        let mut state = self.enter().await?;
        let goal = state.goal_mut(id)?;
        goal.is_completed = false;
        goal.completed_at = None;
        let goal = goal.clone();
        Ok(state.goal_view(&goal))
    }

    async fn delete_goal(&self, id: GoalId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        state.goal_mut(id)?;
        state.goals.retain(|g| g.id != id);
        for list in state.boards.iter_mut().flat_map(|b| b.lists.iter_mut()) {
            for card in list.cards.iter_mut().filter(|c| c.goal == Some(id)) {
                card.goal = None;
            }
        }
        Ok(())
    }

    async fn link_card(&self, id: GoalId, card_id: CardId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        state.goal_mut(id)?;
        state.card_mut(card_id)?.goal = Some(id);
        Ok(())
    }

    async fn unlink_card(&self, id: GoalId, card_id: CardId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        state.goal_mut(id)?;
        let card = state.card_mut(card_id)?;
        if card.goal != Some(id) {
            return Err(FocusError::not_found(format!("Card: {}", card_id)));
        }
        card.goal = None;
        Ok(())
    }
}

// ============================================================
// FOCUS SESSIONS
// ============================================================

#[async_trait]
impl FocusGateway for InMemoryGateway {
    async fn start_session(&self, session: &NewFocusSession) -> FocusResult<FocusSession> {
        let mut state = self.enter().await?;
        let card = match session.card {
            Some(id) => Some(detached(state.card_mut(id)?)),
            None => None,
        };
        let created = FocusSession {
            id: state.next_id(),
            card,
            session_type: session.session_type,
            duration_minutes: session.duration_minutes,
            started_at: Some(Utc::now()),
            completed_at: None,
            is_completed: false,
            notes: None,
        };
        state.sessions.push(created.clone());
        Ok(created)
    }

    async fn complete_session(&self, id: i64) -> FocusResult<()> {
        let mut state = self.enter().await?;
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| FocusError::not_found(format!("Session: {}", id)))?;
        session.is_completed = true;
        session.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn session_stats(&self) -> FocusResult<FocusStats> {
        let state = self.enter().await?;
        let today = Utc::now().date_naive();
        let week_ago = today - ChronoDuration::days(7);

        let mut stats = FocusStats::default();
        for session in state.sessions.iter().filter(|s| s.is_completed) {
            let Some(day) = session.started_at.map(|at| at.date_naive()) else {
                continue;
            };
            if day == today {
                tally(&mut stats.today, session);
            }
            if day >= week_ago {
                tally(&mut stats.this_week, session);
            }
        }
        Ok(stats)
    }
}

// ============================================================
// TEAMS
// ============================================================

#[async_trait]
impl TeamGateway for InMemoryGateway {
    async fn current_user(&self) -> FocusResult<User> {
        let state = self.enter().await?;
        state.me()
    }

    async fn list_teams(&self) -> FocusResult<Vec<Team>> {
        let state = self.enter().await?;
        Ok(state
            .teams
            .iter()
            .filter(|t| t.member(state.signed_in).is_some())
            .cloned()
            .collect())
    }

    async fn get_team(&self, id: TeamId) -> FocusResult<Team> {
        let mut state = self.enter().await?;
        Ok(state.team_mut(id)?.clone())
    }

    async fn create_team(&self, team: &NewTeam) -> FocusResult<Team> {
        let mut state = self.enter().await?;
        if team.name.trim().is_empty() {
            return Err(FocusError::validation("Team name may not be blank"));
        }
        let owner = state.me()?;
        let now = Utc::now();
        let id = state.next_id();
        let membership = TeamMember {
            id: state.next_id(),
            user: owner.clone(),
            role: TeamRole::Owner,
            joined_at: Some(now),
            invited_by: None,
        };
        let created = Team {
            id,
            name: team.name.clone(),
            description: team.description.clone(),
            owner: Some(owner),
            members: vec![membership],
            member_count: 1,
            created_at: Some(now),
            updated_at: Some(now),
            is_active: true,
        };
        state.teams.push(created.clone());
        Ok(created)
    }

    async fn update_team(&self, id: TeamId, patch: &TeamPatch) -> FocusResult<Team> {
        let mut state = self.enter().await?;
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(FocusError::validation("Team name may not be blank"));
        }
        let team = state.team_mut(id)?;
        if let Some(name) = &patch.name {
            team.name = name.clone();
        }
        if let Some(description) = &patch.description {
            team.description = Some(description.clone());
        }
        if let Some(is_active) = patch.is_active {
            team.is_active = is_active;
        }
        team.updated_at = Some(Utc::now());
        Ok(team.clone())
    }

    async fn delete_team(&self, id: TeamId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        state.team_mut(id)?;
        state.teams.retain(|t| t.id != id);
        Ok(())
    }

    async fn invite_member(&self, id: TeamId, invite: &MemberInvite) -> FocusResult<TeamMember> {
        let mut state = self.enter().await?;
        if invite.role == TeamRole::Owner {
            return Err(FocusError::validation("A team has exactly one owner"));
        }
        let inviter = state.me()?;
        let invitee = state
            .users
            .iter()
            .find(|u| u.email == invite.email)
            .cloned()
            .ok_or_else(|| FocusError::not_found("User with this email does not exist"))?;
        let member_id = state.next_id();
        let team = state.team_mut(id)?;
        if team.member(invitee.id).is_some() {
            return Err(FocusError::validation("User is already a team member"));
        }

        let member = TeamMember {
            id: member_id,
            user: invitee,
            role: invite.role,
            joined_at: Some(Utc::now()),
            invited_by: Some(inviter),
        };
        team.members.push(member.clone());
        team.member_count = team.members.len();
        Ok(member)
    }

    async fn remove_member(&self, id: TeamId, user_id: UserId) -> FocusResult<()> {
        let mut state = self.enter().await?;
        let team = state.team_mut(id)?;
        match team.role_of(user_id) {
            None => return Err(FocusError::not_found(format!("Member: {}", user_id))),
            Some(TeamRole::Owner) => {
                return Err(FocusError::validation("The team owner cannot be removed"))
            }
            Some(_) => {}
        }
        team.members.retain(|m| m.user.id != user_id);
        team.member_count = team.members.len();
        Ok(())
    }

    async fn update_member_role(
        &self,
        id: TeamId,
        user_id: UserId,
        role: TeamRole,
    ) -> FocusResult<TeamMember> {
        let mut state = self.enter().await?;
        if role == TeamRole::Owner {
            return Err(FocusError::validation("A team has exactly one owner"));
        }
        let team = state.team_mut(id)?;
        let member = team
            .members
            .iter_mut()
            .find(|m| m.user.id == user_id)
            .ok_or_else(|| FocusError::not_found(format!("Member: {}", user_id)))?;
        if member.role == TeamRole::Owner {
            return Err(FocusError::validation("The owner's role cannot be changed"));
        }
        member.role = role;
        Ok(member.clone())
    }
}

fn tally(window: &mut StatsWindow, session: &FocusSession) {
    window.total_sessions += 1;
    if session.session_type == SessionKind::Work {
        window.work_sessions += 1;
    }
    window.total_minutes += session.duration_minutes;
}

// ============================================================
// REMINDERS
// ============================================================

#[async_trait]
impl ReminderGateway for InMemoryGateway {
    async fn due_soon_cards(&self) -> FocusResult<Vec<Card>> {
        let state = self.enter().await?;
        let now = Utc::now();
        let horizon = now + ChronoDuration::days(DUE_SOON_DAYS);
        let mut cards: Vec<Card> = state
            .cards()
            .filter(|c| !c.completed)
            .filter(|c| c.due_date.is_some_and(|due| due >= now && due <= horizon))
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.due_date);
        Ok(cards)
    }

    async fn dashboard_summary(&self) -> FocusResult<DashboardSummary> {
        let state = self.enter().await?;
        let total = state.cards().count() as u32;
        let completed = state.cards().filter(|c| c.completed).count() as u32;
        Ok(DashboardSummary {
            total_cards: total,
            completed_cards: completed,
        })
    }
}
