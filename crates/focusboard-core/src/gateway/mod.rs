//! Remote store gateway contracts.
//!
//! The remote store is authoritative. Every call either returns the
//! canonical record as finally stored or an error; transport and
//! authentication are the implementation's concern.

pub mod memory;

use async_trait::async_trait;

use crate::board::{
    Board, BoardId, BoardPatch, BoardSummary, Card, CardId, CardPatch, Comment, CommentId,
    CommentPatch, GoalId, Label, LabelId, LabelPatch, List, ListId, ListPatch, NewBoard, NewCard,
    NewComment, NewLabel, NewList, User, UserId,
};
use crate::error::FocusResult;
use crate::goals::{Goal, GoalPatch, NewGoal};
use crate::pomodoro::{FocusSession, FocusStats, NewFocusSession};
use crate::reminders::DashboardSummary;
use crate::teams::{MemberInvite, NewTeam, Team, TeamId, TeamMember, TeamPatch, TeamRole};

pub use memory::{InMemoryGateway, MoveRule};

#[async_trait]
pub trait BoardGateway: Send + Sync {
    async fn list_boards(&self) -> FocusResult<Vec<BoardSummary>>;

    /// Board with nested lists, each with nested cards.
    async fn get_board(&self, id: BoardId) -> FocusResult<Board>;

    async fn create_board(&self, board: &NewBoard) -> FocusResult<Board>;

    async fn update_board(&self, id: BoardId, patch: &BoardPatch) -> FocusResult<Board>;

    async fn delete_board(&self, id: BoardId) -> FocusResult<()>;

    async fn create_list(&self, list: &NewList) -> FocusResult<List>;

    async fn update_list(&self, id: ListId, patch: &ListPatch) -> FocusResult<List>;

    async fn reorder_list(&self, id: ListId, position: usize) -> FocusResult<()>;

    async fn delete_list(&self, id: ListId) -> FocusResult<()>;

    async fn create_card(&self, card: &NewCard) -> FocusResult<Card>;

    async fn update_card(&self, id: CardId, patch: &CardPatch) -> FocusResult<Card>;

    async fn delete_card(&self, id: CardId) -> FocusResult<()>;

    /// Move a card; the response carries the list and position as stored.
    async fn move_card(&self, id: CardId, list_id: ListId, position: usize) -> FocusResult<Card>;

    /// The comment as stored, authored by the signed-in user.
    async fn create_comment(&self, comment: &NewComment) -> FocusResult<Comment>;

    async fn update_comment(&self, id: CommentId, patch: &CommentPatch) -> FocusResult<Comment>;

    async fn delete_comment(&self, id: CommentId) -> FocusResult<()>;
}

#[async_trait]
pub trait LabelGateway: Send + Sync {
    async fn list_labels(&self) -> FocusResult<Vec<Label>>;

    async fn create_label(&self, label: &NewLabel) -> FocusResult<Label>;

    async fn update_label(&self, id: LabelId, patch: &LabelPatch) -> FocusResult<Label>;

    async fn delete_label(&self, id: LabelId) -> FocusResult<()>;
}

#[async_trait]
pub trait GoalGateway: Send + Sync {
    async fn list_goals(&self) -> FocusResult<Vec<Goal>>;

    async fn get_goal(&self, id: GoalId) -> FocusResult<Goal>;

    async fn create_goal(&self, goal: &NewGoal) -> FocusResult<Goal>;

    async fn update_goal(&self, id: GoalId, patch: &GoalPatch) -> FocusResult<Goal>;

    async fn complete_goal(&self, id: GoalId) -> FocusResult<Goal>;

    async fn reopen_goal(&self, id: GoalId) -> FocusResult<Goal>;

    async fn delete_goal(&self, id: GoalId) -> FocusResult<()>;

    async fn link_card(&self, id: GoalId, card_id: CardId) -> FocusResult<()>;

    async fn unlink_card(&self, id: GoalId, card_id: CardId) -> FocusResult<()>;
}

#[async_trait]
pub trait FocusGateway: Send + Sync {
    async fn start_session(&self, session: &NewFocusSession) -> FocusResult<FocusSession>;

    async fn complete_session(&self, id: i64) -> FocusResult<()>;

    async fn session_stats(&self) -> FocusResult<FocusStats>;
}

#[async_trait]
pub trait ReminderGateway: Send + Sync {
    /// Open cards due soon, across every board.
    async fn due_soon_cards(&self) -> FocusResult<Vec<Card>>;

    async fn dashboard_summary(&self) -> FocusResult<DashboardSummary>;
}

#[async_trait]
pub trait TeamGateway: Send + Sync {
    /// The signed-in user.
    async fn current_user(&self) -> FocusResult<User>;

    /// Teams the signed-in user owns or belongs to.
    async fn list_teams(&self) -> FocusResult<Vec<Team>>;

    async fn get_team(&self, id: TeamId) -> FocusResult<Team>;

    async fn create_team(&self, team: &NewTeam) -> FocusResult<Team>;

    async fn update_team(&self, id: TeamId, patch: &TeamPatch) -> FocusResult<Team>;

    async fn delete_team(&self, id: TeamId) -> FocusResult<()>;

    /// `NotFound` when no account has the email, `Validation` when it is already a member.
    async fn invite_member(&self, id: TeamId, invite: &MemberInvite) -> FocusResult<TeamMember>;

    async fn remove_member(&self, id: TeamId, user_id: UserId) -> FocusResult<()>;

    async fn update_member_role(
        &self,
        id: TeamId,
        user_id: UserId,
        role: TeamRole,
    ) -> FocusResult<TeamMember>;
}
