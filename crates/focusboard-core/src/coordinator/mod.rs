//! Mutation coordinator for the active board.
//!
//! Every write to the board cache goes through here. Card moves are
//! optimistic: the cache moves first and the remote store's answer is
//! merged in afterwards. Everything else lands in the cache only once the
//! remote store has confirmed it.

mod store;

pub use store::BoardStore;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::board::{
    Board, BoardId, BoardPatch, BoardSummary, CanonicalRecord, Card, CardId, CardPatch, Comment,
    CommentId, CommentPatch, GoalId, Label, LabelId, List, ListId, ListPatch, NewBoard, NewCard,
    NewComment, NewList, RecordKind,
};
use crate::cache::{BoardCache, CardPlacement};
use crate::error::{FocusError, FocusResult};
use crate::gateway::BoardGateway;
use crate::mutation::{MutationOp, MutationPhase};

/// What happens to an optimistic move the remote store rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveFailurePolicy {
    /// Keep the optimistic placement; a reload repairs any divergence.
    #[default]
    Retain,
    /// Move the card back, provided nothing else has moved it since.
    Rollback,
}

impl MoveFailurePolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "retain" => Some(Self::Retain),
            "rollback" => Some(Self::Rollback),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retain => "retain",
            Self::Rollback => "rollback",
        }
    }
}

#[derive(Clone)]
pub struct BoardCoordinator {
    gateway: Arc<dyn BoardGateway>,
    store: BoardStore,
    move_failure: MoveFailurePolicy,
}

impl BoardCoordinator {
    pub fn new(gateway: Arc<dyn BoardGateway>, store: BoardStore) -> Self {
        Self {
            gateway,
            store,
            move_failure: MoveFailurePolicy::default(),
        }
    }

    pub fn with_move_failure(mut self, policy: MoveFailurePolicy) -> Self {
        self.move_failure = policy;
        self
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    // ============================================================
    // BOARDS
    // ============================================================

    pub async fn load_boards(&self) -> FocusResult<Vec<BoardSummary>> {
        self.clear_error();
        match self.gateway.list_boards().await {
            Ok(summaries) => {
                debug!(count = summaries.len(), "Loaded board summaries");
                self.store.write(|c| c.set_summaries(summaries.clone()));
                Ok(summaries)
            }
            Err(e) => self.fail("load boards", e),
        }
    }

    /// Fetch a board with all its lists and cards and make it the active one.
    pub async fn load_board(&self, id: BoardId) -> FocusResult<Board> {
        self.clear_error();
        match self.gateway.get_board(id).await {
            Ok(board) => {
                let loaded = self.store.write(|c| {
                    c.load_board(board);
                    c.active().cloned()
                });
                info!(board_id = id, "Board loaded");
                loaded.ok_or_else(|| FocusError::inconsistency("board vanished after load"))
            }
            Err(e) => self.fail("load board", e),
        }
    }

    pub async fn create_board(&self, board: NewBoard) -> FocusResult<Board> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Create, RecordKind::Board, None);
        let result = self.gateway.create_board(&board).await;
        self.settle(mutation, &result);
        match result {
            Ok(created) => {
                info!(board_id = created.id, title = %created.title, "Board created");
                self.store.write(|c| c.upsert_summary(BoardSummary::from(&created)));
                Ok(created)
            }
            Err(e) => self.fail("create board", e),
        }
    }

    /// Returns `None` when the board no longer exists remotely.
    pub async fn update_board(&self, id: BoardId, patch: BoardPatch) -> FocusResult<Option<Board>> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Update, RecordKind::Board, Some(id));
        let result = self.gateway.update_board(id, &patch).await;
        self.settle(mutation, &result);
        match result {
            Ok(board) => {
                self.merge(CanonicalRecord::Board(board.clone()));
                Ok(Some(board))
            }
            Err(e) => self.drop_if_missing("update board", e),
        }
    }

    pub async fn delete_board(&self, id: BoardId) -> FocusResult<()> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Delete, RecordKind::Board, Some(id));
        let result = self.gateway.delete_board(id).await;
        self.settle(mutation, &result);
        match result {
            Ok(()) => {
                self.store.write(|c| c.remove_board(id));
                info!(board_id = id, "Board deleted");
                Ok(())
            }
            Err(e) => self.fail("delete board", e),
        }
    }

    // ============================================================
    // LISTS
    // ============================================================

    pub async fn create_list(&self, list: NewList) -> FocusResult<List> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Create, RecordKind::List, None);
        let result = self.gateway.create_list(&list).await;
        self.settle(mutation, &result);
        match result {
            Ok(mut created) => {
                created.board_id = created.board_id.or(Some(list.board_id));
                let inserted = self.store.write(|c| c.insert_list(created.clone()));
                if inserted {
                    info!(list_id = created.id, position = created.position, "List created");
                } else {
                    debug!(list_id = created.id, "Created list is not on the active board");
                }
                Ok(self.cached_list(created.id).unwrap_or(created))
            }
            Err(e) => self.fail("create list", e),
        }
    }

    /// Returns `None` when the list no longer exists remotely.
    pub async fn update_list(&self, id: ListId, patch: ListPatch) -> FocusResult<Option<List>> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Update, RecordKind::List, Some(id));
        let result = self.gateway.update_list(id, &patch).await;
        self.settle(mutation, &result);
        match result {
            Ok(list) => {
                self.merge(CanonicalRecord::List(list.clone()));
                Ok(Some(self.cached_list(id).unwrap_or(list)))
            }
            Err(e) => self.drop_if_missing("update list", e),
        }
    }

    /// Move a list among its siblings once the remote store agrees.
    pub async fn reorder_list(&self, id: ListId, position: usize) -> FocusResult<()> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Reorder, RecordKind::List, Some(id));
        let result = self.gateway.reorder_list(id, position).await;
        self.settle(mutation, &result);
        match result {
            Ok(()) => {
                if let Err(e) = self.store.write(|c| c.move_list(id, position)) {
                    warn!(list_id = id, error = %e, "Reordered list is not on the active board");
                }
                Ok(())
            }
            Err(e) => self.fail("reorder list", e),
        }
    }

    pub async fn delete_list(&self, id: ListId) -> FocusResult<()> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Delete, RecordKind::List, Some(id));
        let result = self.gateway.delete_list(id).await;
        self.settle(mutation, &result);
        match result {
            Ok(()) => {
                let removed = self.store.write(|c| c.remove_list(id));
                info!(
                    list_id = id,
                    cards = removed.map_or(0, |l| l.cards.len()),
                    "List deleted"
                );
                Ok(())
            }
            Err(e) => self.fail("delete list", e),
        }
    }

    // ============================================================
    // CARDS
    // ============================================================

    pub async fn create_card(&self, card: NewCard) -> FocusResult<Card> {
        self.clear_error();
        let list_id = card.list_id;
        let mutation = self.begin(MutationOp::Create, RecordKind::Card, None);
        let result = self.gateway.create_card(&card).await;
        self.settle(mutation, &result);
        match result {
            Ok(created) => {
                let target = created.list_id.unwrap_or(list_id);
                let position = created.position;
                let card_id = created.id;
                let inserted = self.store.write(|c| c.insert_card(target, created.clone(), position));
                if inserted {
                    info!(card_id, list_id = target, position, "Card created");
                }
                Ok(self.cached_card(card_id).unwrap_or(created))
            }
            Err(e) => self.fail("create card", e),
        }
    }

    /// Merge a confirmed card update into the cache.
    ///
    /// Returns `None` when the card no longer exists remotely; the cache is
    /// left untouched in that case.
    pub async fn update_card(&self, id: CardId, patch: CardPatch) -> FocusResult<Option<Card>> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Update, RecordKind::Card, Some(id));
        let result = self.gateway.update_card(id, &patch).await;
        self.settle(mutation, &result);
        match result {
            Ok(card) => {
                self.merge(CanonicalRecord::Card(card.clone()));
                Ok(Some(self.cached_card(id).unwrap_or(card)))
            }
            Err(e) => self.drop_if_missing("update card", e),
        }
    }

    pub async fn delete_card(&self, id: CardId) -> FocusResult<()> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Delete, RecordKind::Card, Some(id));
        let result = self.gateway.delete_card(id).await;
        self.settle(mutation, &result);
        match result {
            Ok(()) => {
                if self.store.write(|c| c.remove_card(id)).is_some() {
                    info!(card_id = id, "Card deleted");
                }
                Ok(())
            }
            Err(e) => self.fail("delete card", e),
        }
    }

    /// Move a card, updating the cache before the remote store answers.
    ///
    /// Readers see the new placement as soon as this is called. The remote
    /// store's placement is merged in when it confirms and is final.
    pub async fn move_card(
        &self,
        card_id: CardId,
        dest_list_id: ListId,
        dest_position: usize,
    ) -> FocusResult<Card> {
        self.clear_error();
        let tracker = self.store.mutations();
        let mutation = tracker.begin(MutationOp::Move, RecordKind::Card, Some(card_id));

        let applied = self.store.write(|c| {
            c.move_card(card_id, dest_list_id, dest_position)
                .map(|previous| (previous, c.placement(card_id)))
        });
        let (previous, optimistic) = match applied {
            Ok(placements) => placements,
            Err(e) => {
                tracker.advance(mutation, MutationPhase::Failed);
                return self.fail("move card", e);
            }
        };
        tracker.advance(mutation, MutationPhase::InFlight);

        match self.gateway.move_card(card_id, dest_list_id, dest_position).await {
            Ok(mut canonical) => {
                tracker.advance(mutation, MutationPhase::Confirmed);
                canonical.list_id = canonical.list_id.or(Some(dest_list_id));
                self.settle_move(canonical.clone());
                info!(
                    card_id,
                    list_id = canonical.list_id,
                    position = canonical.position,
                    "Card move confirmed"
                );
                Ok(self.cached_card(card_id).unwrap_or(canonical))
            }
            Err(e) => {
                tracker.advance(mutation, MutationPhase::Failed);
                if self.move_failure == MoveFailurePolicy::Rollback {
                    self.roll_back(card_id, previous, optimistic);
                }
                self.fail("move card", e)
            }
        }
    }

    fn settle_move(&self, canonical: Card) {
        let card_id = canonical.id;
        self.store.write(|c| {
            let on_board = canonical.list_id.is_some_and(|l| c.list(l).is_some());
            if on_board {
                c.replace_record(CanonicalRecord::Card(canonical));
            } else if c.remove_card(card_id).is_some() {
                debug!(card_id, "Card moved off the active board");
            }
        });
    }

    fn roll_back(&self, card_id: CardId, previous: CardPlacement, optimistic: Option<CardPlacement>) {
        self.store.write(|c| {
            if c.placement(card_id) != optimistic {
                debug!(card_id, "Card moved again since the failed move, not rolling back");
                return;
            }
            match c.move_card(card_id, previous.list_id, previous.index) {
                Ok(_) => debug!(card_id, list_id = previous.list_id, "Rolled back failed move"),
                Err(e) => warn!(card_id, error = %e, "Could not roll back failed move"),
            }
        });
    }

    // ============================================================
    // COMMENTS
    // ============================================================

    pub async fn add_comment(&self, card_id: CardId, content: &str) -> FocusResult<Comment> {
        self.clear_error();
        if content.trim().is_empty() {
            return self.fail("add comment", FocusError::validation("comment may not be blank"));
        }
        let request = NewComment {
            card_id,
            content: content.to_string(),
        };
        let mutation = self.begin(MutationOp::Create, RecordKind::Comment, None);
        let result = self.gateway.create_comment(&request).await;
        self.settle(mutation, &result);
        match result {
            Ok(comment) => {
                if self.store.write(|c| c.insert_comment(card_id, comment.clone())) {
                    info!(card_id, comment_id = comment.id, "Comment added");
                }
                Ok(comment)
            }
            Err(e) => self.fail("add comment", e),
        }
    }

    pub async fn edit_comment(&self, id: CommentId, content: &str) -> FocusResult<Option<Comment>> {
        self.clear_error();
        let patch = CommentPatch {
            content: content.to_string(),
        };
        let mutation = self.begin(MutationOp::Update, RecordKind::Comment, Some(id));
        let result = self.gateway.update_comment(id, &patch).await;
        self.settle(mutation, &result);
        match result {
            Ok(comment) => {
                if !self.store.write(|c| c.replace_comment(&comment)) {
                    debug!(comment_id = id, "Edited comment is not cached");
                }
                Ok(Some(comment))
            }
            Err(e) => self.drop_if_missing("edit comment", e),
        }
    }

    pub async fn delete_comment(&self, id: CommentId) -> FocusResult<()> {
        self.clear_error();
        let mutation = self.begin(MutationOp::Delete, RecordKind::Comment, Some(id));
        let result = self.gateway.delete_comment(id).await;
        self.settle(mutation, &result);
        match result {
            Ok(()) => {
                if self.store.write(|c| c.remove_comment(id)).is_some() {
                    info!(comment_id = id, "Comment deleted");
                }
                Ok(())
            }
            Err(e) => self.fail("delete comment", e),
        }
    }

    // ============================================================
    // CONFIRMED SATELLITE CHANGES
    // ============================================================

    /// Refresh the embedded copy of a confirmed label edit on cached cards.
    pub fn apply_label_update(&self, label: &Label) -> usize {
        let touched = self.apply_confirmed(MutationOp::Update, RecordKind::Label, label.id, |c| {
            c.refresh_label(label)
        });
        debug!(label_id = label.id, cards = touched, "Label refreshed on cached cards");
        touched
    }

    /// Strip a label the remote store deleted from cached cards.
    pub fn apply_label_removal(&self, id: LabelId) -> usize {
        let touched =
            self.apply_confirmed(MutationOp::Delete, RecordKind::Label, id, |c| c.strip_label(id));
        debug!(label_id = id, cards = touched, "Label stripped from cached cards");
        touched
    }

    /// Record a confirmed card→goal link, or its removal with `None`.
    pub fn apply_goal_link(&self, card_id: CardId, goal: Option<GoalId>) -> bool {
        let linked = self.apply_confirmed(MutationOp::Update, RecordKind::Card, card_id, |c| {
            c.set_card_goal(card_id, goal)
        });
        if !linked {
            debug!(card_id, "Linked card is not cached");
        }
        linked
    }

    /// Drop every cached link to a goal the remote store deleted.
    pub fn apply_goal_removal(&self, goal_id: GoalId) -> usize {
        let touched = self.apply_confirmed(MutationOp::Delete, RecordKind::Goal, goal_id, |c| {
            c.unlink_goal(goal_id)
        });
        debug!(goal_id, cards = touched, "Goal unlinked from cached cards");
        touched
    }

    // ============================================================
    // INTERNALS
    // ============================================================

    /// Apply a change the remote store has already confirmed elsewhere.
    fn apply_confirmed<R>(
        &self,
        op: MutationOp,
        kind: RecordKind,
        id: i64,
        f: impl FnOnce(&mut BoardCache) -> R,
    ) -> R {
        let mutation = self.begin(op, kind, Some(id));
        let applied = self.store.write(f);
        self.store.mutations().advance(mutation, MutationPhase::Confirmed);
        applied
    }

    fn merge(&self, record: CanonicalRecord) {
        let kind = record.kind();
        let id = record.id();
        if !self.store.write(|c| c.replace_record(record)) {
            debug!(kind = kind.as_str(), id, "Confirmed record is not cached, update dropped");
        }
    }

    fn cached_card(&self, id: CardId) -> Option<Card> {
        self.store.read(|c| c.card(id).cloned())
    }

    fn cached_list(&self, id: ListId) -> Option<List> {
        self.store.read(|c| c.list(id).cloned())
    }

    fn begin(&self, op: MutationOp, kind: RecordKind, id: Option<i64>) -> Uuid {
        let tracker = self.store.mutations();
        let mutation = tracker.begin(op, kind, id);
        tracker.advance(mutation, MutationPhase::InFlight);
        mutation
    }

    fn settle<T>(&self, mutation: Uuid, result: &FocusResult<T>) {
        let phase = if result.is_ok() {
            MutationPhase::Confirmed
        } else {
            MutationPhase::Failed
        };
        self.store.mutations().advance(mutation, phase);
    }

    fn clear_error(&self) {
        self.store.write(|c| c.clear_error());
    }

    fn fail<T>(&self, action: &str, err: FocusError) -> FocusResult<T> {
        warn!(action, error = %err, "Board mutation failed");
        self.store
            .write(|c| c.record_error(format!("Failed to {}: {}", action, err)));
        Err(err)
    }

    /// Updates of entities the remote store no longer knows are dropped.
    fn drop_if_missing<T>(&self, action: &str, err: FocusError) -> FocusResult<Option<T>> {
        match err {
            FocusError::NotFound(_) => {
                warn!(action, error = %err, "Update addressed a missing entity, dropped");
                self.store
                    .write(|c| c.record_error(format!("Failed to {}: {}", action, err)));
                Ok(None)
            }
            other => self.fail(action, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::{board, card, list};
    use crate::gateway::InMemoryGateway;

    fn setup() -> (Arc<InMemoryGateway>, BoardCoordinator) {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.seed_board(board(
            1,
            vec![
                list(10, 0, vec![card(1, 0), card(2, 1), card(3, 2)]),
                list(20, 1, vec![card(4, 0)]),
            ],
        ));
        let coordinator = BoardCoordinator::new(gateway.clone(), BoardStore::new());
        (gateway, coordinator)
    }

    fn ids(coordinator: &BoardCoordinator, list_id: ListId) -> Vec<CardId> {
        coordinator
            .store()
            .read(|c| c.list(list_id).map(|l| l.cards.iter().map(|c| c.id).collect()))
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_create_card_appends_after_confirmation() {
        let (_, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();

        let created = coordinator.create_card(NewCard::new(20, "Review")).await.unwrap();
        assert_eq!(created.list_id, Some(20));
        assert_eq!(created.position, 1);
        assert_eq!(ids(&coordinator, 20), vec![4, created.id]);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_cache_and_records_error() {
        let (gateway, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();
        gateway.fail_next(FocusError::network("timeout"));

        let err = coordinator.create_card(NewCard::new(20, "Review")).await.unwrap_err();
        assert!(matches!(err, FocusError::Network(_)));
        assert_eq!(ids(&coordinator, 20), vec![4]);
        let last = coordinator.store().read(|c| c.last_error().map(str::to_string));
        assert!(last.unwrap().contains("create card"));
    }

    #[tokio::test]
    async fn test_update_list_keeps_cards() {
        let (_, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();
        let patch = ListPatch {
            title: Some("Later".into()),
        };
        let updated = coordinator.update_list(20, patch).await.unwrap().unwrap();
        assert_eq!(updated.title, "Later");
        assert_eq!(updated.position, 1);
        assert_eq!(updated.cards.len(), 1);
    }

    #[tokio::test]
    async fn test_update_list_applies_remote_position() {
        let (gateway, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();
        // Reordered by another client since the board was loaded.
        gateway.reorder_list(20, 0).await.unwrap();

        let patch = ListPatch {
            title: Some("Now".into()),
        };
        let updated = coordinator.update_list(20, patch).await.unwrap().unwrap();
        assert_eq!(updated.position, 0);
        let order: Vec<ListId> = coordinator
            .store()
            .read(|c| c.active().unwrap().lists.iter().map(|l| l.id).collect());
        assert_eq!(order, vec![20, 10]);
        assert_eq!(ids(&coordinator, 20), vec![4]);
    }

    #[tokio::test]
    async fn test_reorder_list() {
        let (gateway, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();
        coordinator.reorder_list(20, 0).await.unwrap();

        let order: Vec<ListId> = coordinator
            .store()
            .read(|c| c.active().unwrap().lists.iter().map(|l| l.id).collect());
        assert_eq!(order, vec![20, 10]);
        assert_eq!(gateway.snapshot(1).unwrap().lists[0].id, 20);
    }

    #[tokio::test]
    async fn test_delete_list_drops_its_cards() {
        let (_, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();
        coordinator.delete_list(10).await.unwrap();
        assert!(coordinator.store().read(|c| c.list_of_card(1).is_none()));
        coordinator.store().read(|c| c.verify()).unwrap();
    }

    #[tokio::test]
    async fn test_rollback_policy_restores_placement() {
        let (gateway, coordinator) = setup();
        let coordinator = coordinator.with_move_failure(MoveFailurePolicy::Rollback);
        coordinator.load_board(1).await.unwrap();

        gateway.fail_next(FocusError::validation("bad position"));
        assert!(coordinator.move_card(2, 20, 0).await.is_err());
        assert_eq!(ids(&coordinator, 10), vec![1, 2, 3]);
        assert_eq!(ids(&coordinator, 20), vec![4]);
    }

    #[tokio::test]
    async fn test_retain_policy_keeps_optimistic_placement() {
        let (gateway, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();

        gateway.fail_next(FocusError::network("offline"));
        assert!(coordinator.move_card(2, 20, 0).await.is_err());
        assert_eq!(ids(&coordinator, 20), vec![2, 4]);
        assert!(coordinator.store().mutations().in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_move_of_uncached_card_fails_without_remote_call() {
        let (_, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();
        let err = coordinator.move_card(99, 20, 0).await.unwrap_err();
        assert!(matches!(err, FocusError::NotFound(_)));
        coordinator.store().read(|c| c.verify()).unwrap();
    }

    #[tokio::test]
    async fn test_comment_thread_follows_confirmations() {
        let (gateway, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();

        let first = coordinator.add_comment(2, "looks good").await.unwrap();
        let second = coordinator.add_comment(2, "one nit").await.unwrap();
        let thread = |c: &BoardCoordinator| {
            c.store()
                .read(|cache| cache.card(2).unwrap().comments.iter().map(|m| m.id).collect::<Vec<_>>())
        };
        assert_eq!(thread(&coordinator), vec![second.id, first.id]);

        coordinator.edit_comment(first.id, "looks great").await.unwrap();
        let cached = coordinator.store().read(|c| c.card(2).unwrap().comments[1].content.clone());
        assert_eq!(cached, "looks great");

        gateway.fail_next(FocusError::network("timeout"));
        assert!(coordinator.delete_comment(second.id).await.is_err());
        assert_eq!(thread(&coordinator).len(), 2);

        coordinator.delete_comment(second.id).await.unwrap();
        assert_eq!(thread(&coordinator), vec![first.id]);

        let reloaded = coordinator.load_board(1).await.unwrap();
        assert_eq!(reloaded.lists[0].cards[1].comments.len(), 1);
        assert!(coordinator.store().mutations().in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_blank_comment_is_not_sent() {
        let (_, coordinator) = setup();
        coordinator.load_board(1).await.unwrap();
        assert!(matches!(
            coordinator.add_comment(2, "   ").await,
            Err(FocusError::Validation(_))
        ));
        assert!(coordinator.store().read(|c| c.last_error().is_some()));
        assert!(coordinator.edit_comment(404, "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_board_clears_active() {
        let (_, coordinator) = setup();
        coordinator.load_boards().await.unwrap();
        coordinator.load_board(1).await.unwrap();
        coordinator.delete_board(1).await.unwrap();
        assert!(coordinator.store().read(|c| c.active().is_none() && c.summaries().is_empty()));
    }
}
