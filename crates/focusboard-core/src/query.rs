//! Read-only views over the board cache.
//!
//! Nothing here is memoized: every call reads the cache as it is right
//! now, optimistic placements included.

use chrono::{DateTime, Utc};

use crate::board::{Board, BoardId, BoardSummary, Card, CardId, GoalId, LabelId, List, ListId};
use crate::coordinator::BoardStore;
use crate::mutation::Mutation;

#[derive(Clone)]
pub struct BoardQuery {
    store: BoardStore,
}

impl BoardQuery {
    pub fn new(store: BoardStore) -> Self {
        Self { store }
    }

    pub fn active_board(&self) -> Option<Board> {
        self.store.read(|c| c.active().cloned())
    }

    /// The board with `id`, if it is the one currently loaded.
    pub fn board_by_id(&self, id: BoardId) -> Option<Board> {
        self.store
            .read(|c| c.active().filter(|b| b.id == id).cloned())
    }

    pub fn boards(&self) -> Vec<BoardSummary> {
        self.store.read(|c| c.summaries().to_vec())
    }

    pub fn summary_by_id(&self, id: BoardId) -> Option<BoardSummary> {
        self.store
            .read(|c| c.summaries().iter().find(|s| s.id == id).cloned())
    }

    /// Lists of a loaded board in position order. Empty if the board is not loaded.
    pub fn lists_of_board(&self, board_id: BoardId) -> Vec<List> {
        self.store.read(|c| {
            c.active()
                .filter(|b| b.id == board_id)
                .map(|b| b.lists.clone())
                .unwrap_or_default()
        })
    }

    /// Cards of a list in position order.
    pub fn cards_of_list(&self, list_id: ListId) -> Vec<Card> {
        self.store
            .read(|c| c.list(list_id).map(|l| l.cards.clone()).unwrap_or_default())
    }

    pub fn list_by_id(&self, id: ListId) -> Option<List> {
        self.store.read(|c| c.list(id).cloned())
    }

    pub fn card_by_id(&self, id: CardId) -> Option<Card> {
        self.store.read(|c| c.card(id).cloned())
    }

    /// The list currently holding a card.
    pub fn list_of_card(&self, id: CardId) -> Option<ListId> {
        self.store.read(|c| c.list_of_card(id))
    }

    pub fn last_error(&self) -> Option<String> {
        self.store.read(|c| c.last_error().map(str::to_string))
    }

    /// Mutations still waiting on the remote store.
    pub fn pending_mutations(&self) -> Vec<Mutation> {
        self.store.mutations().in_flight()
    }

    pub fn overdue_cards(&self, now: DateTime<Utc>) -> Vec<Card> {
        self.cards_where(|card| card.is_overdue(now))
    }

    pub fn due_soon_cards(&self, now: DateTime<Utc>) -> Vec<Card> {
        self.cards_where(|card| card.is_due_soon(now))
    }

    pub fn cards_with_label(&self, label_id: LabelId) -> Vec<Card> {
        self.cards_where(|card| card.has_label(label_id))
    }

    pub fn cards_for_goal(&self, goal_id: GoalId) -> Vec<Card> {
        self.cards_where(|card| card.goal == Some(goal_id))
    }

    fn cards_where(&self, pred: impl Fn(&Card) -> bool) -> Vec<Card> {
        self.store.read(|c| {
            c.active()
                .into_iter()
                .flat_map(|b| b.lists.iter())
                .flat_map(|l| l.cards.iter())
                .filter(|card| pred(card))
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::tests::{board, card, list};
    use crate::coordinator::BoardCoordinator;
    use crate::gateway::InMemoryGateway;
    use chrono::Duration;

    async fn query() -> (BoardCoordinator, BoardQuery) {
        let mut late = card(3, 0);
        late.due_date = Some(Utc::now() - Duration::hours(2));
        let mut soon = card(4, 1);
        soon.due_date = Some(Utc::now() + Duration::hours(2));
        soon.goal = Some(9);

        let gateway = Arc::new(InMemoryGateway::new());
        gateway.seed_board(board(
            1,
            vec![
                list(10, 0, vec![card(1, 0), card(2, 1)]),
                list(20, 1, vec![late, soon]),
            ],
        ));
        let coordinator = BoardCoordinator::new(gateway, BoardStore::new());
        coordinator.load_boards().await.unwrap();
        coordinator.load_board(1).await.unwrap();
        let query = BoardQuery::new(coordinator.store().clone());
        (coordinator, query)
    }

    #[tokio::test]
    async fn test_lookups() {
        let (_, q) = query().await;
        assert!(q.board_by_id(1).is_some());
        assert!(q.board_by_id(2).is_none());
        assert_eq!(q.lists_of_board(1).len(), 2);
        assert!(q.lists_of_board(2).is_empty());
        assert_eq!(q.cards_of_list(20).len(), 2);
        assert!(q.cards_of_list(99).is_empty());
        assert_eq!(q.list_of_card(4), Some(20));
        assert_eq!(q.card_by_id(2).unwrap().position, 1);
        assert_eq!(q.boards().len(), 1);
    }

    #[tokio::test]
    async fn test_due_filters() {
        let (_, q) = query().await;
        let now = Utc::now();
        let overdue: Vec<CardId> = q.overdue_cards(now).iter().map(|c| c.id).collect();
        assert_eq!(overdue, vec![3]);
        let soon: Vec<CardId> = q.due_soon_cards(now).iter().map(|c| c.id).collect();
        assert_eq!(soon, vec![4]);
        assert_eq!(q.cards_for_goal(9).len(), 1);
    }

    #[tokio::test]
    async fn test_reflects_writes_immediately() {
        let (coordinator, q) = query().await;
        coordinator.move_card(1, 20, 0).await.unwrap();
        assert_eq!(q.cards_of_list(20)[0].id, 1);
        assert_eq!(q.cards_of_list(10).len(), 1);
    }
}
