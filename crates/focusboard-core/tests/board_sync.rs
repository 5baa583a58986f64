//! End-to-end behaviour of the coordinator, cache and query layer against
//! the in-process remote store.

use std::sync::Arc;
use std::time::Duration;

use focusboard_core::board::{
    Board, BoardId, Card, CardId, CardPatch, List, ListId, NewList, Priority,
};
use focusboard_core::gateway::{InMemoryGateway, MoveRule};
use focusboard_core::mutation::MutationOp;
use focusboard_core::{BoardCoordinator, BoardQuery, BoardStore, FocusError, MoveFailurePolicy};

fn card(id: CardId, position: usize) -> Card {
    Card {
        id,
        list_id: None,
        title: format!("Card {}", id),
        description: None,
        priority: Priority::Medium,
        position,
        due_date: None,
        estimated_hours: None,
        completed: false,
        completed_at: None,
        labels: vec![],
        goal: None,
        comments: vec![],
        created_at: None,
        updated_at: None,
    }
}

fn list(id: ListId, position: usize, cards: Vec<Card>) -> List {
    List {
        id,
        board_id: None,
        title: format!("List {}", id),
        position,
        created_at: None,
        updated_at: None,
        cards,
    }
}

fn board(id: BoardId, lists: Vec<List>) -> Board {
    Board {
        id,
        title: format!("Board {}", id),
        description: None,
        is_active: true,
        is_template: false,
        background_color: None,
        created_at: None,
        updated_at: None,
        lists,
    }
}

/// Board 1: list 10 = [1, 2, 3], list 20 = [4].
fn standard_board() -> Board {
    board(
        1,
        vec![
            list(10, 0, vec![card(1, 0), card(2, 1), card(3, 2)]),
            list(20, 1, vec![card(4, 0)]),
        ],
    )
}

async fn session(gateway: InMemoryGateway, seed: Board) -> (Arc<InMemoryGateway>, BoardCoordinator, BoardQuery) {
    let gateway = Arc::new(gateway);
    let board_id = seed.id;
    gateway.seed_board(seed);
    let store = BoardStore::new();
    let coordinator = BoardCoordinator::new(gateway.clone(), store.clone());
    coordinator.load_board(board_id).await.unwrap();
    (gateway, coordinator, BoardQuery::new(store))
}

fn card_ids(query: &BoardQuery, list_id: ListId) -> Vec<CardId> {
    query.cards_of_list(list_id).iter().map(|c| c.id).collect()
}

fn positions(query: &BoardQuery, list_id: ListId) -> Vec<usize> {
    query.cards_of_list(list_id).iter().map(|c| c.position).collect()
}

fn remote_ids(gateway: &InMemoryGateway, board_id: BoardId, list_id: ListId) -> Vec<CardId> {
    gateway
        .snapshot(board_id)
        .and_then(|b| b.lists.into_iter().find(|l| l.id == list_id))
        .map(|l| l.cards.iter().map(|c| c.id).collect())
        .unwrap_or_default()
}

fn assert_consistent(coordinator: &BoardCoordinator) {
    coordinator.store().read(|c| c.verify()).unwrap();
}

#[tokio::test]
async fn test_move_between_lists() {
    let (_, coordinator, query) = session(InMemoryGateway::new(), standard_board()).await;

    coordinator.move_card(2, 20, 0).await.unwrap();

    assert_eq!(card_ids(&query, 10), vec![1, 3]);
    assert_eq!(card_ids(&query, 20), vec![2, 4]);
    assert_eq!(positions(&query, 10), vec![0, 1]);
    assert_eq!(positions(&query, 20), vec![0, 1]);
    assert_eq!(query.list_of_card(2), Some(20));
    assert_consistent(&coordinator);
}

#[tokio::test]
async fn test_move_into_middle_of_list() {
    let seed = board(
        1,
        vec![
            list(1, 0, vec![card(5, 0), card(6, 1), card(7, 2)]),
            list(2, 1, vec![card(8, 0)]),
        ],
    );
    let (gateway, coordinator, query) = session(InMemoryGateway::new(), seed).await;

    let moved = coordinator.move_card(5, 2, 1).await.unwrap();

    assert_eq!(moved.position, 1);
    assert_eq!(card_ids(&query, 1), vec![6, 7]);
    assert_eq!(positions(&query, 1), vec![0, 1]);
    assert_eq!(card_ids(&query, 2), vec![8, 5]);
    assert_eq!(remote_ids(&gateway, 1, 2), vec![8, 5]);
    assert_consistent(&coordinator);
}

#[tokio::test]
async fn test_every_card_lives_in_exactly_one_list() {
    let (_, coordinator, query) = session(InMemoryGateway::new(), standard_board()).await;

    let moves = [(1, 20, 5), (4, 10, 0), (3, 20, 1), (2, 10, 2), (1, 10, 0), (4, 20, 0)];
    for (card_id, list_id, position) in moves {
        coordinator.move_card(card_id, list_id, position).await.unwrap();
        assert_consistent(&coordinator);
    }

    let mut all: Vec<CardId> = [10, 20].iter().flat_map(|l| card_ids(&query, *l)).collect();
    all.sort_unstable();
    assert_eq!(all, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_reload_is_idempotent() {
    let (_, coordinator, query) = session(InMemoryGateway::new(), standard_board()).await;
    coordinator.move_card(3, 20, 1).await.unwrap();

    coordinator.load_board(1).await.unwrap();
    let first = query.active_board();
    coordinator.load_board(1).await.unwrap();
    let second = query.active_board();

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_update_of_unknown_card_is_dropped() {
    let (_, coordinator, query) = session(InMemoryGateway::new(), standard_board()).await;
    let before = query.active_board();

    let patch = CardPatch {
        title: Some("Renamed".into()),
        ..CardPatch::default()
    };
    let result = coordinator.update_card(999, patch).await;

    assert!(matches!(result, Ok(None)));
    assert_eq!(query.active_board(), before);
    assert!(query.last_error().is_some());
}

#[tokio::test]
async fn test_create_first_list_on_empty_board() {
    let (_, coordinator, query) = session(InMemoryGateway::new(), board(1, vec![])).await;

    let created = coordinator
        .create_list(NewList {
            board_id: 1,
            title: "Todo".into(),
        })
        .await
        .unwrap();

    assert!(created.id > 1);
    assert_eq!(created.position, 0);
    let lists = query.lists_of_board(1);
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].id, created.id);
    assert_eq!(lists[0].title, "Todo");
}

#[tokio::test]
async fn test_rejected_update_leaves_cache_and_raises() {
    let (gateway, coordinator, query) = session(InMemoryGateway::new(), standard_board()).await;
    let before = query.card_by_id(2);

    gateway.fail_next(FocusError::validation("title too long"));
    let patch = CardPatch {
        title: Some("x".repeat(300)),
        ..CardPatch::default()
    };
    let result = coordinator.update_card(2, patch).await;

    assert!(matches!(result, Err(FocusError::Validation(_))));
    assert_eq!(query.card_by_id(2), before);
    assert!(query.last_error().unwrap().contains("title too long"));
}

#[tokio::test(start_paused = true)]
async fn test_move_is_visible_before_confirmation() {
    let gateway = InMemoryGateway::new().with_latency(Duration::from_millis(200));
    let (_, coordinator, query) = session(gateway, standard_board()).await;

    let mover = coordinator.clone();
    let handle = tokio::spawn(async move { mover.move_card(1, 20, 1).await });
    tokio::task::yield_now().await;

    assert_eq!(card_ids(&query, 10), vec![2, 3]);
    assert_eq!(card_ids(&query, 20), vec![4, 1]);
    let pending = query.pending_mutations();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].op, MutationOp::Move);

    handle.await.unwrap().unwrap();
    assert!(query.pending_mutations().is_empty());
    assert_eq!(card_ids(&query, 20), vec![4, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_moves_settle_on_remote_order() {
    let gateway = InMemoryGateway::new().with_latency(Duration::from_millis(100));
    let (gateway, coordinator, query) = session(gateway, standard_board()).await;

    let first = coordinator.clone();
    let a = tokio::spawn(async move { first.move_card(1, 20, 0).await });
    tokio::task::yield_now().await;
    let second = coordinator.clone();
    let b = tokio::spawn(async move { second.move_card(1, 10, 2).await });
    tokio::task::yield_now().await;

    assert_eq!(query.list_of_card(1), Some(10));

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(card_ids(&query, 10), remote_ids(&gateway, 1, 10));
    assert_eq!(card_ids(&query, 20), remote_ids(&gateway, 1, 20));
    assert_consistent(&coordinator);
}

#[tokio::test]
async fn test_remote_placement_overrides_requested_position() {
    let gateway = InMemoryGateway::new().with_move_rule(MoveRule::Append);
    let (gateway, coordinator, query) = session(gateway, standard_board()).await;

    let moved = coordinator.move_card(1, 20, 0).await.unwrap();

    assert_eq!(moved.position, 1);
    assert_eq!(card_ids(&query, 20), vec![4, 1]);
    assert_eq!(card_ids(&query, 20), remote_ids(&gateway, 1, 20));
    assert_consistent(&coordinator);
}

#[tokio::test]
async fn test_failed_move_is_retained_by_default() {
    let (gateway, coordinator, query) = session(InMemoryGateway::new(), standard_board()).await;

    gateway.fail_next(FocusError::network("connection reset"));
    let result = coordinator.move_card(1, 20, 0).await;

    assert!(matches!(result, Err(FocusError::Network(_))));
    assert_eq!(card_ids(&query, 20), vec![1, 4]);
    assert!(query.last_error().is_some());
    assert!(query.pending_mutations().is_empty());
}

#[tokio::test]
async fn test_failed_move_rolls_back_when_configured() {
    let gateway = Arc::new(InMemoryGateway::new());
    gateway.seed_board(standard_board());
    let store = BoardStore::new();
    let coordinator = BoardCoordinator::new(gateway.clone(), store.clone())
        .with_move_failure(MoveFailurePolicy::Rollback);
    coordinator.load_board(1).await.unwrap();
    let query = BoardQuery::new(store);

    gateway.fail_next(FocusError::network("connection reset"));
    assert!(coordinator.move_card(2, 20, 1).await.is_err());

    assert_eq!(card_ids(&query, 10), vec![1, 2, 3]);
    assert_eq!(card_ids(&query, 20), vec![4]);
    assert_consistent(&coordinator);
}

#[tokio::test]
async fn test_move_of_unknown_card_touches_nothing() {
    let (_, coordinator, query) = session(InMemoryGateway::new(), standard_board()).await;
    let before = query.active_board();

    assert!(coordinator.move_card(42, 20, 0).await.is_err());
    assert_eq!(query.active_board(), before);
}
