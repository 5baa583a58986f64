//! Ordered entity cache for the active board.
//!
//! Holds at most one fully expanded board plus the board summaries used for
//! listings. Every list keeps its cards in position order, and positions are
//! rewritten after each mutation so that a card's `position` always equals
//! its index in the owning list. A card→list index answers "where does this
//! card live right now" without trusting the card's declared `list_id`.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::board::{
    Board, BoardId, BoardSummary, CanonicalRecord, Card, CardId, Comment, CommentId, GoalId, Label,
    LabelId, List, ListId,
};
use crate::error::{FocusError, FocusResult};

/// Where a card sits inside the active board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPlacement {
    pub list_id: ListId,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct BoardCache {
    summaries: Vec<BoardSummary>,
    active: Option<Board>,
    card_index: HashMap<CardId, ListId>,
    last_error: Option<String>,
}

impl BoardCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================
    // READS
    // ============================================================

    pub fn active(&self) -> Option<&Board> {
        self.active.as_ref()
    }

    pub fn summaries(&self) -> &[BoardSummary] {
        &self.summaries
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn list(&self, list_id: ListId) -> Option<&List> {
        self.active.as_ref()?.lists.iter().find(|l| l.id == list_id)
    }

    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        let placement = self.placement(card_id)?;
        self.list(placement.list_id)?.cards.get(placement.index)
    }

    /// Current placement of a card, resolved through the index.
    pub fn placement(&self, card_id: CardId) -> Option<CardPlacement> {
        let list_id = *self.card_index.get(&card_id)?;
        let index = self.list(list_id)?.cards.iter().position(|c| c.id == card_id)?;
        Some(CardPlacement { list_id, index })
    }

    pub fn list_of_card(&self, card_id: CardId) -> Option<ListId> {
        self.card_index.get(&card_id).copied()
    }

    // ============================================================
    // BOARD
    // ============================================================

    /// Replace the active board wholesale.
    ///
    /// Lists and cards are ordered by their stored position, positions are
    /// re-indexed densely and the card index is rebuilt from scratch.
    pub fn load_board(&mut self, mut board: Board) {
        board.lists.sort_by_key(|l| l.position);
        let board_id = board.id;

        let mut index = HashMap::new();
        for (position, list) in board.lists.iter_mut().enumerate() {
            list.position = position;
            list.board_id = Some(board_id);
            list.cards.sort_by_key(|c| c.position);

            let list_id = list.id;
            list.cards.retain(|card| {
                if index.contains_key(&card.id) {
                    warn!(card_id = card.id, list_id, "Dropping duplicate card from loaded board");
                    false
                } else {
                    index.insert(card.id, list_id);
                    true
                }
            });
            reindex_cards(list);
        }

        debug!(
            board_id,
            lists = board.lists.len(),
            cards = index.len(),
            "Loaded board into cache"
        );
        self.upsert_summary(BoardSummary::from(&board));
        self.card_index = index;
        self.active = Some(board);
    }

    pub fn clear_active(&mut self) {
        self.active = None;
        self.card_index.clear();
    }

    pub fn set_summaries(&mut self, summaries: Vec<BoardSummary>) {
        self.summaries = summaries;
    }

    pub fn upsert_summary(&mut self, summary: BoardSummary) {
        match self.summaries.iter_mut().find(|s| s.id == summary.id) {
            Some(existing) => *existing = summary,
            None => self.summaries.push(summary),
        }
    }

    pub fn remove_summary(&mut self, board_id: BoardId) -> Option<BoardSummary> {
        let idx = self.summaries.iter().position(|s| s.id == board_id)?;
        Some(self.summaries.remove(idx))
    }

    /// Drop a board from the summaries and, if it is the active one, from the graph.
    pub fn remove_board(&mut self, board_id: BoardId) -> bool {
        let had_summary = self.remove_summary(board_id).is_some();
        let was_active = self.active.as_ref().is_some_and(|b| b.id == board_id);
        if was_active {
            self.clear_active();
        }
        had_summary || was_active
    }

    // ============================================================
    // LISTS
    // ============================================================

    /// Insert a list into the active board at its declared position.
    pub fn insert_list(&mut self, mut list: List) -> bool {
        let Some(board) = self.active.as_mut() else {
            warn!(list_id = list.id, "No active board to insert list into");
            return false;
        };
        if list.board_id.is_some_and(|id| id != board.id) {
            debug!(list_id = list.id, board_id = board.id, "List belongs to another board");
            return false;
        }
        if board.lists.iter().any(|l| l.id == list.id) {
            warn!(list_id = list.id, "List already present in active board");
            return false;
        }

        list.board_id = Some(board.id);
        reindex_cards(&mut list);
        for card in &list.cards {
            self.card_index.insert(card.id, list.id);
        }
        let at = list.position.min(board.lists.len());
        board.lists.insert(at, list);
        reindex_lists(board);
        self.refresh_active_summary();
        true
    }

    /// Remove a list and every card it holds.
    pub fn remove_list(&mut self, list_id: ListId) -> Option<List> {
        let board = self.active.as_mut()?;
        let idx = board.lists.iter().position(|l| l.id == list_id)?;
        let list = board.lists.remove(idx);
        reindex_lists(board);
        for card in &list.cards {
            self.card_index.remove(&card.id);
        }
        self.refresh_active_summary();
        Some(list)
    }

    /// Reorder a list among its siblings. Returns the index it left.
    pub fn move_list(&mut self, list_id: ListId, position: usize) -> FocusResult<usize> {
        let board = self
            .active
            .as_mut()
            .ok_or_else(|| FocusError::inconsistency("no active board"))?;
        let from = board
            .lists
            .iter()
            .position(|l| l.id == list_id)
            .ok_or_else(|| FocusError::inconsistency(format!("list {} not in active board", list_id)))?;

        let list = board.lists.remove(from);
        let to = position.min(board.lists.len());
        board.lists.insert(to, list);
        reindex_lists(board);
        debug!(list_id, from, to, "Moved list");
        Ok(from)
    }

    // ============================================================
    // CARDS
    // ============================================================

    /// Insert a card into a list at `at`, shifting later cards down.
    ///
    /// An unknown list is a consistency violation: it is logged and the
    /// call is a no-op.
    pub fn insert_card(&mut self, list_id: ListId, mut card: Card, at: usize) -> bool {
        if self.list(list_id).is_none() {
            warn!(card_id = card.id, list_id, "Insert into list missing from active board");
            return false;
        }
        if self.card_index.contains_key(&card.id) {
            debug!(card_id = card.id, "Card already cached, relocating instead of duplicating");
            self.remove_card(card.id);
        }

        let Some(list) = self.list_mut(list_id) else {
            return false;
        };
        card.list_id = Some(list_id);
        let at = at.min(list.cards.len());
        let card_id = card.id;
        list.cards.insert(at, card);
        reindex_cards(list);
        self.card_index.insert(card_id, list_id);
        self.refresh_active_summary();
        true
    }

    /// Remove a card from whichever list currently holds it.
    pub fn remove_card(&mut self, card_id: CardId) -> Option<Card> {
        let list_id = match self.card_index.get(&card_id) {
            Some(list_id) => *list_id,
            None => return None,
        };
        let removed = self.list_mut(list_id).and_then(|list| {
            let idx = list.cards.iter().position(|c| c.id == card_id)?;
            let card = list.cards.remove(idx);
            reindex_cards(list);
            Some(card)
        });

        let removed = match removed {
            Some(card) => Some(card),
            None => {
                warn!(card_id, list_id, "Card index out of sync, scanning all lists");
                self.scan_remove(card_id)
            }
        };
        self.card_index.remove(&card_id);
        if removed.is_some() {
            self.refresh_active_summary();
        }
        removed
    }

    /// Move a card to `dest_list_id` at `dest_position`.
    ///
    /// The destination is checked before the card leaves its list, so the
    /// card is never absent from every list. Returns the placement it left.
    pub fn move_card(
        &mut self,
        card_id: CardId,
        dest_list_id: ListId,
        dest_position: usize,
    ) -> FocusResult<CardPlacement> {
        if self.list(dest_list_id).is_none() {
            return Err(FocusError::inconsistency(format!(
                "destination list {} not in active board",
                dest_list_id
            )));
        }
        let previous = self
            .placement(card_id)
            .ok_or_else(|| FocusError::not_found(format!("Card: {}", card_id)))?;

        if let Some(card) = self.remove_card(card_id) {
            self.insert_card(dest_list_id, card, dest_position);
        }
        debug!(
            card_id,
            from_list = previous.list_id,
            from_index = previous.index,
            to_list = dest_list_id,
            to_index = dest_position,
            "Moved card"
        );
        Ok(previous)
    }

    /// Merge an authoritative record into the cached entity.
    ///
    /// Returns `false` when the entity is not cached. A list keeps its
    /// cached card sequence; a card keeps its placement unless the record
    /// names a different list or position. Fields the remote payload
    /// leaves out keep their cached value.
    pub fn replace_record(&mut self, record: CanonicalRecord) -> bool {
        match record {
            CanonicalRecord::Board(board) => self.merge_board(board),
            CanonicalRecord::List(list) => self.merge_list(list),
            CanonicalRecord::Card(card) => self.merge_card(card),
        }
    }

    fn merge_board(&mut self, incoming: Board) -> bool {
        let mut matched = false;
        if let Some(summary) = self.summaries.iter_mut().find(|s| s.id == incoming.id) {
            summary.title = incoming.title.clone();
            summary.description = incoming.description.clone();
            summary.is_active = incoming.is_active;
            summary.updated_at = incoming.updated_at;
            matched = true;
        }
        if let Some(board) = self.active.as_mut().filter(|b| b.id == incoming.id) {
            board.title = incoming.title;
            board.description = incoming.description;
            board.is_active = incoming.is_active;
            board.is_template = incoming.is_template;
            // Not part of the backend's board payload.
            board.background_color = incoming.background_color.or(board.background_color.take());
            board.created_at = incoming.created_at.or(board.created_at);
            board.updated_at = incoming.updated_at;
            matched = true;
        }
        matched
    }

    fn merge_list(&mut self, incoming: List) -> bool {
        let Some(current) = self.list(incoming.id).map(|l| l.position) else {
            return false;
        };
        if let Some(list) = self.list_mut(incoming.id) {
            list.title = incoming.title;
            list.created_at = incoming.created_at.or(list.created_at);
            list.updated_at = incoming.updated_at;
        }
        if incoming.position != current {
            if let Err(e) = self.move_list(incoming.id, incoming.position) {
                warn!(list_id = incoming.id, error = %e, "Could not apply canonical list position");
            }
        }
        true
    }

    fn merge_card(&mut self, incoming: Card) -> bool {
        let Some(placement) = self.placement(incoming.id) else {
            return false;
        };

        let target_list = match incoming.list_id {
            Some(list_id) if self.list(list_id).is_some() => list_id,
            Some(list_id) => {
                warn!(
                    card_id = incoming.id,
                    list_id, "Canonical card names a list outside the active board"
                );
                placement.list_id
            }
            None => placement.list_id,
        };
        let target_index = incoming.position;
        let card_id = incoming.id;

        if let Some(card) = self
            .list_mut(placement.list_id)
            .and_then(|l| l.cards.get_mut(placement.index))
        {
            card.title = incoming.title;
            card.description = incoming.description;
            card.priority = incoming.priority;
            card.due_date = incoming.due_date;
            card.estimated_hours = incoming.estimated_hours;
            card.completed = incoming.completed;
            card.completed_at = incoming.completed_at;
            card.labels = incoming.labels;
            // Goal links only travel through the goal endpoints.
            card.goal = incoming.goal.or(card.goal);
            card.comments = incoming.comments;
            card.created_at = incoming.created_at.or(card.created_at);
            card.updated_at = incoming.updated_at;
        }

        if target_list != placement.list_id || target_index != placement.index {
            if let Err(e) = self.move_card(card_id, target_list, target_index) {
                warn!(card_id, error = %e, "Could not apply canonical card placement");
            }
        }
        true
    }

    // ============================================================
    // LABEL REFERENCES
    // ============================================================

    /// Refresh the embedded copy of a label on every cached card.
    pub fn refresh_label(&mut self, label: &Label) -> usize {
        let mut touched = 0;
        for card in self.cards_mut() {
            if let Some(embedded) = card.labels.iter_mut().find(|l| l.id == label.id) {
                *embedded = label.clone();
                touched += 1;
            }
        }
        touched
    }

    /// Strip a deleted label from every cached card.
    pub fn strip_label(&mut self, label_id: LabelId) -> usize {
        let mut touched = 0;
        for card in self.cards_mut() {
            if card.has_label(label_id) {
                card.labels.retain(|l| l.id != label_id);
                touched += 1;
            }
        }
        touched
    }

    // ============================================================
    // GOAL REFERENCES
    // ============================================================

    pub fn set_card_goal(&mut self, card_id: CardId, goal: Option<GoalId>) -> bool {
        let Some(placement) = self.placement(card_id) else {
            return false;
        };
        match self
            .list_mut(placement.list_id)
            .and_then(|l| l.cards.get_mut(placement.index))
        {
            Some(card) => {
                card.goal = goal;
                true
            }
            None => false,
        }
    }

    /// Clear a deleted goal from every cached card.
    pub fn unlink_goal(&mut self, goal_id: GoalId) -> usize {
        let mut touched = 0;
        for card in self.cards_mut() {
            if card.goal == Some(goal_id) {
                card.goal = None;
                touched += 1;
            }
        }
        touched
    }

    // ============================================================
    // COMMENTS
    // ============================================================

    /// Put a confirmed comment at the head of its card's thread.
    pub fn insert_comment(&mut self, card_id: CardId, comment: Comment) -> bool {
        match self.card_mut(card_id) {
            Some(card) => {
                card.comments.retain(|c| c.id != comment.id);
                card.comments.insert(0, comment);
                true
            }
            None => {
                debug!(card_id, "Comment for a card outside the active board");
                false
            }
        }
    }

    /// Swap in an edited comment wherever it is cached; the thread order is kept.
    pub fn replace_comment(&mut self, comment: &Comment) -> bool {
        for card in self.cards_mut() {
            if let Some(existing) = card.comments.iter_mut().find(|c| c.id == comment.id) {
                *existing = comment.clone();
                return true;
            }
        }
        false
    }

    pub fn remove_comment(&mut self, comment_id: CommentId) -> Option<Comment> {
        for card in self.cards_mut() {
            if let Some(idx) = card.comments.iter().position(|c| c.id == comment_id) {
                return Some(card.comments.remove(idx));
            }
        }
        None
    }

    // ============================================================
    // ERRORS
    // ============================================================

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Check the ordering and residency invariants of the active board.
    pub fn verify(&self) -> FocusResult<()> {
        let Some(board) = self.active.as_ref() else {
            return Ok(());
        };

        let mut seen: HashMap<CardId, ListId> = HashMap::new();
        for (idx, list) in board.lists.iter().enumerate() {
            if list.position != idx {
                return Err(FocusError::inconsistency(format!(
                    "list {} has position {} at index {}",
                    list.id, list.position, idx
                )));
            }
            for (cidx, card) in list.cards.iter().enumerate() {
                if card.position != cidx {
                    return Err(FocusError::inconsistency(format!(
                        "card {} has position {} at index {}",
                        card.id, card.position, cidx
                    )));
                }
                if let Some(other) = seen.insert(card.id, list.id) {
                    return Err(FocusError::inconsistency(format!(
                        "card {} present in lists {} and {}",
                        card.id, other, list.id
                    )));
                }
            }
        }
        if seen != self.card_index {
            return Err(FocusError::inconsistency("card index out of sync"));
        }
        Ok(())
    }

    // ============================================================
    // INTERNALS
    // ============================================================

    fn list_mut(&mut self, list_id: ListId) -> Option<&mut List> {
        self.active.as_mut()?.lists.iter_mut().find(|l| l.id == list_id)
    }

    fn card_mut(&mut self, card_id: CardId) -> Option<&mut Card> {
        let placement = self.placement(card_id)?;
        self.list_mut(placement.list_id)?.cards.get_mut(placement.index)
    }

    fn cards_mut(&mut self) -> impl Iterator<Item = &mut Card> {
        self.active
            .iter_mut()
            .flat_map(|b| b.lists.iter_mut())
            .flat_map(|l| l.cards.iter_mut())
    }

    fn scan_remove(&mut self, card_id: CardId) -> Option<Card> {
        let board = self.active.as_mut()?;
        for list in board.lists.iter_mut() {
            if let Some(idx) = list.cards.iter().position(|c| c.id == card_id) {
                let card = list.cards.remove(idx);
                reindex_cards(list);
                return Some(card);
            }
        }
        None
    }

    fn refresh_active_summary(&mut self) {
        if let Some(board) = self.active.as_ref() {
            let fresh = BoardSummary::from(board);
            if let Some(summary) = self.summaries.iter_mut().find(|s| s.id == fresh.id) {
                summary.lists_count = fresh.lists_count;
                summary.cards_count = fresh.cards_count;
            }
        }
    }
}

fn reindex_cards(list: &mut List) {
    let list_id = list.id;
    for (position, card) in list.cards.iter_mut().enumerate() {
        card.position = position;
        card.list_id = Some(list_id);
    }
}

fn reindex_lists(board: &mut Board) {
    for (position, list) in board.lists.iter_mut().enumerate() {
        list.position = position;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::board::Priority;

    pub(crate) fn card(id: CardId, position: usize) -> Card {
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

    pub(crate) fn list(id: ListId, position: usize, cards: Vec<Card>) -> List {
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

    pub(crate) fn board(id: BoardId, lists: Vec<List>) -> Board {
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

    fn ids(cache: &BoardCache, list_id: ListId) -> Vec<CardId> {
        cache.list(list_id).unwrap().cards.iter().map(|c| c.id).collect()
    }

    fn loaded() -> BoardCache {
        let mut cache = BoardCache::new();
        cache.load_board(board(
            1,
            vec![
                list(10, 0, vec![card(1, 0), card(2, 1), card(3, 2)]),
                list(20, 1, vec![card(4, 0)]),
            ],
        ));
        cache
    }

    #[test]
    fn test_load_orders_by_position_and_reindexes() {
        let mut cache = BoardCache::new();
        cache.load_board(board(
            1,
            vec![
                list(20, 5, vec![card(4, 9)]),
                list(10, 2, vec![card(3, 7), card(1, 1), card(2, 4)]),
            ],
        ));

        let active = cache.active().unwrap();
        assert_eq!(active.lists[0].id, 10);
        assert_eq!(active.lists[0].position, 0);
        assert_eq!(active.lists[1].position, 1);
        assert_eq!(ids(&cache, 10), vec![1, 2, 3]);
        assert_eq!(cache.card(3).unwrap().position, 2);
        assert_eq!(cache.list_of_card(4), Some(20));
        assert_eq!(cache.summaries().len(), 1);
        cache.verify().unwrap();
    }

    #[test]
    fn test_load_drops_duplicate_cards() {
        let mut cache = BoardCache::new();
        cache.load_board(board(
            1,
            vec![list(10, 0, vec![card(1, 0)]), list(20, 1, vec![card(1, 0)])],
        ));
        assert_eq!(ids(&cache, 10), vec![1]);
        assert!(ids(&cache, 20).is_empty());
        cache.verify().unwrap();
    }

    #[test]
    fn test_insert_shifts_following_cards() {
        let mut cache = loaded();
        assert!(cache.insert_card(10, card(9, 0), 1));
        assert_eq!(ids(&cache, 10), vec![1, 9, 2, 3]);
        assert_eq!(cache.card(2).unwrap().position, 2);
        assert_eq!(cache.card(9).unwrap().list_id, Some(10));
        cache.verify().unwrap();
    }

    #[test]
    fn test_insert_into_unknown_list_is_noop() {
        let mut cache = loaded();
        assert!(!cache.insert_card(99, card(9, 0), 0));
        assert!(cache.card(9).is_none());
        cache.verify().unwrap();
    }

    #[test]
    fn test_insert_past_end_appends() {
        let mut cache = loaded();
        assert!(cache.insert_card(20, card(9, 0), 42));
        assert_eq!(ids(&cache, 20), vec![4, 9]);
        assert_eq!(cache.card(9).unwrap().position, 1);
    }

    #[test]
    fn test_remove_ignores_stale_declared_list() {
        let mut cache = loaded();
        let removed = cache.remove_card(2).unwrap();
        assert_eq!(removed.id, 2);
        assert_eq!(ids(&cache, 10), vec![1, 3]);
        assert_eq!(cache.card(3).unwrap().position, 1);
        assert!(cache.remove_card(2).is_none());
        cache.verify().unwrap();
    }

    #[test]
    fn test_move_across_lists() {
        let mut cache = loaded();
        let previous = cache.move_card(2, 20, 0).unwrap();
        assert_eq!(previous, CardPlacement { list_id: 10, index: 1 });
        assert_eq!(ids(&cache, 10), vec![1, 3]);
        assert_eq!(ids(&cache, 20), vec![2, 4]);
        assert_eq!(cache.list_of_card(2), Some(20));
        assert_eq!(cache.card(2).unwrap().list_id, Some(20));
        cache.verify().unwrap();
    }

    #[test]
    fn test_move_within_list() {
        let mut cache = loaded();
        cache.move_card(1, 10, 2).unwrap();
        assert_eq!(ids(&cache, 10), vec![2, 3, 1]);
        cache.verify().unwrap();
    }

    #[test]
    fn test_move_to_missing_list_keeps_card() {
        let mut cache = loaded();
        let err = cache.move_card(2, 99, 0).unwrap_err();
        assert!(matches!(err, FocusError::Inconsistency(_)));
        assert_eq!(ids(&cache, 10), vec![1, 2, 3]);
        cache.verify().unwrap();
    }

    #[test]
    fn test_move_unknown_card() {
        let mut cache = loaded();
        assert!(matches!(cache.move_card(77, 20, 0), Err(FocusError::NotFound(_))));
    }

    #[test]
    fn test_replace_card_keeps_position_when_unchanged() {
        let mut cache = loaded();
        let mut canonical = card(2, 1);
        canonical.list_id = Some(10);
        canonical.title = "Renamed".into();
        assert!(cache.replace_record(CanonicalRecord::Card(canonical)));
        assert_eq!(cache.card(2).unwrap().title, "Renamed");
        assert_eq!(ids(&cache, 10), vec![1, 2, 3]);
    }

    #[test]
    fn test_replace_card_applies_server_placement() {
        let mut cache = loaded();
        cache.move_card(2, 20, 0).unwrap();

        // Server stored the card after the existing one instead.
        let mut canonical = card(2, 1);
        canonical.list_id = Some(20);
        assert!(cache.replace_record(CanonicalRecord::Card(canonical)));
        assert_eq!(ids(&cache, 20), vec![4, 2]);
        cache.verify().unwrap();
    }

    #[test]
    fn test_replace_card_without_goal_keeps_link() {
        let mut cache = loaded();
        cache.set_card_goal(2, Some(7));

        let payload: Card = serde_json::from_str(
            r#"{"id": 2, "title": "Renamed", "description": null, "labels": [],
                "priority": "high", "position": 1, "due_date": null,
                "estimated_hours": null, "completed": false, "completed_at": null}"#,
        )
        .unwrap();
        assert!(cache.replace_record(CanonicalRecord::Card(payload)));

        let merged = cache.card(2).unwrap();
        assert_eq!(merged.title, "Renamed");
        assert_eq!(merged.goal, Some(7));
    }

    #[test]
    fn test_replace_board_without_color_keeps_color() {
        let mut colored = board(1, vec![list(10, 0, vec![])]);
        colored.background_color = Some("#10B981".into());
        let mut cache = BoardCache::new();
        cache.load_board(colored);

        let payload: Board = serde_json::from_str(
            r#"{"id": 1, "title": "Renamed", "description": null,
                "is_active": true, "is_template": false, "lists": []}"#,
        )
        .unwrap();
        assert!(cache.replace_record(CanonicalRecord::Board(payload)));

        let active = cache.active().unwrap();
        assert_eq!(active.title, "Renamed");
        assert_eq!(active.background_color.as_deref(), Some("#10B981"));
        assert_eq!(active.lists.len(), 1);
    }

    #[test]
    fn test_replace_unknown_record_is_noop() {
        let mut cache = loaded();
        assert!(!cache.replace_record(CanonicalRecord::Card(card(500, 0))));
        assert!(!cache.replace_record(CanonicalRecord::List(list(500, 0, vec![]))));
        assert!(!cache.replace_record(CanonicalRecord::Board(board(500, vec![]))));
    }

    #[test]
    fn test_replace_list_keeps_cards() {
        let mut cache = loaded();
        let mut canonical = list(10, 1, vec![]);
        canonical.title = "Backlog".into();
        assert!(cache.replace_record(CanonicalRecord::List(canonical)));
        let active = cache.active().unwrap();
        assert_eq!(active.lists[1].id, 10);
        assert_eq!(active.lists[1].title, "Backlog");
        assert_eq!(ids(&cache, 10), vec![1, 2, 3]);
    }

    #[test]
    fn test_list_insert_and_remove() {
        let mut cache = loaded();
        assert!(cache.insert_list(list(30, 0, vec![card(8, 0)])));
        assert_eq!(cache.active().unwrap().lists[0].id, 30);
        assert_eq!(cache.list_of_card(8), Some(30));

        let removed = cache.remove_list(30).unwrap();
        assert_eq!(removed.cards.len(), 1);
        assert_eq!(cache.list_of_card(8), None);
        cache.verify().unwrap();
    }

    #[test]
    fn test_strip_label() {
        let mut cache = loaded();
        let label = Label {
            id: 5,
            name: "home".into(),
            color: "#000000".into(),
            created_at: None,
        };
        cache.remove_card(1);
        let mut tagged = card(1, 0);
        tagged.labels.push(label.clone());
        cache.insert_card(10, tagged, 0);

        assert_eq!(cache.strip_label(5), 1);
        assert!(cache.card(1).unwrap().labels.is_empty());
    }

    #[test]
    fn test_goal_links() {
        let mut cache = loaded();
        assert!(cache.set_card_goal(2, Some(7)));
        assert!(cache.set_card_goal(4, Some(7)));
        assert!(!cache.set_card_goal(99, Some(7)));
        assert_eq!(cache.card(2).unwrap().goal, Some(7));

        assert_eq!(cache.unlink_goal(7), 2);
        assert!(cache.card(4).unwrap().goal.is_none());
    }

    fn comment(id: CommentId, content: &str) -> Comment {
        Comment {
            id,
            content: content.to_string(),
            author: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_comment_thread_newest_first() {
        let mut cache = loaded();
        assert!(cache.insert_comment(2, comment(1, "first")));
        assert!(cache.insert_comment(2, comment(2, "second")));
        assert!(!cache.insert_comment(99, comment(3, "lost")));

        let thread: Vec<CommentId> = cache.card(2).unwrap().comments.iter().map(|c| c.id).collect();
        assert_eq!(thread, vec![2, 1]);

        assert!(cache.replace_comment(&comment(1, "edited")));
        assert_eq!(cache.card(2).unwrap().comments[1].content, "edited");
        assert!(!cache.replace_comment(&comment(42, "nowhere")));

        assert_eq!(cache.remove_comment(2).unwrap().content, "second");
        assert!(cache.remove_comment(2).is_none());
        assert_eq!(cache.card(2).unwrap().comments.len(), 1);
    }

    #[test]
    fn test_replace_card_takes_canonical_comments() {
        let mut cache = loaded();
        cache.insert_comment(3, comment(1, "stale"));
        let mut incoming = card(3, 2);
        incoming.comments = vec![comment(5, "fresh"), comment(1, "stale")];
        assert!(cache.replace_record(CanonicalRecord::Card(incoming)));
        assert_eq!(cache.card(3).unwrap().comments[0].content, "fresh");
    }

    #[test]
    fn test_remove_active_board() {
        let mut cache = loaded();
        assert!(cache.remove_board(1));
        assert!(cache.active().is_none());
        assert!(cache.summaries().is_empty());
        assert!(cache.list_of_card(1).is_none());
    }
}
