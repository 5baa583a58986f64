//! Label catalogue shared across boards.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::board::{Label, LabelId, LabelPatch, NewLabel};
use crate::coordinator::BoardCoordinator;
use crate::error::{FocusError, FocusResult};
use crate::gateway::LabelGateway;

#[derive(Default)]
struct LabelState {
    labels: Vec<Label>,
    last_error: Option<String>,
}

/// Labels as confirmed by the remote store.
///
/// Renames and deletions are handed to the board coordinator, which pushes
/// them into the cards of the active board.
#[derive(Clone)]
pub struct LabelStore {
    gateway: Arc<dyn LabelGateway>,
    state: Arc<RwLock<LabelState>>,
    board: BoardCoordinator,
}

impl LabelStore {
    pub fn new(gateway: Arc<dyn LabelGateway>, board: BoardCoordinator) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(LabelState::default())),
            board,
        }
    }

    pub async fn fetch_labels(&self) -> FocusResult<Vec<Label>> {
        self.clear_error();
        match self.gateway.list_labels().await {
            Ok(mut labels) => {
                labels.sort_by(|a, b| a.name.cmp(&b.name));
                self.write(|s| s.labels = labels.clone());
                Ok(labels)
            }
            Err(e) => self.fail("fetch labels", e),
        }
    }

    pub async fn create_label(&self, label: NewLabel) -> FocusResult<Label> {
        self.clear_error();
        if label.name.trim().is_empty() {
            return self.fail("create label", FocusError::validation("label name is required"));
        }
        match self.gateway.create_label(&label).await {
            Ok(created) => {
                info!(label_id = created.id, name = %created.name, "Label created");
                self.write(|s| s.labels.push(created.clone()));
                Ok(created)
            }
            Err(e) => self.fail("create label", e),
        }
    }

    pub async fn update_label(&self, id: LabelId, patch: LabelPatch) -> FocusResult<Label> {
        self.clear_error();
        match self.gateway.update_label(id, &patch).await {
            Ok(updated) => {
                self.write(|s| {
                    if let Some(existing) = s.labels.iter_mut().find(|l| l.id == id) {
                        *existing = updated.clone();
                    }
                });
                let touched = self.board.apply_label_update(&updated);
                info!(label_id = id, cards = touched, "Label updated");
                Ok(updated)
            }
            Err(e) => self.fail("update label", e),
        }
    }

    pub async fn delete_label(&self, id: LabelId) -> FocusResult<()> {
        self.clear_error();
        match self.gateway.delete_label(id).await {
            Ok(()) => {
                self.write(|s| s.labels.retain(|l| l.id != id));
                let touched = self.board.apply_label_removal(id);
                info!(label_id = id, cards = touched, "Label deleted");
                Ok(())
            }
            Err(e) => self.fail("delete label", e),
        }
    }

    pub fn labels(&self) -> Vec<Label> {
        self.read(|s| s.labels.clone())
    }

    pub fn label_by_id(&self, id: LabelId) -> Option<Label> {
        self.read(|s| s.labels.iter().find(|l| l.id == id).cloned())
    }

    /// Resolve ids in the given order, skipping unknown ones.
    pub fn labels_by_ids(&self, ids: &[LabelId]) -> Vec<Label> {
        self.read(|s| {
            ids.iter()
                .filter_map(|id| s.labels.iter().find(|l| l.id == *id).cloned())
                .collect()
        })
    }

    pub fn label_by_name(&self, name: &str) -> Option<Label> {
        self.read(|s| {
            s.labels
                .iter()
                .find(|l| l.name.eq_ignore_ascii_case(name))
                .cloned()
        })
    }

    pub fn last_error(&self) -> Option<String> {
        self.read(|s| s.last_error.clone())
    }

    fn clear_error(&self) {
        self.write(|s| s.last_error = None);
    }

    fn fail<T>(&self, action: &str, err: FocusError) -> FocusResult<T> {
        warn!(action, error = %err, "Label request failed");
        self.write(|s| s.last_error = Some(format!("Failed to {}: {}", action, err)));
        Err(err)
    }

    fn read<R>(&self, f: impl FnOnce(&LabelState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut LabelState) -> R) -> R {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{NewBoard, NewCard, DEFAULT_LABEL_COLOR};
    use crate::coordinator::BoardStore;
    use crate::gateway::InMemoryGateway;

    fn label_store(gateway: Arc<InMemoryGateway>) -> LabelStore {
        let board = BoardCoordinator::new(gateway.clone(), BoardStore::new());
        LabelStore::new(gateway, board)
    }

    fn new_label(name: &str) -> NewLabel {
        NewLabel {
            name: name.to_string(),
            color: DEFAULT_LABEL_COLOR.to_string(),
        }
    }

    #[tokio::test]
    async fn test_labels_sorted_and_resolved() {
        let gateway = Arc::new(InMemoryGateway::new());
        let store = label_store(gateway);
        let work = store.create_label(new_label("work")).await.unwrap();
        let home = store.create_label(new_label("home")).await.unwrap();

        let fetched = store.fetch_labels().await.unwrap();
        assert_eq!(fetched[0].name, "home");
        assert_eq!(store.labels_by_ids(&[work.id, 999, home.id]).len(), 2);
        assert_eq!(store.label_by_name("WORK").unwrap().id, work.id);
    }

    #[tokio::test]
    async fn test_empty_name_rejected_locally() {
        let store = label_store(Arc::new(InMemoryGateway::new()));
        assert!(matches!(
            store.create_label(new_label("  ")).await,
            Err(FocusError::Validation(_))
        ));
        assert!(store.last_error().is_some());
    }

    #[tokio::test]
    async fn test_rename_and_delete_reach_cached_cards() {
        let gateway = Arc::new(InMemoryGateway::new());
        let board = BoardStore::new();
        let coordinator = BoardCoordinator::new(gateway.clone(), board.clone());
        let labels = LabelStore::new(gateway.clone(), coordinator.clone());

        let urgent = labels.create_label(new_label("urgent")).await.unwrap();
        let created = coordinator
            .create_board(NewBoard {
                title: "Ops".into(),
                ..NewBoard::default()
            })
            .await
            .unwrap();
        coordinator.load_board(created.id).await.unwrap();
        let list_id = board.read(|c| c.active().unwrap().lists[0].id);

        let mut card = NewCard::new(list_id, "Page on-call");
        card.label_ids = vec![urgent.id];
        let card = coordinator.create_card(card).await.unwrap();

        labels
            .update_label(
                urgent.id,
                LabelPatch {
                    name: Some("p1".into()),
                    color: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(board.read(|c| c.card(card.id).unwrap().labels[0].name.clone()), "p1");

        labels.delete_label(urgent.id).await.unwrap();
        assert!(board.read(|c| c.card(card.id).unwrap().labels.is_empty()));
    }
}
