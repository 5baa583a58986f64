//! Board domain models shared by the cache, the gateways and the CLI.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub type BoardId = i64;
pub type ListId = i64;
pub type CardId = i64;
pub type LabelId = i64;
pub type GoalId = i64;
pub type CommentId = i64;
pub type UserId = i64;

fn default_true() -> bool {
    true
}

/// A board fully expanded with its lists and their cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lists: Vec<List>,
}

impl Board {
    /// Total number of cards across every list.
    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|l| l.cards.len()).sum()
    }
}

/// Lightweight board entry used by board listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub lists_count: usize,
    #[serde(default)]
    pub cards_count: usize,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Board> for BoardSummary {
    fn from(board: &Board) -> Self {
        Self {
            id: board.id,
            title: board.title.clone(),
            description: board.description.clone(),
            is_active: board.is_active,
            lists_count: board.lists.len(),
            cards_count: board.card_count(),
            created_at: board.created_at,
            updated_at: board.updated_at,
        }
    }
}

/// A list (column) within a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    /// Owning board. The remote store omits it from list payloads, so the
    /// cache fills it in when a board is loaded.
    #[serde(default, rename = "board", skip_serializing_if = "Option::is_none")]
    pub board_id: Option<BoardId>,
    pub title: String,
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// A card within a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Declared list membership. May be stale right after a move; the cache
    /// index is authoritative for where a card currently lives.
    #[serde(default, rename = "list", skip_serializing_if = "Option::is_none")]
    pub list_id: Option<ListId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_hours: Option<u32>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<GoalId>,
    /// Newest first, as the remote store orders them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Card {
    /// Past its due date and still open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) if !self.completed => now > due,
            _ => false,
        }
    }

    /// Due within the next 24 hours and still open.
    pub fn is_due_soon(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) if !self.completed => due >= now && due - now <= Duration::hours(24),
            _ => false,
        }
    }

    pub fn has_label(&self, label_id: LabelId) -> bool {
        self.labels.iter().any(|l| l.id == label_id)
    }
}

/// Card priority levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// A label that can be attached to cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    #[serde(default = "default_label_color")]
    pub color: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_label_color() -> String {
    DEFAULT_LABEL_COLOR.to_string()
}

pub const DEFAULT_LABEL_COLOR: &str = "#3B82F6";

/// An account as embedded in comments and team memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl User {
    /// Full name when one is set, otherwise the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        match full.trim() {
            "" => self.username.clone(),
            name => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lists the remote store creates for every new board.
pub const DEFAULT_LISTS: &[&str] = &["To-do", "Doing", "Done"];

// ============================================================
// REQUEST PAYLOADS
// ============================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewBoard {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewList {
    #[serde(rename = "board")]
    pub board_id: BoardId,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCard {
    #[serde(rename = "list")]
    pub list_id: ListId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<LabelId>,
}

impl NewCard {
    pub fn new(list_id: ListId, title: impl Into<String>) -> Self {
        Self {
            list_id,
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            estimated_hours: None,
            label_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<LabelId>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LabelPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    #[serde(rename = "card")]
    pub card_id: CardId,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentPatch {
    pub content: String,
}

/// Authoritative representation of an entity as returned by the remote store.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalRecord {
    Board(Board),
    List(List),
    Card(Card),
}

/// Which kind of entity a record or mutation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Board,
    List,
    Card,
    Label,
    Goal,
    Comment,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::List => "list",
            Self::Card => "card",
            Self::Label => "label",
            Self::Goal => "goal",
            Self::Comment => "comment",
        }
    }
}

impl CanonicalRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Board(_) => RecordKind::Board,
            Self::List(_) => RecordKind::List,
            Self::Card(_) => RecordKind::Card,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::Board(b) => b.id,
            Self::List(l) => l.id,
            Self::Card(c) => c.id,
        }
    }
}
