//! Board domain: boards, lists, cards and the payloads exchanged with the remote store.

pub mod model;

pub use model::{
    Board, BoardId, BoardPatch, BoardSummary, CanonicalRecord, Card, CardId, CardPatch, Comment,
    CommentId, CommentPatch, GoalId, Label, LabelId, LabelPatch, List, ListId, ListPatch, NewBoard,
    NewCard, NewComment, NewLabel, NewList, Priority, RecordKind, User, UserId,
    DEFAULT_LABEL_COLOR, DEFAULT_LISTS,
};
