//! Card commands.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;

use focusboard_core::board::{
    BoardId, CardId, CardPatch, CommentId, LabelId, ListId, NewCard, Priority,
};

use super::{confirm, Session};
use crate::output;

#[derive(Subcommand)]
pub enum CardCommands {
    /// Add a card to the end of a list
    Add(AddCardArgs),

    /// Show a card
    Show {
        /// Board ID
        board: BoardId,

        /// Card ID
        card: CardId,
    },

    /// Edit a card's fields
    Edit(EditCardArgs),

    /// Move a card to a list and position
    Move {
        /// Board ID
        board: BoardId,

        /// Card ID
        card: CardId,

        /// Destination list ID
        list: ListId,

        /// Zero-based position in the destination list (defaults to the end)
        #[arg(short, long)]
        position: Option<usize>,
    },

    /// Mark a card completed (or open again with --undo)
    Done {
        /// Board ID
        board: BoardId,

        /// Card ID
        card: CardId,

        /// Reopen instead
        #[arg(long)]
        undo: bool,
    },

    /// Delete a card
    Delete {
        /// Board ID
        board: BoardId,

        /// Card ID
        card: CardId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Comment on a card
    Comment {
        /// Board ID
        board: BoardId,

        /// Card ID
        card: CardId,

        /// Comment text
        text: String,
    },

    /// Rewrite a comment
    EditComment {
        /// Board ID
        board: BoardId,

        /// Comment ID
        comment: CommentId,

        /// New text
        text: String,
    },

    /// Delete a comment
    DeleteComment {
        /// Board ID
        board: BoardId,

        /// Comment ID
        comment: CommentId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct AddCardArgs {
    /// Board ID
    pub board: BoardId,

    /// List ID
    pub list: ListId,

    /// Card title
    pub title: String,

    /// Card description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Priority (low, medium, high, urgent)
    #[arg(long, default_value = "medium", value_parser = parse_priority)]
    pub priority: Priority,

    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_due)]
    pub due: Option<DateTime<Utc>>,

    /// Estimated hours
    #[arg(long)]
    pub estimate: Option<u32>,

    /// Label ID (repeatable)
    #[arg(short, long = "label")]
    pub labels: Vec<LabelId>,
}

#[derive(Args)]
pub struct EditCardArgs {
    /// Board ID
    pub board: BoardId,

    /// Card ID
    pub card: CardId,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New priority (low, medium, high, urgent)
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    /// New due date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_due)]
    pub due: Option<DateTime<Utc>>,

    /// New estimate in hours
    #[arg(long)]
    pub estimate: Option<u32>,

    /// Replace labels with these IDs (repeatable)
    #[arg(short, long = "label")]
    pub labels: Option<Vec<LabelId>>,
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_str(&s.to_lowercase())
        .ok_or_else(|| format!("unknown priority '{}' (low, medium, high, urgent)", s))
}

/// A bare date means the end of that day, local time.
fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", s))?;
    let end_of_day = date
        .and_hms_opt(23, 59, 0)
        .ok_or_else(|| format!("invalid date '{}'", s))?;
    Local
        .from_local_datetime(&end_of_day)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("'{}' does not exist in the local time zone", s))
}

pub async fn execute(cmd: CardCommands, session: &Session) -> Result<()> {
    match cmd {
        CardCommands::Add(args) => {
            session.open_board(args.board).await?;
            let card = NewCard {
                description: args.description,
                priority: args.priority,
                due_date: args.due,
                estimated_hours: args.estimate,
                label_ids: args.labels,
                ..NewCard::new(args.list, args.title)
            };
            let card = session.coordinator.create_card(card).await?;
            println!(
                "{} Created card: {} ({})",
                "✓".green().bold(),
                card.title.cyan(),
                format!("#{}", card.id).dimmed()
            );
        }

        CardCommands::Show { board, card } => {
            session.open_board(board).await?;
            let found = session
                .query()
                .card_by_id(card)
                .with_context(|| format!("Card #{} is not on board #{}", card, board))?;
            output::print_card(&found);
        }

        CardCommands::Edit(args) => {
            session.open_board(args.board).await?;
            let patch = CardPatch {
                title: args.title,
                description: args.description,
                priority: args.priority,
                due_date: args.due,
                estimated_hours: args.estimate,
                label_ids: args.labels,
                ..CardPatch::default()
            };
            report_update(session.coordinator.update_card(args.card, patch).await?, args.card);
        }

        CardCommands::Move {
            board,
            card,
            list,
            position,
        } => {
            session.open_board(board).await?;
            let position = position.unwrap_or_else(|| session.query().cards_of_list(list).len());
            let moved = session.coordinator.move_card(card, list, position).await?;
            println!(
                "{} Moved card {} to list {} at position {}",
                "✓".green().bold(),
                moved.title.cyan(),
                format!("#{}", list).dimmed(),
                moved.position
            );
        }

        CardCommands::Done { board, card, undo } => {
            session.open_board(board).await?;
            let patch = CardPatch {
                completed: Some(!undo),
                ..CardPatch::default()
            };
            report_update(session.coordinator.update_card(card, patch).await?, card);
        }

        CardCommands::Delete { board, card, yes } => {
            session.open_board(board).await?;
            let title = session
                .query()
                .card_by_id(card)
                .map(|c| c.title)
                .unwrap_or_else(|| format!("#{}", card));
            if !confirm(&format!("Delete card '{}'?", title), yes)? {
                println!("{}", "Cancelled.".dimmed());
                return Ok(());
            }
            session.coordinator.delete_card(card).await?;
            println!("{} Deleted card {}", "✓".green().bold(), title.dimmed());
        }

        CardCommands::Comment { board, card, text } => {
            session.open_board(board).await?;
            let comment = session.coordinator.add_comment(card, &text).await?;
            println!(
                "{} Commented on card {} ({})",
                "✓".green().bold(),
                format!("#{}", card).cyan(),
                format!("#{}", comment.id).dimmed()
            );
        }

        CardCommands::EditComment {
            board,
            comment,
            text,
        } => {
            session.open_board(board).await?;
            match session.coordinator.edit_comment(comment, &text).await? {
                Some(_) => println!("{} Updated comment #{}", "✓".green().bold(), comment),
                None => println!("{} Comment #{} no longer exists", "!".yellow(), comment),
            }
        }

        CardCommands::DeleteComment {
            board,
            comment,
            yes,
        } => {
            session.open_board(board).await?;
            if !confirm(&format!("Delete comment #{}?", comment), yes)? {
                println!("{}", "Cancelled.".dimmed());
                return Ok(());
            }
            session.coordinator.delete_comment(comment).await?;
            println!("{} Deleted comment #{}", "✓".green().bold(), comment);
        }
    }

    Ok(())
}

fn report_update(updated: Option<focusboard_core::board::Card>, id: CardId) {
    match updated {
        Some(card) => {
            let state = if card.completed { "done".green() } else { "open".normal() };
            println!(
                "{} Updated card {} ({})",
                "✓".green().bold(),
                card.title.cyan(),
                state
            );
        }
        None => println!("{} Card #{} no longer exists", "!".yellow(), id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_priority() {
        assert_eq!(parse_priority("HIGH").unwrap(), Priority::High);
        assert!(parse_priority("critical").is_err());
    }

    #[test]
    fn test_parse_due() {
        let exact = parse_due("2026-03-01T10:00:00Z").unwrap();
        assert_eq!(exact.to_rfc3339(), "2026-03-01T10:00:00+00:00");

        let day = parse_due("2026-03-01").unwrap().with_timezone(&Local);
        assert_eq!(day.format("%Y-%m-%d %H:%M").to_string(), "2026-03-01 23:59");

        assert!(parse_due("tomorrow").is_err());
    }
}
