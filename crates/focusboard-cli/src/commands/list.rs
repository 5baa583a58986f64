//! List commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use focusboard_core::board::{BoardId, ListId, ListPatch, NewList};

use super::{confirm, Session};

#[derive(Subcommand)]
pub enum ListCommands {
    /// Append a list to a board
    Create {
        /// Board ID
        board: BoardId,

        /// List title
        title: String,
    },

    /// Rename a list
    Rename {
        /// Board ID
        board: BoardId,

        /// List ID
        list: ListId,

        /// New title
        title: String,
    },

    /// Move a list to another position on its board
    Move {
        /// Board ID
        board: BoardId,

        /// List ID
        list: ListId,

        /// Zero-based target position
        position: usize,
    },

    /// Delete a list and its cards
    Delete {
        /// Board ID
        board: BoardId,

        /// List ID
        list: ListId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn execute(cmd: ListCommands, session: &Session) -> Result<()> {
    match cmd {
        ListCommands::Create { board, title } => {
            session.open_board(board).await?;
            let list = session
                .coordinator
                .create_list(NewList {
                    board_id: board,
                    title,
                })
                .await?;
            println!(
                "{} Created list: {} ({}) at position {}",
                "✓".green().bold(),
                list.title.cyan(),
                format!("#{}", list.id).dimmed(),
                list.position
            );
        }

        ListCommands::Rename { board, list, title } => {
            session.open_board(board).await?;
            let patch = ListPatch { title: Some(title) };
            match session.coordinator.update_list(list, patch).await? {
                Some(updated) => println!(
                    "{} Renamed list to {}",
                    "✓".green().bold(),
                    updated.title.cyan()
                ),
                None => println!("{} List #{} no longer exists", "!".yellow(), list),
            }
        }

        ListCommands::Move {
            board,
            list,
            position,
        } => {
            session.open_board(board).await?;
            session.coordinator.reorder_list(list, position).await?;
            let order: Vec<String> = session
                .query()
                .lists_of_board(board)
                .iter()
                .map(|l| l.title.clone())
                .collect();
            println!("{} Moved list {}", "✓".green().bold(), format!("#{}", list).dimmed());
            println!("  {}", order.join(" → "));
        }

        ListCommands::Delete { board, list, yes } => {
            session.open_board(board).await?;
            let cards = session.query().cards_of_list(list).len();
            let prompt = format!("Delete list #{} and its {} card(s)?", list, cards);
            if !confirm(&prompt, yes)? {
                println!("{}", "Cancelled.".dimmed());
                return Ok(());
            }
            session.coordinator.delete_list(list).await?;
            println!("{} Deleted list {}", "✓".green().bold(), format!("#{}", list).dimmed());
        }
    }

    Ok(())
}
