//! Board commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use focusboard_core::board::{BoardId, BoardPatch, NewBoard};

use super::{confirm, Session};
use crate::output;

#[derive(Subcommand)]
pub enum BoardCommands {
    /// Show a board with its lists and cards
    Show {
        /// Board ID
        id: BoardId,
    },

    /// Create a new board
    Create(CreateBoardArgs),

    /// Rename a board or change its description
    Rename(RenameBoardArgs),

    /// Delete a board and everything on it
    Delete {
        /// Board ID
        id: BoardId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct CreateBoardArgs {
    /// Board title
    pub title: String,

    /// Board description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Background color (hex)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct RenameBoardArgs {
    /// Board ID
    pub id: BoardId,

    /// New title
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,
}

pub async fn list_boards(session: &Session) -> Result<()> {
    let boards = session.coordinator.load_boards().await?;
    output::print_boards_table(&boards);
    Ok(())
}

pub async fn execute(cmd: BoardCommands, session: &Session) -> Result<()> {
    match cmd {
        BoardCommands::Show { id } => {
            let board = session.coordinator.load_board(id).await?;
            output::print_board(&board);
        }

        BoardCommands::Create(args) => {
            let board = session
                .coordinator
                .create_board(NewBoard {
                    title: args.title,
                    description: args.description,
                    background_color: args.color,
                })
                .await?;

            println!(
                "{} Created board: {} ({})",
                "✓".green().bold(),
                board.title.cyan(),
                format!("#{}", board.id).dimmed()
            );
            let lists: Vec<&str> = board.lists.iter().map(|l| l.title.as_str()).collect();
            if !lists.is_empty() {
                println!("  {} {}", "Lists:".dimmed(), lists.join(", "));
            }
        }

        BoardCommands::Rename(args) => {
            if args.title.is_none() && args.description.is_none() {
                anyhow::bail!("Nothing to change: pass a title or --description");
            }
            let patch = BoardPatch {
                title: args.title,
                description: args.description,
                ..BoardPatch::default()
            };
            match session.coordinator.update_board(args.id, patch).await? {
                Some(board) => println!(
                    "{} Updated board {}",
                    "✓".green().bold(),
                    board.title.cyan()
                ),
                None => println!("{} Board #{} no longer exists", "!".yellow(), args.id),
            }
        }

        BoardCommands::Delete { id, yes } => {
            if !confirm(&format!("Delete board #{} and all its cards?", id), yes)? {
                println!("{}", "Cancelled.".dimmed());
                return Ok(());
            }
            session.coordinator.delete_board(id).await?;
            println!("{} Deleted board {}", "✓".green().bold(), format!("#{}", id).dimmed());
        }
    }

    Ok(())
}
