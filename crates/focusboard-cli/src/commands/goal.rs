//! Goal commands.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use colored::Colorize;

use focusboard_core::board::{CardId, GoalId};
use focusboard_core::goals::{Goal, NewGoal};
use focusboard_core::GoalStore;

use super::{confirm, Session};
use crate::output;

#[derive(Subcommand)]
pub enum GoalCommands {
    /// List goals
    Ls {
        /// Only goals still open
        #[arg(long)]
        active: bool,

        /// Only open goals past their target date
        #[arg(long, conflicts_with = "active")]
        overdue: bool,
    },

    /// Create a goal
    Add {
        /// Goal title
        title: String,

        /// Goal description
        #[arg(short, long)]
        description: Option<String>,

        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        target: Option<NaiveDate>,
    },

    /// Mark a goal completed (or reopen it with --undo)
    Done {
        /// Goal ID
        id: GoalId,

        /// Reopen instead
        #[arg(long)]
        undo: bool,
    },

    /// Link a card to a goal
    Link {
        /// Goal ID
        id: GoalId,

        /// Card ID
        card: CardId,
    },

    /// Unlink a card from a goal
    Unlink {
        /// Goal ID
        id: GoalId,

        /// Card ID
        card: CardId,
    },

    /// Delete a goal
    Rm {
        /// Goal ID
        id: GoalId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn execute(cmd: GoalCommands, session: &Session) -> Result<()> {
    let goals = GoalStore::new(session.gateway.clone()).with_board(session.coordinator.clone());
    let today = Local::now().date_naive();

    match cmd {
        GoalCommands::Ls { active, overdue } => {
            goals.fetch_goals().await?;
            let shown = if overdue {
                goals.overdue_goals(today)
            } else if active {
                goals.active_goals()
            } else {
                goals.goals()
            };
            output::print_goals(&shown, today);
        }

        GoalCommands::Add {
            title,
            description,
            target,
        } => {
            let goal = goals
                .create_goal(NewGoal {
                    title,
                    description,
                    target_date: target,
                })
                .await?;
            println!(
                "{} Created goal: {} ({})",
                "✓".green().bold(),
                goal.title.cyan(),
                format!("#{}", goal.id).dimmed()
            );
        }

        GoalCommands::Done { id, undo } => {
            let goal = goals.set_completed(id, !undo).await?;
            let state = if goal.is_completed { "completed".green() } else { "reopened".yellow() };
            println!("{} Goal {} {}", "✓".green().bold(), goal.title.cyan(), state);
        }

        GoalCommands::Link { id, card } => {
            let goal = goals.link_card(id, card).await?;
            report_progress("Linked", card, &goal);
        }

        GoalCommands::Unlink { id, card } => {
            let goal = goals.unlink_card(id, card).await?;
            report_progress("Unlinked", card, &goal);
        }

        GoalCommands::Rm { id, yes } => {
            if !confirm(&format!("Delete goal #{}? Linked cards are kept.", id), yes)? {
                println!("{}", "Cancelled.".dimmed());
                return Ok(());
            }
            goals.delete_goal(id).await?;
            println!("{} Deleted goal {}", "✓".green().bold(), format!("#{}", id).dimmed());
        }
    }

    Ok(())
}

fn report_progress(action: &str, card: CardId, goal: &Goal) {
    println!(
        "{} {} card {} · {} now {}/{} ({}%)",
        "✓".green().bold(),
        action,
        format!("#{}", card).dimmed(),
        goal.title.cyan(),
        goal.completed_cards_count,
        goal.cards_count,
        goal.progress_percentage
    );
}
