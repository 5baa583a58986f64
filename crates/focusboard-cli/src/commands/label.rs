//! Label commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use focusboard_core::board::{LabelId, LabelPatch, NewLabel, DEFAULT_LABEL_COLOR};
use focusboard_core::LabelStore;

use super::{confirm, Session};
use crate::output;

#[derive(Subcommand)]
pub enum LabelCommands {
    /// List labels
    Ls,

    /// Create a label
    Add {
        /// Label name
        name: String,

        /// Color (hex)
        #[arg(long, default_value = DEFAULT_LABEL_COLOR)]
        color: String,
    },

    /// Rename a label or change its color
    Edit {
        /// Label ID
        id: LabelId,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New color (hex)
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a label
    Rm {
        /// Label ID
        id: LabelId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn execute(cmd: LabelCommands, session: &Session) -> Result<()> {
    let labels = LabelStore::new(session.gateway.clone(), session.coordinator.clone());

    match cmd {
        LabelCommands::Ls => {
            let all = labels.fetch_labels().await?;
            output::print_labels(&all);
        }

        LabelCommands::Add { name, color } => {
            let label = labels.create_label(NewLabel { name, color }).await?;
            println!(
                "{} Created label: {} ({})",
                "✓".green().bold(),
                label.name.cyan(),
                format!("#{}", label.id).dimmed()
            );
        }

        LabelCommands::Edit { id, name, color } => {
            if name.is_none() && color.is_none() {
                anyhow::bail!("Nothing to change: pass --name or --color");
            }
            let label = labels.update_label(id, LabelPatch { name, color }).await?;
            println!("{} Updated label {}", "✓".green().bold(), label.name.cyan());
        }

        LabelCommands::Rm { id, yes } => {
            if !confirm(&format!("Delete label #{}? Cards keep their other labels.", id), yes)? {
                println!("{}", "Cancelled.".dimmed());
                return Ok(());
            }
            labels.delete_label(id).await?;
            println!("{} Deleted label {}", "✓".green().bold(), format!("#{}", id).dimmed());
        }
    }

    Ok(())
}
