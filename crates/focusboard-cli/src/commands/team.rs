//! Team commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use focusboard_core::board::UserId;
use focusboard_core::teams::{NewTeam, TeamId, TeamPatch, TeamRole};
use focusboard_core::TeamStore;

use super::{confirm, Session};
use crate::output;

#[derive(Subcommand)]
pub enum TeamCommands {
    /// List teams you own or belong to
    Ls {
        /// Only teams you own
        #[arg(long, conflicts_with = "joined")]
        owned: bool,

        /// Only teams you joined
        #[arg(long)]
        joined: bool,
    },

    /// Show a team and its members
    Show {
        /// Team ID
        id: TeamId,
    },

    /// Create a team
    Create {
        /// Team name
        name: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Rename a team or change its description
    Edit {
        /// Team ID
        id: TeamId,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a team
    Rm {
        /// Team ID
        id: TeamId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Invite a user by email
    Invite {
        /// Team ID
        id: TeamId,

        /// Email of the account to invite
        email: String,

        /// Role (admin, member, viewer)
        #[arg(long, default_value = "member", value_parser = parse_role)]
        role: TeamRole,
    },

    /// Remove a member
    Kick {
        /// Team ID
        id: TeamId,

        /// User ID
        user: UserId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Change a member's role
    Role {
        /// Team ID
        id: TeamId,

        /// User ID
        user: UserId,

        /// Role (admin, member, viewer)
        #[arg(value_parser = parse_role)]
        role: TeamRole,
    },
}

fn parse_role(s: &str) -> Result<TeamRole, String> {
    match TeamRole::from_str(&s.to_lowercase()) {
        Some(TeamRole::Owner) => Err("ownership cannot be assigned".to_string()),
        Some(role) => Ok(role),
        None => Err(format!("unknown role '{}' (admin, member, viewer)", s)),
    }
}

pub async fn execute(cmd: TeamCommands, session: &Session) -> Result<()> {
    let teams = TeamStore::new(session.gateway.clone());

    match cmd {
        TeamCommands::Ls { owned, joined } => {
            let all = teams.fetch_teams().await?;
            if !owned && !joined {
                output::print_teams(&all);
                return Ok(());
            }
            let me = teams.fetch_current_user().await?;
            let shown = if owned {
                teams.owned_teams(me.id)
            } else {
                teams.joined_teams(me.id)
            };
            output::print_teams(&shown);
        }

        TeamCommands::Show { id } => {
            let team = teams.fetch_team(id).await?;
            output::print_team(&team);
        }

        TeamCommands::Create { name, description } => {
            let team = teams.create_team(NewTeam { name, description }).await?;
            println!(
                "{} Created team: {} ({})",
                "✓".green().bold(),
                team.name.cyan(),
                format!("#{}", team.id).dimmed()
            );
        }

        TeamCommands::Edit {
            id,
            name,
            description,
        } => {
            if name.is_none() && description.is_none() {
                anyhow::bail!("Nothing to change: pass --name or --description");
            }
            let patch = TeamPatch {
                name,
                description,
                ..TeamPatch::default()
            };
            let team = teams.update_team(id, patch).await?;
            println!("{} Updated team {}", "✓".green().bold(), team.name.cyan());
        }

        TeamCommands::Rm { id, yes } => {
            if !confirm(&format!("Delete team #{} for every member?", id), yes)? {
                println!("{}", "Cancelled.".dimmed());
                return Ok(());
            }
            teams.delete_team(id).await?;
            println!("{} Deleted team {}", "✓".green().bold(), format!("#{}", id).dimmed());
        }

        TeamCommands::Invite { id, email, role } => {
            let member = teams.invite_member(id, &email, role).await?;
            println!(
                "{} Added {} to team #{} as {}",
                "✓".green().bold(),
                member.user.display_name().cyan(),
                id,
                role.as_str()
            );
        }

        TeamCommands::Kick { id, user, yes } => {
            if !confirm(&format!("Remove user #{} from team #{}?", user, id), yes)? {
                println!("{}", "Cancelled.".dimmed());
                return Ok(());
            }
            teams.remove_member(id, user).await?;
            println!("{} Removed user #{} from team #{}", "✓".green().bold(), user, id);
        }

        TeamCommands::Role { id, user, role } => {
            let member = teams.update_member_role(id, user, role).await?;
            println!(
                "{} {} is now {} of team #{}",
                "✓".green().bold(),
                member.user.display_name().cyan(),
                member.role.as_str(),
                id
            );
        }
    }

    Ok(())
}
