//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;

use focusboard_core::board::BoardId;
use focusboard_core::config::{API_URL_ENV, TOKEN_ENV};
use focusboard_core::{BoardCoordinator, BoardQuery, BoardStore, ClientConfig};
use focusboard_http::HttpGateway;

pub mod board;
pub mod card;
pub mod config;
pub mod focus;
pub mod goal;
pub mod label;
pub mod list;
pub mod remind;
pub mod team;

/// Focusboard - task board client with focus sessions and goals
#[derive(Parser)]
#[command(name = "focusboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the Focusboard API
    #[arg(long, global = true, env = API_URL_ENV)]
    pub api_url: Option<String>,

    /// API token
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List boards
    Boards,

    /// Board management
    #[command(subcommand)]
    Board(board::BoardCommands),

    /// List management
    #[command(subcommand)]
    List(list::ListCommands),

    /// Card management
    #[command(subcommand)]
    Card(card::CardCommands),

    /// Label management
    #[command(subcommand)]
    Label(label::LabelCommands),

    /// Goal tracking
    #[command(subcommand)]
    Goal(goal::GoalCommands),

    /// Teams and memberships
    #[command(subcommand)]
    Team(team::TeamCommands),

    /// Focus sessions (pomodoro)
    #[command(subcommand)]
    Focus(focus::FocusCommands),

    /// Due-date reminders and daily summary
    Remind(remind::RemindArgs),

    /// Client configuration
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let command = match self.command {
            Commands::Config(cmd) => return config::execute(cmd, self.config.as_deref()),
            other => other,
        };

        let mut config = ClientConfig::load(self.config.as_deref())?;
        if let Some(url) = self.api_url {
            config.api_url = url;
        }
        if let Some(token) = self.token {
            config.token = Some(token);
        }
        config.validate()?;
        let session = Session::connect(config)?;

        match command {
            Commands::Boards => board::list_boards(&session).await,
            Commands::Board(cmd) => board::execute(cmd, &session).await,
            Commands::List(cmd) => list::execute(cmd, &session).await,
            Commands::Card(cmd) => card::execute(cmd, &session).await,
            Commands::Label(cmd) => label::execute(cmd, &session).await,
            Commands::Goal(cmd) => goal::execute(cmd, &session).await,
            Commands::Team(cmd) => team::execute(cmd, &session).await,
            Commands::Focus(cmd) => focus::execute(cmd, &session).await,
            Commands::Remind(args) => remind::execute(args, &session).await,
            Commands::Config(_) => unreachable!("handled before connecting"),
        }
    }
}

/// Everything a command needs to talk to the remote store.
pub struct Session {
    pub config: ClientConfig,
    pub gateway: Arc<HttpGateway>,
    pub store: BoardStore,
    pub coordinator: BoardCoordinator,
}

impl Session {
    fn connect(config: ClientConfig) -> Result<Self> {
        let gateway = Arc::new(
            HttpGateway::from_config(&config).context("Failed to build HTTP client")?,
        );
        let store = BoardStore::new();
        let coordinator = BoardCoordinator::new(gateway.clone(), store.clone())
            .with_move_failure(config.move_failure);
        Ok(Self {
            config,
            gateway,
            store,
            coordinator,
        })
    }

    pub fn query(&self) -> BoardQuery {
        BoardQuery::new(self.store.clone())
    }

    /// Load a board into the cache; list and card commands operate on it.
    pub async fn open_board(&self, id: BoardId) -> Result<()> {
        self.coordinator
            .load_board(id)
            .await
            .with_context(|| format!("Failed to load board {}", id))?;
        Ok(())
    }
}

/// Ask before a destructive operation unless `--yes` was given.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
