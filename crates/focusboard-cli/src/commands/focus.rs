//! Focus session (pomodoro) commands.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;

use focusboard_core::board::CardId;
use focusboard_core::pomodoro::{SessionKind, TimerEvent};
use focusboard_core::FocusTimer;

use super::Session;
use crate::output;

const REFRESH: Duration = Duration::from_millis(250);

#[derive(Subcommand)]
pub enum FocusCommands {
    /// Run focus sessions in the foreground until done or interrupted
    Start {
        /// Card to focus on
        #[arg(long)]
        card: Option<CardId>,

        /// Custom length of the first session, in minutes
        #[arg(short, long)]
        minutes: Option<u32>,

        /// Kind of the first session (work, short, long)
        #[arg(short, long, default_value = "work", value_parser = parse_kind)]
        kind: SessionKind,

        /// Number of sessions to run, breaks included
        #[arg(long, default_value_t = 1)]
        sessions: u32,
    },

    /// Show today's and this week's focus statistics
    Stats,
}

fn parse_kind(s: &str) -> Result<SessionKind, String> {
    SessionKind::from_str(&s.to_lowercase())
        .ok_or_else(|| format!("unknown session kind '{}' (work, short, long)", s))
}

pub async fn execute(cmd: FocusCommands, session: &Session) -> Result<()> {
    let focus = &session.config.focus;
    let timer = FocusTimer::with_settings(session.gateway.clone(), focus.durations, focus.settings);

    match cmd {
        FocusCommands::Start {
            card,
            minutes,
            kind,
            sessions,
        } => run_sessions(&timer, card, minutes, kind, sessions.max(1)).await,

        FocusCommands::Stats => {
            let stats = timer.fetch_stats().await?;
            output::print_focus_stats(&stats);
            Ok(())
        }
    }
}

async fn run_sessions(
    timer: &FocusTimer,
    card: Option<CardId>,
    minutes: Option<u32>,
    kind: SessionKind,
    sessions: u32,
) -> Result<()> {
    timer.set_session_kind(kind);
    let mut events = timer.subscribe();
    timer
        .start_session(card, minutes)
        .await
        .context("Failed to start focus session")?;

    let mut bar: Option<ProgressBar> = None;
    let mut finished = 0;
    let mut refresh = tokio::time::interval(REFRESH);

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                let snapshot = timer.snapshot();
                if let (Some(bar), Some(current)) = (&bar, &snapshot.session) {
                    let total = u64::from(current.duration_minutes) * 60;
                    bar.set_position(total.saturating_sub(u64::from(snapshot.remaining_secs)));
                    bar.set_prefix(timer.formatted_time());
                }
                if let Some(err) = timer.last_error() {
                    if snapshot.session.is_none() {
                        if let Some(bar) = bar.take() {
                            bar.abandon_with_message("failed");
                        }
                        anyhow::bail!("Focus session failed: {}", err);
                    }
                }
            }

            event = events.recv() => match event {
                Ok(TimerEvent::Started { kind, minutes }) => {
                    bar = Some(session_bar(kind, minutes)?);
                }
                Ok(TimerEvent::Completed { kind, next }) => {
                    finished += 1;
                    if let Some(bar) = bar.take() {
                        bar.finish_with_message(format!("{} done", kind.label()));
                    }
                    if finished >= sessions {
                        timer.stop();
                        println!(
                            "{} {} complete. Next up: {}",
                            "✓".green().bold(),
                            kind.label().cyan(),
                            next.label()
                        );
                        break;
                    }
                    let settings = timer.settings();
                    let auto = if next.is_break() {
                        settings.auto_start_breaks
                    } else {
                        settings.auto_start_work
                    };
                    if !auto {
                        timer.start_session(card, None).await?;
                    }
                }
                Ok(TimerEvent::Stopped) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(_)) => {}
            },

            _ = tokio::signal::ctrl_c() => {
                timer.stop();
                if let Some(bar) = bar.take() {
                    bar.abandon_with_message("stopped");
                }
                println!("{}", "Focus session stopped.".yellow());
                break;
            }
        }
    }

    let stats = timer.stats();
    if stats.today.total_sessions > 0 {
        println!();
        output::print_focus_stats(&stats);
    }
    Ok(())
}

fn session_bar(kind: SessionKind, minutes: u32) -> Result<ProgressBar> {
    let bar = ProgressBar::new(u64::from(minutes) * 60);
    let color = if kind.is_break() { "green" } else { "red" };
    let template = format!("{{msg:12}} [{{bar:30.{}/black}}] {{prefix}}", color);
    bar.set_style(ProgressStyle::with_template(&template)?.progress_chars("█▓░"));
    bar.set_message(kind.label().to_string());
    bar.set_prefix(focusboard_core::pomodoro::format_clock(minutes * 60));
    Ok(bar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("Work").unwrap(), SessionKind::Work);
        assert_eq!(parse_kind("short").unwrap(), SessionKind::ShortBreak);
        assert_eq!(parse_kind("long").unwrap(), SessionKind::LongBreak);
        assert!(parse_kind("nap").is_err());
    }
}
