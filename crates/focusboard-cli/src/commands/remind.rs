//! Reminder command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use focusboard_core::ReminderScheduler;

use super::Session;
use crate::output;

#[derive(Args)]
pub struct RemindArgs {
    /// Keep running and deliver reminders on schedule until interrupted
    #[arg(short, long)]
    pub watch: bool,

    /// Include the pending-task summary
    #[arg(short, long)]
    pub summary: bool,
}

pub async fn execute(args: RemindArgs, session: &Session) -> Result<()> {
    let mut preferences = session.config.reminders.clone();
    if args.summary {
        preferences.daily_summary = true;
    }
    let (scheduler, mut reminders) = ReminderScheduler::new(session.gateway.clone(), preferences);

    if !args.watch {
        let sent = scheduler.check_now().await?;
        if args.summary {
            scheduler.summary_now().await?;
        }
        while let Ok(reminder) = reminders.try_recv() {
            output::print_reminder(&reminder);
        }
        if sent == 0 {
            println!("{}", "No cards due soon.".dimmed());
        }
        return Ok(());
    }

    scheduler.start()?;
    let prefs = scheduler.preferences();
    println!(
        "{} Watching for reminders (due dates: {}, daily summary: {}). Ctrl-C to stop.",
        "→".blue().bold(),
        on_off(prefs.due_date_reminders),
        if prefs.daily_summary {
            prefs.reminder_time.clone()
        } else {
            "off".to_string()
        }
    );

    loop {
        tokio::select! {
            received = reminders.recv() => match received {
                Some(reminder) => output::print_reminder(&reminder),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    scheduler.stop();
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
