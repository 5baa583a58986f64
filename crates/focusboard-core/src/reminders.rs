//! Due-date reminders and the daily summary.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::board::{Card, CardId};
use crate::error::{FocusError, FocusResult};
use crate::gateway::ReminderGateway;
use crate::schedule::ScheduledTask;

pub const DUE_CHECK_PERIOD: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_REMINDER_TIME: &str = "09:00";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_cards: u32,
    #[serde(default)]
    pub completed_cards: u32,
}

impl DashboardSummary {
    pub fn pending(&self) -> u32 {
        self.total_cards.saturating_sub(self.completed_cards)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reminder {
    DueSoon {
        card_id: CardId,
        title: String,
        due: String,
    },
    Overdue {
        card_id: CardId,
        title: String,
    },
    DailySummary {
        pending: u32,
    },
}

impl Reminder {
    pub fn title(&self) -> &'static str {
        match self {
            Self::DueSoon { .. } => "Task Due Soon",
            Self::Overdue { .. } => "Task Overdue",
            Self::DailySummary { .. } => "Daily Task Summary",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::DueSoon { title, due, .. } => format!("\"{}\" is due {}", title, due),
            Self::Overdue { title, .. } => format!("\"{}\" is overdue!", title),
            Self::DailySummary { pending } => {
                format!("You have {} pending tasks. Keep going!", pending)
            }
        }
    }

    /// Reminder for an open card, or `None` if it has no due date or is done.
    pub fn for_card(card: &Card, now: DateTime<Utc>) -> Option<Self> {
        let due = card.due_date?;
        if card.completed {
            return None;
        }
        if due < now {
            Some(Self::Overdue {
                card_id: card.id,
                title: card.title.clone(),
            })
        } else {
            Some(Self::DueSoon {
                card_id: card.id,
                title: card.title.clone(),
                due: describe_due(due, now),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderPreferences {
    pub due_date_reminders: bool,
    pub daily_summary: bool,
    /// Local wall-clock time of the daily summary, `HH:MM`.
    pub reminder_time: String,
}

impl Default for ReminderPreferences {
    fn default() -> Self {
        Self {
            due_date_reminders: true,
            daily_summary: false,
            reminder_time: DEFAULT_REMINDER_TIME.to_string(),
        }
    }
}

impl ReminderPreferences {
    pub fn parsed_time(&self) -> FocusResult<NaiveTime> {
        NaiveTime::parse_from_str(&self.reminder_time, "%H:%M").map_err(|_| {
            FocusError::Config(format!(
                "reminder_time must be HH:MM, got '{}'",
                self.reminder_time
            ))
        })
    }
}

/// Human description of a due date relative to `now`.
pub fn describe_due(due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = due - now;
    let hours = diff.num_milliseconds().div_euclid(3_600_000);
    if hours < 0 {
        "overdue".to_string()
    } else if hours < 1 {
        format!("in {} minutes", diff.num_minutes())
    } else if hours < 24 {
        format!("in {} hours", hours)
    } else {
        format!("in {} days", hours / 24)
    }
}

/// Next instant at which the local clock reads `time`, strictly after `now`.
pub fn next_daily_occurrence<Tz: TimeZone>(now: DateTime<Tz>, time: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    loop {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(time)).earliest() {
            if candidate > now {
                return candidate;
            }
        }
        // Local time skipped by a DST gap, or already past: try the next day.
        date = match date.succ_opt() {
            Some(next) => next,
            None => return now,
        };
    }
}

/// Spawns the hourly due-date check and the daily summary.
///
/// Reminders are delivered on the channel handed out by `new`; stopping
/// the scheduler or dropping it cancels both timers.
pub struct ReminderScheduler {
    gateway: Arc<dyn ReminderGateway>,
    preferences: ReminderPreferences,
    sender: mpsc::UnboundedSender<Reminder>,
    tasks: Arc<Mutex<Vec<ScheduledTask>>>,
}

impl ReminderScheduler {
    pub fn new(
        gateway: Arc<dyn ReminderGateway>,
        preferences: ReminderPreferences,
    ) -> (Self, mpsc::UnboundedReceiver<Reminder>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            gateway,
            preferences,
            sender,
            tasks: Arc::new(Mutex::new(Vec::new())),
        };
        (scheduler, receiver)
    }

    pub fn preferences(&self) -> &ReminderPreferences {
        &self.preferences
    }

    pub fn start(&self) -> FocusResult<()> {
        let time = self.preferences.parsed_time()?;
        self.stop();

        if self.preferences.due_date_reminders {
            let gateway = self.gateway.clone();
            let sender = self.sender.clone();
            let task = ScheduledTask::every("due-soon-check", DUE_CHECK_PERIOD, move || {
                let gateway = gateway.clone();
                let sender = sender.clone();
                async move {
                    if let Err(e) = check_due_soon(gateway.as_ref(), &sender, Utc::now()).await {
                        warn!(error = %e, "Due-soon check failed");
                    }
                }
            });
            self.tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(task);
        }
        if self.preferences.daily_summary {
            schedule_daily(
                self.gateway.clone(),
                self.sender.clone(),
                time,
                Arc::downgrade(&self.tasks),
            );
        }
        info!(
            due_date_reminders = self.preferences.due_date_reminders,
            daily_summary = self.preferences.daily_summary,
            reminder_time = %self.preferences.reminder_time,
            "Reminder scheduler started"
        );
        Ok(())
    }

    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.iter_mut() {
            task.stop();
        }
        tasks.clear();
    }

    /// Run one due-date check immediately.
    pub async fn check_now(&self) -> FocusResult<usize> {
        check_due_soon(self.gateway.as_ref(), &self.sender, Utc::now()).await
    }

    /// Send the daily summary immediately.
    pub async fn summary_now(&self) -> FocusResult<u32> {
        send_summary(self.gateway.as_ref(), &self.sender).await
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn check_due_soon(
    gateway: &dyn ReminderGateway,
    sender: &mpsc::UnboundedSender<Reminder>,
    now: DateTime<Utc>,
) -> FocusResult<usize> {
    let cards = gateway.due_soon_cards().await?;
    let mut sent = 0;
    for card in &cards {
        if let Some(reminder) = Reminder::for_card(card, now) {
            if sender.send(reminder).is_ok() {
                sent += 1;
            }
        }
    }
    debug!(cards = cards.len(), sent, "Due-soon check finished");
    Ok(sent)
}

async fn send_summary(
    gateway: &dyn ReminderGateway,
    sender: &mpsc::UnboundedSender<Reminder>,
) -> FocusResult<u32> {
    let summary = gateway.dashboard_summary().await?;
    let pending = summary.pending();
    let _ = sender.send(Reminder::DailySummary { pending });
    Ok(pending)
}

/// Arm a one-shot timer for the next occurrence of `time`; it re-arms
/// itself after firing for as long as the scheduler is alive.
fn schedule_daily(
    gateway: Arc<dyn ReminderGateway>,
    sender: mpsc::UnboundedSender<Reminder>,
    time: NaiveTime,
    tasks: std::sync::Weak<Mutex<Vec<ScheduledTask>>>,
) {
    let Some(slots) = tasks.upgrade() else {
        return;
    };
    let now = Local::now();
    let at = next_daily_occurrence(now, time);
    let delay = (at - now).to_std().unwrap_or_default();
    debug!(at = %at, "Daily summary scheduled");

    let task = ScheduledTask::after("daily-summary", delay, move || async move {
        if let Err(e) = send_summary(gateway.as_ref(), &sender).await {
            warn!(error = %e, "Daily summary failed");
        }
        schedule_daily(gateway, sender, time, tasks);
    });

    let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
    slots.retain(|t| !t.is_finished());
    slots.push(task);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, List, NewBoard, NewCard};
    use crate::gateway::{BoardGateway, InMemoryGateway};
    use chrono::{Duration as ChronoDuration, FixedOffset, NaiveDate};

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2024, 3, 10)
                    .unwrap()
                    .and_hms_opt(h, m, 0)
                    .unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_next_daily_occurrence_rolls_over() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(next_daily_occurrence(at(8, 30), nine), at(9, 0));

        let next = next_daily_occurrence(at(9, 0), nine);
        assert_eq!(next - at(9, 0), ChronoDuration::hours(24));
    }

    #[test]
    fn test_describe_due() {
        let now = Utc::now();
        assert_eq!(describe_due(now - ChronoDuration::minutes(5), now), "overdue");
        assert_eq!(describe_due(now + ChronoDuration::minutes(30), now), "in 30 minutes");
        assert_eq!(describe_due(now + ChronoDuration::hours(5), now), "in 5 hours");
        assert_eq!(describe_due(now + ChronoDuration::hours(50), now), "in 2 days");
    }

    #[test]
    fn test_preferences_reject_bad_time() {
        let prefs = ReminderPreferences {
            reminder_time: "9am".into(),
            ..ReminderPreferences::default()
        };
        assert!(matches!(prefs.parsed_time(), Err(FocusError::Config(_))));
    }

    #[test]
    fn test_reminder_for_card() {
        let now = Utc::now();
        let mut card = crate::cache::tests::card(1, 0);
        assert!(Reminder::for_card(&card, now).is_none());

        card.due_date = Some(now + ChronoDuration::hours(3));
        let reminder = Reminder::for_card(&card, now).unwrap();
        assert_eq!(reminder.message(), "\"Card 1\" is due in 3 hours");

        card.completed = true;
        assert!(Reminder::for_card(&card, now).is_none());
    }

    async fn seeded() -> Arc<InMemoryGateway> {
        let gateway = Arc::new(InMemoryGateway::new());
        let board: Board = gateway
            .create_board(&NewBoard {
                title: "Home".into(),
                ..NewBoard::default()
            })
            .await
            .unwrap();
        let todo: &List = &board.lists[0];

        let mut soon = NewCard::new(todo.id, "Pay rent");
        soon.due_date = Some(Utc::now() + ChronoDuration::hours(2));
        gateway.create_card(&soon).await.unwrap();
        gateway.create_card(&NewCard::new(todo.id, "Someday")).await.unwrap();
        gateway
    }

    #[tokio::test]
    async fn test_check_now_sends_due_soon() {
        let gateway = seeded().await;
        let (scheduler, mut rx) = ReminderScheduler::new(gateway, ReminderPreferences::default());

        assert_eq!(scheduler.check_now().await.unwrap(), 1);
        match rx.recv().await.unwrap() {
            Reminder::DueSoon { title, .. } => assert_eq!(title, "Pay rent"),
            other => panic!("unexpected reminder {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_summary_counts_pending() {
        let gateway = seeded().await;
        let (scheduler, mut rx) = ReminderScheduler::new(gateway, ReminderPreferences::default());
        assert_eq!(scheduler.summary_now().await.unwrap(), 2);
        assert_eq!(rx.recv().await.unwrap(), Reminder::DailySummary { pending: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_hourly_check_runs_until_stopped() {
        let gateway = seeded().await;
        let (scheduler, mut rx) = ReminderScheduler::new(gateway, ReminderPreferences::default());
        scheduler.start().unwrap();

        tokio::time::sleep(DUE_CHECK_PERIOD + Duration::from_secs(1)).await;
        assert!(matches!(rx.try_recv(), Ok(Reminder::DueSoon { .. })));

        scheduler.stop();
        tokio::time::sleep(DUE_CHECK_PERIOD * 2).await;
        assert!(rx.try_recv().is_err());
    }
}
