//! Focus timer (pomodoro) sessions.
//!
//! The remote store records each session; the timer itself runs locally,
//! driven by a one-second `ScheduledTask` that exists only while a session
//! is active.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::board::{Card, CardId};
use crate::error::{FocusError, FocusResult};
use crate::gateway::FocusGateway;
use crate::schedule::ScheduledTask;

/// Pause between a completed session and an auto-started follow-up.
pub const AUTO_START_DELAY: Duration = Duration::from_secs(2);

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionKind {
    pub fn is_break(&self) -> bool {
        !matches!(self, Self::Work)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::ShortBreak => "short_break",
            Self::LongBreak => "long_break",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::ShortBreak => "short break",
            Self::LongBreak => "long break",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "work" => Some(Self::Work),
            "short_break" | "short" => Some(Self::ShortBreak),
            "long_break" | "long" => Some(Self::LongBreak),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: i64,
    #[serde(default)]
    pub card: Option<Card>,
    pub session_type: SessionKind,
    pub duration_minutes: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFocusSession {
    pub card: Option<CardId>,
    pub session_type: SessionKind,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsWindow {
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default)]
    pub work_sessions: u32,
    #[serde(default)]
    pub total_minutes: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusStats {
    #[serde(default)]
    pub today: StatsWindow,
    #[serde(default)]
    pub this_week: StatsWindow,
}

/// Session lengths in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusDurations {
    pub work: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Default for FocusDurations {
    fn default() -> Self {
        Self {
            work: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}

impl FocusDurations {
    pub fn minutes(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Work => self.work,
            SessionKind::ShortBreak => self.short_break,
            SessionKind::LongBreak => self.long_break,
        }
    }

    /// Reject lengths outside `1..=MAX_SESSION_MINUTES`.
    pub fn validate(&self) -> FocusResult<()> {
        for kind in [SessionKind::Work, SessionKind::ShortBreak, SessionKind::LongBreak] {
            check_session_length(self.minutes(kind))?;
        }
        Ok(())
    }
}

/// Longest session the timer accepts, in minutes.
pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

fn check_session_length(minutes: u32) -> FocusResult<()> {
    if minutes == 0 || minutes > MAX_SESSION_MINUTES {
        return Err(FocusError::validation(format!(
            "session length must be between 1 and {} minutes, got {}",
            MAX_SESSION_MINUTES, minutes
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusSettings {
    pub auto_start_breaks: bool,
    pub auto_start_work: bool,
    /// A long break follows every Nth work session.
    pub long_break_interval: u32,
    pub notifications: bool,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            auto_start_breaks: true,
            auto_start_work: false,
            long_break_interval: 4,
            notifications: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    Started { kind: SessionKind, minutes: u32 },
    Completed { kind: SessionKind, next: SessionKind },
    Stopped,
}

/// Point-in-time view of the timer.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub session: Option<FocusSession>,
    pub active: bool,
    pub remaining_secs: u32,
    pub kind: SessionKind,
    pub cycle_count: u32,
}

#[derive(Default)]
struct TimerState {
    current: Option<FocusSession>,
    active: bool,
    remaining_secs: u32,
    kind: SessionKind,
    cycle_count: u32,
    durations: FocusDurations,
    settings: FocusSettings,
    stats: FocusStats,
    last_error: Option<String>,
}

impl TimerState {
    fn next_kind(&self) -> SessionKind {
        match self.kind {
            SessionKind::Work => {
                let interval = self.settings.long_break_interval;
                if interval > 0 && (self.cycle_count + 1) % interval == 0 {
                    SessionKind::LongBreak
                } else {
                    SessionKind::ShortBreak
                }
            }
            _ => SessionKind::Work,
        }
    }
}

struct TimerInner {
    gateway: Arc<dyn FocusGateway>,
    state: Mutex<TimerState>,
    ticker: Mutex<Option<ScheduledTask>>,
    pending_start: Mutex<Option<ScheduledTask>>,
    events: broadcast::Sender<TimerEvent>,
}

#[derive(Clone)]
pub struct FocusTimer {
    inner: Arc<TimerInner>,
}

impl FocusTimer {
    pub fn new(gateway: Arc<dyn FocusGateway>) -> Self {
        Self::with_settings(gateway, FocusDurations::default(), FocusSettings::default())
    }

    pub fn with_settings(
        gateway: Arc<dyn FocusGateway>,
        durations: FocusDurations,
        settings: FocusSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        let state = TimerState {
            durations,
            settings,
            ..TimerState::default()
        };
        Self {
            inner: Arc::new(TimerInner {
                gateway,
                state: Mutex::new(state),
                ticker: Mutex::new(None),
                pending_start: Mutex::new(None),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.inner.events.subscribe()
    }

    // ============================================================
    // SESSION LIFECYCLE
    // ============================================================

    /// Start a session of the current kind, optionally tied to a card.
    pub async fn start_session(
        &self,
        card: Option<CardId>,
        custom_minutes: Option<u32>,
    ) -> FocusResult<FocusSession> {
        let (kind, minutes) = {
            let mut state = self.state();
            state.last_error = None;
            let minutes = custom_minutes.unwrap_or_else(|| state.durations.minutes(state.kind));
            (state.kind, minutes)
        };
        if let Err(e) = check_session_length(minutes) {
            return Err(self.record(e));
        }

        let request = NewFocusSession {
            card,
            session_type: kind,
            duration_minutes: minutes,
        };
        let session = match self.inner.gateway.start_session(&request).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to start focus session");
                return Err(self.record(e));
            }
        };

        {
            let mut state = self.state();
            state.current = Some(session.clone());
            state.remaining_secs = minutes * 60;
            state.active = true;
        }
        self.start_ticker();
        info!(session_id = session.id, kind = kind.as_str(), minutes, "Focus session started");
        let _ = self.inner.events.send(TimerEvent::Started { kind, minutes });
        Ok(session)
    }

    pub fn pause(&self) {
        self.state().active = false;
        self.stop_ticker();
    }

    pub fn resume(&self) -> bool {
        {
            let mut state = self.state();
            if state.current.is_none() || state.active {
                return false;
            }
            state.active = true;
        }
        self.start_ticker();
        true
    }

    /// Advance the clock by one second. Returns `true` once the session has
    /// run out and should be completed.
    pub fn tick(&self) -> bool {
        let mut state = self.state();
        if !state.active {
            return false;
        }
        if state.remaining_secs > 0 {
            state.remaining_secs -= 1;
            false
        } else {
            true
        }
    }

    /// Confirm the current session with the remote store and pick the next kind.
    ///
    /// The local session is cleared whether or not the remote call succeeds.
    pub async fn complete_session(&self) -> FocusResult<()> {
        let current = self.state().current.clone();
        let result = match current {
            Some(session) => self.confirm(session).await,
            None => Ok(()),
        };

        {
            let mut state = self.state();
            state.current = None;
            state.remaining_secs = 0;
        }
        self.stop_ticker();
        result
    }

    async fn confirm(&self, session: FocusSession) -> FocusResult<()> {
        if let Err(e) = self.inner.gateway.complete_session(session.id).await {
            warn!(session_id = session.id, error = %e, "Failed to complete focus session");
            return Err(self.record(e));
        }

        let (finished, next, auto_start) = {
            let mut state = self.state();
            let finished = state.kind;
            let next = state.next_kind();
            if finished == SessionKind::Work {
                state.cycle_count += 1;
            }
            let auto_start = if next.is_break() {
                state.settings.auto_start_breaks
            } else {
                state.settings.auto_start_work
            };
            state.kind = next;
            state.active = false;
            (finished, next, auto_start)
        };

        info!(
            session_id = session.id,
            kind = finished.as_str(),
            next = next.as_str(),
            "Focus session completed"
        );
        let _ = self.inner.events.send(TimerEvent::Completed {
            kind: finished,
            next,
        });

        if auto_start {
            self.schedule_auto_start();
        }
        if let Err(e) = self.fetch_stats().await {
            debug!(error = %e, "Could not refresh focus stats");
        }
        Ok(())
    }

    pub fn stop(&self) {
        {
            let mut state = self.state();
            state.active = false;
            state.current = None;
            state.remaining_secs = 0;
        }
        self.stop_ticker();
        if let Some(mut pending) = lock(&self.inner.pending_start).take() {
            pending.stop();
        }
        let _ = self.inner.events.send(TimerEvent::Stopped);
    }

    /// Switch the kind of the next session. Ignored while a session runs.
    pub fn set_session_kind(&self, kind: SessionKind) -> bool {
        let mut state = self.state();
        if state.active {
            return false;
        }
        state.kind = kind;
        state.remaining_secs = state.durations.minutes(kind).saturating_mul(60);
        true
    }

    pub fn update_settings(&self, settings: FocusSettings) {
        self.state().settings = settings;
    }

    pub fn update_durations(&self, durations: FocusDurations) {
        self.state().durations = durations;
    }

    pub async fn fetch_stats(&self) -> FocusResult<FocusStats> {
        let stats = self.inner.gateway.session_stats().await?;
        self.state().stats = stats;
        Ok(stats)
    }

    // ============================================================
    // READS
    // ============================================================

    pub fn snapshot(&self) -> TimerSnapshot {
        let state = self.state();
        TimerSnapshot {
            session: state.current.clone(),
            active: state.active,
            remaining_secs: state.remaining_secs,
            kind: state.kind,
            cycle_count: state.cycle_count,
        }
    }

    pub fn settings(&self) -> FocusSettings {
        self.state().settings
    }

    pub fn stats(&self) -> FocusStats {
        self.state().stats
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn next_session_kind(&self) -> SessionKind {
        self.state().next_kind()
    }

    /// Elapsed share of the current kind's nominal length, in percent.
    pub fn progress_percentage(&self) -> f64 {
        let state = self.state();
        let total = state.durations.minutes(state.kind).saturating_mul(60);
        if total == 0 {
            return 0.0;
        }
        let elapsed = total.saturating_sub(state.remaining_secs);
        f64::from(elapsed) / f64::from(total) * 100.0
    }

    pub fn formatted_time(&self) -> String {
        format_clock(self.state().remaining_secs)
    }

    // ============================================================
    // INTERNALS
    // ============================================================

    fn start_ticker(&self) {
        let weak = Arc::downgrade(&self.inner);
        let task = ScheduledTask::every("focus-tick", TICK, move || on_tick(weak.clone()));
        if let Some(mut previous) = lock(&self.inner.ticker).replace(task) {
            previous.stop();
        }
    }

    fn stop_ticker(&self) {
        if let Some(mut ticker) = lock(&self.inner.ticker).take() {
            ticker.stop();
        }
    }

    fn schedule_auto_start(&self) {
        let weak = Arc::downgrade(&self.inner);
        let task = ScheduledTask::after("focus-auto-start", AUTO_START_DELAY, move || async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let timer = FocusTimer { inner };
            if let Err(e) = timer.start_session(None, None).await {
                warn!(error = %e, "Auto-start of next focus session failed");
            }
        });
        *lock(&self.inner.pending_start) = Some(task);
    }

    fn record(&self, err: FocusError) -> FocusError {
        self.state().last_error = Some(err.to_string());
        err
    }

    fn state(&self) -> MutexGuard<'_, TimerState> {
        lock(&self.inner.state)
    }
}

async fn on_tick(weak: Weak<TimerInner>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let timer = FocusTimer { inner };
    if timer.tick() {
        if let Err(e) = timer.complete_session().await {
            debug!(error = %e, "Expired focus session could not be confirmed");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Render seconds as `MM:SS`.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;

    fn timer() -> (Arc<InMemoryGateway>, FocusTimer) {
        let gateway = Arc::new(InMemoryGateway::new());
        let timer = FocusTimer::new(gateway.clone());
        (gateway, timer)
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(61), "01:01");
    }

    #[test]
    fn test_session_kind_parsing() {
        assert_eq!(SessionKind::from_str("short_break"), Some(SessionKind::ShortBreak));
        assert_eq!(SessionKind::from_str("long"), Some(SessionKind::LongBreak));
        assert_eq!(SessionKind::from_str("nap"), None);
        assert!(SessionKind::LongBreak.is_break());
    }

    #[tokio::test]
    async fn test_next_kind_follows_cycle() {
        let (_, timer) = timer();
        timer.update_settings(FocusSettings {
            auto_start_breaks: false,
            ..FocusSettings::default()
        });
        assert_eq!(timer.next_session_kind(), SessionKind::ShortBreak);

        for _ in 0..3 {
            timer.set_session_kind(SessionKind::Work);
            timer.start_session(None, Some(1)).await.unwrap();
            timer.complete_session().await.unwrap();
        }
        assert_eq!(timer.snapshot().cycle_count, 3);
        timer.set_session_kind(SessionKind::Work);
        assert_eq!(timer.next_session_kind(), SessionKind::LongBreak);

        timer.set_session_kind(SessionKind::ShortBreak);
        assert_eq!(timer.next_session_kind(), SessionKind::Work);
    }

    #[tokio::test]
    async fn test_set_kind_only_while_inactive() {
        let (_, timer) = timer();
        assert!(timer.set_session_kind(SessionKind::LongBreak));
        assert_eq!(timer.formatted_time(), "15:00");

        timer.start_session(None, None).await.unwrap();
        assert!(!timer.set_session_kind(SessionKind::Work));
        assert_eq!(timer.snapshot().kind, SessionKind::LongBreak);
        timer.stop();
    }

    #[tokio::test]
    async fn test_tick_and_progress() {
        let (_, timer) = timer();
        timer.start_session(None, None).await.unwrap();
        timer.pause();

        assert!(!timer.tick());
        assert_eq!(timer.formatted_time(), "25:00");

        timer.resume();
        for _ in 0..150 {
            assert!(!timer.tick());
        }
        assert_eq!(timer.formatted_time(), "22:30");
        assert!((timer.progress_percentage() - 10.0).abs() < 1e-9);
        timer.stop();
        assert!(timer.snapshot().session.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_runs_out_and_completes() {
        let (_, timer) = timer();
        timer.update_settings(FocusSettings {
            auto_start_breaks: false,
            ..FocusSettings::default()
        });
        let mut events = timer.subscribe();

        timer.start_session(None, Some(1)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(62)).await;

        let snapshot = timer.snapshot();
        assert!(snapshot.session.is_none());
        assert!(!snapshot.active);
        assert_eq!(snapshot.kind, SessionKind::ShortBreak);
        assert_eq!(snapshot.cycle_count, 1);

        assert!(matches!(events.recv().await, Ok(TimerEvent::Started { .. })));
        assert_eq!(
            events.recv().await.unwrap(),
            TimerEvent::Completed {
                kind: SessionKind::Work,
                next: SessionKind::ShortBreak
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_auto_starts() {
        let (_, timer) = timer();
        timer.start_session(None, None).await.unwrap();
        timer.complete_session().await.unwrap();
        assert!(!timer.snapshot().active);

        tokio::time::sleep(AUTO_START_DELAY + Duration::from_millis(10)).await;
        let snapshot = timer.snapshot();
        assert!(snapshot.active);
        assert_eq!(snapshot.kind, SessionKind::ShortBreak);
        assert_eq!(timer.formatted_time(), "05:00");
        timer.stop();
    }

    #[tokio::test]
    async fn test_failed_start_records_error() {
        let (gateway, timer) = timer();
        gateway.fail_next(FocusError::network("offline"));
        assert!(timer.start_session(None, None).await.is_err());
        assert!(timer.last_error().is_some());
        assert!(!timer.snapshot().active);
    }

    #[tokio::test]
    async fn test_completion_refreshes_stats() {
        let (_, timer) = timer();
        timer.update_settings(FocusSettings {
            auto_start_breaks: false,
            ..FocusSettings::default()
        });
        timer.start_session(None, None).await.unwrap();
        timer.complete_session().await.unwrap();

        let stats = timer.stats();
        assert_eq!(stats.today.work_sessions, 1);
        assert_eq!(stats.today.total_minutes, 25);
    }

    #[tokio::test]
    async fn test_oversized_session_is_rejected() {
        let (_, timer) = timer();
        let err = timer.start_session(None, Some(u32::MAX)).await.unwrap_err();
        assert!(matches!(err, FocusError::Validation(_)));
        assert!(timer.snapshot().session.is_none());
        assert!(timer.last_error().is_some());

        timer
            .start_session(None, Some(MAX_SESSION_MINUTES))
            .await
            .unwrap();
        assert_eq!(timer.formatted_time(), "1440:00");
        timer.stop();
    }

    #[test]
    fn test_duration_bounds() {
        assert!(FocusDurations::default().validate().is_ok());
        let zero = FocusDurations {
            short_break: 0,
            ..FocusDurations::default()
        };
        assert!(zero.validate().is_err());
        let huge = FocusDurations {
            work: MAX_SESSION_MINUTES + 1,
            ..FocusDurations::default()
        };
        assert!(huge.validate().is_err());
    }
}
