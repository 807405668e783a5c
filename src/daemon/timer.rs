//! Timer engine for the focus timer.
//!
//! This module provides the core timer state machine:
//! - Run status transitions (Idle → Running ⇄ Paused → Idle)
//! - Deadline-based countdown that tolerates missed ticks
//! - Session record generation on completion
//! - Focus/short break/long break cycling
//!
//! The engine does not schedule itself. A driver calls [`TimerEngine::tick`]
//! periodically while it is running; see [`super::driver`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use crate::types::{PhaseType, SessionRecord, Settings, TimerSnapshot, TimerStatus};

// ============================================================================
// TimerEvent
// ============================================================================

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown started or resumed
    Started {
        /// Phase being timed
        phase: PhaseType,
        /// Seconds left when the countdown began
        remaining_seconds: u32,
        /// Whether this continued a paused countdown
        resumed: bool,
    },
    /// Countdown paused
    Paused {
        /// Phase being timed
        phase: PhaseType,
        /// Frozen remaining seconds
        remaining_seconds: u32,
    },
    /// Phase cancelled without a record
    Stopped {
        /// Phase that was reset
        phase: PhaseType,
    },
    /// Phase completed, by expiry or skip
    SessionCompleted {
        /// Record of the phase that ended
        record: SessionRecord,
        /// Phase the engine advanced to
        next_phase: PhaseType,
    },
}

// ============================================================================
// EngineError
// ============================================================================

/// Rejected transition requests. The engine state is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// `start` while already running
    #[error("Timer is already running")]
    AlreadyRunning,

    /// `pause` or `skip` without a running countdown
    #[error("Timer is not running")]
    NotRunning,
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Pomodoro state machine.
pub struct TimerEngine {
    settings: Settings,
    status: TimerStatus,
    phase: PhaseType,
    /// Stored remaining seconds; authoritative only while not running
    time_left: u32,
    intent: String,
    completed_focus_count: u32,
    /// Absolute end of the running countdown (epoch ms)
    deadline_ms: Option<u64>,
    clock: Arc<dyn Clock>,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an idle engine at the start of a focus phase.
    pub fn new(
        settings: Settings,
        clock: Arc<dyn Clock>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let settings = settings.clamped();
        Self {
            settings,
            status: TimerStatus::Idle,
            phase: PhaseType::Focus,
            time_left: settings.phase_seconds(PhaseType::Focus),
            intent: String::new(),
            completed_focus_count: 0,
            deadline_ms: None,
            clock,
            event_tx,
        }
    }

    /// Creates an engine reading the system clock.
    pub fn with_system_clock(
        settings: Settings,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        Self::new(settings, Arc::new(SystemClock), event_tx)
    }

    /// Starts a fresh countdown or resumes a paused one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyRunning`] if the countdown is running.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.status == TimerStatus::Running {
            debug!("start ignored: already running");
            return Err(EngineError::AlreadyRunning);
        }

        let resumed = self.status == TimerStatus::Paused;
        let now = self.clock.now_ms();
        self.deadline_ms = Some(now.saturating_add(u64::from(self.time_left) * 1000));
        self.status = TimerStatus::Running;

        info!(
            phase = self.phase.as_str(),
            remaining = self.time_left,
            resumed,
            "countdown started"
        );
        self.emit(TimerEvent::Started {
            phase: self.phase,
            remaining_seconds: self.time_left,
            resumed,
        });

        Ok(())
    }

    /// Freezes the countdown at its current value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] unless the countdown is running.
    pub fn pause(&mut self) -> Result<(), EngineError> {
        if self.status != TimerStatus::Running {
            debug!(status = self.status.as_str(), "pause ignored");
            return Err(EngineError::NotRunning);
        }

        self.time_left = self.remaining_seconds();
        self.deadline_ms = None;
        self.status = TimerStatus::Paused;

        info!(remaining = self.time_left, "countdown paused");
        self.emit(TimerEvent::Paused {
            phase: self.phase,
            remaining_seconds: self.time_left,
        });

        Ok(())
    }

    /// Cancels the current phase and resets it to its full duration.
    ///
    /// Valid in every state; no session record is produced.
    pub fn stop(&mut self) {
        self.status = TimerStatus::Idle;
        self.deadline_ms = None;
        self.time_left = self.settings.phase_seconds(self.phase);

        info!(phase = self.phase.as_str(), "timer stopped");
        self.emit(TimerEvent::Stopped { phase: self.phase });
    }

    /// Completes the running phase immediately, as if it had expired.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] when idle or paused.
    pub fn skip(&mut self) -> Result<SessionRecord, EngineError> {
        if self.status != TimerStatus::Running {
            debug!(status = self.status.as_str(), "skip ignored");
            return Err(EngineError::NotRunning);
        }

        info!(phase = self.phase.as_str(), "phase skipped");
        Ok(self.complete())
    }

    /// Recomputes the remaining time from the deadline.
    ///
    /// Returns the completed record when this tick observes expiry. Ticks
    /// outside `Running` do nothing, so completion fires once per phase.
    pub fn tick(&mut self) -> Option<SessionRecord> {
        if self.status != TimerStatus::Running {
            return None;
        }

        self.time_left = self.remaining_seconds();
        if self.time_left == 0 {
            return Some(self.complete());
        }
        None
    }

    /// Replaces the intent text captured at the next focus completion.
    pub fn set_intent(&mut self, text: impl Into<String>) {
        self.intent = text.into();
        debug!(intent = %self.intent, "intent updated");
    }

    /// Replaces the settings.
    ///
    /// While idle the remaining time is recomputed for the current phase;
    /// a running or paused countdown keeps its deadline.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings.clamped();
        if self.status == TimerStatus::Idle {
            self.time_left = self.settings.phase_seconds(self.phase);
        }
        info!(settings = ?self.settings, "settings updated");
    }

    /// Remaining seconds, derived from the deadline while running.
    pub fn remaining_seconds(&self) -> u32 {
        match (self.status, self.deadline_ms) {
            (TimerStatus::Running, Some(deadline)) => {
                let left_ms = deadline.saturating_sub(self.clock.now_ms());
                u32::try_from(left_ms.div_ceil(1000)).unwrap_or(u32::MAX)
            }
            _ => self.time_left,
        }
    }

    /// Returns a point-in-time view of the engine.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            status: self.status,
            phase: self.phase,
            remaining_seconds: self.remaining_seconds(),
            completed_focus_count: self.completed_focus_count,
            intent: self.intent.clone(),
        }
    }

    /// Current run status.
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    /// Current phase.
    pub fn phase(&self) -> PhaseType {
        self.phase
    }

    /// Current intent text.
    pub fn intent(&self) -> &str {
        &self.intent
    }

    /// Focus phases completed since the engine was created.
    pub fn completed_focus_count(&self) -> u32 {
        self.completed_focus_count
    }

    /// Active settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns true while the countdown is running.
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Deadline of the running countdown in epoch milliseconds.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// Ends the current phase: records it, emits it, then advances.
    fn complete(&mut self) -> SessionRecord {
        let ended = self.phase;
        self.status = TimerStatus::Idle;
        self.deadline_ms = None;

        // Duration comes from the current settings, not the elapsed time.
        let duration = self.settings.phase_seconds(ended);
        let record = SessionRecord::completed(ended, &self.intent, duration, self.now_utc());

        let completed_focus_count = match ended {
            PhaseType::Focus => self.completed_focus_count + 1,
            PhaseType::ShortBreak | PhaseType::LongBreak => self.completed_focus_count,
        };
        let next_phase = self.phase_after(ended, completed_focus_count);

        info!(
            phase = ended.as_str(),
            duration,
            next = next_phase.as_str(),
            "session completed"
        );
        self.emit(TimerEvent::SessionCompleted {
            record: record.clone(),
            next_phase,
        });

        self.completed_focus_count = completed_focus_count;
        if ended.is_break() {
            self.intent.clear();
        }
        self.phase = next_phase;
        self.time_left = self.settings.phase_seconds(next_phase);

        record
    }

    fn phase_after(&self, ended: PhaseType, completed_focus_count: u32) -> PhaseType {
        match ended {
            PhaseType::Focus => {
                if completed_focus_count % self.settings.sessions_until_long_break == 0 {
                    PhaseType::LongBreak
                } else {
                    PhaseType::ShortBreak
                }
            }
            PhaseType::ShortBreak | PhaseType::LongBreak => PhaseType::Focus,
        }
    }

    fn now_utc(&self) -> DateTime<Utc> {
        i64::try_from(self.clock.now_ms())
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now)
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("timer event receiver dropped; event discarded");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
