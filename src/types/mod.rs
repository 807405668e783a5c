//! Core data types for the focus timer.
//!
//! This module defines the data structures used for:
//! - Timer phases and run status
//! - User settings with validation
//! - Completed session records
//! - IPC request/response serialization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// PhaseType
// ============================================================================

/// A timed interval type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhaseType {
    /// Focused work
    Focus,
    /// Short break between focus sessions
    ShortBreak,
    /// Long break at the end of a cycle
    LongBreak,
}

impl PhaseType {
    /// Returns the wire representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseType::Focus => "focus",
            PhaseType::ShortBreak => "shortBreak",
            PhaseType::LongBreak => "longBreak",
        }
    }

    /// Returns the human-readable label of the phase.
    pub fn label(&self) -> &'static str {
        match self {
            PhaseType::Focus => "Focus Session",
            PhaseType::ShortBreak => "Short Break",
            PhaseType::LongBreak => "Long Break",
        }
    }

    /// Returns true for both break kinds.
    pub fn is_break(&self) -> bool {
        !matches!(self, PhaseType::Focus)
    }
}

impl Default for PhaseType {
    fn default() -> Self {
        PhaseType::Focus
    }
}

// ============================================================================
// TimerStatus
// ============================================================================

/// Run status of the timer, orthogonal to the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// Waiting for `start`
    Idle,
    /// Counting down towards the deadline
    Running,
    /// Countdown frozen
    Paused,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        }
    }
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Upper bound for the focus duration in minutes.
pub const MAX_FOCUS_MINUTES: u32 = 120;
/// Upper bound for the short break duration in minutes.
pub const MAX_SHORT_BREAK_MINUTES: u32 = 30;
/// Upper bound for the long break duration in minutes.
pub const MAX_LONG_BREAK_MINUTES: u32 = 60;
/// Upper bound for the number of focus sessions per cycle.
pub const MAX_SESSIONS_UNTIL_LONG_BREAK: u32 = 10;

fn default_focus_minutes() -> u32 {
    25
}

fn default_short_break_minutes() -> u32 {
    5
}

fn default_long_break_minutes() -> u32 {
    15
}

fn default_sessions_until_long_break() -> u32 {
    4
}

/// Settings validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A field is outside its allowed range
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        /// Field name as shown to the user
        field: &'static str,
        /// Offending value
        value: u32,
        /// Inclusive lower bound
        min: u32,
        /// Inclusive upper bound
        max: u32,
    },
}

/// User-tunable durations and cycle length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Focus duration in minutes (1-120)
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    /// Short break duration in minutes (1-30)
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    /// Long break duration in minutes (1-60)
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Focus sessions before a long break (1-10)
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sessions_until_long_break: default_sessions_until_long_break(),
        }
    }
}

impl Settings {
    /// Sets the focus duration.
    pub fn with_focus_minutes(mut self, minutes: u32) -> Self {
        self.focus_minutes = minutes;
        self
    }

    /// Sets the short break duration.
    pub fn with_short_break_minutes(mut self, minutes: u32) -> Self {
        self.short_break_minutes = minutes;
        self
    }

    /// Sets the long break duration.
    pub fn with_long_break_minutes(mut self, minutes: u32) -> Self {
        self.long_break_minutes = minutes;
        self
    }

    /// Sets the cycle length.
    pub fn with_sessions_until_long_break(mut self, sessions: u32) -> Self {
        self.sessions_until_long_break = sessions;
        self
    }

    /// Nominal duration of `phase` in seconds.
    pub fn phase_seconds(&self, phase: PhaseType) -> u32 {
        let minutes = match phase {
            PhaseType::Focus => self.focus_minutes,
            PhaseType::ShortBreak => self.short_break_minutes,
            PhaseType::LongBreak => self.long_break_minutes,
        };
        minutes.saturating_mul(60)
    }

    /// Validates every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first field found out of range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range("focus minutes", self.focus_minutes, MAX_FOCUS_MINUTES)?;
        check_range(
            "short break minutes",
            self.short_break_minutes,
            MAX_SHORT_BREAK_MINUTES,
        )?;
        check_range(
            "long break minutes",
            self.long_break_minutes,
            MAX_LONG_BREAK_MINUTES,
        )?;
        check_range(
            "sessions until long break",
            self.sessions_until_long_break,
            MAX_SESSIONS_UNTIL_LONG_BREAK,
        )?;
        Ok(())
    }

    /// Returns a copy with every field raised to at least 1.
    ///
    /// The engine relies on this to never divide by a zero cycle length.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            focus_minutes: self.focus_minutes.max(1),
            short_break_minutes: self.short_break_minutes.max(1),
            long_break_minutes: self.long_break_minutes.max(1),
            sessions_until_long_break: self.sessions_until_long_break.max(1),
        }
    }
}

fn check_range(field: &'static str, value: u32, max: u32) -> Result<(), SettingsError> {
    if value < 1 || value > max {
        return Err(SettingsError::OutOfRange {
            field,
            value,
            min: 1,
            max,
        });
    }
    Ok(())
}

// ============================================================================
// SessionRecord
// ============================================================================

/// Intent recorded for a focus session completed without one.
pub const DEFAULT_FOCUS_INTENT: &str = "Focused work";

/// Intent recorded for every break.
pub const BREAK_INTENT: &str = "Break";

/// Immutable record of a completed interval.
///
/// Field names on the wire match the history export format
/// (`duration`, `completedAt`, `type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique identifier
    pub id: String,
    /// What the session was about
    pub intent: String,
    /// Nominal duration of the phase in seconds
    #[serde(rename = "duration")]
    pub duration_seconds: u32,
    /// Completion timestamp
    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<Utc>,
    /// Phase that ended
    #[serde(rename = "type")]
    pub phase_type: PhaseType,
}

impl SessionRecord {
    /// Builds a record for a phase that just ended.
    ///
    /// Focus sessions keep `intent` as typed, or the default when it is
    /// empty; breaks are always recorded as [`BREAK_INTENT`].
    pub fn completed(
        phase_type: PhaseType,
        intent: &str,
        duration_seconds: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let intent = match phase_type {
            PhaseType::Focus if intent.is_empty() => DEFAULT_FOCUS_INTENT.to_string(),
            PhaseType::Focus => intent.to_string(),
            PhaseType::ShortBreak | PhaseType::LongBreak => BREAK_INTENT.to_string(),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            intent,
            duration_seconds,
            completed_at,
            phase_type,
        }
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Point-in-time view of the timer engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Run status
    pub status: TimerStatus,
    /// Current phase
    pub phase: PhaseType,
    /// Remaining seconds in the current phase
    pub remaining_seconds: u32,
    /// Focus phases completed since the engine was created
    pub completed_focus_count: u32,
    /// Current intent text
    pub intent: String,
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start or resume the countdown
    Start {
        /// Intent to set before starting
        #[serde(skip_serializing_if = "Option::is_none")]
        intent: Option<String>,
    },
    /// Pause the running countdown
    Pause,
    /// Cancel the current phase without recording it
    Stop,
    /// Complete the running phase immediately
    Skip,
    /// Replace the intent text
    Intent {
        /// New intent text
        text: String,
    },
    /// Replace the settings
    Settings {
        /// New settings
        settings: Settings,
    },
    /// Query the current status
    Status,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Run status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Current phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseType>,
    /// Remaining seconds
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    /// Completed focus sessions in this daemon's lifetime
    #[serde(
        rename = "completedFocusCount",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_focus_count: Option<u32>,
    /// Current intent text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl ResponseData {
    /// Creates response data from an engine snapshot.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        Self {
            state: Some(snapshot.status.as_str().to_string()),
            phase: Some(snapshot.phase),
            remaining_seconds: Some(snapshot.remaining_seconds),
            completed_focus_count: Some(snapshot.completed_focus_count),
            intent: (!snapshot.intent.is_empty()).then(|| snapshot.intent.clone()),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for error responses.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

// ============================================================================
// Tests
// ============================================================================
