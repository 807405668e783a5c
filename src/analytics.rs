//! Read-only views over the session history.
//!
//! Only focus sessions count towards the summary; breaks are recorded in
//! the store but never reported here.

use chrono::{Local, NaiveDate};

use crate::types::{PhaseType, SessionRecord};

/// Aggregate numbers shown by the `stats` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Sum of focus session durations
    pub total_focus_seconds: u64,
    /// Number of focus sessions ever completed
    pub focus_sessions: usize,
    /// Number of focus sessions completed on `today`
    pub today_sessions: usize,
}

/// Summarizes focus sessions. `today` is compared against each record's
/// completion time in the local timezone.
pub fn summarize(records: &[SessionRecord], today: NaiveDate) -> Summary {
    records
        .iter()
        .filter(|r| r.phase_type == PhaseType::Focus)
        .fold(Summary::default(), |mut summary, record| {
            summary.total_focus_seconds += u64::from(record.duration_seconds);
            summary.focus_sessions += 1;
            if record.completed_at.with_timezone(&Local).date_naive() == today {
                summary.today_sessions += 1;
            }
            summary
        })
}

/// Focus sessions, newest first.
pub fn recent_focus_sessions(records: &[SessionRecord], limit: Option<usize>) -> Vec<&SessionRecord> {
    let mut focus: Vec<&SessionRecord> = records
        .iter()
        .filter(|r| r.phase_type == PhaseType::Focus)
        .collect();
    focus.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    if let Some(limit) = limit {
        focus.truncate(limit);
    }
    focus
}

/// Formats a total as `"Xh Ym"`, or `"Ym"` under an hour.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Session length in whole minutes, rounded to nearest.
pub fn session_minutes(duration_seconds: u32) -> u32 {
    duration_seconds.saturating_add(30) / 60
}
