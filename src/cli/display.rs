//! Display utilities for the focus timer CLI.
//!
//! This module provides formatted output for:
//! - Command results
//! - Status display
//! - Settings, history and stats

use chrono::Local;

use crate::analytics::{format_duration, session_minutes, Summary};
use crate::types::{IpcResponse, ResponseData, SessionRecord, Settings};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Prints the daemon's message followed by the timer line.
    pub fn show_command_success(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("{}", response.message);
        }
        if let Some(data) = &response.data {
            println!("  {}", Self::render_timer_line(data));
        }
    }

    /// Prints the current timer status.
    pub fn show_status(response: &IpcResponse) {
        match &response.data {
            Some(data) => println!("{}", Self::render_status(data)),
            None => println!("No status available"),
        }
    }

    pub fn show_settings(settings: &Settings) {
        println!("{}", Self::render_settings(settings));
    }

    pub fn show_history(records: &[&SessionRecord]) {
        println!("{}", Self::render_history(records));
    }

    pub fn show_stats(summary: &Summary) {
        println!("{}", Self::render_stats(summary));
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Formats seconds as zero-padded `MM:SS`.
    ///
    /// Minutes are not wrapped, so 120 minutes reads `120:00`.
    pub fn format_time(total_seconds: u32) -> String {
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    fn render_timer_line(data: &ResponseData) -> String {
        let phase = data.phase.map(|p| p.label()).unwrap_or("Timer");
        let remaining = data.remaining_seconds.unwrap_or(0);
        format!("{} {}", phase, Self::format_time(remaining))
    }

    fn render_status(data: &ResponseData) -> String {
        let state = data.state.as_deref().unwrap_or("unknown");
        let state_display = match state {
            "idle" => "Idle",
            "running" => "Running",
            "paused" => "Paused",
            _ => state,
        };

        let mut lines = vec![
            "Focus Timer Status".to_string(),
            "──────────────────".to_string(),
            format!("State:     {}", state_display),
            format!("Phase:     {}", data.phase.map(|p| p.label()).unwrap_or("-")),
            format!(
                "Remaining: {}",
                Self::format_time(data.remaining_seconds.unwrap_or(0))
            ),
        ];
        if let Some(count) = data.completed_focus_count {
            lines.push(format!("Completed: {}", count));
        }
        if let Some(intent) = &data.intent {
            lines.push(format!("Intent:    {}", intent));
        }
        lines.join("\n")
    }

    fn render_settings(settings: &Settings) -> String {
        [
            format!("Focus:                 {} min", settings.focus_minutes),
            format!("Short break:           {} min", settings.short_break_minutes),
            format!("Long break:            {} min", settings.long_break_minutes),
            format!(
                "Sessions before long:  {}",
                settings.sessions_until_long_break
            ),
        ]
        .join("\n")
    }

    fn render_history(records: &[&SessionRecord]) -> String {
        if records.is_empty() {
            return "No focus sessions yet".to_string();
        }

        records
            .iter()
            .map(|record| {
                format!(
                    "{}  {:>3} min  {}",
                    record
                        .completed_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M"),
                    session_minutes(record.duration_seconds),
                    record.intent
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_stats(summary: &Summary) -> String {
        [
            format!(
                "Total focus time: {}",
                format_duration(summary.total_focus_seconds)
            ),
            format!("Focus sessions:   {}", summary.focus_sessions),
            format!("Today:            {}", summary.today_sessions),
        ]
        .join("\n")
    }
}

// ============================================================================
// Tests
// ============================================================================
