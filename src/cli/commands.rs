//! Command definitions for the focus timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::types::{
    Settings, MAX_FOCUS_MINUTES, MAX_LONG_BREAK_MINUTES, MAX_SESSIONS_UNTIL_LONG_BREAK,
    MAX_SHORT_BREAK_MINUTES,
};

/// Maximum intent length in characters.
pub const MAX_INTENT_CHARS: usize = 100;

// ============================================================================
// CLI Structure
// ============================================================================

/// Focus timer - a Pomodoro daemon and CLI
#[derive(Parser, Debug)]
#[command(
    name = "focus-timer",
    version,
    about = "Pomodoro focus timer with session history",
    long_about = "A Pomodoro focus timer.\n\
                  Run `focus-timer daemon` once, then control it with start, pause, \
                  skip and stop. Completed sessions are kept for history and stats.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the current phase, or resume it when paused
    #[command(visible_alias = "resume")]
    Start(StartArgs),

    /// Pause the running timer
    Pause,

    /// Stop and reset the current phase without recording it
    Stop,

    /// Finish the running phase now and move to the next one
    Skip,

    /// Show current timer status
    Status,

    /// Set what the current focus session is about
    Intent {
        /// Intent text (1-100 characters)
        #[arg(value_parser = validate_intent)]
        text: String,
    },

    /// Show or change timer settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// List completed focus sessions, newest first
    History {
        /// Show at most this many sessions
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show focus totals
    Stats,

    /// Run the timer daemon in the foreground
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Intent to set before starting
    #[arg(short, long, value_parser = validate_intent)]
    pub intent: Option<String>,
}

/// Arguments for the daemon command
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// Command run on session completion, receiving title and message as
    /// trailing arguments (e.g. "notify-send")
    #[arg(long)]
    pub notify_command: Option<String>,
}

// ============================================================================
// Settings Subcommands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Print the current settings
    Show,

    /// Change one or more settings
    Set(SettingsArgs),
}

/// Arguments for `settings set`
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsArgs {
    /// Focus duration in minutes (1-120)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_FOCUS_MINUTES)))]
    pub focus: Option<u32>,

    /// Short break duration in minutes (1-30)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SHORT_BREAK_MINUTES)))]
    pub short_break: Option<u32>,

    /// Long break duration in minutes (1-60)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LONG_BREAK_MINUTES)))]
    pub long_break: Option<u32>,

    /// Focus sessions before a long break (1-10)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SESSIONS_UNTIL_LONG_BREAK)))]
    pub sessions: Option<u32>,
}

impl SettingsArgs {
    /// Returns true if no field was given.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays the given fields on `base`.
    pub fn apply(&self, base: Settings) -> Settings {
        Settings {
            focus_minutes: self.focus.unwrap_or(base.focus_minutes),
            short_break_minutes: self.short_break.unwrap_or(base.short_break_minutes),
            long_break_minutes: self.long_break.unwrap_or(base.long_break_minutes),
            sessions_until_long_break: self.sessions.unwrap_or(base.sessions_until_long_break),
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates an intent.
///
/// - Must not be blank
/// - Must not exceed 100 characters
fn validate_intent(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("Intent cannot be empty".to_string());
    }
    if s.chars().count() > MAX_INTENT_CHARS {
        return Err(format!(
            "Intent must be at most {} characters",
            MAX_INTENT_CHARS
        ));
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================
