//! Session completion notifications.
//!
//! Delivery is best-effort: the daemon's event dispatcher calls a
//! [`NotificationPort`] after each completed session and only logs
//! failures. Backends:
//!
//! - [`LogNotifier`]: writes the notification to the tracing log
//! - [`CommandNotifier`]: launches an external program such as
//!   `notify-send` or `terminal-notifier` with the title and body
//! - [`MockNotifier`]: records notifications for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use focus_timer::notification::{create_session_complete_content, CommandNotifier, NotificationPort};
//! # fn example(record: &focus_timer::types::SessionRecord) -> Result<(), Box<dyn std::error::Error>> {
//! let notifier = CommandNotifier::parse("notify-send --app-name=focus-timer").expect("non-empty command");
//! notifier.notify(&create_session_complete_content(record))?;
//! # Ok(())
//! # }
//! ```

mod content;
pub mod error;

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use tracing::{debug, info, warn};

pub use self::content::{
    create_session_complete_content, validate_intent, NotificationContent,
    NotificationContentBuilder, BREAK_COMPLETE_BODY, FOCUS_COMPLETE_BODY, SESSION_COMPLETE_TITLE,
};
pub use self::error::NotificationError;

/// Best-effort user alert.
pub trait NotificationPort: Send + Sync {
    /// Delivers a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be handed off.
    fn notify(&self, content: &NotificationContent) -> Result<(), NotificationError>;

    /// Returns true if the backend can deliver notifications.
    ///
    /// The daemon checks this once at startup and warns when it is false.
    fn is_available(&self) -> bool;
}

impl<T: NotificationPort + ?Sized> NotificationPort for Box<T> {
    fn notify(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        (**self).notify(content)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

// ============================================================================
// LogNotifier
// ============================================================================

/// Notifier that writes to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationPort for LogNotifier {
    fn notify(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        info!(
            title = %content.title,
            subtitle = content.subtitle.as_deref().unwrap_or(""),
            "{}",
            content.body
        );
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

// ============================================================================
// CommandNotifier
// ============================================================================

/// Notifier that launches an external program.
///
/// The program receives its configured arguments followed by the title and
/// the message (subtitle and body on separate lines). The child is not
/// awaited; its exit status is logged from a reaper thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Creates a notifier for `program` with extra leading arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parses a whitespace-separated command line.
    ///
    /// Returns `None` for a blank command.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    /// Program that will be launched.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for `content`.
    pub fn arguments(&self, content: &NotificationContent) -> Vec<String> {
        let message = match &content.subtitle {
            Some(subtitle) => format!("{}\n{}", subtitle, content.body),
            None => content.body.clone(),
        };

        let mut args = self.args.clone();
        args.push(content.title.clone());
        args.push(message);
        args
    }
}

impl NotificationPort for CommandNotifier {
    fn notify(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        let mut child = Command::new(&self.program)
            .args(self.arguments(content))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| NotificationError::LaunchFailed {
                program: self.program.clone(),
                source,
            })?;

        debug!(program = %self.program, "notifier launched");

        let program = self.program.clone();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(
                "{}",
                NotificationError::CommandFailed {
                    program,
                    status: status.to_string(),
                }
            ),
            Err(e) => warn!("failed to wait for notifier '{}': {}", program, e),
        });

        Ok(())
    }

    /// True when the program is an existing file, or is found on `PATH`.
    fn is_available(&self) -> bool {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file();
        }

        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
            .unwrap_or(false)
    }
}

// ============================================================================
// MockNotifier
// ============================================================================

#[derive(Debug)]
pub struct MockNotifier {
    notifications: Mutex<Vec<NotificationContent>>,
    available: std::sync::atomic::AtomicBool,
    should_fail: std::sync::atomic::AtomicBool,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            available: std::sync::atomic::AtomicBool::new(true),
            should_fail: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available
            .store(available, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail
            .store(should_fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn get_notifications(&self) -> Vec<NotificationContent> {
        self.notifications.lock().unwrap().clone()
    }

    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

impl NotificationPort for MockNotifier {
    fn notify(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        if self.should_fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        self.notifications.lock().unwrap().push(content.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(std::sync::atomic::Ordering::SeqCst)
    }
}
