//! Notification error types.

use thiserror::Error;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The notifier command could not be launched.
    #[error("Failed to launch notifier '{program}': {source}")]
    LaunchFailed {
        /// Program that failed to start
        program: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The notifier command exited unsuccessfully.
    #[error("Notifier '{program}' exited with {status}")]
    CommandFailed {
        /// Program that failed
        program: String,
        /// Exit status description
        status: String,
    },

    /// Failed to send a notification.
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
}

impl NotificationError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::LaunchFailed { .. } => {
                "Check that the notifier command is installed and on PATH"
            }
            Self::CommandFailed { .. } => "Run the notifier command by hand to see its output",
            Self::SendFailed(_) => "Retry later",
        }
    }
}
