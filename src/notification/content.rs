//! Notification content construction.
//!
//! This module provides a builder for notification content and the
//! messages shown when a session completes.

use crate::types::{PhaseType, SessionRecord};

/// Maximum length for intents shown in notifications.
const MAX_INTENT_LENGTH: usize = 100;

/// Title used for every completion notification.
pub const SESSION_COMPLETE_TITLE: &str = "Session Complete";

/// Body shown after a focus session.
pub const FOCUS_COMPLETE_BODY: &str = "Great job! Time for a break.";

/// Body shown after a break.
pub const BREAK_COMPLETE_BODY: &str = "Break is over. Ready to focus?";

/// Text of a user-facing notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationContent {
    /// Headline
    pub title: String,
    /// Optional secondary line
    pub subtitle: Option<String>,
    /// Message text
    pub body: String,
}

/// Builder for constructing notification content.
#[derive(Debug, Default)]
pub struct NotificationContentBuilder {
    content: NotificationContent,
}

impl NotificationContentBuilder {
    /// Creates a new notification content builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the notification title.
    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.content.title = title.to_string();
        self
    }

    /// Sets the notification subtitle.
    #[must_use]
    pub fn subtitle(mut self, subtitle: &str) -> Self {
        self.content.subtitle = Some(subtitle.to_string());
        self
    }

    /// Sets the notification body text.
    #[must_use]
    pub fn body(mut self, body: &str) -> Self {
        self.content.body = body.to_string();
        self
    }

    /// Builds and returns the notification content.
    #[must_use]
    pub fn build(self) -> NotificationContent {
        self.content
    }
}

/// Sanitizes an intent for display in a notification.
///
/// Returns `None` if nothing printable remains.
pub fn validate_intent(intent: &str) -> Option<String> {
    let sanitized: String = intent
        .chars()
        .take(MAX_INTENT_LENGTH)
        .filter(|c| !c.is_control())
        .collect();

    if sanitized.trim().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Creates the notification for a completed session.
///
/// Focus sessions carry their intent as the subtitle.
#[must_use]
pub fn create_session_complete_content(record: &SessionRecord) -> NotificationContent {
    let builder = NotificationContentBuilder::new().title(SESSION_COMPLETE_TITLE);

    match record.phase_type {
        PhaseType::Focus => {
            let builder = builder.body(FOCUS_COMPLETE_BODY);
            match validate_intent(&record.intent) {
                Some(intent) => builder.subtitle(&intent).build(),
                None => builder.build(),
            }
        }
        PhaseType::ShortBreak | PhaseType::LongBreak => builder.body(BREAK_COMPLETE_BODY).build(),
    }
}
