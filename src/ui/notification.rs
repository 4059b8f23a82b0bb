use chrono::{DateTime, Local};
use std::fmt;
use std::time::Duration;

use crate::common::config::AppConfig;

/// A user-visible message, e.g. "Settings are not available in smi mode".
#[derive(Clone, Debug)]
pub struct Notification {
    pub title: String,
    /// Optional second line with a hint for the user
    pub body: Option<String>,
    pub created_at: DateTime<Local>,
    pub duration_seconds: u64,
    pub notification_type: NotificationType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationType {
    Info,
    Warning,
    Error,
}

impl Notification {
    pub fn new(title: String, body: Option<String>, notification_type: NotificationType) -> Self {
        Self {
            title,
            body,
            created_at: Local::now(),
            duration_seconds: AppConfig::NOTIFICATION_DURATION_SECS,
            notification_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        let elapsed = Local::now()
            .signed_duration_since(self.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0));

        elapsed >= Duration::from_secs(self.duration_seconds)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Some(body) => write!(f, "{}: {}", self.title, body),
            None => f.write_str(&self.title),
        }
    }
}

/// Holds the one notification currently shown to the user.
#[derive(Clone, Debug, Default)]
pub struct NotificationManager {
    pub current_notification: Option<Notification>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            current_notification: None,
        }
    }

    pub fn show(&mut self, title: String, body: Option<String>, notification_type: NotificationType) {
        self.current_notification = Some(Notification::new(title, body, notification_type));
    }

    pub fn clear(&mut self) {
        self.current_notification = None;
    }

    /// Drop the current notification once it has been shown long enough.
    pub fn update(&mut self) {
        if let Some(notification) = &self.current_notification {
            if notification.is_expired() {
                self.current_notification = None;
            }
        }
    }

    /// Hand the current notification to the display layer, leaving none.
    pub fn take(&mut self) -> Option<Notification> {
        self.current_notification.take()
    }

    pub fn get_current_message(&self) -> Option<&str> {
        self.current_notification
            .as_ref()
            .map(|n| n.title.as_str())
    }

    pub fn get_current_notification(&self) -> Option<&Notification> {
        self.current_notification.as_ref()
    }

    pub fn has_notification(&self) -> bool {
        self.current_notification.is_some()
    }
}

// Helper functions for common notification types
impl NotificationManager {
    pub fn info(&mut self, message: String) {
        self.show(message, None, NotificationType::Info);
    }

    pub fn warning(&mut self, message: String) {
        self.show(message, None, NotificationType::Warning);
    }

    pub fn error(&mut self, message: String) {
        self.show(message, None, NotificationType::Error);
    }

    pub fn error_with_body(&mut self, title: String, body: String) {
        self.show(title, Some(body), NotificationType::Error);
    }
}
