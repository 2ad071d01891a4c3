//! Advisories and alerts raised by a session
//!
//! Advisories and confirmations fade after a while. Alerts stay until the
//! user dismisses them, and only the latest alert is kept.

use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Something the user should hear about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The payload was valid but carried no pages
    EmptyContent,
    /// Export was attempted on a page whose binary has not arrived
    ExportUnavailable { page: u32 },
    ExportFailed { detail: String },
    ExportSaved { file_name: String },
    EditSaved { element_id: String },
}

impl Notice {
    #[must_use]
    pub fn level(&self) -> NotificationLevel {
        match self {
            Notice::EmptyContent => NotificationLevel::Warning,
            Notice::ExportUnavailable { .. } | Notice::ExportFailed { .. } => {
                NotificationLevel::Error
            }
            Notice::ExportSaved { .. } | Notice::EditSaved { .. } => NotificationLevel::Info,
        }
    }

    /// Alerts need an explicit dismissal
    #[must_use]
    pub fn is_alert(&self) -> bool {
        self.level() == NotificationLevel::Error
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Notice::EmptyContent => "This document has no extractable pages yet.".to_string(),
            Notice::ExportUnavailable { page } => {
                format!("Page {page} cannot be downloaded yet: its file has not been loaded.")
            }
            Notice::ExportFailed { detail } => format!("Download failed: {detail}"),
            Notice::ExportSaved { file_name } => format!("Saved {file_name}"),
            Notice::EditSaved { .. } => "Edit saved".to_string(),
        }
    }
}

/// A raised notice with its display data
#[derive(Debug, Clone)]
pub struct Notification {
    pub notice: Notice,
    pub level: NotificationLevel,
    pub message: String,
    pub raised_at: Instant,
    /// `None` for alerts
    pub expires_at: Option<Instant>,
}

impl Notification {
    fn new(notice: Notice, lifetime: Duration) -> Self {
        let raised_at = Instant::now();
        Self {
            level: notice.level(),
            message: notice.message(),
            expires_at: (!notice.is_alert()).then(|| raised_at + lifetime),
            raised_at,
            notice,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Newest-first notices of the open document
#[derive(Debug, Default)]
pub struct NotificationManager {
    notifications: Vec<Notification>,
    lifetime: Duration,
    /// Notices already raised once for this document
    raised_once: Vec<Notice>,
}

impl NotificationManager {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            notifications: Vec::new(),
            lifetime,
            raised_once: Vec::new(),
        }
    }

    pub fn raise(&mut self, notice: Notice) {
        if notice.is_alert() {
            self.notifications.retain(|n| !n.notice.is_alert());
        }
        self.notifications
            .insert(0, Notification::new(notice, self.lifetime));
    }

    /// Raise `notice` unless it was already raised for this document
    pub fn raise_once(&mut self, notice: Notice) -> bool {
        if self.raised_once.contains(&notice) {
            return false;
        }
        self.raised_once.push(notice.clone());
        self.raise(notice);
        true
    }

    /// Forget everything tied to the previous document
    pub fn start_document(&mut self) {
        self.notifications.clear();
        self.raised_once.clear();
    }

    /// Drop faded notices, returns true if any were removed
    pub fn expire(&mut self) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| !n.is_expired());
        self.notifications.len() != before
    }

    pub fn current(&self) -> Option<&Notification> {
        self.notifications.first()
    }

    pub fn alert(&self) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.notice.is_alert())
    }

    pub fn dismiss_alert(&mut self) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| !n.notice.is_alert());
        self.notifications.len() != before
    }

    pub fn all(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}
