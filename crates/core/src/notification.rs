//! Transient notifications emitted by the session cores.
//!
//! Cores publish [`Notification`]s; a rendering collaborator keeps them on a
//! [`NotificationBoard`], which drops each one after a fixed time-to-live or
//! when the user dismisses it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_NOTIFICATION_TTL_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Error => write!(f, "ERROR"),
            NotificationKind::Warning => write!(f, "WARNING"),
            NotificationKind::Info => write!(f, "INFO"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    /// Optional illustrative image reference.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            image: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    #[must_use]
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    /// Returns true once `ttl` has elapsed since creation.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at >= ttl
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Collaborator-side list of visible notifications.
#[derive(Debug, Clone)]
pub struct NotificationBoard {
    ttl: Duration,
    next_id: u64,
    entries: Vec<(u64, Notification)>,
}

impl NotificationBoard {
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(i64::from(u32::try_from(ttl_secs).unwrap_or(u32::MAX))),
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Adds a notification and returns its handle for explicit dismissal.
    pub fn push(&mut self, notification: Notification) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, notification));
        id
    }

    /// Removes a notification on user request. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Drops every notification whose time-to-live has elapsed at `now`.
    ///
    /// Returns the number of notifications removed.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|(_, n)| !n.is_expired(now, ttl));
        before - self.entries.len()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter().map(|(_, n)| n)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NotificationBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL_SECS)
    }
}
