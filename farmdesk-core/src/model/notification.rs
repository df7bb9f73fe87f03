//! ``src/model/notification.rs``
//! ============================================================================
//! # Notifications: short-lived outcome messages
//!
//! `NotificationSink` is the fire-and-forget interface the controller talks
//! to. `NotificationCenter` is the in-process implementation: a bounded queue
//! whose entries carry their own auto-dismiss deadline.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::NotificationConfig;

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum NotificationLevel {
    Info = 0,
    Success = 1,
    Warning = 2,
    Error = 3,
}

/// Compact notification with timestamp
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: CompactString,
    pub description: Option<CompactString>,
    pub timestamp: Instant,
    pub auto_dismiss: Option<Duration>,
}

impl Notification {
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.auto_dismiss
            .is_some_and(|ttl| now.saturating_duration_since(self.timestamp) > ttl)
    }
}

/// Receiver of user-visible outcome messages. Delivery is fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, level: NotificationLevel, title: &str, description: Option<&str>);

    #[inline]
    fn notify_success(&self, title: &str, description: Option<&str>) {
        self.notify(NotificationLevel::Success, title, description);
    }

    #[inline]
    fn notify_error(&self, title: &str, description: Option<&str>) {
        self.notify(NotificationLevel::Error, title, description);
    }

    #[inline]
    fn notify_warning(&self, title: &str, description: Option<&str>) {
        self.notify(NotificationLevel::Warning, title, description);
    }

    #[inline]
    fn notify_info(&self, title: &str, description: Option<&str>) {
        self.notify(NotificationLevel::Info, title, description);
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for Arc<S> {
    fn notify(&self, level: NotificationLevel, title: &str, description: Option<&str>) {
        (**self).notify(level, title, description);
    }
}

/// In-process notification queue. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    inner: Arc<Mutex<VecDeque<Notification>>>,
    config: NotificationConfig,
}

impl NotificationCenter {
    #[must_use]
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(config.max_visible))),
            config,
        }
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        // A poisoned queue only holds display messages; keep using it
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Currently queued notifications, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.queue().iter().cloned().collect()
    }

    /// Remove and return everything queued.
    pub fn drain(&self) -> Vec<Notification> {
        self.queue().drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    /// Drop notifications past their auto-dismiss deadline. Returns true if
    /// anything was removed.
    pub fn expire(&self, now: Instant) -> bool {
        let mut queue = self.queue();
        let before = queue.len();
        queue.retain(|n| !n.is_expired(now));
        queue.len() != before
    }

    /// Dismiss the oldest notification.
    pub fn dismiss_oldest(&self) -> Option<Notification> {
        self.queue().pop_front()
    }
}

impl NotificationSink for NotificationCenter {
    fn notify(&self, level: NotificationLevel, title: &str, description: Option<&str>) {
        match level {
            NotificationLevel::Error | NotificationLevel::Warning => {
                warn!(?level, title, description, "notification");
            }
            NotificationLevel::Info | NotificationLevel::Success => {
                info!(?level, title, description, "notification");
            }
        }

        let notification = Notification {
            level,
            title: CompactString::from(title),
            description: description.map(CompactString::from),
            timestamp: Instant::now(),
            auto_dismiss: self.config.auto_dismiss(level),
        };

        let mut queue = self.queue();
        while queue.len() >= self.config.max_visible.max(1) {
            queue.pop_front();
        }
        queue.push_back(notification);
    }
}
