#[cfg(test)]
#[path = "notifications_test.rs"]
mod tests;

use std::time::Duration;
use std::time::Instant;

use crate::domain::models::Notification;
use crate::domain::models::NotificationKind;

pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(3000);

/// Transient status messages. Notices are kept in insertion order, are never
/// deduplicated, and expire on `tick` unless shown with a zero duration.
pub struct NotificationService {
    default_duration: Duration,
    next_id: u64,
    notifications: Vec<Notification>,
}

impl NotificationService {
    pub fn new(default_duration: Duration) -> NotificationService {
        return NotificationService {
            default_duration,
            next_id: 1,
            notifications: vec![],
        };
    }

    /// Shows a notice for the configured default duration.
    pub fn notify(&mut self, message: &str, kind: NotificationKind) -> u64 {
        return self.show(message, kind, self.default_duration);
    }

    pub fn show(&mut self, message: &str, kind: NotificationKind, duration: Duration) -> u64 {
        let mut expires_at = None;
        if !duration.is_zero() {
            expires_at = Some(Instant::now() + duration);
        }

        let id = self.next_id;
        self.next_id += 1;

        tracing::debug!(id = id, kind = kind.to_string(), message = message, "notification");
        self.notifications.push(Notification {
            id,
            message: message.to_string(),
            kind,
            expires_at,
        });

        return id;
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let len = self.notifications.len();
        self.notifications.retain(|notice| return notice.id != id);
        return self.notifications.len() != len;
    }

    pub fn dismiss_latest(&mut self) -> bool {
        let latest = self.notifications.last().map(|notice| return notice.id);
        match latest {
            Some(id) => return self.dismiss(id),
            None => return false,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.notifications.retain(|notice| return !notice.is_expired(now));
    }

    pub fn list(&self) -> &[Notification] {
        return &self.notifications;
    }
}
