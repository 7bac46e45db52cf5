//! Per-user spacing between coaching messages.

use std::time::Duration;

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::time::Instant;

/// Ledger of when each user was last coached.
///
/// A slot is consumed at decision time, before delivery is attempted, so a
/// failed delivery still counts against the user's window.
#[derive(Debug)]
pub struct CooldownGate {
    interval: Duration,
    last_notified: DashMap<u64, Instant>,
}

impl CooldownGate {
    /// Creates a gate enforcing `interval` between notifications.
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_notified: DashMap::new() }
    }

    /// Claims the notification slot for `user_id` at `now`.
    ///
    /// Returns `true` and records `now` when the user has no record or the
    /// previous one is at least `interval` old; otherwise returns `false` and
    /// leaves the record untouched.
    pub fn try_consume(&self, user_id: u64, now: Instant) -> bool {
        match self.last_notified.entry(user_id) {
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
            Entry::Occupied(mut entry) => {
                if now.saturating_duration_since(*entry.get()) >= self.interval {
                    entry.insert(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Drops records whose window has elapsed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.last_notified.len();
        self.last_notified
            .retain(|_, last| now.saturating_duration_since(*last) < self.interval);
        before.saturating_sub(self.last_notified.len())
    }

    /// Number of users currently tracked.
    pub fn tracked_users(&self) -> usize {
        self.last_notified.len()
    }
}
