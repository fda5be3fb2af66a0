//! The bounded alert feed.
//!
//! Holds at most `FEED_CAPACITY` entries, most recent first. Entries are
//! never edited and never expire by age; the oldest is evicted when a new
//! one would exceed the bound.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::thresholds::AlertKind;

pub const FEED_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEntry {
    pub raised_at: DateTime<Utc>,
    pub kind: AlertKind,
    pub message: String,
}

impl AlertEntry {
    pub fn new(raised_at: DateTime<Utc>, kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            raised_at,
            kind,
            message: message.into(),
        }
    }

    /// Wall-clock time of creation, `HH:MM:SS`.
    pub fn time_label(&self) -> String {
        self.raised_at.format("%H:%M:%S").to_string()
    }

    /// Feed line with the label wrapped in an inline-styled span.
    pub fn markup(&self) -> String {
        format!(
            "{} <b style=\"color:{}\">{}</b> {}",
            self.time_label(),
            self.kind.color(),
            self.kind.label(),
            self.message
        )
    }

    /// Same line without styling, for terminals and logs.
    pub fn plain(&self) -> String {
        format!("{} {}: {}", self.time_label(), self.kind.label(), self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertFeed {
    entries: VecDeque<AlertEntry>,
}

impl AlertFeed {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(FEED_CAPACITY + 1),
        }
    }

    /// Prepends `entry`, evicting the oldest beyond capacity. Returns the
    /// evicted entry, if any.
    pub fn push(&mut self, entry: AlertEntry) -> Option<AlertEntry> {
        self.entries.push_front(entry);
        if self.entries.len() > FEED_CAPACITY {
            self.entries.pop_back()
        } else {
            None
        }
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &AlertEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&AlertEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
