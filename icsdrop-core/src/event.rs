//! Calendar event records as produced by the feed.
//!
//! Events are read-only once parsed: every output (tooltip strings, ICS
//! documents, file names) is derived from a borrowed `CalendarEvent`.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;

/// A single event from the calendar feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// UID from the feed, if it had one
    pub uid: Option<String>,
    pub title: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Zone the start was given in (TZID, or the viewer's zone for floating
    /// and all-day values). Recurrences keep their wall-clock time in it.
    #[serde(default)]
    pub start_tz: Option<Tz>,
    /// Description as supplied by the feed (may contain HTML)
    pub description: Option<String>,
    pub recurrence: Option<RecurrenceRule>,
}

impl CalendarEvent {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        CalendarEvent {
            uid: None,
            title: Some(title.into()),
            start,
            end,
            start_tz: None,
            description: None,
            recurrence: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_start_tz(mut self, tz: Tz) -> Self {
        self.start_tz = Some(tz);
        self
    }

    pub fn with_recurrence(mut self, recurrence: RecurrenceRule) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Title, or the empty string when the feed omitted it.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Description, or the empty string when the feed omitted it.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

impl std::fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => write!(f, "{}", title),
            _ => write!(f, "(No title)"),
        }
    }
}
