//! Input and output records.
//!
//! [`EventCollection`] and [`RawEvent`] mirror the provider's JSON feed;
//! [`Occurrence`] is the public output shape. Everything in between lives in
//! the stage modules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A calendar feed: the raw event list plus provider metadata we ignore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventCollection {
    #[serde(default)]
    pub items: Vec<RawEvent>,
}

/// One event as supplied by the calendar source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub id: String,
    /// Set only on an individually modified instance of a recurring series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    /// Recurrence lines (`RRULE:...`). Only the first is evaluated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
    /// Provider fields with no meaning to the pipeline.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEvent {
    pub fn is_recurring(&self) -> bool {
        !self.recurrence.is_empty()
    }

    pub fn is_override(&self) -> bool {
        self.recurring_event_id.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}

/// A start or end marker: either an all-day `date` or a `dateTime`.
///
/// Both fields are optional on the wire so that a record missing them can be
/// reported as a schema error for that record alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    pub fn timed(date_time: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            date: None,
            date_time: Some(date_time.into()),
            time_zone: Some(time_zone.into()),
        }
    }
}

/// One concrete occurrence, as handed to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// ISO-8601 UTC, millisecond precision.
    pub start: String,
    /// ISO-8601 UTC, millisecond precision.
    pub end: String,
    pub start_as_display_string: String,
    pub urls: Vec<String>,
    pub images: Vec<String>,
}
