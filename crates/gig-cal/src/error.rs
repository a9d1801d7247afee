//! Error types for gig-cal operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("Invalid recurrence rule on event '{event_id}': {reason}")]
    InvalidRecurrenceRule { event_id: String, reason: String },

    #[error("Invalid event schema on event '{event_id}': {reason}")]
    InvalidEventSchema { event_id: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl ExpandError {
    pub(crate) fn schema(event_id: &str, reason: impl Into<String>) -> Self {
        ExpandError::InvalidEventSchema {
            event_id: event_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn rule(event_id: &str, reason: impl Into<String>) -> Self {
        ExpandError::InvalidRecurrenceRule {
            event_id: event_id.to_string(),
            reason: reason.into(),
        }
    }

    /// The id of the offending record, for per-record failures.
    pub fn event_id(&self) -> Option<&str> {
        match self {
            ExpandError::InvalidRecurrenceRule { event_id, .. }
            | ExpandError::InvalidEventSchema { event_id, .. } => Some(event_id),
            ExpandError::InvalidTimezone(_) | ExpandError::InvalidOptions(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpandError>;
