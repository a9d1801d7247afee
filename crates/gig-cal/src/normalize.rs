//! Date normalization: start/end markers → absolute instants.
//!
//! An all-day `date` is anchored at midnight in the viewer zone. A `dateTime`
//! is taken at face value; its `timeZone` is kept for recurrence evaluation
//! and display.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::error::{ExpandError, Result};
use crate::model::{EventTime, RawEvent};
use crate::temporal::{parse_date, parse_date_time, parse_timezone, to_iso_millis, ViewerZone};

/// An event with canonical start and end instants.
///
/// Every occurrence is its own owned value; materialization builds new ones
/// by value rather than sharing the base record.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub raw: RawEvent,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// The event's own zone, when its start is a `dateTime` that names one.
    pub zone: Option<Tz>,
}

impl NormalizedEvent {
    pub fn id(&self) -> &str {
        &self.raw.id
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn start_iso(&self) -> String {
        to_iso_millis(&self.start)
    }

    pub fn end_iso(&self) -> String {
        to_iso_millis(&self.end)
    }
}

/// The start instant of `event`, without normalizing the rest of it.
///
/// # Errors
///
/// Returns [`ExpandError::InvalidEventSchema`] when the start marker is
/// missing, ambiguous or unparsable.
pub fn start_instant(event: &RawEvent, viewer: &ViewerZone) -> Result<DateTime<Utc>> {
    resolve_marker(&event.id, &event.start, "start", viewer).map(|(instant, _)| instant)
}

/// Normalize one event.
///
/// An event without `end` lasts zero time.
///
/// # Errors
///
/// Returns [`ExpandError::InvalidEventSchema`] for a bad start or end marker,
/// an unknown `timeZone`, or an end before the start.
pub fn normalize_event(event: &RawEvent, viewer: &ViewerZone) -> Result<NormalizedEvent> {
    let (start, zone) = resolve_marker(&event.id, &event.start, "start", viewer)?;
    let end = match &event.end {
        Some(marker) => resolve_marker(&event.id, marker, "end", viewer)?.0,
        None => start,
    };
    if end < start {
        return Err(ExpandError::schema(
            &event.id,
            format!(
                "end {} is before start {}",
                to_iso_millis(&end),
                to_iso_millis(&start)
            ),
        ));
    }

    tracing::trace!(event_id = %event.id, start = %start, end = %end, "Normalized event");
    Ok(NormalizedEvent {
        raw: event.clone(),
        start,
        end,
        zone,
    })
}

fn resolve_marker(
    event_id: &str,
    marker: &EventTime,
    field: &str,
    viewer: &ViewerZone,
) -> Result<(DateTime<Utc>, Option<Tz>)> {
    match (&marker.date, &marker.date_time) {
        (Some(_), Some(_)) => Err(ExpandError::schema(
            event_id,
            format!("{field} has both date and dateTime"),
        )),
        (None, None) => Err(ExpandError::schema(
            event_id,
            format!("{field} has neither date nor dateTime"),
        )),
        (Some(date), None) => {
            let day = parse_date(date).ok_or_else(|| {
                ExpandError::schema(event_id, format!("{field}.date '{date}' is not YYYY-MM-DD"))
            })?;
            let midnight = viewer.midnight(day).ok_or_else(|| {
                ExpandError::schema(event_id, format!("{field}.date '{date}' has no local midnight"))
            })?;
            Ok((midnight, None))
        }
        (None, Some(date_time)) => {
            let zone = marker
                .time_zone
                .as_deref()
                .map(parse_timezone)
                .transpose()
                .map_err(|e| ExpandError::schema(event_id, format!("{field}.timeZone: {e}")))?;
            let instant = parse_date_time(date_time, zone.as_ref()).ok_or_else(|| {
                ExpandError::schema(
                    event_id,
                    format!("{field}.dateTime '{date_time}' is not a valid timestamp"),
                )
            })?;
            Ok((instant, zone))
        }
    }
}
