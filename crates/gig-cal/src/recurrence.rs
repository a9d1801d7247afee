//! Recurrence expansion: RRULE text + start instant → occurrence instants.
//!
//! Rules are evaluated with the `rrule` crate in the event's own zone (or the
//! viewer zone for events without one) so weekday and wall-clock constraints
//! survive DST and UTC date boundaries. Instants leave this module in UTC.
//!
//! Only the first line of an event's `recurrence` is honored; EXDATE, RDATE
//! and extra RRULE lines are not supported.
//!
//! Override tracking lives in an [`OverrideIds`] value owned by a single
//! expansion call.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rrule::{RRule, RRuleSet, Unvalidated};

use crate::error::{ExpandError, Result};
use crate::model::RawEvent;
use crate::normalize::NormalizedEvent;
use crate::options::Window;
use crate::temporal::{compact_iso, first_valid_local, ViewerZone};

/// Ceiling on occurrences evaluated for one series inside the window.
pub const MAX_INSTANCES_PER_SERIES: u16 = u16::MAX;

const RRULE_PREFIX: &str = "RRULE:";

// ── Override tracking ───────────────────────────────────────────────────────

/// Ids of series members that exist as explicit override records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideIds(HashSet<String>);

impl OverrideIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the ids of every override record in `events`.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a RawEvent>) -> Self {
        let mut ids = Self::new();
        for event in events {
            if event.is_override() && !event.is_recurring() {
                ids.record(event.id.clone());
            }
        }
        ids
    }

    pub fn record(&mut self, id: impl Into<String>) {
        self.0.insert(id.into());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Rule specification ──────────────────────────────────────────────────────

/// A recurrence rule bound to its starting instant.
#[derive(Debug, Clone)]
pub struct RecurrenceSpec {
    /// Rule body after the `RRULE:` prefix, e.g. `FREQ=WEEKLY;COUNT=4;BYDAY=TU`.
    pub rule: String,
    pub dt_start: DateTime<Utc>,
    /// Zone the rule's wall-clock parts are evaluated in.
    pub zone: rrule::Tz,
}

impl RecurrenceSpec {
    /// Build the spec for `event`, or `None` if it does not recur.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidRecurrenceRule`] when the first recurrence
    /// line is not an `RRULE:` line.
    pub fn for_event(event: &NormalizedEvent, viewer: &ViewerZone) -> Result<Option<Self>> {
        let Some(line) = event.raw.recurrence.first() else {
            return Ok(None);
        };
        let rule = strip_rrule_prefix(line).ok_or_else(|| {
            ExpandError::rule(
                event.id(),
                format!("first recurrence line is not an RRULE: '{line}'"),
            )
        })?;
        let zone = match event.zone {
            Some(tz) => rrule::Tz::Tz(tz),
            None => viewer.rrule_tz(),
        };
        Ok(Some(Self {
            rule: conform_until(rule, &zone),
            dt_start: event.start,
            zone,
        }))
    }

    /// Two-line wire form: `DTSTART:<compact-ISO>` then the `RRULE:` line.
    pub fn wire(&self) -> String {
        format!(
            "DTSTART:{}\n{}{}",
            compact_iso(&self.dt_start),
            RRULE_PREFIX,
            self.rule
        )
    }

    /// Parse and validate the rule against its start.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidRecurrenceRule`] naming `event_id` when the
    /// rule text does not parse or fails validation.
    pub fn build(&self, event_id: &str) -> Result<RRuleSet> {
        let rule: RRule<Unvalidated> = self
            .rule
            .parse()
            .map_err(|e: rrule::RRuleError| ExpandError::rule(event_id, e.to_string()))?;
        rule.build(self.dt_start.with_timezone(&self.zone))
            .map_err(|e| ExpandError::rule(event_id, e.to_string()))
    }

    /// Occurrences strictly inside `window`, in ascending order.
    ///
    /// # Errors
    ///
    /// See [`RecurrenceSpec::build`].
    pub fn occurrences_in(&self, event_id: &str, window: &Window) -> Result<Vec<DateTime<Utc>>> {
        let set = self.build(event_id)?;

        // Widen by a second so the evaluator's own bound inclusivity does not
        // matter; the strict check below decides.
        let after = window
            .min
            .checked_sub_signed(Duration::seconds(1))
            .unwrap_or(window.min);
        let before = window
            .max
            .checked_add_signed(Duration::seconds(1))
            .unwrap_or(window.max);

        let result = set
            .after(after.with_timezone(&self.zone))
            .before(before.with_timezone(&self.zone))
            .all(MAX_INSTANCES_PER_SERIES);
        if result.limited {
            tracing::warn!(
                event_id = %event_id,
                limit = MAX_INSTANCES_PER_SERIES,
                "Recurrence evaluation hit its instance ceiling"
            );
        }

        Ok(result
            .dates
            .iter()
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|dt| window.strictly_contains(dt))
            .collect())
    }
}

fn strip_rrule_prefix(line: &str) -> Option<&str> {
    let line = line.trim();
    let head = line.get(..RRULE_PREFIX.len())?;
    head.eq_ignore_ascii_case(RRULE_PREFIX)
        .then(|| &line[RRULE_PREFIX.len()..])
}

/// Rewrite the `UNTIL` part of `rule` into the form the evaluator accepts
/// next to a start in `zone`: UTC for a named zone, floating wall time for
/// the process-local zone. A date-only `UNTIL` means the end of that day in
/// `zone`. Unparseable values are left for the rule parser to reject.
fn conform_until(rule: &str, zone: &rrule::Tz) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("UNTIL") => {
                match until_instant(value.trim(), zone) {
                    Some(instant) => format!("UNTIL={}", until_token(&instant, zone)),
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn until_instant(value: &str, zone: &rrule::Tz) -> Option<DateTime<Utc>> {
    if let Some(utc) = value.strip_suffix(['Z', 'z']) {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(naive.and_utc());
    }
    let naive = match NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        Ok(naive) => naive,
        Err(_) => NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()?
            .and_hms_opt(23, 59, 59)?,
    };
    first_valid_local(zone, naive)
}

fn until_token(instant: &DateTime<Utc>, zone: &rrule::Tz) -> String {
    match zone {
        rrule::Tz::Local(local) => instant
            .with_timezone(local)
            .format("%Y%m%dT%H%M%S")
            .to_string(),
        _ => compact_iso(instant),
    }
}

// ── Expansion ───────────────────────────────────────────────────────────────

/// An event after recurrence evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandedEvent {
    /// A non-recurring event or an override instance, passed through.
    Single(NormalizedEvent),
    /// A recurring event and its in-window occurrence instants.
    Series {
        base: NormalizedEvent,
        instants: Vec<DateTime<Utc>>,
    },
}

/// Occurrence instants of `event` strictly inside `window`.
///
/// Returns an empty list for events that do not recur.
///
/// # Errors
///
/// Returns [`ExpandError::InvalidRecurrenceRule`] for a malformed rule.
pub fn occurrences_in_window(
    event: &NormalizedEvent,
    window: &Window,
    viewer: &ViewerZone,
) -> Result<Vec<DateTime<Utc>>> {
    match RecurrenceSpec::for_event(event, viewer)? {
        Some(spec) => {
            tracing::trace!(event_id = %event.id(), rule = %spec.wire(), "Evaluating recurrence");
            spec.occurrences_in(event.id(), window)
        }
        None => Ok(Vec::new()),
    }
}

/// Run recurrence evaluation for one normalized event.
///
/// Override instances are recorded in `overrides` and passed through. A
/// recurring event with no occurrence in the window yields `None`.
///
/// # Errors
///
/// Returns [`ExpandError::InvalidRecurrenceRule`] for a malformed rule.
pub fn expand_event(
    event: NormalizedEvent,
    window: &Window,
    viewer: &ViewerZone,
    overrides: &mut OverrideIds,
) -> Result<Option<ExpandedEvent>> {
    if !event.raw.is_recurring() {
        if event.raw.is_override() {
            overrides.record(event.id());
        }
        return Ok(Some(ExpandedEvent::Single(event)));
    }

    let instants = occurrences_in_window(&event, window, viewer)?;
    if instants.is_empty() {
        tracing::trace!(event_id = %event.id(), "Series has no occurrence in window");
        return Ok(None);
    }
    tracing::trace!(event_id = %event.id(), count = instants.len(), "Expanded series");
    Ok(Some(ExpandedEvent::Series {
        base: event,
        instants,
    }))
}
