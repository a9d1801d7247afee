//! Occurrence materialization: one owned event per occurrence instant.

use chrono::{DateTime, Utc};

use crate::model::RawEvent;
use crate::normalize::NormalizedEvent;
use crate::recurrence::{ExpandedEvent, OverrideIds};
use crate::temporal::{compact_iso, ViewerZone};

/// Identity of a generated occurrence: `<baseId>_<compact-ISO instant>`.
///
/// Matches the id a provider gives an override of the same instant.
pub fn occurrence_id(base_id: &str, instant: &DateTime<Utc>) -> String {
    format!("{}_{}", base_id, compact_iso(instant))
}

/// Date-only id a provider gives an override of an all-day instance,
/// `<baseId>_<YYYYMMDD>` with the date taken in the viewer zone.
pub fn all_day_override_id(
    base_id: &str,
    instant: &DateTime<Utc>,
    viewer: &ViewerZone,
) -> String {
    format!("{}_{}", base_id, viewer.local_date(instant).format("%Y%m%d"))
}

/// Flatten expanded events into concrete occurrences.
///
/// Each series instant becomes a copy of its base event moved to that
/// instant, keeping the base event's duration. Instants whose id belongs to
/// an override are skipped; the override record stands in for them. For
/// all-day series the date-only override id counts as well.
pub fn materialize(
    expanded: Vec<ExpandedEvent>,
    overrides: &OverrideIds,
    viewer: &ViewerZone,
) -> Vec<NormalizedEvent> {
    let mut out = Vec::with_capacity(expanded.len());
    for entry in expanded {
        match entry {
            ExpandedEvent::Single(event) => out.push(event),
            ExpandedEvent::Series { base, instants } => {
                let duration = base.duration();
                let all_day = base.raw.start.date.is_some();
                for instant in instants {
                    let id = occurrence_id(base.id(), &instant);
                    let overridden = overrides.contains(&id)
                        || all_day
                            && overrides.contains(&all_day_override_id(base.id(), &instant, viewer));
                    if overridden {
                        tracing::trace!(occurrence_id = %id, "Occurrence replaced by override");
                        continue;
                    }
                    out.push(NormalizedEvent {
                        raw: RawEvent {
                            id,
                            ..base.raw.clone()
                        },
                        start: instant,
                        end: instant + duration,
                        zone: base.zone,
                    });
                }
            }
        }
    }
    out
}
