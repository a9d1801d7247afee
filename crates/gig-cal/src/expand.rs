//! The expansion entry points: raw feed in, occurrence list out.
//!
//! Stages run strictly forward:
//!
//! 1. resolve options
//! 2. drop single events outside the window ([`crate::prefilter`])
//! 3. normalize start/end instants ([`crate::normalize`])
//! 4. evaluate recurrence rules ([`crate::recurrence`])
//! 5. materialize occurrences, skipping overridden ones ([`crate::materialize`])
//! 6. attach display strings and links ([`crate::enrich`])
//! 7. sort, cap and project ([`crate::project`])
//!
//! All state (the override set included) lives on this call's stack, so two
//! calls with the same input and options return the same list.

use chrono::{DateTime, Utc};

use crate::enrich::enrich;
use crate::error::{ExpandError, Result};
use crate::materialize::materialize;
use crate::model::{EventCollection, Occurrence, RawEvent};
use crate::normalize::{normalize_event, NormalizedEvent};
use crate::options::ExpandOptions;
use crate::prefilter::in_window;
use crate::project::project;
use crate::recurrence::{expand_event, ExpandedEvent, OverrideIds};

/// Result of an expansion plus the records that were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub occurrences: Vec<Occurrence>,
    /// Per-record failures, in input order. Empty under fail-fast.
    pub rejected: Vec<ExpandError>,
}

/// Expand `collection` against a window anchored at the current time.
///
/// # Errors
///
/// Fails on invalid options, or on the first bad record when `failFast` is
/// set. Otherwise bad records are skipped.
pub fn expand(collection: &EventCollection, options: &ExpandOptions) -> Result<Vec<Occurrence>> {
    expand_at(collection, options, Utc::now())
}

/// Like [`expand`], with an explicit "now".
///
/// # Errors
///
/// See [`expand`].
pub fn expand_at(
    collection: &EventCollection,
    options: &ExpandOptions,
    now: DateTime<Utc>,
) -> Result<Vec<Occurrence>> {
    expand_with_report(collection, options, now).map(|expansion| expansion.occurrences)
}

/// Expand `collection` and report which records were skipped.
///
/// # Errors
///
/// See [`expand`].
pub fn expand_with_report(
    collection: &EventCollection,
    options: &ExpandOptions,
    now: DateTime<Utc>,
) -> Result<Expansion> {
    let resolved = options.resolve(now)?;
    let window = resolved.window;
    let viewer = resolved.viewer_zone;
    let mut rejections = Rejections::new(resolved.fail_fast);

    // Overrides moved out of the window or cancelled still claim their slot.
    let mut overrides = OverrideIds::from_events(&collection.items);

    let mut candidates: Vec<&RawEvent> = Vec::with_capacity(collection.items.len());
    for event in &collection.items {
        if event.is_cancelled() {
            tracing::trace!(event_id = %event.id, "Skipping cancelled event");
            continue;
        }
        if rejections.absorb(in_window(event, &window, &viewer))? == Some(true) {
            candidates.push(event);
        }
    }

    let mut normalized: Vec<NormalizedEvent> = Vec::with_capacity(candidates.len());
    for event in candidates {
        if let Some(event) = rejections.absorb(normalize_event(event, &viewer))? {
            normalized.push(event);
        }
    }

    let mut expanded: Vec<ExpandedEvent> = Vec::with_capacity(normalized.len());
    for event in normalized {
        let outcome = expand_event(event, &window, &viewer, &mut overrides);
        if let Some(entry) = rejections.absorb(outcome)?.flatten() {
            expanded.push(entry);
        }
    }

    let materialized = materialize(expanded, &overrides, &viewer);
    let total = materialized.len();
    let enriched = materialized
        .into_iter()
        .map(|event| enrich(event, &resolved))
        .collect();
    let occurrences = project(enriched, &resolved);

    tracing::debug!(
        items = collection.items.len(),
        overrides = overrides.len(),
        materialized = total,
        returned = occurrences.len(),
        rejected = rejections.errors.len(),
        "Expanded calendar"
    );

    Ok(Expansion {
        occurrences,
        rejected: rejections.errors,
    })
}

/// Per-record failure policy for one call.
struct Rejections {
    fail_fast: bool,
    errors: Vec<ExpandError>,
}

impl Rejections {
    fn new(fail_fast: bool) -> Self {
        Self {
            fail_fast,
            errors: Vec::new(),
        }
    }

    /// `Ok(Some)` on success, `Ok(None)` for a skipped record, `Err` under
    /// fail-fast.
    fn absorb<T>(&mut self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.fail_fast => Err(err),
            Err(err) => {
                tracing::warn!(event_id = err.event_id().unwrap_or(""), error = %err, "Skipping event");
                self.errors.push(err);
                Ok(None)
            }
        }
    }
}
