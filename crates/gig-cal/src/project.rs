//! Projection onto the public [`Occurrence`] shape, with ordering and cap.

use crate::enrich::EnrichedEvent;
use crate::model::Occurrence;
use crate::options::ResolvedOptions;

/// Sort by start (ascending when `sort_earliest`, else descending), keep at
/// most `max_items`, and strip every internal field.
///
/// Events with equal starts keep their input order.
pub fn project(mut events: Vec<EnrichedEvent>, options: &ResolvedOptions) -> Vec<Occurrence> {
    if options.sort_earliest {
        events.sort_by(|a, b| a.event.start.cmp(&b.event.start));
    } else {
        events.sort_by(|a, b| b.event.start.cmp(&a.event.start));
    }
    if events.len() > options.max_items {
        tracing::debug!(
            total = events.len(),
            max_items = options.max_items,
            "Truncating occurrences"
        );
        events.truncate(options.max_items);
    }
    events.into_iter().map(to_occurrence).collect()
}

/// Reduce one enriched record to the public shape.
pub fn to_occurrence(enriched: EnrichedEvent) -> Occurrence {
    let start = enriched.event.start_iso();
    let end = enriched.event.end_iso();
    let raw = enriched.event.raw;
    Occurrence {
        id: raw.id,
        summary: raw.summary,
        description: raw.description,
        start,
        end,
        start_as_display_string: enriched.start_as_display_string,
        urls: enriched.urls,
        images: enriched.images,
    }
}
