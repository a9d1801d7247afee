//! Early window check for single events.

use crate::error::Result;
use crate::model::RawEvent;
use crate::normalize::start_instant;
use crate::options::Window;
use crate::temporal::ViewerZone;

/// Whether `event` may contribute to the window.
///
/// Recurring events always pass; their occurrences are checked one by one
/// later. A single event passes when its start lies in `[min, max]`, bounds
/// included.
///
/// # Errors
///
/// Returns [`crate::ExpandError::InvalidEventSchema`] when a single event's
/// start cannot be read.
pub fn in_window(event: &RawEvent, window: &Window, viewer: &ViewerZone) -> Result<bool> {
    if event.is_recurring() {
        return Ok(true);
    }
    let start = start_instant(event, viewer)?;
    let keep = window.contains(&start);
    if !keep {
        tracing::trace!(event_id = %event.id, start = %start, "Dropping event outside window");
    }
    Ok(keep)
}
