//! # gig-cal
//!
//! Expand a calendar feed into a flat, time-windowed list of occurrences.
//!
//! A feed mixes single events, recurring events (one RRULE each) and
//! individually edited instances of recurring series. [`expand()`] evaluates
//! every rule against a window, replaces generated instances with their
//! edited overrides, and returns display-ready [`Occurrence`] records sorted
//! by start.
//!
//! ## Modules
//!
//! - [`options`] — caller options, defaults, the evaluation window
//! - [`prefilter`] — early window check for single events
//! - [`normalize`] — start/end markers → absolute instants
//! - [`recurrence`] — RRULE evaluation and override tracking
//! - [`materialize`] — one owned record per occurrence instant
//! - [`enrich`] — display strings, URL and image extraction
//! - [`project`] — ordering, `maxItems` cap, public shape
//! - [`mod@expand`] — the entry points tying the stages together
//! - [`temporal`] — compact-ISO tokens, formatting, zones
//! - [`model`] — input and output records
//! - [`error`] — Error types

pub mod enrich;
pub mod error;
pub mod expand;
pub mod materialize;
pub mod model;
pub mod normalize;
pub mod options;
pub mod prefilter;
pub mod project;
pub mod recurrence;
pub mod temporal;

pub use error::ExpandError;
pub use expand::{expand, expand_at, expand_with_report, Expansion};
pub use model::{EventCollection, EventTime, Occurrence, RawEvent};
pub use options::{ExpandOptions, ResolvedOptions, Window, DEFAULT_MAX_ITEMS, DEFAULT_WINDOW_DAYS};
pub use recurrence::{OverrideIds, RecurrenceSpec};
pub use temporal::{compact_iso, trim_iso, ViewerZone};
