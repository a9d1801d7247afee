//! Caller options and their resolution into a complete configuration.
//!
//! [`ExpandOptions`] is what callers write (every field optional, camelCase
//! JSON). [`ExpandOptions::resolve`] fills the gaps from constant defaults and
//! returns a fresh [`ResolvedOptions`] each time; nothing shared is mutated.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExpandError, Result};
use crate::temporal::{from_millis, ViewerZone};

/// Output cap applied when the caller gives none.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Window length when the caller gives no `maxTime`.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Partial configuration as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExpandOptions {
    /// Window start, UTC milliseconds. Defaults to now.
    pub min_time: Option<i64>,
    /// Window end, UTC milliseconds. Defaults to `minTime` + 30 days.
    pub max_time: Option<i64>,
    /// Maximum number of occurrences returned.
    pub max_items: Option<usize>,
    #[serde(rename = "extractURLs")]
    pub extract_urls: Option<bool>,
    pub extract_images: Option<bool>,
    /// Render display strings in each event's own zone.
    pub time_zone_by_event: Option<bool>,
    /// Ascending by start when true, descending when false.
    pub sort_earliest: Option<bool>,
    /// IANA zone standing in for the viewer's local zone.
    pub viewer_time_zone: Option<String>,
    /// Abort on the first bad record instead of skipping it.
    pub fail_fast: Option<bool>,
}

impl ExpandOptions {
    /// Sets the window start.
    #[must_use]
    pub fn with_min_time(mut self, min: DateTime<Utc>) -> Self {
        self.min_time = Some(min.timestamp_millis());
        self
    }

    /// Sets the window end.
    #[must_use]
    pub fn with_max_time(mut self, max: DateTime<Utc>) -> Self {
        self.max_time = Some(max.timestamp_millis());
        self
    }

    /// Sets the viewer zone.
    #[must_use]
    pub fn with_viewer_time_zone(mut self, zone: impl Into<String>) -> Self {
        self.viewer_time_zone = Some(zone.into());
        self
    }

    /// Merge these options onto the defaults.
    ///
    /// `now` anchors the default window; pass `Utc::now()` outside tests.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidOptions`] if an instant is out of range or
    /// the window is inverted, and [`ExpandError::InvalidTimezone`] for an
    /// unknown `viewerTimeZone`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<ResolvedOptions> {
        let min = match self.min_time {
            Some(ms) => from_millis(ms, "minTime")?,
            None => now,
        };
        let max = match self.max_time {
            Some(ms) => from_millis(ms, "maxTime")?,
            None => min
                .checked_add_signed(Duration::days(DEFAULT_WINDOW_DAYS))
                .ok_or_else(|| {
                    ExpandError::InvalidOptions(format!(
                        "minTime {} leaves no room for the default window",
                        min.to_rfc3339()
                    ))
                })?,
        };
        if min > max {
            return Err(ExpandError::InvalidOptions(format!(
                "minTime {} is after maxTime {}",
                min.to_rfc3339(),
                max.to_rfc3339()
            )));
        }

        let viewer_zone = match self.viewer_time_zone.as_deref() {
            Some(name) => ViewerZone::parse(name)?,
            None => ViewerZone::Local,
        };

        Ok(ResolvedOptions {
            window: Window { min, max },
            max_items: self.max_items.unwrap_or(DEFAULT_MAX_ITEMS),
            extract_urls: self.extract_urls.unwrap_or(true),
            extract_images: self.extract_images.unwrap_or(true),
            time_zone_by_event: self.time_zone_by_event.unwrap_or(true),
            sort_earliest: self.sort_earliest.unwrap_or(true),
            viewer_zone,
            fail_fast: self.fail_fast.unwrap_or(false),
        })
    }
}

/// Complete configuration for one expansion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub window: Window,
    pub max_items: usize,
    pub extract_urls: bool,
    pub extract_images: bool,
    pub time_zone_by_event: bool,
    pub sort_earliest: bool,
    pub viewer_zone: ViewerZone,
    pub fail_fast: bool,
}

/// The `[min, max]` instant range occurrences are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

impl Window {
    /// Bounds included. Used for single events.
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.min <= *instant && *instant <= self.max
    }

    /// Bounds excluded. Used for recurrence occurrences.
    pub fn strictly_contains(&self, instant: &DateTime<Utc>) -> bool {
        self.min < *instant && *instant < self.max
    }
}
