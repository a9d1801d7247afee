//! Instant parsing, formatting, and zone handling shared by the pipeline.
//!
//! Every instant inside the pipeline is a `DateTime<Utc>`. Zones only matter
//! at three edges: anchoring all-day dates at a local midnight, evaluating a
//! recurrence rule in wall-clock time, and rendering display strings.
//!
//! # Functions
//!
//! - [`trim_iso`] — ISO-8601 UTC text → compact `DTSTART` token
//! - [`compact_iso`] — instant → compact token
//! - [`to_iso_millis`] — instant → `2022-08-02T01:30:00.000Z`
//! - [`display_string`] — instant → `8/2/2022, 1:30:00 AM` in a zone

use chrono::{
    DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::{ExpandError, Result};

const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

// ── Viewer zone ─────────────────────────────────────────────────────────────

/// The zone of whoever looks at the output.
///
/// Used for all-day dates, for display strings when per-event zones are
/// disabled, and for events that carry no zone of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerZone {
    /// The process-local zone.
    #[default]
    Local,
    /// An explicit IANA zone.
    Named(Tz),
}

impl ViewerZone {
    /// Parse an IANA zone name.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidTimezone`] for unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        parse_timezone(name).map(ViewerZone::Named)
    }

    /// The first instant of `date` in this zone.
    ///
    /// Zones that skip midnight on a DST day start that date at the end of
    /// the gap instead.
    pub fn midnight(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let naive = date.and_hms_opt(0, 0, 0)?;
        match self {
            ViewerZone::Local => first_valid_local(&Local, naive),
            ViewerZone::Named(tz) => first_valid_local(tz, naive),
        }
    }

    /// Render `instant` as a display string in this zone.
    pub fn render(&self, instant: &DateTime<Utc>) -> String {
        match self {
            ViewerZone::Local => instant.with_timezone(&Local).format(DISPLAY_FORMAT).to_string(),
            ViewerZone::Named(tz) => display_string(instant, tz),
        }
    }

    /// Calendar date of `instant` in this zone.
    pub fn local_date(&self, instant: &DateTime<Utc>) -> NaiveDate {
        match self {
            ViewerZone::Local => instant.with_timezone(&Local).date_naive(),
            ViewerZone::Named(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    /// The equivalent zone for recurrence evaluation.
    pub(crate) fn rrule_tz(&self) -> rrule::Tz {
        match self {
            ViewerZone::Local => rrule::Tz::Local(Local),
            ViewerZone::Named(tz) => rrule::Tz::Tz(*tz),
        }
    }
}

pub(crate) fn first_valid_local<Z: TimeZone>(
    zone: &Z,
    naive: NaiveDateTime,
) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        // Gaps are at most a couple of hours; walk forward until wall time exists.
        LocalResult::None => (1..=3)
            .filter_map(|h| naive.checked_add_signed(chrono::Duration::hours(h)))
            .find_map(|shifted| zone.from_local_datetime(&shifted).earliest())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

// ── Compact ISO ─────────────────────────────────────────────────────────────

/// Strip an ISO-8601 UTC timestamp down to the compact `DTSTART` token form.
///
/// Removes `-`, `:` and the fractional-second block.
///
/// # Examples
///
/// ```
/// use gig_cal::temporal::trim_iso;
///
/// assert_eq!(trim_iso("2022-08-02T01:30:00.000Z"), "20220802T013000Z");
/// assert_eq!(trim_iso("2022-08-02T01:30:00Z"), "20220802T013000Z");
/// ```
pub fn trim_iso(iso: &str) -> String {
    let (main, tail) = match iso.find('.') {
        Some(dot) => {
            let rest = &iso[dot + 1..];
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            (&iso[..dot], &rest[digits..])
        }
        None => (iso, ""),
    };
    main.chars()
        .chain(tail.chars())
        .filter(|c| *c != '-' && *c != ':')
        .collect()
}

/// Compact token for an instant, e.g. `20220809T180000Z`.
pub fn compact_iso(instant: &DateTime<Utc>) -> String {
    trim_iso(&to_iso_millis(instant))
}

/// ISO-8601 UTC with millisecond precision, e.g. `2022-08-02T01:30:00.000Z`.
pub fn to_iso_millis(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Locale-style display string of `instant` in `tz`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use gig_cal::temporal::display_string;
///
/// let instant = Utc.with_ymd_and_hms(2022, 8, 9, 22, 0, 0).unwrap();
/// let shown = display_string(&instant, &chrono_tz::America::New_York);
/// assert_eq!(shown, "8/9/2022, 6:00:00 PM");
/// ```
pub fn display_string(instant: &DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

// ── Parsing helpers ─────────────────────────────────────────────────────────

/// Parse an IANA timezone string into `Tz`.
pub(crate) fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| ExpandError::InvalidTimezone(format!("'{}'", s)))
}

/// Parse a provider `dateTime`.
///
/// RFC 3339 text carries its own offset. Text without an offset is read as
/// wall time in `zone`, when one is given.
pub(crate) fn parse_date_time(s: &str, zone: Option<&Tz>) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()?;
    zone.and_then(|tz| first_valid_local(tz, naive))
}

/// Parse an all-day `date` (`YYYY-MM-DD`).
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Convert UTC milliseconds into an instant.
pub(crate) fn from_millis(ms: i64, name: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| ExpandError::InvalidOptions(format!("{name} out of range: {ms}")))
}

// ── Tests ───────────────────────────────────────────────────────────────────
