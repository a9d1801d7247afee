//! End-to-end expansion over a realistic calendar feed.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use gig_cal::{
    compact_iso, expand_at, expand_with_report, EventCollection, ExpandError, ExpandOptions,
    Occurrence, ViewerZone,
};
use serde_json::{json, Value};

fn aug_one() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 8, 1, 0, 0, 0).unwrap()
}

/// Window Aug 1 .. Aug 31 2022, viewer in New York.
fn august_options() -> ExpandOptions {
    ExpandOptions::default()
        .with_min_time(aug_one())
        .with_viewer_time_zone("America/New_York")
}

fn collection(items: Vec<Value>) -> EventCollection {
    serde_json::from_value(json!({
        "kind": "calendar#events",
        "summary": "craig public test",
        "timeZone": "America/New_York",
        "items": items
    }))
    .unwrap()
}

fn with_id_prefix<'a>(occurrences: &'a [Occurrence], prefix: &str) -> Vec<&'a Occurrence> {
    occurrences.iter().filter(|o| o.id.starts_with(prefix)).collect()
}

fn tuesday_series() -> Value {
    json!({
        "kind": "calendar#event",
        "id": "X",
        "status": "confirmed",
        "summary": "weekly tuesday gig",
        "description": "Poster: https://cdn.example.com/poster.jpg",
        "creator": { "email": "someone@example.com" },
        "start": { "dateTime": "2022-07-26T18:00:00Z", "timeZone": "UTC" },
        "end": { "dateTime": "2022-07-26T20:00:00Z", "timeZone": "UTC" },
        "recurrence": ["RRULE:FREQ=WEEKLY;COUNT=4;BYDAY=TU"]
    })
}

// ── recurrence scenarios ────────────────────────────────────────────────────

#[test]
fn test_weekly_count_series_three_of_four_in_window() {
    let feed = collection(vec![tuesday_series()]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    let ids: Vec<&str> = out.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["X_20220802T180000Z", "X_20220809T180000Z", "X_20220816T180000Z"]
    );
    assert_eq!(out[0].start, "2022-08-02T18:00:00.000Z");
    assert_eq!(out[0].end, "2022-08-02T20:00:00.000Z");
}

#[test]
fn test_all_day_series_entirely_after_window_contributes_nothing() {
    let feed = collection(vec![json!({
        "id": "1pg1flt62edvv544bot05tugbb",
        "summary": "test 3 recur * 4 last occ after lfd",
        "description": "should test false",
        "start": { "date": "2022-09-06" },
        "end": { "date": "2022-09-07" },
        "recurrence": ["RRULE:FREQ=WEEKLY;WKST=SU;COUNT=4;BYDAY=TU"]
    })]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    assert!(out.is_empty(), "got: {out:?}");
}

#[test]
fn test_series_ending_before_window_contributes_nothing() {
    let feed = collection(vec![json!({
        "id": "early",
        "summary": "limited, final before window",
        "start": { "dateTime": "2022-06-01T19:00:00-04:00", "timeZone": "America/New_York" },
        "end": { "dateTime": "2022-06-01T22:00:00-04:00", "timeZone": "America/New_York" },
        "recurrence": ["RRULE:FREQ=WEEKLY;COUNT=3"]
    })]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_until_series_in_event_zone() {
    let feed = collection(vec![json!({
        "id": "35r46qa2m9fpbr5649vvqljfdk",
        "summary": "test 4 recurr 4x 2 in range",
        "description": "test true *2",
        "start": { "dateTime": "2022-07-21T20:00:00-04:00", "timeZone": "America/New_York" },
        "end": { "dateTime": "2022-07-21T21:00:00-04:00", "timeZone": "America/New_York" },
        "recurrence": ["RRULE:FREQ=WEEKLY;WKST=SU;UNTIL=20220813T035959Z;BYDAY=TH"]
    })]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].id, "35r46qa2m9fpbr5649vvqljfdk_20220805T000000Z");
    assert_eq!(out[0].start_as_display_string, "8/4/2022, 8:00:00 PM");
    assert_eq!(out[1].start_as_display_string, "8/11/2022, 8:00:00 PM");
}

fn all_day_tuesdays(rule: &str) -> Value {
    json!({
        "id": "rehearsal",
        "summary": "all-day rehearsal",
        "start": { "date": "2022-08-02" },
        "end": { "date": "2022-08-03" },
        "recurrence": [rule]
    })
}

/// Options for the August window under each viewer zone (`None` is the default).
fn viewer_cases() -> Vec<(ViewerZone, ExpandOptions)> {
    let base = ExpandOptions::default().with_min_time(aug_one());
    vec![
        (
            ViewerZone::parse("America/New_York").unwrap(),
            base.clone().with_viewer_time_zone("America/New_York"),
        ),
        (ViewerZone::parse("UTC").unwrap(), base.clone().with_viewer_time_zone("UTC")),
        (ViewerZone::Local, base),
    ]
}

fn august_midnight_ids(viewer: &ViewerZone, days: &[u32]) -> Vec<String> {
    days.iter()
        .map(|day| {
            let midnight = viewer
                .midnight(NaiveDate::from_ymd_opt(2022, 8, *day).unwrap())
                .unwrap();
            format!("rehearsal_{}", compact_iso(&midnight))
        })
        .collect()
}

#[test]
fn test_all_day_series_with_date_only_until() {
    let feed = collection(vec![all_day_tuesdays("RRULE:FREQ=WEEKLY;UNTIL=20220823;BYDAY=TU")]);
    for (viewer, options) in viewer_cases() {
        let expansion = expand_with_report(&feed, &options, aug_one()).unwrap();
        assert!(expansion.rejected.is_empty(), "{viewer:?}: {:?}", expansion.rejected);
        let ids: Vec<String> = expansion.occurrences.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, august_midnight_ids(&viewer, &[2, 9, 16, 23]), "{viewer:?}");
    }
}

#[test]
fn test_all_day_series_with_utc_until() {
    let feed = collection(vec![all_day_tuesdays("RRULE:FREQ=WEEKLY;UNTIL=20220816T120000Z")]);
    for (viewer, options) in viewer_cases() {
        let expansion = expand_with_report(&feed, &options, aug_one()).unwrap();
        assert!(expansion.rejected.is_empty(), "{viewer:?}: {:?}", expansion.rejected);
        let ids: Vec<String> = expansion.occurrences.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, august_midnight_ids(&viewer, &[2, 9, 16]), "{viewer:?}");
    }
}

#[test]
fn test_timed_series_with_date_only_until() {
    let feed = collection(vec![json!({
        "id": "wed",
        "start": { "dateTime": "2022-08-03T19:00:00-04:00", "timeZone": "America/New_York" },
        "end": { "dateTime": "2022-08-03T20:00:00-04:00", "timeZone": "America/New_York" },
        "recurrence": ["RRULE:FREQ=WEEKLY;UNTIL=20220817"]
    })]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    let ids: Vec<&str> = out.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["wed_20220803T230000Z", "wed_20220810T230000Z", "wed_20220817T230000Z"]
    );
}

#[test]
fn test_infinite_series_started_before_window() {
    let feed = collection(vec![json!({
        "id": "inf",
        "summary": "test 1 infinite, before efd",
        "start": { "dateTime": "2022-05-02T21:00:00-04:00", "timeZone": "America/New_York" },
        "end": { "dateTime": "2022-05-02T23:00:00-04:00", "timeZone": "America/New_York" },
        "recurrence": ["RRULE:FREQ=WEEKLY;BYDAY=MO"]
    })]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    // Mondays Aug 1, 8, 15, 22, 29 at 9pm New York
    assert_eq!(out.len(), 5);
    assert!(out.iter().all(|o| o.summary.as_deref() == Some("test 1 infinite, before efd")));
}

#[test]
fn test_infinite_series_starting_after_window() {
    let feed = collection(vec![json!({
        "id": "late",
        "start": { "dateTime": "2022-10-03T21:00:00-04:00", "timeZone": "America/New_York" },
        "end": { "dateTime": "2022-10-03T23:00:00-04:00", "timeZone": "America/New_York" },
        "recurrence": ["RRULE:FREQ=WEEKLY"]
    })]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    assert!(out.is_empty());
}

// ── single-event scenarios ──────────────────────────────────────────────────

#[test]
fn test_single_events_filtered_by_window() {
    let feed = collection(vec![
        json!({
            "id": "before",
            "start": { "date": "2022-07-20" },
            "end": { "date": "2022-07-21" }
        }),
        json!({
            "id": "inside",
            "summary": "paris show",
            "description": "<a href=\"https://venue.example.com\">https://venue.example.com</a>",
            "start": { "dateTime": "2022-08-12T18:00:00+02:00", "timeZone": "Europe/Paris" },
            "end": { "dateTime": "2022-08-12T21:00:00+02:00", "timeZone": "Europe/Paris" }
        }),
        json!({
            "id": "after",
            "start": { "date": "2022-09-20" },
            "end": { "date": "2022-09-21" }
        }),
    ]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    assert_eq!(out.len(), 1);
    let show = &out[0];
    assert_eq!(show.id, "inside");
    assert_eq!(show.start, "2022-08-12T16:00:00.000Z");
    assert_eq!(show.start_as_display_string, "8/12/2022, 6:00:00 PM");
    assert_eq!(show.urls, vec!["https://venue.example.com"]);
    assert!(show.images.is_empty());
}

#[test]
fn test_viewer_zone_display_when_event_zone_disabled() {
    let feed = collection(vec![json!({
        "id": "inside",
        "start": { "dateTime": "2022-08-12T18:00:00+02:00", "timeZone": "Europe/Paris" },
        "end": { "dateTime": "2022-08-12T21:00:00+02:00", "timeZone": "Europe/Paris" }
    })]);
    let options = ExpandOptions {
        time_zone_by_event: Some(false),
        ..august_options()
    };
    let out = expand_at(&feed, &options, aug_one()).unwrap();
    assert_eq!(out[0].start_as_display_string, "8/12/2022, 12:00:00 PM");
}

// ── override scenarios ──────────────────────────────────────────────────────

#[test]
fn test_override_replaces_generated_occurrence() {
    let moved = json!({
        "id": "X_20220809T180000Z",
        "recurringEventId": "X",
        "summary": "weekly tuesday gig (moved to 7pm)",
        "description": "new room",
        "start": { "dateTime": "2022-08-09T19:00:00Z", "timeZone": "UTC" },
        "end": { "dateTime": "2022-08-09T21:00:00Z", "timeZone": "UTC" },
        "originalStartTime": { "dateTime": "2022-08-09T18:00:00Z", "timeZone": "UTC" }
    });
    let feed = collection(vec![tuesday_series(), moved]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();

    assert_eq!(out.len(), 3);
    let overridden: Vec<&Occurrence> =
        out.iter().filter(|o| o.id == "X_20220809T180000Z").collect();
    assert_eq!(overridden.len(), 1);
    let only = overridden[0];
    assert_eq!(only.summary.as_deref(), Some("weekly tuesday gig (moved to 7pm)"));
    assert_eq!(only.description.as_deref(), Some("new room"));
    assert_eq!(only.start, "2022-08-09T19:00:00.000Z");
    assert!(out.iter().all(|o| o.start != "2022-08-09T18:00:00.000Z"));
}

#[test]
fn test_override_moved_out_of_window_keeps_slot_empty() {
    let moved = json!({
        "id": "X_20220816T180000Z",
        "recurringEventId": "X",
        "summary": "pushed to september",
        "start": { "dateTime": "2022-09-20T18:00:00Z", "timeZone": "UTC" },
        "end": { "dateTime": "2022-09-20T20:00:00Z", "timeZone": "UTC" }
    });
    let feed = collection(vec![tuesday_series(), moved]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    let ids: Vec<&str> = out.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["X_20220802T180000Z", "X_20220809T180000Z"]);
}

#[test]
fn test_date_only_override_replaces_all_day_instant() {
    let moved = json!({
        "id": "rehearsal_20220809",
        "recurringEventId": "rehearsal",
        "summary": "rehearsal (moved to wednesday)",
        "start": { "date": "2022-08-10" },
        "end": { "date": "2022-08-11" },
        "originalStartTime": { "date": "2022-08-09" }
    });
    let feed = collection(vec![all_day_tuesdays("RRULE:FREQ=WEEKLY;COUNT=3"), moved]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    let ids: Vec<&str> = out.iter().map(|o| o.id.as_str()).collect();
    // Generated ids keep the compact instant form; the override keeps its own.
    assert_eq!(
        ids,
        vec!["rehearsal_20220802T040000Z", "rehearsal_20220809", "rehearsal_20220816T040000Z"]
    );
}

// ── options and errors ──────────────────────────────────────────────────────

#[test]
fn test_max_items_and_descending_order() {
    let feed = collection(vec![tuesday_series()]);
    let options = ExpandOptions {
        max_items: Some(2),
        sort_earliest: Some(false),
        ..august_options()
    };
    let out = expand_at(&feed, &options, aug_one()).unwrap();
    let ids: Vec<&str> = out.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["X_20220816T180000Z", "X_20220809T180000Z"]);
}

#[test]
fn test_images_extracted_from_series_description() {
    let feed = collection(vec![tuesday_series()]);
    let out = expand_at(&feed, &august_options(), aug_one()).unwrap();
    for occurrence in with_id_prefix(&out, "X_") {
        assert_eq!(occurrence.urls, vec!["https://cdn.example.com/poster.jpg"]);
        assert_eq!(occurrence.images, vec!["https://cdn.example.com/poster.jpg"]);
    }
}

#[test]
fn test_malformed_rule_reported_without_aborting() {
    let feed = collection(vec![
        tuesday_series(),
        json!({
            "id": "garbled",
            "start": { "dateTime": "2022-08-03T18:00:00Z", "timeZone": "UTC" },
            "end": { "dateTime": "2022-08-03T19:00:00Z", "timeZone": "UTC" },
            "recurrence": ["RRULE:FREQ=WEEKLY;BYDAY=XX"]
        }),
    ]);
    let expansion = expand_with_report(&feed, &august_options(), aug_one()).unwrap();
    assert_eq!(expansion.occurrences.len(), 3);
    assert_eq!(expansion.rejected.len(), 1);
    assert!(matches!(
        &expansion.rejected[0],
        ExpandError::InvalidRecurrenceRule { event_id, .. } if event_id == "garbled"
    ));
}

#[test]
fn test_repeated_calls_are_identical() {
    let moved = json!({
        "id": "X_20220809T180000Z",
        "recurringEventId": "X",
        "start": { "dateTime": "2022-08-09T19:00:00Z", "timeZone": "UTC" },
        "end": { "dateTime": "2022-08-09T21:00:00Z", "timeZone": "UTC" }
    });
    let with_override = collection(vec![tuesday_series(), moved]);
    let without_override = collection(vec![tuesday_series()]);

    let first = expand_at(&with_override, &august_options(), aug_one()).unwrap();
    let second = expand_at(&with_override, &august_options(), aug_one()).unwrap();
    assert_eq!(first, second);

    // An override seen in one call must not suppress anything in the next.
    let plain = expand_at(&without_override, &august_options(), aug_one()).unwrap();
    assert!(plain.iter().any(|o| o.id == "X_20220809T180000Z" && o.start == "2022-08-09T18:00:00.000Z"));
}
