//! Tests for series expansion.

use chrono::NaiveDate;
use schedule_engine::model::{Cancellation, SeriesStatus};
use schedule_engine::occurrence::{active_dates, upcoming};
use schedule_engine::{generate, AppointmentSeries, EngineError, Weekday};

fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid test date")
}

/// Helper: a series for therapist 1 / patient 100, 09:00-10:00.
fn series(start: &str, end: &str, weekday: Weekday, frequency: u32) -> AppointmentSeries {
    AppointmentSeries {
        id: 7,
        therapist_id: 1,
        patient_id: 100,
        start_date: date(start),
        end_date: date(end),
        weekday,
        weekly_frequency: frequency,
        start_time: "09:00:00".parse().unwrap(),
        end_time: "10:00:00".parse().unwrap(),
        status: SeriesStatus::Active,
        cancellations: Vec::new(),
        version: 0,
    }
}

fn dates(occurrences: &[schedule_engine::Occurrence]) -> Vec<NaiveDate> {
    occurrences.iter().map(|o| o.date).collect()
}

// ---------------------------------------------------------------------------
// Stepping
// ---------------------------------------------------------------------------

#[test]
fn biweekly_mondays_in_january() {
    let s = series("2024-01-01", "2024-01-29", Weekday::Monday, 2);

    let result = generate(&s, s.start_date, s.end_date).expect("should expand");

    assert_eq!(
        dates(&result),
        vec![date("2024-01-01"), date("2024-01-15"), date("2024-01-29")]
    );
    assert!(result.iter().all(|o| !o.is_cancelled));
}

#[test]
fn start_date_off_weekday_aligns_forward() {
    // Starts on Wednesday 2024-01-03 but meets on Mondays.
    let s = series("2024-01-03", "2024-01-31", Weekday::Monday, 1);

    let result = generate(&s, s.start_date, s.end_date).unwrap();

    assert_eq!(
        dates(&result),
        vec![
            date("2024-01-08"),
            date("2024-01-15"),
            date("2024-01-22"),
            date("2024-01-29")
        ]
    );
}

#[test]
fn no_matching_weekday_inside_series_window() {
    // Tuesday to Thursday, but the series meets on Fridays.
    let s = series("2024-01-02", "2024-01-04", Weekday::Friday, 1);
    assert!(generate(&s, s.start_date, s.end_date).unwrap().is_empty());
}

#[test]
fn occurrences_carry_series_identity_and_times() {
    let s = series("2024-01-01", "2024-01-08", Weekday::Monday, 1);
    let result = generate(&s, s.start_date, s.end_date).unwrap();

    assert_eq!(result.len(), 2);
    for o in &result {
        assert_eq!(o.series_id, 7);
        assert_eq!(o.therapist_id, 1);
        assert_eq!(o.patient_id, 100);
        assert_eq!(o.start_time, s.start_time);
        assert_eq!(o.end_time, s.end_time);
    }
}

// ---------------------------------------------------------------------------
// Windowing
// ---------------------------------------------------------------------------

#[test]
fn window_clips_but_keeps_anchor() {
    // Every third Monday from 2024-01-01: Jan 1, Jan 22, Feb 12, Mar 4, Mar 25.
    let s = series("2024-01-01", "2024-03-31", Weekday::Monday, 3);

    let result = generate(&s, date("2024-02-01"), date("2024-03-10")).unwrap();

    // The window start must not re-anchor the stepping.
    assert_eq!(dates(&result), vec![date("2024-02-12"), date("2024-03-04")]);
}

#[test]
fn window_outside_series_is_empty() {
    let s = series("2024-01-01", "2024-01-29", Weekday::Monday, 1);
    assert!(generate(&s, date("2024-02-01"), date("2024-02-28"))
        .unwrap()
        .is_empty());
    assert!(generate(&s, date("2023-12-01"), date("2023-12-31"))
        .unwrap()
        .is_empty());
}

#[test]
fn single_day_window() {
    let s = series("2024-01-01", "2024-01-29", Weekday::Monday, 2);
    assert_eq!(generate(&s, date("2024-01-15"), date("2024-01-15")).unwrap().len(), 1);
    assert!(generate(&s, date("2024-01-08"), date("2024-01-08")).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Cancellations and views
// ---------------------------------------------------------------------------

#[test]
fn cancelled_dates_are_tagged_not_hidden() {
    let mut s = series("2024-01-01", "2024-01-29", Weekday::Monday, 1);
    s.cancellations.push(Cancellation {
        id: 3,
        date: date("2024-01-15"),
    });

    let result = generate(&s, s.start_date, s.end_date).unwrap();

    assert_eq!(result.len(), 5, "cancelled occurrences stay in the list");
    let cancelled: Vec<_> = result.iter().filter(|o| o.is_cancelled).collect();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].date, date("2024-01-15"));
    assert_eq!(cancelled[0].cancellation_id, Some(3));

    let active: Vec<_> = active_dates(&result).map(|o| o.date).collect();
    assert_eq!(active.len(), 4);
    assert!(!active.contains(&date("2024-01-15")));
}

#[test]
fn upcoming_view_drops_past_and_cancelled() {
    let mut s = series("2024-01-01", "2024-01-29", Weekday::Monday, 1);
    s.cancellations.push(Cancellation {
        id: 1,
        date: date("2024-01-22"),
    });
    let result = generate(&s, s.start_date, s.end_date).unwrap();

    let next: Vec<_> = upcoming(&result, date("2024-01-15")).map(|o| o.date).collect();

    assert_eq!(next, vec![date("2024-01-15"), date("2024-01-29")]);
}

#[test]
fn paused_series_still_expands() {
    let mut s = series("2024-01-01", "2024-01-15", Weekday::Monday, 1);
    s.status = SeriesStatus::Paused;
    assert_eq!(generate(&s, s.start_date, s.end_date).unwrap().len(), 3);
}

#[test]
fn history_is_relative_to_today() {
    let s = series("2024-01-01", "2024-01-29", Weekday::Monday, 1);
    assert!(s.is_history(date("2024-01-30")));
    assert!(!s.is_history(date("2024-01-29")));
}

#[test]
fn huge_frequency_yields_only_the_anchor() {
    let s = series("2024-01-01", "2024-12-31", Weekday::Monday, 20_000_000);
    let occurrences = generate(&s, s.start_date, s.end_date).unwrap();
    assert_eq!(dates(&occurrences), vec![date("2024-01-01")]);
}

#[test]
fn open_ended_series_stops_at_the_last_representable_date() {
    let mut s = series("2024-01-01", "2024-01-01", Weekday::Monday, 1_000_000);
    s.end_date = NaiveDate::MAX;
    let occurrences = generate(&s, s.start_date, NaiveDate::MAX).unwrap();
    assert!(!occurrences.is_empty());
    assert_eq!(occurrences[0].date, date("2024-01-01"));
    assert!(occurrences.windows(2).all(|w| (w[1].date - w[0].date).num_weeks() == 1_000_000));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn zero_frequency_is_rejected() {
    let s = series("2024-01-01", "2024-01-29", Weekday::Monday, 0);
    assert!(matches!(
        generate(&s, s.start_date, s.end_date),
        Err(EngineError::InvalidInterval(_))
    ));
}

#[test]
fn inverted_series_dates_are_rejected() {
    let s = series("2024-02-01", "2024-01-01", Weekday::Monday, 1);
    assert!(matches!(
        generate(&s, date("2024-01-01"), date("2024-02-01")),
        Err(EngineError::InvalidInterval(_))
    ));
}

#[test]
fn inverted_times_are_rejected() {
    let mut s = series("2024-01-01", "2024-01-29", Weekday::Monday, 1);
    s.end_time = s.start_time;
    assert!(matches!(
        generate(&s, s.start_date, s.end_date),
        Err(EngineError::InvalidInterval(_))
    ));
}

#[test]
fn inverted_window_is_rejected() {
    let s = series("2024-01-01", "2024-01-29", Weekday::Monday, 1);
    assert!(matches!(
        generate(&s, date("2024-01-29"), date("2024-01-01")),
        Err(EngineError::InvalidRange(_))
    ));
}
