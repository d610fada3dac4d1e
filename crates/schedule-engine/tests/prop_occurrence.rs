//! Property-based tests for expansion, overlap and slot search invariants.
//!
//! These hold for *any* valid series or booking, not just the fixed examples
//! in the other test files.

use chrono::{Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;
use schedule_engine::calendar::TimeInterval;
use schedule_engine::conflict::{occupancy_from_appointments, Candidate};
use schedule_engine::model::SeriesStatus;
use schedule_engine::slots::SearchContext;
use schedule_engine::{
    add_cancellation, check, generate, remove_cancellation, search, Appointment,
    AppointmentSeries, AppointmentStatus, DayPart, EngineConfig, SlotSearchRequest, Therapist,
    Weekday,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_weekday() -> impl Strategy<Value = Weekday> {
    prop::sample::select(Weekday::ALL.to_vec())
}

/// A date in 2024-2026.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..1096).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    })
}

/// A time on a 5-minute grid between 06:00 and 21:55.
fn arb_time() -> impl Strategy<Value = NaiveTime> {
    (6u32..22, 0u32..12).prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m * 5, 0).unwrap())
}

fn arb_interval() -> impl Strategy<Value = TimeInterval> {
    (arb_time(), 1i64..=24).prop_filter_map("crosses midnight", |(start, fives)| {
        TimeInterval::starting_at(start, fives * 5)
    })
}

fn arb_series() -> impl Strategy<Value = AppointmentSeries> {
    (arb_date(), 0i64..400, arb_weekday(), 1u32..=6, arb_interval()).prop_map(
        |(start, span, weekday, frequency, interval)| AppointmentSeries {
            id: 1,
            therapist_id: 1,
            patient_id: 1,
            start_date: start,
            end_date: start + Duration::days(span),
            weekday,
            weekly_frequency: frequency,
            start_time: interval.start,
            end_time: interval.end,
            status: SeriesStatus::Active,
            cancellations: Vec::new(),
            version: 0,
        },
    )
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: consecutive occurrences are exactly 7f days apart, on the weekday
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn occurrences_step_by_frequency_on_weekday(series in arb_series()) {
        let occurrences = generate(&series, series.start_date, series.end_date).unwrap();

        for o in &occurrences {
            prop_assert_eq!(Weekday::of(o.date), series.weekday);
        }
        let step = 7 * series.weekly_frequency as i64;
        for pair in occurrences.windows(2) {
            prop_assert_eq!((pair[1].date - pair[0].date).num_days(), step);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: expansion never leaves the series window or the query window
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn occurrences_stay_inside_both_windows(
        series in arb_series(),
        window_start in arb_date(),
        window_days in 0i64..200,
    ) {
        let window_end = window_start + Duration::days(window_days);
        let occurrences = generate(&series, window_start, window_end).unwrap();

        for o in &occurrences {
            prop_assert!(o.date >= series.start_date && o.date <= series.end_date);
            prop_assert!(o.date >= window_start && o.date <= window_end);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: windowed expansion is a slice of the full expansion
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn windowed_expansion_matches_full_expansion(
        series in arb_series(),
        window_start in arb_date(),
        window_days in 0i64..200,
    ) {
        let window_end = window_start + Duration::days(window_days);
        let full = generate(&series, series.start_date, series.end_date).unwrap();
        let windowed = generate(&series, window_start, window_end).unwrap();

        let expected: Vec<_> = full
            .into_iter()
            .filter(|o| o.date >= window_start && o.date <= window_end)
            .collect();
        prop_assert_eq!(windowed, expected);
    }
}

// ---------------------------------------------------------------------------
// Property 4: add then remove a cancellation is a no-op on expansion
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn cancellation_roundtrip_restores_expansion(series in arb_series(), pick in any::<prop::sample::Index>()) {
        let before = generate(&series, series.start_date, series.end_date).unwrap();
        prop_assume!(!before.is_empty());
        let target = before[pick.index(before.len())].date;

        let mut edited = series.clone();
        let cancellation = add_cancellation(&mut edited, target).unwrap();
        let during = generate(&edited, edited.start_date, edited.end_date).unwrap();
        prop_assert_eq!(during.iter().filter(|o| o.is_cancelled).count(), 1);

        remove_cancellation(&mut edited, cancellation.id).unwrap();
        let after = generate(&edited, edited.start_date, edited.end_date).unwrap();
        prop_assert_eq!(after, before);
    }
}

// ---------------------------------------------------------------------------
// Property 5: check agrees with the half-open overlap predicate
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn check_matches_overlap_predicate(a in arb_interval(), b in arb_interval()) {
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let existing = occupancy_from_appointments(&[Appointment {
            id: 1,
            therapist_id: 1,
            patient_id: 1,
            date: day,
            start_time: a.start,
            end_time: a.end,
            status: AppointmentStatus::Scheduled,
        }]).unwrap();
        let candidate = Candidate {
            therapist_id: 1,
            date: day,
            start_time: b.start,
            end_time: b.end,
            exclude_appointment_id: None,
            exclude_series_id: None,
        };

        let result = check(&candidate, &existing).unwrap();

        let expected = b.start < a.end && a.start < b.end;
        prop_assert_eq!(result.has_conflicts, expected);
    }
}

// ---------------------------------------------------------------------------
// Property 6: slot search never returns an occupied or out-of-band slot
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_avoid_occupancy_and_respect_bands(
        bookings in prop::collection::vec(arb_interval(), 0..6),
        duration in 1i64..=12,
        part in prop::sample::select(DayPart::ALL.to_vec()),
    ) {
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let therapists = vec![Therapist { id: 1, name: "Anna".to_string(), active: true }];
        let appointments: Vec<Appointment> = bookings
            .iter()
            .enumerate()
            .map(|(i, iv)| Appointment {
                id: i as u64,
                therapist_id: 1,
                patient_id: 1,
                date: day,
                start_time: iv.start,
                end_time: iv.end,
                status: AppointmentStatus::Scheduled,
            })
            .collect();
        let context = SearchContext {
            therapists: &therapists,
            appointments: &appointments,
            ..SearchContext::default()
        };
        let request = SlotSearchRequest {
            range_from: day,
            range_to: day,
            duration_minutes: duration * 10,
            therapist_id: None,
            day_parts: vec![part],
            exclude_patient_id: None,
        };

        let response = search(&request, &context, &EngineConfig::default()).unwrap();

        for slot in response.slots_by_day.iter().flat_map(|d| &d.slots) {
            let iv = TimeInterval::new(slot.start_time, slot.end_time).unwrap();
            prop_assert_eq!(iv.duration_minutes(), duration * 10);
            prop_assert!(part.window().contains(&iv));
            for booked in &bookings {
                prop_assert!(!booked.overlaps(&iv), "{} overlaps booking {}", iv, booked);
            }
        }
    }
}
