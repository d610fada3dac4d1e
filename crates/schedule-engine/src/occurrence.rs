//! Series expansion: turns a recurring series into the concrete dates it
//! occurs on inside a window.
//!
//! Expansion is the single source of occurrence dates. It always returns the
//! full tagged list, cancelled dates included, sorted ascending. Views such as
//! "only upcoming, non-cancelled" are plain filters over that list
//! ([`active_dates`], [`upcoming`]) so no consumer re-implements the stepping.
//!
//! Series that are paused, cancelled or completed still expand. Availability
//! and conflict callers filter to active series themselves.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::debug;

use crate::calendar::{align_forward, step_weeks, wall_clock};
use crate::error::{EngineError, Result};
use crate::model::{AppointmentSeries, CancellationId, PatientId, SeriesId, TherapistId};

/// One date on which a series occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub series_id: SeriesId,
    pub therapist_id: TherapistId,
    pub patient_id: PatientId,
    pub date: NaiveDate,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    pub is_cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_id: Option<CancellationId>,
}

/// Expand `series` over `[window_start, window_end]`.
///
/// The result is restricted to the intersection of the window with
/// `[series.start_date, series.end_date]` and sorted by date. Consecutive
/// dates are exactly `7 * weekly_frequency` days apart, anchored on the first
/// matching weekday on or after `start_date`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInterval`] if the series definition is
/// invalid (see [`AppointmentSeries::validate`]) and
/// [`EngineError::InvalidRange`] if `window_end < window_start`.
pub fn generate(
    series: &AppointmentSeries,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<Vec<Occurrence>> {
    series.validate()?;
    if window_end < window_start {
        return Err(EngineError::InvalidRange(format!(
            "window ends on {} before it starts on {}",
            window_end, window_start
        )));
    }

    let first = align_forward(series.start_date, series.weekday);
    if first > series.end_date {
        return Ok(Vec::new());
    }

    let lower = series.start_date.max(window_start);
    let upper = series.end_date.min(window_end);

    let mut occurrences = Vec::new();
    let mut current = first;
    while current <= upper {
        if current >= lower {
            occurrences.push(occurrence_on(series, current));
        }
        match step_weeks(current, series.weekly_frequency) {
            Some(next) => current = next,
            None => break,
        }
    }

    debug!(
        series_id = series.id,
        %window_start,
        %window_end,
        count = occurrences.len(),
        "expanded series"
    );

    Ok(occurrences)
}

/// Whether `date` is one of the series' occurrence dates (cancelled or not).
pub fn occurs_on(series: &AppointmentSeries, date: NaiveDate) -> Result<bool> {
    Ok(!generate(series, date, date)?.is_empty())
}

fn occurrence_on(series: &AppointmentSeries, date: NaiveDate) -> Occurrence {
    let cancellation = series.cancellation_on(date);
    Occurrence {
        series_id: series.id,
        therapist_id: series.therapist_id,
        patient_id: series.patient_id,
        date,
        start_time: series.start_time,
        end_time: series.end_time,
        is_cancelled: cancellation.is_some(),
        cancellation_id: cancellation.map(|c| c.id),
    }
}

/// Non-cancelled occurrences, in input order.
pub fn active_dates(occurrences: &[Occurrence]) -> impl Iterator<Item = &Occurrence> {
    occurrences.iter().filter(|o| !o.is_cancelled)
}

/// Non-cancelled occurrences on or after `today`, in input order.
pub fn upcoming(occurrences: &[Occurrence], today: NaiveDate) -> impl Iterator<Item = &Occurrence> {
    active_dates(occurrences).filter(move |o| o.date >= today)
}
