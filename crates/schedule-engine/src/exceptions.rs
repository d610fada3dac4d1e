//! Cancellation exceptions attached to a series.
//!
//! A cancellation removes one occurrence date without touching the series
//! definition. Both operations validate against a fresh expansion, so a
//! cancellation can only ever point at a real occurrence.
//!
//! Each successful mutation bumps [`AppointmentSeries::version`]. The caller
//! persists the series with a compare-and-swap on that version; two requests
//! racing on the same series therefore cannot both commit against a stale
//! occurrence list.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::{AppointmentSeries, Cancellation, CancellationId};
use crate::occurrence::occurs_on;

/// Cancel the occurrence of `series` on `date`.
///
/// Cancelling an already-cancelled date returns the existing cancellation and
/// leaves the series untouched.
///
/// # Errors
///
/// Returns [`EngineError::NotAnOccurrence`] if the series does not occur on
/// `date`, or any validation error from expanding the series.
pub fn add_cancellation(series: &mut AppointmentSeries, date: NaiveDate) -> Result<Cancellation> {
    if !occurs_on(series, date)? {
        return Err(EngineError::NotAnOccurrence {
            series_id: series.id,
            date,
        });
    }

    if let Some(existing) = series.cancellation_on(date) {
        return Ok(*existing);
    }

    let cancellation = Cancellation {
        id: next_cancellation_id(series),
        date,
    };
    series.cancellations.push(cancellation);
    series.cancellations.sort_by_key(|c| c.date);
    series.version += 1;

    debug!(series_id = series.id, %date, cancellation_id = cancellation.id, "added cancellation");
    Ok(cancellation)
}

/// Remove the cancellation `cancellation_id` from `series`, restoring the
/// occurrence.
///
/// # Errors
///
/// Returns [`EngineError::NotFound`] if the id does not belong to the series.
pub fn remove_cancellation(
    series: &mut AppointmentSeries,
    cancellation_id: CancellationId,
) -> Result<Cancellation> {
    let position = series
        .cancellations
        .iter()
        .position(|c| c.id == cancellation_id)
        .ok_or_else(|| {
            EngineError::NotFound(format!(
                "cancellation {} on series {}",
                cancellation_id, series.id
            ))
        })?;

    let removed = series.cancellations.remove(position);
    series.version += 1;

    debug!(series_id = series.id, cancellation_id, "removed cancellation");
    Ok(removed)
}

/// Cancellations whose dates the series no longer produces, e.g. after the
/// weekday or frequency was edited. Callers decide whether to drop them.
pub fn orphaned_cancellations(series: &AppointmentSeries) -> Result<Vec<Cancellation>> {
    let mut orphans = Vec::new();
    for cancellation in &series.cancellations {
        if !occurs_on(series, cancellation.date)? {
            orphans.push(*cancellation);
        }
    }
    Ok(orphans)
}

fn next_cancellation_id(series: &AppointmentSeries) -> CancellationId {
    series
        .cancellations
        .iter()
        .map(|c| c.id)
        .max()
        .map_or(1, |max| max + 1)
}
