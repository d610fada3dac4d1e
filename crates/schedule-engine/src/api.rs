//! Request handlers for the engine's JSON-facing shapes.
//!
//! A [`Dataset`] is whatever the persistence layer loaded: therapists,
//! bookings, series, absences and holidays. Each handler resolves the ids a
//! request names against it and delegates to the pure engine modules.
//! All dates are `YYYY-MM-DD`; all times are emitted as `HH:MM:SS`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::blackout::{Absence, Holiday};
use crate::conflict::{
    check, find_conflict_clusters, occupancy_from_series, Candidate, ConflictCluster,
    ConflictResult, OccupiedInterval,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::model::{
    Appointment, AppointmentSeries, CancellationId, SeriesId, Therapist, TherapistId,
};
use crate::occurrence::generate;
use crate::slots::{search, SearchContext, SlotSearchRequest, SlotSearchResponse};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    pub therapists: Vec<Therapist>,
    pub appointments: Vec<Appointment>,
    pub series: Vec<AppointmentSeries>,
    pub absences: Vec<Absence>,
    pub holidays: Vec<Holiday>,
}

impl Dataset {
    pub fn context(&self) -> SearchContext<'_> {
        SearchContext {
            therapists: &self.therapists,
            appointments: &self.appointments,
            series: &self.series,
            absences: &self.absences,
            holidays: &self.holidays,
        }
    }

    pub fn series_by_id(&self, id: SeriesId) -> Result<&AppointmentSeries> {
        self.series
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("series {}", id)))
    }

    /// Every booking in `[from, to]` as occupied intervals: standalone
    /// appointments of any status plus non-cancelled ACTIVE series occurrences.
    /// Records outside the range are never materialized.
    pub fn occupancy(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<OccupiedInterval>> {
        self.occupancy_where(from, to, |_| true)
    }

    /// Like [`Dataset::occupancy`], restricted to one therapist.
    pub fn therapist_occupancy(
        &self,
        therapist_id: TherapistId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OccupiedInterval>> {
        self.occupancy_where(from, to, |id| id == therapist_id)
    }

    fn occupancy_where(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        therapist: impl Fn(TherapistId) -> bool,
    ) -> Result<Vec<OccupiedInterval>> {
        let mut occupied = self
            .appointments
            .iter()
            .filter(|a| therapist(a.therapist_id) && from <= a.date && a.date <= to)
            .map(OccupiedInterval::from_appointment)
            .collect::<Result<Vec<_>>>()?;
        let series = self.series.iter().filter(|s| therapist(s.therapist_id));
        occupied.extend(occupancy_from_series(series, from, to)?);
        Ok(occupied)
    }
}

// ── Occurrence query ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceQuery {
    pub series_id: SeriesId,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceView {
    pub date: NaiveDate,
    pub is_cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_id: Option<CancellationId>,
}

pub fn query_occurrences(dataset: &Dataset, query: &OccurrenceQuery) -> Result<Vec<OccurrenceView>> {
    let series = dataset.series_by_id(query.series_id)?;
    let occurrences = generate(series, query.window_start, query.window_end)?;
    Ok(occurrences
        .into_iter()
        .map(|o| OccurrenceView {
            date: o.date,
            is_cancelled: o.is_cancelled,
            cancellation_id: o.cancellation_id,
        })
        .collect())
}

// ── Conflict check ──────────────────────────────────────────────────────────

/// Check a proposed booking against everything booked for that therapist on
/// that date.
pub fn check_conflicts(dataset: &Dataset, candidate: &Candidate) -> Result<ConflictResult> {
    let existing =
        dataset.therapist_occupancy(candidate.therapist_id, candidate.date, candidate.date)?;
    check(candidate, &existing)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanRequest {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Scan every booking in `[from, to]` for conflict clusters.
pub fn scan_conflicts(dataset: &Dataset, request: &ScanRequest) -> Result<Vec<ConflictCluster>> {
    let ScanRequest { from, to } = *request;
    if to < from {
        return Err(EngineError::InvalidRange(format!(
            "scan range ends on {} before it starts on {}",
            to, from
        )));
    }
    Ok(find_conflict_clusters(&dataset.occupancy(from, to)?))
}

// ── Slot search ─────────────────────────────────────────────────────────────

pub fn search_slots(
    dataset: &Dataset,
    request: &SlotSearchRequest,
    config: &EngineConfig,
) -> Result<SlotSearchResponse> {
    search(request, &dataset.context(), config)
}
