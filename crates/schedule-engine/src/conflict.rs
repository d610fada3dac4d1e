//! Detect overlapping bookings for a therapist.
//!
//! Everything here works on [`OccupiedInterval`] facts: concrete
//! therapist/date/time ranges materialized from standalone appointments and
//! from series occurrences. Two intervals conflict when
//! `a.start < b.end && b.start < a.end`; adjacent bookings (one ends exactly
//! when the next starts) are NOT conflicts.
//!
//! Detection is pure. Whether a caller books anyway after seeing conflicts is
//! the caller's policy and never influences what is reported here.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{wall_clock, TimeInterval};
use crate::error::Result;
use crate::model::{
    Appointment, AppointmentId, AppointmentSeries, AppointmentStatus, PatientId, SeriesId,
    TherapistId,
};
use crate::occurrence::{active_dates, generate};

/// Where an occupied interval comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OccupancyKind {
    /// A standalone appointment; `id` is the appointment id.
    Appointment,
    /// A series occurrence; `id` is the series id.
    SeriesOccurrence,
}

impl OccupancyKind {
    fn label(self) -> &'static str {
        match self {
            OccupancyKind::Appointment => "appointment",
            OccupancyKind::SeriesOccurrence => "series",
        }
    }
}

/// A concrete block of a therapist's time on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupiedInterval {
    pub id: u64,
    pub kind: OccupancyKind,
    pub therapist_id: TherapistId,
    pub patient_id: PatientId,
    pub date: NaiveDate,
    pub interval: TimeInterval,
    pub status: AppointmentStatus,
}

impl OccupiedInterval {
    pub fn from_appointment(appointment: &Appointment) -> Result<Self> {
        Ok(Self {
            id: appointment.id,
            kind: OccupancyKind::Appointment,
            therapist_id: appointment.therapist_id,
            patient_id: appointment.patient_id,
            date: appointment.date,
            interval: appointment.interval()?,
            status: appointment.status,
        })
    }

    pub fn occupies_time(&self) -> bool {
        self.status.occupies_time()
    }
}

/// Materialize standalone appointments, all statuses included.
pub fn occupancy_from_appointments(appointments: &[Appointment]) -> Result<Vec<OccupiedInterval>> {
    appointments
        .iter()
        .map(OccupiedInterval::from_appointment)
        .collect()
}

/// Materialize the non-cancelled occurrences of every ACTIVE series inside
/// `[from, to]`. Series whose date range misses the window are skipped
/// without validation.
pub fn occupancy_from_series<'a>(
    series: impl IntoIterator<Item = &'a AppointmentSeries>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<OccupiedInterval>> {
    let mut occupied = Vec::new();
    let in_range = |s: &AppointmentSeries| s.start_date <= to && from <= s.end_date;
    for s in series.into_iter().filter(|s| s.is_active() && in_range(s)) {
        let interval = s.interval()?;
        let occurrences = generate(s, from, to)?;
        occupied.extend(active_dates(&occurrences).map(|o| OccupiedInterval {
            id: s.id,
            kind: OccupancyKind::SeriesOccurrence,
            therapist_id: s.therapist_id,
            patient_id: s.patient_id,
            date: o.date,
            interval,
            status: AppointmentStatus::Scheduled,
        }));
    }
    Ok(occupied)
}

// ── Pairwise check ──────────────────────────────────────────────────────────

/// A proposed booking to test against existing occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub therapist_id: TherapistId,
    pub date: NaiveDate,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    /// The appointment being edited, ignored so it does not conflict with itself.
    #[serde(default)]
    pub exclude_appointment_id: Option<AppointmentId>,
    /// The series being edited, ignored for the same reason.
    #[serde(default)]
    pub exclude_series_id: Option<SeriesId>,
}

/// One overlap found for a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub conflicting_appointment_id: u64,
    pub kind: OccupancyKind,
    pub message: String,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    pub overlap_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResult {
    pub has_conflicts: bool,
    pub conflicts: Vec<Conflict>,
}

impl ConflictResult {
    fn from_conflicts(conflicts: Vec<Conflict>) -> Self {
        Self {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
        }
    }
}

/// Test `candidate` against `existing`.
///
/// Entries for other therapists or dates, cancelled entries and the
/// candidate's own excluded appointment/series are ignored. Conflicts are
/// reported in the scan order of `existing`.
///
/// # Errors
///
/// Returns [`crate::EngineError::InvalidInterval`] if the candidate's
/// `start_time >= end_time`.
pub fn check(candidate: &Candidate, existing: &[OccupiedInterval]) -> Result<ConflictResult> {
    let proposed = TimeInterval::new(candidate.start_time, candidate.end_time)?;

    let conflicts: Vec<Conflict> = existing
        .iter()
        .filter(|o| o.therapist_id == candidate.therapist_id && o.date == candidate.date)
        .filter(|o| o.occupies_time())
        .filter(|o| !is_excluded(candidate, o))
        .filter(|o| proposed.overlaps(&o.interval))
        .map(|o| {
            let overlap_start = proposed.start.max(o.interval.start);
            let overlap_end = proposed.end.min(o.interval.end);
            Conflict {
                conflicting_appointment_id: o.id,
                kind: o.kind,
                message: format!(
                    "Overlaps {} {} on {} ({})",
                    o.kind.label(),
                    o.id,
                    o.date,
                    o.interval
                ),
                start_time: o.interval.start,
                end_time: o.interval.end,
                overlap_minutes: (overlap_end - overlap_start).num_minutes(),
            }
        })
        .collect();

    debug!(
        therapist_id = candidate.therapist_id,
        date = %candidate.date,
        conflicts = conflicts.len(),
        "checked candidate"
    );

    Ok(ConflictResult::from_conflicts(conflicts))
}

fn is_excluded(candidate: &Candidate, occupied: &OccupiedInterval) -> bool {
    let excluded_id = match occupied.kind {
        OccupancyKind::Appointment => candidate.exclude_appointment_id,
        OccupancyKind::SeriesOccurrence => candidate.exclude_series_id,
    };
    excluded_id == Some(occupied.id)
}

/// Conflicts found for one occurrence date of a proposed series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceConflicts {
    pub date: NaiveDate,
    pub result: ConflictResult,
}

/// Check every non-cancelled occurrence of `series` inside the window.
///
/// The series' own occurrences in `existing` are excluded, so an edited
/// series can be checked against occupancy that still contains its old form.
/// Only dates with at least one conflict are returned, date-ascending.
pub fn check_series(
    series: &AppointmentSeries,
    window_start: NaiveDate,
    window_end: NaiveDate,
    existing: &[OccupiedInterval],
) -> Result<Vec<OccurrenceConflicts>> {
    let occurrences = generate(series, window_start, window_end)?;
    let mut found = Vec::new();
    for occurrence in active_dates(&occurrences) {
        let candidate = Candidate {
            therapist_id: series.therapist_id,
            date: occurrence.date,
            start_time: series.start_time,
            end_time: series.end_time,
            exclude_appointment_id: None,
            exclude_series_id: Some(series.id),
        };
        let result = check(&candidate, existing)?;
        if result.has_conflicts {
            found.push(OccurrenceConflicts {
                date: occurrence.date,
                result,
            });
        }
    }
    Ok(found)
}

// ── Batch discovery ─────────────────────────────────────────────────────────

/// Identifies one member of a conflict cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMember {
    pub id: u64,
    pub kind: OccupancyKind,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
}

/// A chain of mutually overlapping bookings for one therapist on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCluster {
    pub therapist_id: TherapistId,
    pub date: NaiveDate,
    pub members: Vec<ClusterMember>,
}

/// Find every group of overlapping bookings in `existing`.
///
/// Entries are grouped by `(therapist, date)`, sorted by start time, and swept
/// once while tracking the furthest end seen so far: an entry starting
/// strictly before that end joins the running cluster. Touching endpoints do
/// not join. Clusters are returned ordered by therapist id, then date, then
/// first start time; members within a cluster are start-ascending.
pub fn find_conflict_clusters(existing: &[OccupiedInterval]) -> Vec<ConflictCluster> {
    let mut groups: BTreeMap<(TherapistId, NaiveDate), Vec<&OccupiedInterval>> = BTreeMap::new();
    for occupied in existing.iter().filter(|o| o.occupies_time()) {
        groups
            .entry((occupied.therapist_id, occupied.date))
            .or_default()
            .push(occupied);
    }

    let mut clusters = Vec::new();
    for ((therapist_id, date), mut group) in groups {
        group.sort_by_key(|o| (o.interval.start, o.interval.end, o.kind, o.id));

        let mut current: Vec<ClusterMember> = Vec::new();
        let mut reach: Option<NaiveTime> = None;
        for occupied in group {
            let end = occupied.interval.end;
            reach = match reach {
                Some(r) if occupied.interval.start < r => Some(r.max(end)),
                Some(_) => {
                    flush_cluster(&mut clusters, therapist_id, date, &mut current);
                    Some(end)
                }
                None => Some(end),
            };
            current.push(ClusterMember {
                id: occupied.id,
                kind: occupied.kind,
                start_time: occupied.interval.start,
                end_time: occupied.interval.end,
            });
        }
        flush_cluster(&mut clusters, therapist_id, date, &mut current);
    }

    debug!(clusters = clusters.len(), "scanned for conflict clusters");
    clusters
}

fn flush_cluster(
    clusters: &mut Vec<ConflictCluster>,
    therapist_id: TherapistId,
    date: NaiveDate,
    current: &mut Vec<ClusterMember>,
) {
    let members = std::mem::take(current);
    if members.len() > 1 {
        clusters.push(ConflictCluster {
            therapist_id,
            date,
            members,
        });
    }
}
