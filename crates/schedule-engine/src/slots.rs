//! Free-slot search across therapists and days.
//!
//! For every `(day, therapist)` pair the occupied intervals are materialized
//! once, from standalone appointments plus ACTIVE series occurrences, and then
//! reused for every candidate start time on that day. Candidates step through
//! the working hours at the configured granularity and survive when they fit
//! inside working hours, overlap nothing (half-open, as in
//! [`crate::conflict`]) and, if day-part filters are given, lie entirely
//! within one of the requested bands.
//!
//! Output order is part of the contract: days ascend, and within a day slots
//! are ordered by start time, then therapist name.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blackout::{is_absent, is_holiday, Absence, Holiday};
use crate::calendar::{wall_clock, TimeInterval};
use crate::config::{hm, EngineConfig};
use crate::conflict::{occupancy_from_series, OccupiedInterval};
use crate::error::{EngineError, Result};
use crate::model::{Appointment, AppointmentSeries, PatientId, Therapist, TherapistId};

// ── Day parts ───────────────────────────────────────────────────────────────

/// Fixed local-time bands of the working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayPart {
    /// 07:00-10:00
    Morning,
    /// 10:00-12:00
    LateMorning,
    /// 12:00-16:00
    Afternoon,
    /// 16:00-20:00
    Evening,
}

impl DayPart {
    pub const ALL: [DayPart; 4] = [
        DayPart::Morning,
        DayPart::LateMorning,
        DayPart::Afternoon,
        DayPart::Evening,
    ];

    pub fn window(self) -> TimeInterval {
        let (start, end) = match self {
            DayPart::Morning => (hm(7, 0), hm(10, 0)),
            DayPart::LateMorning => (hm(10, 0), hm(12, 0)),
            DayPart::Afternoon => (hm(12, 0), hm(16, 0)),
            DayPart::Evening => (hm(16, 0), hm(20, 0)),
        };
        TimeInterval { start, end }
    }

    /// The band a time of day falls into, if any.
    pub fn of(time: NaiveTime) -> Option<DayPart> {
        DayPart::ALL.into_iter().find(|part| {
            let window = part.window();
            window.start <= time && time < window.end
        })
    }
}

// ── Request / response ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSearchRequest {
    pub range_from: NaiveDate,
    pub range_to: NaiveDate,
    pub duration_minutes: i64,
    #[serde(default)]
    pub therapist_id: Option<TherapistId>,
    /// Empty means every part of the day.
    #[serde(default)]
    pub day_parts: Vec<DayPart>,
    /// Treat this patient's own bookings as free, for rebooking.
    #[serde(default)]
    pub exclude_patient_id: Option<PatientId>,
}

impl SlotSearchRequest {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRange`] if the range is inverted or the
    /// duration is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.range_to < self.range_from {
            return Err(EngineError::InvalidRange(format!(
                "search range ends on {} before it starts on {}",
                self.range_to, self.range_from
            )));
        }
        if self.duration_minutes <= 0 {
            return Err(EngineError::InvalidRange(format!(
                "slot duration must be positive, got {} minutes",
                self.duration_minutes
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub therapist_id: TherapistId,
    pub therapist_name: String,
    pub date: NaiveDate,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    pub day_part: Option<DayPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSearchResponse {
    pub slots_by_day: Vec<DaySlots>,
    pub total_slots_found: usize,
}

/// Borrowed view of everything slot search reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchContext<'a> {
    pub therapists: &'a [Therapist],
    pub appointments: &'a [Appointment],
    pub series: &'a [AppointmentSeries],
    pub absences: &'a [Absence],
    pub holidays: &'a [Holiday],
}

// ── Search ──────────────────────────────────────────────────────────────────

/// Enumerate free slots for `request`.
///
/// Holidays skip the whole day and absences skip the therapist for that day.
/// Days without any free slot are omitted from the response.
///
/// # Errors
///
/// - [`EngineError::InvalidRange`] for an inverted range or non-positive duration
/// - [`EngineError::InvalidInterval`] for an invalid config or malformed booking
/// - [`EngineError::NotFound`] if the therapist filter names an unknown therapist
pub fn search(
    request: &SlotSearchRequest,
    context: &SearchContext<'_>,
    config: &EngineConfig,
) -> Result<SlotSearchResponse> {
    config.validate()?;
    request.validate()?;

    let therapists = therapists_in_scope(request, context.therapists)?;
    let occupancy = build_occupancy(request, context, &therapists)?;
    let step = Duration::minutes(config.slot_step_minutes as i64);

    let mut response = SlotSearchResponse::default();
    let days = request
        .range_from
        .iter_days()
        .take_while(|day| *day <= request.range_to);

    for day in days {
        if is_holiday(context.holidays, day) {
            continue;
        }

        let mut slots = Vec::new();
        for therapist in &therapists {
            if is_absent(context.absences, therapist.id, day) {
                continue;
            }
            let busy = occupancy
                .get(&(therapist.id, day))
                .map(Vec::as_slice)
                .unwrap_or_default();
            for interval in free_candidates(request, config, step, busy) {
                slots.push(Slot {
                    therapist_id: therapist.id,
                    therapist_name: therapist.name.clone(),
                    date: day,
                    start_time: interval.start,
                    end_time: interval.end,
                    day_part: DayPart::of(interval.start),
                });
            }
        }

        if slots.is_empty() {
            continue;
        }
        slots.sort_by(|a, b| {
            (a.start_time, &a.therapist_name, a.therapist_id).cmp(&(
                b.start_time,
                &b.therapist_name,
                b.therapist_id,
            ))
        });
        response.total_slots_found += slots.len();
        response.slots_by_day.push(DaySlots { date: day, slots });
    }

    debug!(
        range_from = %request.range_from,
        range_to = %request.range_to,
        therapists = therapists.len(),
        total = response.total_slots_found,
        "slot search finished"
    );

    Ok(response)
}

/// The single filtered therapist, or every active therapist, sorted by name.
fn therapists_in_scope<'a>(
    request: &SlotSearchRequest,
    therapists: &'a [Therapist],
) -> Result<Vec<&'a Therapist>> {
    let mut selected: Vec<&Therapist> = match request.therapist_id {
        Some(id) => {
            let therapist = therapists
                .iter()
                .find(|t| t.id == id)
                .ok_or_else(|| EngineError::NotFound(format!("therapist {}", id)))?;
            vec![therapist]
        }
        None => therapists.iter().filter(|t| t.active).collect(),
    };
    selected.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
    Ok(selected)
}

/// Occupied intervals per `(therapist, day)` across the whole range, built
/// in one pass so candidates never re-scan the booking lists.
fn build_occupancy(
    request: &SlotSearchRequest,
    context: &SearchContext<'_>,
    therapists: &[&Therapist],
) -> Result<HashMap<(TherapistId, NaiveDate), Vec<TimeInterval>>> {
    let in_scope = |o: &OccupiedInterval| {
        o.occupies_time()
            && request.exclude_patient_id != Some(o.patient_id)
            && therapists.iter().any(|t| t.id == o.therapist_id)
    };

    let mut occupancy: HashMap<(TherapistId, NaiveDate), Vec<TimeInterval>> = HashMap::new();

    for appointment in context
        .appointments
        .iter()
        .filter(|a| request.range_from <= a.date && a.date <= request.range_to)
    {
        let occupied = OccupiedInterval::from_appointment(appointment)?;
        if in_scope(&occupied) {
            occupancy
                .entry((occupied.therapist_id, occupied.date))
                .or_default()
                .push(occupied.interval);
        }
    }

    let series = context
        .series
        .iter()
        .filter(|s| therapists.iter().any(|t| t.id == s.therapist_id));
    let from_series = occupancy_from_series(series, request.range_from, request.range_to)?;
    for occupied in from_series.into_iter().filter(|o| in_scope(o)) {
        occupancy
            .entry((occupied.therapist_id, occupied.date))
            .or_default()
            .push(occupied.interval);
    }

    Ok(occupancy)
}

/// Candidate intervals of the requested duration that survive every filter.
fn free_candidates(
    request: &SlotSearchRequest,
    config: &EngineConfig,
    step: Duration,
    busy: &[TimeInterval],
) -> Vec<TimeInterval> {
    let working = config.working_hours;
    let mut free = Vec::new();
    let mut start = working.start;

    loop {
        let Some(candidate) = TimeInterval::starting_at(start, request.duration_minutes) else {
            break;
        };
        if !working.contains(&candidate) {
            break;
        }
        let clear = !busy.iter().any(|b| b.overlaps(&candidate));
        if clear && within_day_parts(&request.day_parts, &candidate) {
            free.push(candidate);
        }

        let (next, wrapped) = start.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        start = next;
    }

    free
}

fn within_day_parts(day_parts: &[DayPart], candidate: &TimeInterval) -> bool {
    day_parts.is_empty() || day_parts.iter().any(|p| p.window().contains(candidate))
}
