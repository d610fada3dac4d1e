//! Scheduling records consumed by the engine.
//!
//! These are the shapes the persistence layer hands over. The engine reads
//! them and never writes them back, apart from the cancellation list of a
//! series (see [`crate::exceptions`]).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::calendar::{wall_clock, TimeInterval, Weekday};
use crate::error::{EngineError, Result};

pub type SeriesId = u64;
pub type AppointmentId = u64;
pub type TherapistId = u64;
pub type PatientId = u64;
pub type CancellationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeriesStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Whether an appointment in this status blocks the therapist's time.
    pub fn occupies_time(self) -> bool {
        self != AppointmentStatus::Cancelled
    }
}

/// One occurrence date removed from a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cancellation {
    pub id: CancellationId,
    pub date: NaiveDate,
}

/// A recurring appointment template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSeries {
    pub id: SeriesId,
    pub therapist_id: TherapistId,
    pub patient_id: PatientId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekday: Weekday,
    /// Weeks between occurrences; 1 means every week.
    pub weekly_frequency: u32,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: SeriesStatus,
    #[serde(default)]
    pub cancellations: Vec<Cancellation>,
    /// Bumped on every cancellation-list mutation; the persistence layer
    /// compares it to serialize concurrent edits.
    #[serde(default)]
    pub version: u64,
}

impl AppointmentSeries {
    /// Check the series definition.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInterval`] if `weekly_frequency` is zero,
    /// `start_time >= end_time`, or `start_date > end_date`.
    pub fn validate(&self) -> Result<()> {
        if self.weekly_frequency == 0 {
            return Err(EngineError::InvalidInterval(format!(
                "series {} has a weekly frequency of 0",
                self.id
            )));
        }
        if self.start_date > self.end_date {
            return Err(EngineError::InvalidInterval(format!(
                "series {} starts on {} after it ends on {}",
                self.id, self.start_date, self.end_date
            )));
        }
        self.interval().map(|_| ())
    }

    /// The time-of-day interval shared by every occurrence.
    pub fn interval(&self) -> Result<TimeInterval> {
        TimeInterval::new(self.start_time, self.end_time)
    }

    pub fn is_active(&self) -> bool {
        self.status == SeriesStatus::Active
    }

    /// A series whose last date is before `today` is history: kept for
    /// display, never scheduled against.
    pub fn is_history(&self, today: NaiveDate) -> bool {
        self.end_date < today
    }

    pub fn cancellation_on(&self, date: NaiveDate) -> Option<&Cancellation> {
        self.cancellations.iter().find(|c| c.date == date)
    }
}

/// A single concrete booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub therapist_id: TherapistId,
    pub patient_id: PatientId,
    pub date: NaiveDate,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn interval(&self) -> Result<TimeInterval> {
        TimeInterval::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Therapist {
    pub id: TherapistId,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}
