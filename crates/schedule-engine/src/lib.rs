//! # schedule-engine
//!
//! Deterministic recurrence and availability computation for a therapy
//! practice.
//!
//! The engine answers three questions from plain data: on which dates a
//! recurring series occurs, whether a proposed booking overlaps another one
//! for the same therapist, and which slots of a given length are still free.
//! It is pure and synchronous: inputs are borrowed, never mutated (except for
//! the cancellation list edited through [`exceptions`]), and the same inputs
//! always produce the same, stably ordered output.
//!
//! ## Modules
//!
//! - [`calendar`] — weekday canonicalization, week stepping, wall-clock intervals
//! - [`model`] — series, appointments, therapists
//! - [`occurrence`] — series → tagged list of occurrence dates
//! - [`exceptions`] — add/remove cancellations on a series
//! - [`conflict`] — overlap checks and batch conflict clusters
//! - [`blackout`] — holidays and therapist absences
//! - [`slots`] — free-slot search across therapists and days
//! - [`config`] — working hours and slot granularity
//! - [`api`] — dataset + request handlers for the JSON-facing shapes
//! - [`error`] — Error types

pub mod api;
pub mod blackout;
pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod exceptions;
pub mod model;
pub mod occurrence;
pub mod slots;

pub use api::Dataset;
pub use calendar::{align_forward, normalize_weekday, step_weeks, TimeInterval, Weekday};
pub use config::EngineConfig;
pub use conflict::{check, check_series, find_conflict_clusters, ConflictResult};
pub use error::EngineError;
pub use exceptions::{add_cancellation, remove_cancellation};
pub use model::{Appointment, AppointmentSeries, AppointmentStatus, SeriesStatus, Therapist};
pub use occurrence::{generate, Occurrence};
pub use slots::{search, DayPart, SlotSearchRequest, SlotSearchResponse};
