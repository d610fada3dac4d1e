//! Error types for schedule-engine operations.
//!
//! Every variant is a caller-input error. The engine holds no state, so there
//! is no recoverable/fatal split: a request is either answered or rejected
//! with one of these reasons.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid weekday: {0:?}")]
    InvalidWeekday(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Not an occurrence: {date} is not produced by series {series_id}")]
    NotAnOccurrence { series_id: u64, date: NaiveDate },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid date: {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid time: {0:?} (expected HH:MM or HH:MM:SS)")]
    InvalidTime(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
