//! Whole-day blackouts: practice holidays and therapist absences.
//!
//! Absences follow the same shape as series (a weekday plus an optional date
//! window) but have no interval stepping and no exceptions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::Weekday;
use crate::model::TherapistId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbsenceRule {
    /// Every day in `[from, to]`.
    OneOff { from: NaiveDate, to: NaiveDate },
    /// Every `weekday`, optionally bounded.
    Recurring {
        weekday: Weekday,
        #[serde(default)]
        from: Option<NaiveDate>,
        #[serde(default)]
        until: Option<NaiveDate>,
    },
}

impl AbsenceRule {
    pub fn covers(&self, date: NaiveDate) -> bool {
        match self {
            AbsenceRule::OneOff { from, to } => *from <= date && date <= *to,
            AbsenceRule::Recurring {
                weekday,
                from,
                until,
            } => {
                Weekday::of(date) == *weekday
                    && from.is_none_or(|f| f <= date)
                    && until.is_none_or(|u| date <= u)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Absence {
    pub therapist_id: TherapistId,
    pub rule: AbsenceRule,
}

pub fn is_holiday(holidays: &[Holiday], date: NaiveDate) -> bool {
    holidays.iter().any(|h| h.date == date)
}

/// Whether `therapist_id` is absent for the whole of `date`.
pub fn is_absent(absences: &[Absence], therapist_id: TherapistId, date: NaiveDate) -> bool {
    absences
        .iter()
        .any(|a| a.therapist_id == therapist_id && a.rule.covers(date))
}
