//! Practice-level settings for slot search.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::calendar::TimeInterval;
use crate::error::{EngineError, Result};

/// Engine settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Bookable hours of the practice day.
    pub working_hours: TimeInterval,
    /// Granularity of candidate start times, in minutes.
    pub slot_step_minutes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            working_hours: TimeInterval {
                start: hm(7, 0),
                end: hm(20, 0),
            },
            slot_step_minutes: 10,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInterval`] for a zero step or inverted
    /// working hours.
    pub fn validate(&self) -> Result<()> {
        if self.slot_step_minutes == 0 {
            return Err(EngineError::InvalidInterval(
                "slot step must be at least one minute".to_string(),
            ));
        }
        TimeInterval::new(self.working_hours.start, self.working_hours.end)?;
        Ok(())
    }
}

pub(crate) fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}
