//! Calendar primitives shared by every other module.
//!
//! Dates are naive calendar dates local to the practice and times are naive
//! wall-clock times. Nothing here knows about time zones: stepping a series
//! by N weeks is plain `7 * N` day arithmetic.
//!
//! - [`Weekday`] — the single internal weekday representation
//! - [`normalize_weekday`] — canonicalize free-form weekday input
//! - [`align_forward`] / [`step_weeks`] — the two date moves recurrence needs
//! - [`TimeInterval`] — a validated half-open `[start, end)` wall-clock range
//! - [`wall_clock`] — serde adapter for `HH:MM` / `HH:MM:SS` times

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, Result};

// ── Weekday ─────────────────────────────────────────────────────────────────

/// Day of the week. Serialized as the upper-case English name (`"MONDAY"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Canonical enum name.
    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "MONDAY",
            Weekday::Tuesday => "TUESDAY",
            Weekday::Wednesday => "WEDNESDAY",
            Weekday::Thursday => "THURSDAY",
            Weekday::Friday => "FRIDAY",
            Weekday::Saturday => "SATURDAY",
            Weekday::Sunday => "SUNDAY",
        }
    }

    /// Weekday of a calendar date.
    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    fn num_days_from_monday(self) -> u32 {
        chrono::Weekday::from(self).num_days_from_monday()
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl From<Weekday> for chrono::Weekday {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        normalize_weekday(s)
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        normalize_weekday(&raw).map_err(serde::de::Error::custom)
    }
}

/// Canonicalize a weekday token.
///
/// Accepts, case-insensitively and ignoring surrounding whitespace or a
/// trailing period:
/// - the canonical enum names (`MONDAY` … `SUNDAY`),
/// - English abbreviations (`Mon`, `Tue`/`Tues`, `Wed`, `Thu`/`Thurs`, `Fri`, `Sat`, `Sun`)
///   and the two-letter iCalendar codes (`MO` … `SU`),
/// - German names and abbreviations (`Montag`/`Mo`, `Dienstag`/`Di`,
///   `Mittwoch`/`Mi`, `Donnerstag`/`Do`, `Freitag`/`Fr`, `Samstag`/`Sonnabend`/`Sa`,
///   `Sonntag`/`So`).
///
/// Numeric codes are rejected: they are ambiguous between Monday-based and
/// Sunday-based numbering.
///
/// # Errors
///
/// Returns [`EngineError::InvalidWeekday`] for anything else.
pub fn normalize_weekday(input: &str) -> Result<Weekday> {
    let token = input.trim().trim_end_matches('.').to_lowercase();
    let day = match token.as_str() {
        "monday" | "mon" | "mo" | "montag" => Weekday::Monday,
        "tuesday" | "tue" | "tues" | "tu" | "dienstag" | "di" => Weekday::Tuesday,
        "wednesday" | "wed" | "we" | "mittwoch" | "mi" => Weekday::Wednesday,
        "thursday" | "thu" | "thur" | "thurs" | "th" | "donnerstag" | "do" => Weekday::Thursday,
        "friday" | "fri" | "fr" | "freitag" => Weekday::Friday,
        "saturday" | "sat" | "sa" | "samstag" | "sonnabend" => Weekday::Saturday,
        "sunday" | "sun" | "su" | "sonntag" | "so" => Weekday::Sunday,
        _ => return Err(EngineError::InvalidWeekday(input.to_string())),
    };
    Ok(day)
}

// ── Date moves ──────────────────────────────────────────────────────────────

/// Smallest date `>= from` that falls on `target`.
pub fn align_forward(from: NaiveDate, target: Weekday) -> NaiveDate {
    let current = Weekday::of(from).num_days_from_monday();
    let wanted = target.num_days_from_monday();
    let days_ahead = (wanted + 7 - current) % 7;
    from + Duration::days(days_ahead as i64)
}

/// `date` advanced by `weeks * 7` days, or `None` past the last
/// representable date.
pub fn step_weeks(date: NaiveDate, weeks: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(weeks) * 7))
}

// ── Parsing ─────────────────────────────────────────────────────────────────

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidDate(input.to_string()))
}

/// Parse a wall-clock time given as `HH:MM` or `HH:MM:SS`.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| EngineError::InvalidTime(input.to_string()))
}

/// Serde adapter for wall-clock times: reads `HH:MM` or `HH:MM:SS`, always
/// writes `HH:MM:SS`.
///
/// ```
/// use chrono::NaiveTime;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct At {
///     #[serde(with = "schedule_engine::calendar::wall_clock")]
///     time: NaiveTime,
/// }
///
/// let at: At = serde_json::from_str(r#"{"time":"09:30"}"#).unwrap();
/// assert_eq!(serde_json::to_string(&at).unwrap(), r#"{"time":"09:30:00"}"#);
/// ```
pub mod wall_clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

// ── TimeInterval ────────────────────────────────────────────────────────────

const MINUTES_PER_DAY: i64 = 24 * 60;

/// A half-open wall-clock interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    #[serde(with = "wall_clock")]
    pub start: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end: NaiveTime,
}

#[derive(Deserialize)]
struct RawInterval {
    #[serde(with = "wall_clock")]
    start: NaiveTime,
    #[serde(with = "wall_clock")]
    end: NaiveTime,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = EngineError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        TimeInterval::new(raw.start, raw.end)
    }
}

impl TimeInterval {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInterval`] unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(EngineError::InvalidInterval(format!(
                "start time {} is not before end time {}",
                start.format("%H:%M:%S"),
                end.format("%H:%M:%S")
            )));
        }
        Ok(Self { start, end })
    }

    /// Interval of `minutes` starting at `start`, or `None` if it would run
    /// past midnight or `minutes` is not positive.
    pub fn starting_at(start: NaiveTime, minutes: i64) -> Option<Self> {
        if minutes <= 0 || minutes >= MINUTES_PER_DAY {
            return None;
        }
        let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(minutes));
        if wrapped != 0 || end <= start {
            return None;
        }
        Some(Self { start, end })
    }

    /// Half-open overlap: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}
