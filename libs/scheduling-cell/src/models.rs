use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// WEEKLY SCHEDULE MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sun => DayOfWeek::Sunday,
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
        }
    }

    /// Store index, 0 = Sunday through 6 = Saturday.
    pub fn index(&self) -> i32 {
        match self {
            DayOfWeek::Sunday => 0,
            DayOfWeek::Monday => 1,
            DayOfWeek::Tuesday => 2,
            DayOfWeek::Wednesday => 3,
            DayOfWeek::Thursday => 4,
            DayOfWeek::Friday => 5,
            DayOfWeek::Saturday => 6,
        }
    }

    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(DayOfWeek::Sunday),
            1 => Some(DayOfWeek::Monday),
            2 => Some(DayOfWeek::Tuesday),
            3 => Some(DayOfWeek::Wednesday),
            4 => Some(DayOfWeek::Thursday),
            5 => Some(DayOfWeek::Friday),
            6 => Some(DayOfWeek::Saturday),
            _ => None,
        }
    }
}

/// A contiguous working interval within one day, e.g. 09:00-12:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn is_degenerate(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub is_available: bool,
    pub windows: Vec<TimeWindow>,
}

impl DaySchedule {
    /// The fail-safe default: days with no configuration are closed.
    pub fn closed() -> Self {
        Self {
            is_available: false,
            windows: Vec::new(),
        }
    }
}

/// A professional's full weekly schedule, one entry per configured day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    pub days: HashMap<DayOfWeek, DaySchedule>,
}

impl WeeklyAvailability {
    pub fn from_rows(rows: Vec<ProfessionalAvailability>) -> Self {
        let mut days = HashMap::new();
        for row in rows {
            if let Some(day) = DayOfWeek::from_index(row.day_of_week) {
                days.insert(
                    day,
                    DaySchedule {
                        is_available: row.is_available,
                        windows: row.windows,
                    },
                );
            }
        }
        Self { days }
    }

    /// Resolve the working schedule for a calendar date. Unknown or
    /// unconfigured days resolve to closed.
    pub fn resolve(&self, date: NaiveDate) -> DaySchedule {
        self.days
            .get(&DayOfWeek::from_date(date))
            .cloned()
            .unwrap_or_else(DaySchedule::closed)
    }
}

/// Store row: one per professional per day-of-week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalAvailability {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub day_of_week: i32,
    pub is_available: bool,
    pub windows: Vec<TimeWindow>,
    pub updated_at: DateTime<Utc>,
}

// ==============================================================================
// SLOT COMPUTATION MODELS
// ==============================================================================

/// An already-booked interval for a professional on one date. Only active
/// (slot-blocking) appointments reach the overlap filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookedInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
}

impl AvailableSlot {
    pub fn from_start(start_time: DateTime<Utc>, duration_minutes: i32) -> Self {
        Self {
            start_time,
            end_time: start_time + Duration::minutes(duration_minutes as i64),
            duration_minutes,
        }
    }

    /// Wall-clock start label for UI slot buttons, "HH:MM".
    pub fn start_label(&self) -> String {
        self.start_time.format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub duration_minutes: i32,
    pub step_minutes: Option<i32>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertDayScheduleRequest {
    pub is_available: bool,
    pub windows: Vec<TimeWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayScheduleResponse {
    pub day: DayOfWeek,
    pub is_available: bool,
    pub windows: Vec<TimeWindow>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Service duration must be a positive number of minutes, got {0}")]
    InvalidDuration(i32),

    #[error("Slot step must be a positive number of minutes, got {0}")]
    InvalidStep(i32),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
