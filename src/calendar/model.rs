use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::CalendarError;

pub const DEFAULT_TOPIC_SEPARATOR: &str = " · ";
pub const DEFAULT_EXAM_WINDOW_DAYS: u32 = 5;

/// A semester as stored in the workspace. The calendar core never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Start of instructional week 1.
    pub first_teaching_date: NaiveDate,
    pub exam_start_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
}

impl Semester {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Checks `start <= end` and `start <= firstTeaching <= end`.
    ///
    /// `examStartDate >= firstTeachingDate` is assumed by the classifier but not
    /// enforced here.
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.start_date > self.end_date {
            return Err(CalendarError::InvertedSemester {
                semester_id: self.id,
                start: self.start_date,
                end: self.end_date,
            });
        }
        if !self.contains(self.first_teaching_date) {
            return Err(CalendarError::FirstTeachingOutsideSemester {
                semester_id: self.id,
                first_teaching: self.first_teaching_date,
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Holiday,
    Exam,
    Activity,
    HolidayMakeup,
    WeekdaySwap,
    SportsMeet,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Holiday => "HOLIDAY",
            EventType::Exam => "EXAM",
            EventType::Activity => "ACTIVITY",
            EventType::HolidayMakeup => "HOLIDAY_MAKEUP",
            EventType::WeekdaySwap => "WEEKDAY_SWAP",
            EventType::SportsMeet => "SPORTS_MEET",
        }
    }

    /// Swap and makeup events borrow another date's schedule.
    pub fn is_reschedule(self) -> bool {
        matches!(self, EventType::WeekdaySwap | EventType::HolidayMakeup)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "HOLIDAY" => Ok(EventType::Holiday),
            "EXAM" => Ok(EventType::Exam),
            "ACTIVITY" => Ok(EventType::Activity),
            "HOLIDAY_MAKEUP" => Ok(EventType::HolidayMakeup),
            "WEEKDAY_SWAP" => Ok(EventType::WeekdaySwap),
            "SPORTS_MEET" => Ok(EventType::SportsMeet),
            other => Err(CalendarError::UnknownEventType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Active,
    ActiveTentative,
    Expiry,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Active => "ACTIVE",
            RecordStatus::ActiveTentative => "ACTIVE_TENTATIVE",
            RecordStatus::Expiry => "EXPIRY",
        }
    }

    pub fn is_active(self) -> bool {
        self != RecordStatus::Expiry
    }
}

impl FromStr for RecordStatus {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ACTIVE" => Ok(RecordStatus::Active),
            "ACTIVE_TENTATIVE" => Ok(RecordStatus::ActiveTentative),
            "EXPIRY" => Ok(RecordStatus::Expiry),
            other => Err(CalendarError::UnknownRecordStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: i64,
    pub semester_id: i64,
    pub topic: String,
    pub date: NaiveDate,
    pub event_type: EventType,
    /// Date whose schedule is borrowed. Only set on swap/makeup events.
    #[serde(default)]
    pub original_date: Option<NaiveDate>,
    pub record_status: RecordStatus,
}

impl CalendarEvent {
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.original_date.is_some() && !self.event_type.is_reschedule() {
            return Err(CalendarError::UnexpectedOriginalDate(self.event_type));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Normal,
    Weekend,
    Holiday,
    Special,
    Exam,
}

impl DayType {
    pub const ALL: [DayType; 5] = [
        DayType::Normal,
        DayType::Weekend,
        DayType::Holiday,
        DayType::Special,
        DayType::Exam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DayType::Normal => "normal",
            DayType::Weekend => "weekend",
            DayType::Holiday => "holiday",
            DayType::Special => "special",
            DayType::Exam => "exam",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterDay {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub day_type: DayType,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reschedule_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekData {
    /// 0 for the preparation period, then 1..N.
    pub week_index: u32,
    pub days: Vec<SemesterDay>,
}

impl WeekData {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }

    pub fn count(&self, day_type: DayType) -> usize {
        self.days.iter().filter(|d| d.day_type == day_type).count()
    }
}

/// Knobs a workspace may override. `Default` reproduces the fixed behaviour:
/// a 5-day exam window and `" · "` between topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarOptions {
    pub exam_window_days: u32,
    pub topic_separator: String,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            exam_window_days: DEFAULT_EXAM_WINDOW_DAYS,
            topic_separator: DEFAULT_TOPIC_SEPARATOR.to_string(),
        }
    }
}

impl CalendarOptions {
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.exam_window_days == 0 {
            return Err(CalendarError::EmptyExamWindow);
        }
        Ok(())
    }
}
