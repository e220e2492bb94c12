use chrono::NaiveDate;

use super::model::EventType;

/// Precondition violations and malformed records rejected by the calendar core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// The semester ends before it starts.
    #[error("semester {semester_id} starts on {start} but ends on {end}")]
    InvertedSemester {
        semester_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// The first teaching date is not inside `[start, end]`.
    #[error("first teaching date {first_teaching} is outside semester {semester_id} ({start}..={end})")]
    FirstTeachingOutsideSemester {
        semester_id: i64,
        first_teaching: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// A date handed to the checked classifier is not inside the semester.
    #[error("date {date} is outside semester {semester_id} ({start}..={end})")]
    DateOutsideSemester {
        semester_id: i64,
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("unknown record status: {0}")]
    UnknownRecordStatus(String),

    /// `originalDate` was supplied on an event that does not borrow a schedule.
    #[error("originalDate is only allowed on WEEKDAY_SWAP and HOLIDAY_MAKEUP events, got {0}")]
    UnexpectedOriginalDate(EventType),

    #[error("exam window must cover at least one day")]
    EmptyExamWindow,
}

impl CalendarError {
    /// Error code used on the IPC wire.
    pub fn code(&self) -> &'static str {
        match self {
            CalendarError::InvertedSemester { .. }
            | CalendarError::FirstTeachingOutsideSemester { .. } => "invalid_semester",
            CalendarError::DateOutsideSemester { .. } => "date_outside_semester",
            _ => "bad_params",
        }
    }
}
