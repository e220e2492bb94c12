//! Semester calendar core: per-day classification and teaching-week grouping.
//!
//! Everything here is pure. Callers load [`Semester`] and [`CalendarEvent`]
//! records from the workspace and render the resulting [`WeekData`].

pub mod classify;
mod error;
pub mod model;
pub mod partition;
pub mod range;

pub use classify::classify_in_semester;
pub use error::CalendarError;
pub use model::{
    CalendarEvent, CalendarOptions, DayType, EventType, RecordStatus, Semester, WeekData,
    DEFAULT_EXAM_WINDOW_DAYS, DEFAULT_TOPIC_SEPARATOR,
};
pub use partition::{teaching_week_of, week_monday};
pub use range::build_semester_calendar;
