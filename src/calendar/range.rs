use chrono::NaiveDate;

use super::classify::classify;
use super::error::CalendarError;
use super::model::{CalendarEvent, CalendarOptions, Semester, WeekData};
use super::partition::partition;

/// Every date of the semester, `start_date..=end_date`.
pub fn semester_dates(semester: &Semester) -> impl Iterator<Item = NaiveDate> {
    let end = semester.end_date;
    semester
        .start_date
        .iter_days()
        .take_while(move |date| *date <= end)
}

/// Classifies each semester date and groups the result into teaching weeks.
pub fn build_semester_calendar(
    semester: &Semester,
    events: &[CalendarEvent],
    options: &CalendarOptions,
) -> Result<Vec<WeekData>, CalendarError> {
    semester.validate()?;
    options.validate()?;
    if semester.exam_start_date < semester.first_teaching_date {
        tracing::warn!(
            semester_id = semester.id,
            exam_start = %semester.exam_start_date,
            first_teaching = %semester.first_teaching_date,
            "exam period starts before teaching"
        );
    }

    let days = semester_dates(semester).map(|date| classify(date, semester, events, options));
    let weeks = partition(days, semester.first_teaching_date);
    tracing::debug!(
        semester_id = semester.id,
        weeks = weeks.len(),
        events = events.len(),
        "built semester calendar"
    );
    Ok(weeks)
}
