use chrono::{Datelike, Days, NaiveDate, Weekday};

use super::error::CalendarError;
use super::model::{CalendarEvent, CalendarOptions, DayType, EventType, Semester, SemesterDay};

const WEEKDAY_GLYPHS: [&str; 7] = ["一", "二", "三", "四", "五", "六", "日"];

/// CJK numeral for an ISO weekday, Monday = 一 .. Sunday = 日.
pub fn weekday_glyph(weekday: Weekday) -> &'static str {
    WEEKDAY_GLYPHS[weekday.num_days_from_monday() as usize]
}

/// `调 MM-DD 课(周X)` for the date whose schedule is borrowed.
pub fn reschedule_label(original: NaiveDate) -> String {
    format!(
        "调 {} 课(周{})",
        original.format("%m-%d"),
        weekday_glyph(original.weekday())
    )
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn in_exam_window(date: NaiveDate, exam_start: NaiveDate, window_days: u32) -> bool {
    if window_days == 0 || date < exam_start {
        return false;
    }
    match exam_start.checked_add_days(Days::new(u64::from(window_days - 1))) {
        Some(last) => date <= last,
        None => true,
    }
}

/// Classifies one day of `semester`. `CalendarOptions::default()` gives the
/// standard 5-day exam window and `" · "` topic separator.
///
/// Only events of this semester, on this date, and not `EXPIRY` take part.
/// The type is decided by priority `holiday > special > normal`, independent of
/// event order; a plain day with no events is `weekend` on Saturday/Sunday.
/// A `normal` day inside the exam window then becomes `exam`.
///
/// When several swap/makeup events sit on the same date, the first one in
/// `events` order supplies `rescheduleInfo`.
pub fn classify(
    date: NaiveDate,
    semester: &Semester,
    events: &[CalendarEvent],
    options: &CalendarOptions,
) -> SemesterDay {
    let active: Vec<&CalendarEvent> = events
        .iter()
        .filter(|e| e.semester_id == semester.id && e.date == date && e.record_status.is_active())
        .collect();

    let topic = active
        .iter()
        .map(|e| e.topic.as_str())
        .collect::<Vec<_>>()
        .join(&options.topic_separator);

    let reschedule_info = active
        .iter()
        .find(|e| e.event_type.is_reschedule() && e.original_date.is_some())
        .and_then(|e| e.original_date)
        .map(reschedule_label);

    let has = |pred: fn(EventType) -> bool| active.iter().any(|e| pred(e.event_type));
    let mut day_type = if active.is_empty() {
        if is_weekend(date) {
            DayType::Weekend
        } else {
            DayType::Normal
        }
    } else if has(|t| t == EventType::Holiday) {
        DayType::Holiday
    } else if has(|t| matches!(t, EventType::SportsMeet | EventType::Activity)) {
        DayType::Special
    } else {
        DayType::Normal
    };

    if day_type == DayType::Normal
        && in_exam_window(date, semester.exam_start_date, options.exam_window_days)
    {
        day_type = DayType::Exam;
    }

    SemesterDay {
        date,
        day_type,
        topic,
        reschedule_info,
    }
}

/// Checked variant of [`classify`]: rejects dates outside the semester.
pub fn classify_in_semester(
    date: NaiveDate,
    semester: &Semester,
    events: &[CalendarEvent],
    options: &CalendarOptions,
) -> Result<SemesterDay, CalendarError> {
    if !semester.contains(date) {
        return Err(CalendarError::DateOutsideSemester {
            semester_id: semester.id,
            date,
            start: semester.start_date,
            end: semester.end_date,
        });
    }
    Ok(classify(date, semester, events, options))
}
