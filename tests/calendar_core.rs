#[path = "../src/calendar/mod.rs"]
mod calendar;

use calendar::model::SemesterDay;
use calendar::partition::partition;
use calendar::range::semester_dates;
use calendar::{
    build_semester_calendar, classify_in_semester, teaching_week_of, CalendarError,
    CalendarEvent, CalendarOptions, DayType, EventType, RecordStatus, Semester,
};
use chrono::{Datelike, NaiveDate, Weekday};

fn classify(date: NaiveDate, semester: &Semester, events: &[CalendarEvent]) -> SemesterDay {
    calendar::classify::classify(date, semester, events, &CalendarOptions::default())
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
}

fn spring_2025() -> Semester {
    Semester {
        id: 42,
        name: "2024-2025学年第二学期".to_string(),
        start_date: d("2025-02-10"),
        end_date: d("2025-06-29"),
        first_teaching_date: d("2025-02-17"),
        exam_start_date: d("2025-05-26"),
        is_current: true,
    }
}

fn event(id: i64, date: &str, event_type: EventType, topic: &str) -> CalendarEvent {
    CalendarEvent {
        id,
        semester_id: 42,
        topic: topic.to_string(),
        date: d(date),
        event_type,
        original_date: None,
        record_status: RecordStatus::Active,
    }
}

fn swap(id: i64, date: &str, event_type: EventType, original: Option<&str>) -> CalendarEvent {
    CalendarEvent {
        original_date: original.map(d),
        ..event(id, date, event_type, "调课")
    }
}

#[test]
fn exam_window_monday_without_events_is_exam() {
    let sem = spring_2025();
    let day = classify(d("2025-05-26"), &sem, &[]);
    assert_eq!(day.day_type, DayType::Exam);
    assert_eq!(day.topic, "");
    assert_eq!(day.reschedule_info, None);
}

#[test]
fn weekday_swap_reports_borrowed_date() {
    let sem = spring_2025();
    let events = vec![swap(1, "2025-04-02", EventType::WeekdaySwap, Some("2025-04-03"))];
    let day = classify(d("2025-04-02"), &sem, &events);
    assert_eq!(day.reschedule_info.as_deref(), Some("调 04-03 课(周四)"));
    assert_eq!(day.day_type, DayType::Normal);
}

#[test]
fn weekday_holiday_is_holiday() {
    let sem = spring_2025();
    let events = vec![event(1, "2025-05-01", EventType::Holiday, "劳动节放假")];
    let day = classify(d("2025-05-01"), &sem, &events);
    assert_eq!(d("2025-05-01").weekday(), Weekday::Thu);
    assert_eq!(day.day_type, DayType::Holiday);
    assert!(day.topic.contains("劳动节放假"));
}

#[test]
fn holiday_beats_sports_meet_in_either_order() {
    let sem = spring_2025();
    let holiday = event(1, "2025-04-04", EventType::Holiday, "清明节");
    let meet = event(2, "2025-04-04", EventType::SportsMeet, "春季运动会");

    let a = classify(d("2025-04-04"), &sem, &[holiday.clone(), meet.clone()]);
    let b = classify(d("2025-04-04"), &sem, &[meet, holiday]);
    assert_eq!(a.day_type, DayType::Holiday);
    assert_eq!(b.day_type, DayType::Holiday);
    assert_eq!(a.topic, "清明节 · 春季运动会");
    assert_eq!(b.topic, "春季运动会 · 清明节");
}

#[test]
fn activity_on_weekday_is_special() {
    let sem = spring_2025();
    let events = vec![
        event(1, "2025-03-12", EventType::Activity, "植树活动"),
        event(2, "2025-03-12", EventType::Exam, "月考"),
    ];
    let day = classify(d("2025-03-12"), &sem, &events);
    assert_eq!(day.day_type, DayType::Special);
    assert_eq!(day.topic, "植树活动 · 月考");
}

#[test]
fn weekend_inside_exam_window_stays_weekend() {
    let mut sem = spring_2025();
    // Thursday start, so the five-day window spans a weekend.
    sem.exam_start_date = d("2025-05-29");
    assert_eq!(classify(d("2025-05-31"), &sem, &[]).day_type, DayType::Weekend);
    assert_eq!(classify(d("2025-06-01"), &sem, &[]).day_type, DayType::Weekend);
    assert_eq!(classify(d("2025-06-02"), &sem, &[]).day_type, DayType::Exam);
    assert_eq!(classify(d("2025-06-03"), &sem, &[]).day_type, DayType::Normal);
}

#[test]
fn holiday_inside_exam_window_stays_holiday() {
    let sem = spring_2025();
    let events = vec![event(1, "2025-05-30", EventType::Holiday, "端午节")];
    assert_eq!(
        classify(d("2025-05-30"), &sem, &events).day_type,
        DayType::Holiday
    );
    assert_eq!(classify(d("2025-05-29"), &sem, &events).day_type, DayType::Exam);
}

#[test]
fn makeup_sunday_is_a_normal_day() {
    let sem = spring_2025();
    let events = vec![swap(1, "2025-04-27", EventType::HolidayMakeup, Some("2025-05-05"))];
    let day = classify(d("2025-04-27"), &sem, &events);
    assert_eq!(day.day_type, DayType::Normal);
    assert_eq!(day.reschedule_info.as_deref(), Some("调 05-05 课(周一)"));
}

#[test]
fn expired_events_are_ignored_and_tentative_ones_count() {
    let sem = spring_2025();
    let mut expired = event(1, "2025-03-05", EventType::Holiday, "已取消");
    expired.record_status = RecordStatus::Expiry;
    let mut tentative = event(2, "2025-03-05", EventType::SportsMeet, "待定运动会");
    tentative.record_status = RecordStatus::ActiveTentative;

    let only_expired = classify(d("2025-03-05"), &sem, std::slice::from_ref(&expired));
    assert_eq!(only_expired.day_type, DayType::Normal);
    assert_eq!(only_expired.topic, "");

    let both = classify(d("2025-03-05"), &sem, &[expired, tentative]);
    assert_eq!(both.day_type, DayType::Special);
    assert_eq!(both.topic, "待定运动会");
}

#[test]
fn first_reschedule_event_in_input_order_wins() {
    let sem = spring_2025();
    let events = vec![
        swap(1, "2025-04-02", EventType::WeekdaySwap, None),
        swap(2, "2025-04-02", EventType::HolidayMakeup, Some("2025-04-07")),
        swap(3, "2025-04-02", EventType::WeekdaySwap, Some("2025-04-03")),
    ];
    let day = classify(d("2025-04-02"), &sem, &events);
    assert_eq!(day.reschedule_info.as_deref(), Some("调 04-07 课(周一)"));
}

#[test]
fn classification_is_idempotent() {
    let sem = spring_2025();
    let events = vec![
        event(1, "2025-04-04", EventType::Holiday, "清明节"),
        swap(2, "2025-04-02", EventType::WeekdaySwap, Some("2025-04-03")),
    ];
    for date in semester_dates(&sem) {
        assert_eq!(classify(date, &sem, &events), classify(date, &sem, &events));
    }
}

#[test]
fn checked_classify_rejects_dates_outside_semester() {
    let sem = spring_2025();
    let err = classify_in_semester(d("2025-07-01"), &sem, &[], &CalendarOptions::default())
        .expect_err("outside");
    assert!(matches!(err, CalendarError::DateOutsideSemester { .. }));
    assert!(
        classify_in_semester(d("2025-06-29"), &sem, &[], &CalendarOptions::default()).is_ok()
    );
}

#[test]
fn preparation_week_ends_before_first_teaching_monday() {
    let sem = spring_2025();
    let weeks = build_semester_calendar(&sem, &[], &CalendarOptions::default()).expect("build");

    assert_eq!(weeks[0].week_index, 0);
    assert_eq!(weeks[0].first_date(), Some(d("2025-02-10")));
    assert_eq!(weeks[0].last_date(), Some(d("2025-02-16")));
    assert_eq!(weeks[1].week_index, 1);
    assert_eq!(weeks[1].first_date(), Some(d("2025-02-17")));
}

#[test]
fn full_spring_semester_layout() {
    let sem = spring_2025();
    let weeks = build_semester_calendar(&sem, &[], &CalendarOptions::default()).expect("build");

    assert_eq!(weeks.len(), 20);
    let idx: Vec<u32> = weeks.iter().map(|w| w.week_index).collect();
    assert_eq!(idx, (0..20).collect::<Vec<u32>>());
    assert!(weeks.iter().all(|w| w.days.len() == 7));

    let exam_week = &weeks[15];
    assert_eq!(exam_week.first_date(), Some(d("2025-05-26")));
    assert_eq!(exam_week.count(DayType::Exam), 5);
    assert_eq!(exam_week.count(DayType::Weekend), 2);
    assert_eq!(teaching_week_of(d("2025-05-28"), sem.first_teaching_date), 15);
}

#[test]
fn partition_is_lossless_for_many_layouts() {
    let starts = ["2025-02-10", "2025-02-12", "2025-02-15", "2025-02-16", "2025-02-17"];
    let ends = ["2025-03-09", "2025-03-10", "2025-03-13", "2025-06-29"];
    for start in starts {
        for end in ends {
            let mut sem = spring_2025();
            sem.start_date = d(start);
            sem.end_date = d(end);
            sem.first_teaching_date = d("2025-02-17");
            let days: Vec<SemesterDay> = semester_dates(&sem)
                .map(|date| classify(date, &sem, &[]))
                .collect();

            let weeks = partition(days.clone(), sem.first_teaching_date);
            let total: usize = weeks.iter().map(|w| w.days.len()).sum();
            assert_eq!(total, days.len(), "{start}..{end}");
            let flat: Vec<SemesterDay> = weeks.into_iter().flat_map(|w| w.days).collect();
            assert_eq!(flat, days, "{start}..{end}");
        }
    }
}

#[test]
fn every_bucket_after_the_first_starts_on_monday() {
    let mut sem = spring_2025();
    sem.start_date = d("2025-02-13");
    let weeks = build_semester_calendar(&sem, &[], &CalendarOptions::default()).expect("build");
    assert_eq!(weeks[0].days.len(), 4);
    for w in weeks.iter().skip(1) {
        assert_eq!(w.days[0].date.weekday(), Weekday::Mon);
        assert!(w.days.len() <= 7);
    }
    for pair in weeks.windows(2) {
        assert_eq!(pair[1].week_index, pair[0].week_index + 1);
    }
}

#[test]
fn semester_days_serialize_with_wire_names() {
    let sem = spring_2025();
    let events = vec![swap(1, "2025-04-02", EventType::WeekdaySwap, Some("2025-04-03"))];
    let v = serde_json::to_value(classify(d("2025-04-02"), &sem, &events)).expect("json");
    assert_eq!(v["date"], "2025-04-02");
    assert_eq!(v["type"], "normal");
    assert_eq!(v["rescheduleInfo"], "调 04-03 课(周四)");

    let plain = serde_json::to_value(classify(d("2025-04-01"), &sem, &[])).expect("json");
    assert!(plain.get("rescheduleInfo").is_none());
}
