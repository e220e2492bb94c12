use crate::calendar::{
    build_semester_calendar, classify_in_semester, teaching_week_of, week_monday, DayType,
    Semester, WeekData,
};
use crate::db;
use crate::ipc::error::{respond, store_err, HandlerErr};
use crate::ipc::handlers::semesters::load_semester;
use crate::ipc::handlers::setup::load_calendar_options;
use crate::ipc::helpers::{db_conn, required_date, required_i64};
use crate::ipc::types::{AppState, Request};
use chrono::NaiveDate;
use serde_json::{json, Map, Value};

fn week_json(week: &WeekData) -> Value {
    let mut counts = Map::new();
    for t in DayType::ALL {
        counts.insert(t.as_str().to_string(), Value::from(week.count(t)));
    }
    json!({
        "weekIndex": week.week_index,
        "startDate": week.first_date(),
        "endDate": week.last_date(),
        "counts": counts,
        "days": week.days,
    })
}

fn ensure_date_in(semester: &Semester, date: NaiveDate) -> Result<(), HandlerErr> {
    if semester.contains(date) {
        return Ok(());
    }
    Err(HandlerErr::new(
        "date_outside_semester",
        format!("date {} is outside the semester", date),
    )
    .with_details(json!({
        "semesterId": semester.id,
        "startDate": semester.start_date,
        "endDate": semester.end_date,
    })))
}

fn calendar_weeks(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let semester_id = required_i64(params, "semesterId")?;
    let conn = db_conn(state)?;
    let semester = load_semester(conn, semester_id)?;
    let events = db::list_events(conn, semester_id, false).map_err(store_err("db_query_failed"))?;
    let options = load_calendar_options(conn).map_err(store_err("db_query_failed"))?;

    let weeks = build_semester_calendar(&semester, &events, &options)?;
    let teaching_weeks = weeks.iter().filter(|w| w.week_index > 0).count();
    Ok(json!({
        "semester": semester,
        "teachingWeekCount": teaching_weeks,
        "weeks": weeks.iter().map(week_json).collect::<Vec<_>>(),
    }))
}

fn calendar_classify_day(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let semester_id = required_i64(params, "semesterId")?;
    let date = required_date(params, "date")?;
    let conn = db_conn(state)?;
    let semester = load_semester(conn, semester_id)?;
    semester.validate()?;
    let events = db::list_events(conn, semester_id, false).map_err(store_err("db_query_failed"))?;
    let options = load_calendar_options(conn).map_err(store_err("db_query_failed"))?;

    let day = classify_in_semester(date, &semester, &events, &options)?;
    Ok(json!({
        "day": day,
        "weekIndex": teaching_week_of(date, semester.first_teaching_date),
    }))
}

fn calendar_teaching_week(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let semester_id = required_i64(params, "semesterId")?;
    let date = required_date(params, "date")?;
    let conn = db_conn(state)?;
    let semester = load_semester(conn, semester_id)?;
    semester.validate()?;
    ensure_date_in(&semester, date)?;

    Ok(json!({
        "weekIndex": teaching_week_of(date, semester.first_teaching_date),
        "weekMonday": week_monday(date),
        "firstTeachingMonday": week_monday(semester.first_teaching_date),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "calendar.weeks" => calendar_weeks(state, &req.params),
        "calendar.classifyDay" => calendar_classify_day(state, &req.params),
        "calendar.teachingWeek" => calendar_teaching_week(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
