use crate::calendar::{CalendarEvent, EventType, RecordStatus};
use crate::db;
use crate::ipc::error::{respond, store_err, HandlerErr};
use crate::ipc::handlers::semesters::load_semester;
use crate::ipc::helpers::{db_conn, now_ts, parse_bool, parse_date, required_i64, required_object};
use crate::ipc::types::{AppState, Request};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};

fn default_status() -> RecordStatus {
    RecordStatus::Active
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct EventInput {
    topic: String,
    date: NaiveDate,
    event_type: EventType,
    #[serde(default)]
    original_date: Option<NaiveDate>,
    #[serde(default = "default_status")]
    record_status: RecordStatus,
}

// originalDate is handled separately: absent keeps it, null clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPatch {
    topic: Option<String>,
    date: Option<NaiveDate>,
    event_type: Option<EventType>,
    record_status: Option<RecordStatus>,
}

const PATCH_KEYS: [&str; 5] = ["topic", "date", "eventType", "originalDate", "recordStatus"];

fn patch_original_date(patch: &Value) -> Result<Option<Option<NaiveDate>>, HandlerErr> {
    match patch.get("originalDate") {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Some(None)),
        Some(Value::String(s)) => Ok(Some(Some(parse_date(s, "originalDate")?))),
        Some(_) => Err(HandlerErr::new(
            "bad_params",
            "originalDate must be string or null",
        )),
    }
}

fn clean_topic(raw: &str) -> Result<String, HandlerErr> {
    let topic = raw.trim().to_string();
    if topic.is_empty() {
        return Err(HandlerErr::new("bad_params", "topic must not be empty"));
    }
    Ok(topic)
}

fn load_event(conn: &Connection, event_id: i64) -> Result<CalendarEvent, HandlerErr> {
    db::get_event(conn, event_id)
        .map_err(store_err("db_query_failed"))?
        .ok_or_else(|| {
            HandlerErr::new("not_found", "calendar event not found")
                .with_details(json!({ "eventId": event_id }))
        })
}

/// Events must sit on a day the semester calendar renders.
fn ensure_inside_semester(conn: &Connection, event: &CalendarEvent) -> Result<(), HandlerErr> {
    let semester = load_semester(conn, event.semester_id)?;
    if !semester.contains(event.date) {
        return Err(HandlerErr::new(
            "date_outside_semester",
            format!(
                "event date {} is outside semester {} ({}..={})",
                event.date, semester.id, semester.start_date, semester.end_date
            ),
        ));
    }
    Ok(())
}

fn events_list(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let semester_id = required_i64(params, "semesterId")?;
    let include_expired = parse_bool(params, "includeExpired", false)?;
    let conn = db_conn(state)?;
    load_semester(conn, semester_id)?;
    let events =
        db::list_events(conn, semester_id, include_expired).map_err(store_err("db_query_failed"))?;
    Ok(json!({ "events": events }))
}

fn events_create(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let semester_id = required_i64(params, "semesterId")?;
    let input: EventInput = required_object(params, "input")?;
    let conn = db_conn(state)?;

    let event = CalendarEvent {
        id: 0,
        semester_id,
        topic: clean_topic(&input.topic)?,
        date: input.date,
        event_type: input.event_type,
        original_date: input.original_date,
        record_status: input.record_status,
    };
    event.validate()?;
    ensure_inside_semester(conn, &event)?;

    let event_id = db::insert_event(conn, &event, &now_ts()).map_err(store_err("db_insert_failed"))?;
    tracing::info!(
        event_id,
        semester_id,
        date = %event.date,
        event_type = %event.event_type,
        "calendar event created"
    );
    Ok(json!({ "eventId": event_id }))
}

fn events_update(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let event_id = required_i64(params, "eventId")?;
    let Some(raw_patch) = params.get("patch").filter(|v| v.is_object()) else {
        return Err(HandlerErr::new("bad_params", "patch must be an object"));
    };
    if let Some(obj) = raw_patch.as_object() {
        if let Some(unknown) = obj.keys().find(|k| !PATCH_KEYS.contains(&k.as_str())) {
            return Err(HandlerErr::new(
                "bad_params",
                format!("unknown event field: {}", unknown),
            ));
        }
    }
    let patch: EventPatch = required_object(params, "patch")?;
    let original_date = patch_original_date(raw_patch)?;
    let conn = db_conn(state)?;

    let mut event = load_event(conn, event_id)?;
    if let Some(v) = patch.topic {
        event.topic = clean_topic(&v)?;
    }
    if let Some(v) = patch.date {
        event.date = v;
    }
    if let Some(v) = patch.event_type {
        event.event_type = v;
    }
    if let Some(v) = patch.record_status {
        event.record_status = v;
    }
    if let Some(v) = original_date {
        event.original_date = v;
    }
    event.validate()?;
    ensure_inside_semester(conn, &event)?;

    db::update_event(conn, &event, &now_ts()).map_err(store_err("db_update_failed"))?;
    Ok(json!({ "ok": true }))
}

fn events_expire(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let event_id = required_i64(params, "eventId")?;
    let conn = db_conn(state)?;
    if !db::expire_event(conn, event_id, &now_ts()).map_err(store_err("db_update_failed"))? {
        return Err(HandlerErr::new("not_found", "calendar event not found"));
    }
    Ok(json!({ "ok": true }))
}

fn events_delete(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let event_id = required_i64(params, "eventId")?;
    let conn = db_conn(state)?;
    if !db::delete_event(conn, event_id).map_err(store_err("db_delete_failed"))? {
        return Err(HandlerErr::new("not_found", "calendar event not found"));
    }
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "calendarEvents.list" => events_list(state, &req.params),
        "calendarEvents.create" => events_create(state, &req.params),
        "calendarEvents.update" => events_update(state, &req.params),
        "calendarEvents.expire" => events_expire(state, &req.params),
        "calendarEvents.delete" => events_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
