use crate::calendar::Semester;
use crate::db;
use crate::ipc::error::{respond, store_err, HandlerErr};
use crate::ipc::helpers::{db_conn, db_conn_mut, required_i64, required_object};
use crate::ipc::types::{AppState, Request};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SemesterInput {
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    first_teaching_date: NaiveDate,
    exam_start_date: NaiveDate,
    #[serde(default)]
    is_current: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SemesterPatch {
    name: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    first_teaching_date: Option<NaiveDate>,
    exam_start_date: Option<NaiveDate>,
    is_current: Option<bool>,
}

impl SemesterPatch {
    fn apply(self, s: &mut Semester) {
        if let Some(v) = self.name {
            s.name = v;
        }
        if let Some(v) = self.start_date {
            s.start_date = v;
        }
        if let Some(v) = self.end_date {
            s.end_date = v;
        }
        if let Some(v) = self.first_teaching_date {
            s.first_teaching_date = v;
        }
        if let Some(v) = self.exam_start_date {
            s.exam_start_date = v;
        }
        if let Some(v) = self.is_current {
            s.is_current = v;
        }
    }
}

fn clean_name(raw: &str) -> Result<String, HandlerErr> {
    let name = raw.trim().to_string();
    if name.is_empty() {
        return Err(HandlerErr::new("bad_params", "name must not be empty"));
    }
    Ok(name)
}

pub(crate) fn load_semester(conn: &Connection, semester_id: i64) -> Result<Semester, HandlerErr> {
    db::get_semester(conn, semester_id)
        .map_err(store_err("db_query_failed"))?
        .ok_or_else(|| {
            HandlerErr::new("not_found", "semester not found")
                .with_details(json!({ "semesterId": semester_id }))
        })
}

/// Rejects a new date range that would leave stored events outside it.
fn ensure_events_inside(conn: &Connection, semester: &Semester) -> Result<(), HandlerErr> {
    let events = db::list_events(conn, semester.id, true).map_err(store_err("db_query_failed"))?;
    let stranded: Vec<i64> = events
        .iter()
        .filter(|e| !semester.contains(e.date))
        .map(|e| e.id)
        .collect();
    if stranded.is_empty() {
        return Ok(());
    }
    Err(HandlerErr::new(
        "date_outside_semester",
        format!(
            "{} event(s) fall outside {}..={}",
            stranded.len(),
            semester.start_date,
            semester.end_date
        ),
    )
    .with_details(json!({ "semesterId": semester.id, "eventIds": stranded })))
}

fn semesters_list(state: &AppState) -> Result<Value, HandlerErr> {
    let Some(conn) = state.db.as_ref() else {
        return Ok(json!({ "semesters": [] }));
    };
    let semesters = db::list_semesters(conn).map_err(store_err("db_query_failed"))?;
    Ok(json!({ "semesters": semesters }))
}

fn semesters_create(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let input: SemesterInput = required_object(params, "input")?;
    let semester = Semester {
        id: 0,
        name: clean_name(&input.name)?,
        start_date: input.start_date,
        end_date: input.end_date,
        first_teaching_date: input.first_teaching_date,
        exam_start_date: input.exam_start_date,
        is_current: input.is_current,
    };
    semester.validate()?;

    let conn = db_conn_mut(state)?;
    let semester_id = db::insert_semester(conn, &semester).map_err(store_err("db_insert_failed"))?;
    if semester.is_current {
        db::set_current_semester(conn, semester_id).map_err(store_err("db_update_failed"))?;
    }
    tracing::info!(semester_id, name = %semester.name, "semester created");
    Ok(json!({ "semesterId": semester_id }))
}

fn semesters_update(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let semester_id = required_i64(params, "semesterId")?;
    let patch: SemesterPatch = required_object(params, "patch")?;
    let conn = db_conn_mut(state)?;

    let mut semester = load_semester(conn, semester_id)?;
    let becomes_current = patch.is_current == Some(true);
    patch.apply(&mut semester);
    semester.name = clean_name(&semester.name)?;
    semester.validate()?;
    ensure_events_inside(conn, &semester)?;

    db::update_semester(conn, &semester).map_err(store_err("db_update_failed"))?;
    if becomes_current {
        db::set_current_semester(conn, semester_id).map_err(store_err("db_update_failed"))?;
    }
    Ok(json!({ "ok": true }))
}

fn semesters_delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let semester_id = required_i64(params, "semesterId")?;
    let conn = db_conn_mut(state)?;
    let deleted = db::delete_semester(conn, semester_id).map_err(store_err("db_delete_failed"))?;
    if !deleted {
        return Err(HandlerErr::new("not_found", "semester not found"));
    }
    tracing::info!(semester_id, "semester deleted");
    Ok(json!({ "ok": true }))
}

fn semesters_set_current(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let semester_id = required_i64(params, "semesterId")?;
    let conn = db_conn_mut(state)?;
    let found =
        db::set_current_semester(conn, semester_id).map_err(store_err("db_update_failed"))?;
    if !found {
        return Err(HandlerErr::new("not_found", "semester not found"));
    }
    Ok(json!({ "ok": true }))
}

fn semesters_open(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let semester_id = required_i64(params, "semesterId")?;
    let conn = db_conn(state)?;
    let semester = load_semester(conn, semester_id)?;
    Ok(json!({ "semester": semester }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "semesters.list" => semesters_list(state),
        "semesters.open" => semesters_open(state, &req.params),
        "semesters.create" => semesters_create(state, &req.params),
        "semesters.update" => semesters_update(state, &req.params),
        "semesters.delete" => semesters_delete(state, &req.params),
        "semesters.setCurrent" => semesters_set_current(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
