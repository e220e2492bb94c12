use crate::calendar::{CalendarOptions, DEFAULT_EXAM_WINDOW_DAYS, DEFAULT_TOPIC_SEPARATOR};
use crate::db;
use crate::ipc::error::{respond, store_err, HandlerErr};
use crate::ipc::helpers::{db_conn, required_str};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::{json, Map, Value};

const MAX_EXAM_WINDOW_DAYS: i64 = 21;
const MAX_SEPARATOR_CHARS: usize = 8;

#[derive(Clone, Copy)]
enum SetupSection {
    Calendar,
}

impl SetupSection {
    const ALL: [SetupSection; 1] = [SetupSection::Calendar];

    fn parse(s: &str) -> Option<Self> {
        match s {
            "calendar" => Some(Self::Calendar),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Calendar => "setup.calendar",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Calendar => json!({
            "examWindowDays": DEFAULT_EXAM_WINDOW_DAYS,
            "topicSeparator": DEFAULT_TOPIC_SEPARATOR,
        }),
    }
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        match section {
            SetupSection::Calendar => match k.as_str() {
                "examWindowDays" => {
                    let n = v.as_i64().ok_or_else(|| format!("{} must be integer", k))?;
                    if !(1..=MAX_EXAM_WINDOW_DAYS).contains(&n) {
                        return Err(format!("{} must be in 1..={}", k, MAX_EXAM_WINDOW_DAYS));
                    }
                    obj.insert(k.clone(), Value::from(n));
                }
                "topicSeparator" => {
                    // Surrounding spaces are part of the separator, so no trimming.
                    let s = v.as_str().ok_or_else(|| format!("{} must be string", k))?;
                    if s.is_empty() || s.chars().count() > MAX_SEPARATOR_CHARS {
                        return Err(format!(
                            "{} must be 1..={} characters",
                            k, MAX_SEPARATOR_CHARS
                        ));
                    }
                    obj.insert(k.clone(), Value::String(s.to_string()));
                }
                _ => return Err(format!("unknown calendar field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Malformed historical values fall back to defaults field by field.
            for (k, v) in saved_obj {
                let mut single = Map::new();
                single.insert(k.clone(), v.clone());
                if let Err(msg) = merge_section_patch(section, &mut current, &single) {
                    tracing::warn!(section = section.name(), %msg, "ignoring saved setting");
                }
            }
        }
    }
    Ok(current)
}

/// Calendar options for this workspace, defaults filled in.
pub(crate) fn load_calendar_options(conn: &Connection) -> anyhow::Result<CalendarOptions> {
    let section = load_section(conn, SetupSection::Calendar)?;
    let defaults = CalendarOptions::default();
    Ok(CalendarOptions {
        exam_window_days: section
            .get("examWindowDays")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(defaults.exam_window_days),
        topic_separator: section
            .get("topicSeparator")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or(defaults.topic_separator),
    })
}

fn setup_get(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = db_conn(state)?;
    let sections: Vec<SetupSection> = match params.get("section").and_then(|v| v.as_str()) {
        Some(raw) => vec![SetupSection::parse(raw)
            .ok_or_else(|| HandlerErr::new("bad_params", "unknown section"))?],
        None => SetupSection::ALL.to_vec(),
    };
    let mut out = Map::new();
    for section in sections {
        let value = load_section(conn, section).map_err(store_err("db_query_failed"))?;
        out.insert(section.name().to_string(), value);
    }
    Ok(Value::Object(out))
}

fn setup_update(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let conn = db_conn(state)?;
    let section_raw = required_str(params, "section")?;
    let section = SetupSection::parse(&section_raw)
        .ok_or_else(|| HandlerErr::new("bad_params", "unknown section"))?;
    let Some(patch) = params.get("patch").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::new("bad_params", "patch must be an object"));
    };

    let mut current = load_section(conn, section).map_err(store_err("db_query_failed"))?;
    merge_section_patch(section, &mut current, patch)
        .map_err(|msg| HandlerErr::new("bad_params", msg))?;
    db::settings_set_json(conn, section.key(), &current).map_err(store_err("db_update_failed"))?;
    let mut out = json!({ "ok": true });
    out[section.name()] = current;
    Ok(out)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "setup.get" => setup_get(state, &req.params),
        "setup.update" => setup_update(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
