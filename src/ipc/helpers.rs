use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn db_conn(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn db_conn_mut(state: &mut AppState) -> Result<&mut Connection, HandlerErr> {
    state
        .db
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn required_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing integer {}", key)))
}

pub fn parse_date(raw: &str, key: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| HandlerErr::new("bad_params", format!("{} must be YYYY-MM-DD", key)))
}

pub fn required_date(params: &Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    parse_date(&required_str(params, key)?, key)
}

pub fn parse_bool(params: &Value, key: &str, default: bool) -> Result<bool, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_bool()
            .ok_or_else(|| HandlerErr::new("bad_params", format!("{} must be boolean", key))),
    }
}

/// Deserializes `params[key]` into `T`, reporting serde's message as `bad_params`.
pub fn required_object<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, HandlerErr> {
    let Some(v) = params.get(key).filter(|v| v.is_object()) else {
        return Err(HandlerErr::new("bad_params", format!("{} must be an object", key)));
    };
    serde_json::from_value(v.clone())
        .map_err(|e| HandlerErr::new("bad_params", format!("invalid {}: {}", key, e)))
}

pub fn now_ts() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
