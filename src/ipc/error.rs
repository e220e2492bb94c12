use crate::calendar::CalendarError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Failure of a single handler, rendered into the error envelope by [`respond`].
#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<CalendarError> for HandlerErr {
    fn from(e: CalendarError) -> Self {
        HandlerErr::new(e.code(), e.to_string())
    }
}

/// Maps a store error to `code`, unless it carries a calendar validation error.
pub fn store_err(code: &'static str) -> impl FnOnce(anyhow::Error) -> HandlerErr {
    move |e| match e.downcast_ref::<CalendarError>() {
        Some(ce) => HandlerErr::from(ce.clone()),
        None => HandlerErr::new(code, format!("{e:#}")),
    }
}

pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => {
            tracing::debug!(id, code = e.code, message = %e.message, "request failed");
            e.response(id)
        }
    }
}
