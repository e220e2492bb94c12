use crate::calendar::{CalendarEvent, EventType, RecordStatus, Semester};
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

pub const DB_FILE: &str = "educal.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS semesters(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            first_teaching_date TEXT NOT NULL,
            exam_start_date TEXT NOT NULL,
            is_current INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS calendar_events(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            semester_id INTEGER NOT NULL,
            topic TEXT NOT NULL,
            date TEXT NOT NULL,
            event_type TEXT NOT NULL,
            original_date TEXT,
            record_status TEXT NOT NULL DEFAULT 'ACTIVE',
            updated_at TEXT,
            FOREIGN KEY(semester_id) REFERENCES semesters(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_calendar_events_semester_date
         ON calendar_events(semester_id, date)",
        [],
    )?;

    // Early workspaces had no updated_at column on events.
    ensure_events_updated_at(&conn)?;

    Ok(conn)
}

fn ensure_events_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "calendar_events", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE calendar_events ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(
            serde_json::from_str(&s).with_context(|| format!("setting {key} is not valid JSON"))?,
        )),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_iso(raw: &str, column: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("column {column} holds a malformed date: {raw}"))
}

struct SemesterRow {
    id: i64,
    name: String,
    start_date: String,
    end_date: String,
    first_teaching_date: String,
    exam_start_date: String,
    is_current: bool,
}

const SEMESTER_COLUMNS: &str =
    "id, name, start_date, end_date, first_teaching_date, exam_start_date, is_current";

fn semester_row(r: &Row<'_>) -> rusqlite::Result<SemesterRow> {
    Ok(SemesterRow {
        id: r.get(0)?,
        name: r.get(1)?,
        start_date: r.get(2)?,
        end_date: r.get(3)?,
        first_teaching_date: r.get(4)?,
        exam_start_date: r.get(5)?,
        is_current: r.get::<_, i64>(6)? != 0,
    })
}

impl SemesterRow {
    fn into_semester(self) -> anyhow::Result<Semester> {
        Ok(Semester {
            id: self.id,
            name: self.name,
            start_date: parse_iso(&self.start_date, "start_date")?,
            end_date: parse_iso(&self.end_date, "end_date")?,
            first_teaching_date: parse_iso(&self.first_teaching_date, "first_teaching_date")?,
            exam_start_date: parse_iso(&self.exam_start_date, "exam_start_date")?,
            is_current: self.is_current,
        })
    }
}

pub fn list_semesters(conn: &Connection) -> anyhow::Result<Vec<Semester>> {
    let sql = format!("SELECT {SEMESTER_COLUMNS} FROM semesters ORDER BY start_date, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], semester_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(SemesterRow::into_semester).collect()
}

pub fn get_semester(conn: &Connection, semester_id: i64) -> anyhow::Result<Option<Semester>> {
    let sql = format!("SELECT {SEMESTER_COLUMNS} FROM semesters WHERE id = ?");
    let row = conn
        .query_row(&sql, [semester_id], semester_row)
        .optional()?;
    row.map(SemesterRow::into_semester).transpose()
}

/// Inserts `semester` (its `id` is ignored) and returns the new id.
pub fn insert_semester(conn: &Connection, semester: &Semester) -> anyhow::Result<i64> {
    semester.validate()?;
    conn.execute(
        "INSERT INTO semesters(name, start_date, end_date, first_teaching_date, exam_start_date, is_current)
         VALUES(?, ?, ?, ?, ?, ?)",
        params![
            semester.name,
            iso(semester.start_date),
            iso(semester.end_date),
            iso(semester.first_teaching_date),
            iso(semester.exam_start_date),
            semester.is_current as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_semester(conn: &Connection, semester: &Semester) -> anyhow::Result<()> {
    semester.validate()?;
    let changed = conn.execute(
        "UPDATE semesters
         SET name = ?, start_date = ?, end_date = ?, first_teaching_date = ?,
             exam_start_date = ?, is_current = ?
         WHERE id = ?",
        params![
            semester.name,
            iso(semester.start_date),
            iso(semester.end_date),
            iso(semester.first_teaching_date),
            iso(semester.exam_start_date),
            semester.is_current as i64,
            semester.id,
        ],
    )?;
    if changed == 0 {
        return Err(anyhow!("semester {} not found", semester.id));
    }
    Ok(())
}

/// Deletes a semester and its events. Returns false when nothing matched.
pub fn delete_semester(conn: &mut Connection, semester_id: i64) -> anyhow::Result<bool> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM calendar_events WHERE semester_id = ?",
        [semester_id],
    )?;
    let n = tx.execute("DELETE FROM semesters WHERE id = ?", [semester_id])?;
    tx.commit()?;
    Ok(n > 0)
}

/// Marks one semester current and clears the flag everywhere else.
pub fn set_current_semester(conn: &mut Connection, semester_id: i64) -> anyhow::Result<bool> {
    let tx = conn.transaction()?;
    let exists = tx
        .query_row("SELECT 1 FROM semesters WHERE id = ?", [semester_id], |r| {
            r.get::<_, i64>(0)
        })
        .optional()?
        .is_some();
    if exists {
        tx.execute("UPDATE semesters SET is_current = (id = ?)", [semester_id])?;
    }
    tx.commit()?;
    Ok(exists)
}

const EVENT_COLUMNS: &str =
    "id, semester_id, topic, date, event_type, original_date, record_status";

struct EventRow {
    id: i64,
    semester_id: i64,
    topic: String,
    date: String,
    event_type: String,
    original_date: Option<String>,
    record_status: String,
}

fn event_row(r: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: r.get(0)?,
        semester_id: r.get(1)?,
        topic: r.get(2)?,
        date: r.get(3)?,
        event_type: r.get(4)?,
        original_date: r.get(5)?,
        record_status: r.get(6)?,
    })
}

impl EventRow {
    fn into_event(self) -> anyhow::Result<CalendarEvent> {
        let original_date = match self.original_date.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(parse_iso(s, "original_date")?),
            _ => None,
        };
        Ok(CalendarEvent {
            id: self.id,
            semester_id: self.semester_id,
            topic: self.topic,
            date: parse_iso(&self.date, "date")?,
            event_type: self.event_type.parse::<EventType>()?,
            original_date,
            record_status: self.record_status.parse::<RecordStatus>()?,
        })
    }
}

/// Events of a semester ordered by date, then by insertion order.
///
/// Insertion order within a date matters: the classifier takes the first
/// swap/makeup event it meets.
pub fn list_events(
    conn: &Connection,
    semester_id: i64,
    include_expired: bool,
) -> anyhow::Result<Vec<CalendarEvent>> {
    let sql = if include_expired {
        format!("SELECT {EVENT_COLUMNS} FROM calendar_events WHERE semester_id = ? ORDER BY date, id")
    } else {
        format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_events
             WHERE semester_id = ? AND record_status <> 'EXPIRY'
             ORDER BY date, id"
        )
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([semester_id], event_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(EventRow::into_event).collect()
}

pub fn get_event(conn: &Connection, event_id: i64) -> anyhow::Result<Option<CalendarEvent>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM calendar_events WHERE id = ?");
    let row = conn.query_row(&sql, [event_id], event_row).optional()?;
    row.map(EventRow::into_event).transpose()
}

/// Inserts `event` (its `id` is ignored) and returns the new id.
pub fn insert_event(conn: &Connection, event: &CalendarEvent, now: &str) -> anyhow::Result<i64> {
    event.validate()?;
    conn.execute(
        "INSERT INTO calendar_events(semester_id, topic, date, event_type, original_date, record_status, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        params![
            event.semester_id,
            event.topic,
            iso(event.date),
            event.event_type.as_str(),
            event.original_date.map(iso),
            event.record_status.as_str(),
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_event(conn: &Connection, event: &CalendarEvent, now: &str) -> anyhow::Result<()> {
    event.validate()?;
    let changed = conn.execute(
        "UPDATE calendar_events
         SET topic = ?, date = ?, event_type = ?, original_date = ?, record_status = ?, updated_at = ?
         WHERE id = ?",
        params![
            event.topic,
            iso(event.date),
            event.event_type.as_str(),
            event.original_date.map(iso),
            event.record_status.as_str(),
            now,
            event.id,
        ],
    )?;
    if changed == 0 {
        return Err(anyhow!("calendar event {} not found", event.id));
    }
    Ok(())
}

pub fn expire_event(conn: &Connection, event_id: i64, now: &str) -> anyhow::Result<bool> {
    let n = conn.execute(
        "UPDATE calendar_events SET record_status = 'EXPIRY', updated_at = ? WHERE id = ?",
        (now, event_id),
    )?;
    Ok(n > 0)
}

pub fn delete_event(conn: &Connection, event_id: i64) -> anyhow::Result<bool> {
    let n = conn.execute("DELETE FROM calendar_events WHERE id = ?", [event_id])?;
    Ok(n > 0)
}
