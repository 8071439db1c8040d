mod billing;
mod content;
mod domain;
mod lifecycle;
mod record;
mod tenant;

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};

use self::record::{Ordered, Record};
use super::Store;
use super::ordering;
use super::schema::SCHEMA;
use crate::error::{Error, Result};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }

    fn insert<R: Record>(&self, record: &R) -> Result<()> {
        insert_with(&self.conn(), record)
    }

    /// Assigns the next order in the record's scope and inserts it, under
    /// one lock so concurrent creates never share an order.
    fn insert_ordered<R: Ordered>(&self, record: &mut R) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let order = ordering::next_order(&tx, R::INDEX, record.scope_id())?;
        record.set_order(order);
        insert_with(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    fn find<R: Record>(&self, id: &str) -> Result<Option<R>> {
        self.find_by("id", id)
    }

    fn find_by<R: Record>(&self, column: &str, value: &str) -> Result<Option<R>> {
        let sql = format!("{} WHERE {column} = ?1", select_sql::<R>());
        self.conn()
            .query_row(&sql, [value], R::from_row)
            .optional()
            .map_err(Error::from)
    }

    /// Lists rows where `column = value`, sorted by `order_by`.
    fn list_by<R: Record>(&self, column: &str, value: &str, order_by: &str) -> Result<Vec<R>> {
        let sql = format!(
            "{} WHERE {column} = ?1 ORDER BY {order_by}",
            select_sql::<R>()
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([value], R::from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Rewrites every column of an existing row.
    fn save<R: Record>(&self, record: &R) -> Result<()> {
        save_with(&self.conn(), record)
    }

    fn remove<R: Record>(&self, id: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);
        let rows = self.conn().execute(&sql, [id])?;
        Ok(rows > 0)
    }
}

fn select_sql<R: Record>() -> String {
    format!("SELECT {} FROM {}", R::COLUMNS.join(", "), R::TABLE)
}

fn insert_with<R: Record>(conn: &Connection, record: &R) -> Result<()> {
    let placeholders: Vec<String> = (1..=R::COLUMNS.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::TABLE,
        R::COLUMNS.join(", "),
        placeholders.join(", ")
    );
    conn.execute(&sql, params_from_iter(record.values()))
        .map(|_| ())
        .map_err(unique_violation)
}

fn save_with<R: Record>(conn: &Connection, record: &R) -> Result<()> {
    // COLUMNS[0] is always `id`, bound as ?1.
    let assignments: Vec<String> = R::COLUMNS
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, col)| format!("{col} = ?{}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?1",
        R::TABLE,
        assignments.join(", ")
    );
    let rows = conn
        .execute(&sql, params_from_iter(record.values()))
        .map_err(unique_violation)?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

/// Like `save_with`, but only while `column` still holds `expected`.
/// A missing row is `NotFound`; a row that has moved on is `Conflict`.
fn save_guarded<R: Record>(
    conn: &Connection,
    record: &R,
    column: &str,
    expected: &str,
) -> Result<()> {
    let mut values = record.values();
    let assignments: Vec<String> = R::COLUMNS
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, col)| format!("{col} = ?{}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?1 AND {column} = ?{}",
        R::TABLE,
        assignments.join(", "),
        values.len() + 1
    );
    let id = values[0].clone();
    values.push(text(expected));

    let rows = conn
        .execute(&sql, params_from_iter(values))
        .map_err(unique_violation)?;
    if rows > 0 {
        return Ok(());
    }

    let exists: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", R::TABLE),
        [id],
        |row| row.get(0),
    )?;
    if exists {
        Err(Error::Conflict(format!(
            "{} row is no longer {expected}",
            R::TABLE
        )))
    } else {
        Err(Error::NotFound)
    }
}

/// Maps UNIQUE and PRIMARY KEY violations to `AlreadyExists`.
fn unique_violation(err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Error::AlreadyExists
        }
        _ => Error::from(err),
    }
}

pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

/// Fixed-width so that stored timestamps compare correctly as text.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// Column value builders

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn opt_text(s: Option<&str>) -> Value {
    s.map_or(Value::Null, text)
}

fn int(i: i64) -> Value {
    Value::Integer(i)
}

fn opt_int(i: Option<i64>) -> Value {
    i.map_or(Value::Null, Value::Integer)
}

fn flag(b: bool) -> Value {
    Value::Integer(i64::from(b))
}

fn time(dt: &DateTime<Utc>) -> Value {
    Value::Text(format_datetime(dt))
}

fn opt_time(dt: Option<&DateTime<Utc>>) -> Value {
    dt.map_or(Value::Null, time)
}

fn json(v: &serde_json::Value) -> Value {
    Value::Text(v.to_string())
}

fn label<T: std::fmt::Display>(v: T) -> Value {
    Value::Text(v.to_string())
}

// Row readers

fn get_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(parse_datetime(&row.get::<_, String>(idx)?))
}

fn get_opt_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .map(|s| parse_datetime(&s)))
}

fn get_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = Error>,
{
    let s: String = row.get(idx)?;
    s.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn get_json(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
