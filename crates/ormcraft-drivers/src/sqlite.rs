//! SQLite row/param conversion, sibling of [`crate::postgres`].
//!
//! SQLite has no native `DECIMAL`/`BOOLEAN` type (both are stored as
//! `INTEGER`/`TEXT` under the hood); the cascade here tries the integer and
//! boolean readings before falling through to text, matching how
//! `sqlx::sqlite` actually type-affines these columns.

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row};

use ormcraft_core::{OrmError, OrmResult, RowView, Value};

pub(crate) fn bind_param<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(i),
        Value::UInt(u) => query.bind(*u as i64),
        Value::Float(f) => query.bind(f),
        Value::Text(s) => query.bind(s),
        Value::Bytes(b) => query.bind(b),
        Value::Decimal(d) => query.bind(d.to_string()),
    }
}

fn extract_value(row: &SqliteRow, idx: usize) -> OrmResult<Value> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Ok(v.map(Value::Int).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return Ok(v.map(Value::Bool).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Ok(v.map(Value::Float).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        // SQLite has no DECIMAL affinity; decimal columns round-trip as TEXT
        // and come back out as `Value::Text`, same as any other string column.
        return Ok(v.map(Value::Text).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Ok(v.map(Value::Bytes).unwrap_or(Value::Null));
    }
    Err(OrmError::execution(format!(
        "column {:?} at index {idx} has no supported scalar decoding",
        row.columns().get(idx).map(|c| c.name())
    )))
}

pub(crate) fn row_to_view(row: &SqliteRow) -> OrmResult<RowView> {
    let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
    let mut values = Vec::with_capacity(row.columns().len());
    for idx in 0..row.columns().len() {
        values.push(extract_value(row, idx)?);
    }
    Ok(RowView::new(columns, values))
}
