//! Postgres row/param conversion, grounded in the teacher's
//! `engine/drivers/postgres_utils.rs` `bind_param`/`extract_value` pair.
//! `Value` here is closed over relational scalars only (no `Json`/`Array`
//! arm), so the cascading `try_get` ladder is considerably shorter than the
//! teacher's.

use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row};

use ormcraft_core::{OrmError, OrmResult, RowView, Value};

/// Rewrites this crate's `?` placeholder convention into Postgres's
/// `$1..$n`. SQLite and MySQL accept `?` natively, so only Postgres and
/// SQL Server (see [`crate::sqlserver::positional_placeholders`]) need this.
pub(crate) fn dollar_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut n = 0usize;
    for ch in sql.chars() {
        if ch == '?' {
            n += 1;
            out.push('$');
            out.push_str(&n.to_string());
        } else {
            out.push(ch);
        }
    }
    out
}

pub(crate) fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(b),
        Value::Int(i) => query.bind(i),
        Value::UInt(u) => query.bind(*u as i64),
        Value::Float(f) => query.bind(f),
        Value::Text(s) => query.bind(s),
        Value::Bytes(b) => query.bind(b),
        Value::Decimal(d) => query.bind(d),
    }
}

fn extract_value(row: &PgRow, idx: usize) -> OrmResult<Value> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Ok(v.map(Value::Int).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return Ok(v.map(|i| Value::Int(i as i64)).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return Ok(v.map(|i| Value::Int(i as i64)).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return Ok(v.map(Value::Bool).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Ok(v.map(Value::Float).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<Decimal>, _>(idx) {
        return Ok(v.map(Value::Decimal).unwrap_or(Value::Null));
    }
    // Postgres sends `uuid` columns in a binary format `String` cannot
    // decode directly (unlike MySQL/SQLite, which store it as text/blob);
    // try the dedicated type before falling through to the string cascade.
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(idx) {
        return Ok(v.map(|u| Value::Text(u.to_string())).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return Ok(v.map(Value::Text).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Ok(v.map(Value::Bytes).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return Ok(v.map(|dt| Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string())).unwrap_or(Value::Null));
    }
    Err(OrmError::execution(format!(
        "column {:?} at index {idx} has no supported scalar decoding",
        row.columns().get(idx).map(|c| c.name())
    )))
}

pub(crate) fn row_to_view(row: &PgRow) -> OrmResult<RowView> {
    let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
    let mut values = Vec::with_capacity(row.columns().len());
    for idx in 0..row.columns().len() {
        values.push(extract_value(row, idx)?);
    }
    Ok(RowView::new(columns, values))
}
