//! SQL Server row/param conversion and connection setup, grounded in the
//! teacher's `engine/drivers/sqlserver.rs`.
//!
//! Tiberius has no query-builder type analogous to `sqlx::query::Query`; a
//! [`tiberius::Query`] is built fresh per call and bound positionally, the
//! same shape the teacher uses for its ad-hoc `conn.query(sql, &[..])`
//! calls. Unlike the teacher, placeholders here are driven entirely by our
//! own `?` convention rather than T-SQL's native `@P1`/`@P2`;
//! [`positional_placeholders`] rewrites `?` into `@Pn` before the SQL
//! reaches tiberius.

use std::time::Duration;

use bb8::Pool;
use bb8_tiberius::ConnectionManager;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use ormcraft_core::{OrmError, OrmResult, RowView, Value};

pub(crate) type MssqlPool = Pool<ConnectionManager>;
pub(crate) type MssqlClient = Client<Compat<TcpStream>>;

pub(crate) fn build_config(host: &str, port: u16, user: &str, password: &str, database: &str, ssl: bool) -> Config {
    let mut config = Config::new();
    config.host(host);
    config.port(port);
    config.authentication(AuthMethod::sql_server(user, password));
    if !database.is_empty() {
        config.database(database);
    }
    config.encryption(if ssl { EncryptionLevel::Required } else { EncryptionLevel::NotSupported });
    config.trust_cert();
    config
}

pub(crate) async fn create_pool(config: Config, max_size: u32, acquire_timeout: Duration) -> OrmResult<MssqlPool> {
    let manager = ConnectionManager::new(config);
    Pool::builder()
        .max_size(max_size)
        .connection_timeout(acquire_timeout)
        .build(manager)
        .await
        .map_err(|e| OrmError::execution(format!("failed to build SQL Server pool: {e}")))
}

pub(crate) async fn connect_raw(config: Config) -> OrmResult<MssqlClient> {
    let tcp = TcpStream::connect(config.get_addr())
        .await
        .map_err(|e| OrmError::execution(format!("failed to connect to SQL Server: {e}")))?;
    tcp.set_nodelay(true).ok();
    Client::connect(config, tcp.compat_write())
        .await
        .map_err(|e| OrmError::execution(format!("failed to open SQL Server session: {e}")))
}

/// Rewrites this crate's `?` placeholder convention into T-SQL's `@P1..@Pn`.
pub(crate) fn positional_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut n = 0usize;
    for ch in sql.chars() {
        if ch == '?' {
            n += 1;
            out.push_str(&format!("@P{n}"));
        } else {
            out.push(ch);
        }
    }
    out
}

pub(crate) fn bind_args<'a>(query: &mut Query<'a>, args: &'a [Value]) {
    for arg in args {
        match arg {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::UInt(u) => query.bind(*u as i64),
            Value::Float(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
            Value::Decimal(d) => query.bind(d.to_string()),
        }
    }
}

pub(crate) fn row_to_view(row: &tiberius::Row) -> RowView {
    let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    let values: Vec<Value> = (0..columns.len()).map(|i| extract_value(row, i)).collect();
    RowView::new(columns, values)
}

fn extract_value(row: &tiberius::Row, idx: usize) -> Value {
    use tiberius::ColumnData;
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return v.map(Value::Int).unwrap_or(Value::Null);
    }
    if let Ok(Some(v)) = row.try_get::<i32, _>(idx) {
        return Value::Int(v as i64);
    }
    if let Ok(Some(v)) = row.try_get::<i16, _>(idx) {
        return Value::Int(v as i64);
    }
    if let Ok(Some(v)) = row.try_get::<u8, _>(idx) {
        return Value::Int(v as i64);
    }
    if let Ok(Some(v)) = row.try_get::<bool, _>(idx) {
        return Value::Bool(v);
    }
    if let Ok(Some(v)) = row.try_get::<f64, _>(idx) {
        return Value::Float(v);
    }
    if let Ok(Some(v)) = row.try_get::<f32, _>(idx) {
        return Value::Float(v as f64);
    }
    if let Ok(Some(v)) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
        return Value::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string());
    }
    if let Ok(Some(v)) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx) {
        return Value::Text(v.to_rfc3339());
    }
    if let Ok(Some(v)) = row.try_get::<chrono::NaiveDate, _>(idx) {
        return Value::Text(v.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(v)) = row.try_get::<&str, _>(idx) {
        return Value::Text(v.to_string());
    }
    if let Ok(Some(v)) = row.try_get::<&[u8], _>(idx) {
        return Value::Bytes(v.to_vec());
    }
    match row.cells().nth(idx).map(|(_, d)| d) {
        Some(ColumnData::Guid(Some(g))) => Value::Text(g.to_string()),
        _ => Value::Null,
    }
}
