//! Dialect abstraction and the process-wide dialect registry (§4.3, §4.4).
//!
//! Built-in dialects cover the four backends `ormcraft-drivers` ships a
//! real pool for: Postgres, MySQL, SQLite (all MySQL-family pagination),
//! and SQL Server (SQL-2008 pagination). Call [`registry::register_builtins`]
//! once at process start (the root facade does this in `Orm::connect`) to
//! make them available by name.

mod common;
pub mod dialect;
pub mod mysql;
pub mod postgres;
pub mod registry;
pub mod sqlite;
pub mod sqlserver;

pub use dialect::{ColumnSpec, Dialect, TableSpec};
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;
