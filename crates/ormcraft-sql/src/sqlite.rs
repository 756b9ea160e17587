//! SQLite dialect: double-quoted identifiers (SQLite accepts either quote
//! style but `"` matches the marker grammar directly), MySQL-family
//! `LIMIT ? OFFSET ?` pagination, and a file-path basename as the database
//! name (SQLite has no server-side database concept).

use async_trait::async_trait;
use ormcraft_core::{Backend, OrmResult, SqlType, Value};

use crate::common::{render_add_missing_columns, render_create_table};
use crate::dialect::{ColumnSpec, Dialect, TableSpec};

pub struct SqliteDialect;

fn sql_type_for(col: &ColumnSpec) -> String {
    match col.sql_type {
        SqlType::TinyInt
        | SqlType::SmallInt
        | SqlType::Int
        | SqlType::BigInt
        | SqlType::UTinyInt
        | SqlType::USmallInt
        | SqlType::UInt
        | SqlType::UBigInt => {
            if col.is_ai {
                "INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
            } else {
                "INTEGER".to_string()
            }
        }
        SqlType::Float | SqlType::Double => "REAL".to_string(),
        SqlType::Decimal { .. } => "NUMERIC".to_string(),
        SqlType::Varchar(_) | SqlType::Text | SqlType::Uuid => "TEXT".to_string(),
        SqlType::Boolean => "BOOLEAN".to_string(),
        SqlType::Bytes => "BLOB".to_string(),
        SqlType::DateTime | SqlType::Date | SqlType::Time => "TEXT".to_string(),
    }
}

#[async_trait]
impl Dialect for SqliteDialect {
    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn db_name_from_dsn(&self, dsn: &str) -> OrmResult<String> {
        let path = dsn.split('?').next().unwrap_or(dsn);
        let base = path.rsplit('/').next().unwrap_or(path);
        let name = base.strip_suffix(".db").or_else(|| base.rsplit_once('.').map(|(n, _)| n)).unwrap_or(base);
        Ok(name.to_string())
    }

    fn limit_clause(&self, limit: u64, offset: u64) -> (String, Vec<Value>) {
        (
            " LIMIT ? OFFSET ? ".to_string(),
            vec![Value::UInt(limit), Value::UInt(offset)],
        )
    }

    fn supports_last_insert_id(&self) -> bool {
        true
    }

    fn sql_type_for(&self, col: &ColumnSpec) -> String {
        sql_type_for(col)
    }

    async fn create_table(&self, backend: &dyn Backend, table: &TableSpec) -> OrmResult<()> {
        let table_name = backend.replace_prefix(&table.name);
        let mut table = table.clone();
        table.name = table_name;
        // `INTEGER PRIMARY KEY AUTOINCREMENT` already declares the primary
        // key inline; a trailing `PRIMARY KEY(...)` clause for the same
        // column would be a second PK definition, which SQLite rejects.
        if table.columns.iter().any(|c| c.is_ai) {
            table.primary_key.clear();
        }

        let rows = backend
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                &[Value::Text(table.name.clone())],
            )
            .await?;

        if rows.is_empty() {
            let sql = render_create_table(&table, self.quote_chars(), sql_type_for);
            backend.exec(&sql, &[]).await?;
            return Ok(());
        }

        let pragma = backend
            .query(&format!("PRAGMA table_info({})", quote(&table.name)), &[])
            .await?;
        let existing: Vec<String> = pragma
            .iter()
            .filter_map(|r| r.get("name"))
            .filter_map(|v| ormcraft_core::convert::<String>(v).ok())
            .collect();
        for stmt in render_add_missing_columns(&table, &existing, self.quote_chars(), sql_type_for) {
            backend.exec(&stmt, &[]).await?;
        }
        Ok(())
    }
}

fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_name_is_file_basename_without_extension() {
        let d = SqliteDialect;
        assert_eq!(d.db_name_from_dsn("/var/data/orders.db").unwrap(), "orders");
        assert_eq!(d.db_name_from_dsn("orders.sqlite3?mode=rwc").unwrap(), "orders");
    }

    #[test]
    fn autoincrement_forces_integer_primary_key() {
        let col = ColumnSpec {
            name: "id".to_string(),
            sql_type: SqlType::Int,
            is_ai: true,
            nullable: false,
        };
        assert_eq!(sql_type_for(&col), "INTEGER PRIMARY KEY AUTOINCREMENT");
    }

    /// A fake `Backend` whose `query` always reports "table absent", just
    /// enough to drive `create_table`'s CREATE path without a live
    /// connection — the same hand-written-fake pattern as the original's
    /// `orm/core/dialecttest/fake1.go`.
    struct EmptyBackend {
        sql: std::sync::Mutex<Option<String>>,
    }

    #[async_trait::async_trait]
    impl Backend for EmptyBackend {
        fn name(&self) -> &str {
            "orders"
        }
        fn prefix(&self) -> &str {
            ""
        }
        fn quote_chars(&self) -> (char, char) {
            ('"', '"')
        }
        async fn exec(&self, sql: &str, _args: &[Value]) -> OrmResult<ormcraft_core::ExecResult> {
            *self.sql.lock().unwrap() = Some(sql.to_string());
            Ok(Default::default())
        }
        async fn query(&self, _sql: &str, _args: &[Value]) -> OrmResult<Vec<ormcraft_core::RowView>> {
            Ok(vec![])
        }
        async fn query_row(&self, _sql: &str, _args: &[Value]) -> OrmResult<Option<ormcraft_core::RowView>> {
            Ok(None)
        }
        async fn prepare(&self, sql: &str) -> OrmResult<ormcraft_core::PreparedStatement> {
            Ok(ormcraft_core::PreparedStatement::new(sql))
        }
        fn stmts(&self) -> &ormcraft_core::StmtCache {
            unimplemented!("not needed for this test")
        }
    }

    #[tokio::test]
    async fn create_table_on_ai_column_emits_a_single_primary_key() {
        let backend = EmptyBackend { sql: std::sync::Mutex::new(None) };
        let table = TableSpec {
            name: "users".to_string(),
            columns: vec![ColumnSpec {
                name: "id".to_string(),
                sql_type: SqlType::Int,
                is_ai: true,
                nullable: false,
            }],
            primary_key: vec!["id".to_string()],
            unique: vec![],
            meta: Default::default(),
        };
        SqliteDialect.create_table(&backend, &table).await.unwrap();
        let sql = backend.sql.lock().unwrap().clone().unwrap();
        assert_eq!(sql.matches("PRIMARY KEY").count(), 1);
    }
}
