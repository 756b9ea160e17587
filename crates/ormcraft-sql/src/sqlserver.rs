//! SQL Server dialect: bracket-quoted identifiers, SQL-2008
//! `OFFSET ? ROWS FETCH NEXT ? ROWS ONLY` pagination (note the argument
//! order is reversed relative to the MySQL family: offset first, then
//! count), `Initial Catalog=`/`Database=` DSN parsing.

use async_trait::async_trait;
use ormcraft_core::{Backend, OrmError, OrmResult, SqlType, Value};

use crate::common::{render_add_missing_columns, render_create_table};
use crate::dialect::{ColumnSpec, Dialect, TableSpec};

pub struct SqlServerDialect;

fn sql_type_for(col: &ColumnSpec) -> String {
    let base = match col.sql_type {
        SqlType::TinyInt | SqlType::UTinyInt => "TINYINT".to_string(),
        SqlType::SmallInt | SqlType::USmallInt => "SMALLINT".to_string(),
        SqlType::Int | SqlType::UInt => "INT".to_string(),
        SqlType::BigInt | SqlType::UBigInt => "BIGINT".to_string(),
        SqlType::Float => "REAL".to_string(),
        SqlType::Double => "FLOAT".to_string(),
        SqlType::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
        SqlType::Varchar(len) => format!("NVARCHAR({len})"),
        SqlType::Text => "NVARCHAR(MAX)".to_string(),
        SqlType::Boolean => "BIT".to_string(),
        SqlType::Bytes => "VARBINARY(MAX)".to_string(),
        SqlType::DateTime => "DATETIME2".to_string(),
        SqlType::Date => "DATE".to_string(),
        SqlType::Time => "TIME".to_string(),
        SqlType::Uuid => "UNIQUEIDENTIFIER".to_string(),
    };
    if col.is_ai {
        format!("{base} IDENTITY(1,1)")
    } else {
        base
    }
}

#[async_trait]
impl Dialect for SqlServerDialect {
    fn quote_chars(&self) -> (char, char) {
        ('[', ']')
    }

    fn db_name_from_dsn(&self, dsn: &str) -> OrmResult<String> {
        for key in ["Initial Catalog=", "Database=", "database="] {
            if let Some(idx) = dsn.find(key) {
                let rest = &dsn[idx + key.len()..];
                let end = rest.find(';').unwrap_or(rest.len());
                return Ok(rest[..end].trim().to_string());
            }
        }
        Err(OrmError::dialect(format!(
            "could not find Initial Catalog/Database in sqlserver DSN {dsn:?}"
        )))
    }

    fn limit_clause(&self, limit: u64, offset: u64) -> (String, Vec<Value>) {
        (
            " OFFSET ? ROWS FETCH NEXT ? ROWS ONLY ".to_string(),
            vec![Value::UInt(offset), Value::UInt(limit)],
        )
    }

    fn supports_last_insert_id(&self) -> bool {
        false
    }

    fn sql_type_for(&self, col: &ColumnSpec) -> String {
        sql_type_for(col)
    }

    async fn create_table(&self, backend: &dyn Backend, table: &TableSpec) -> OrmResult<()> {
        let table_name = backend.replace_prefix(&table.name);
        let mut table = table.clone();
        table.name = table_name;

        let rows = backend
            .query(
                "SELECT name FROM sys.columns WHERE object_id = OBJECT_ID(?)",
                &[Value::Text(table.name.clone())],
            )
            .await?;

        if rows.is_empty() {
            let sql = render_create_table(&table, self.quote_chars(), sql_type_for);
            backend.exec(&sql, &[]).await?;
            return Ok(());
        }

        let existing: Vec<String> = rows
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_database_from_initial_catalog() {
        let d = SqlServerDialect;
        assert_eq!(
            d.db_name_from_dsn("Server=tcp:host,1433;Initial Catalog=Orders;Encrypt=true").unwrap(),
            "Orders"
        );
    }

    #[test]
    fn pagination_reverses_offset_and_limit_order() {
        let d = SqlServerDialect;
        let (frag, args) = d.limit_clause(5, 10);
        assert_eq!(frag, " OFFSET ? ROWS FETCH NEXT ? ROWS ONLY ");
        assert_eq!(args, vec![Value::UInt(10), Value::UInt(5)]);
    }
}
