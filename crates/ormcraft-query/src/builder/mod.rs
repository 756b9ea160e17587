//! CRUD SQL builders (§4.9, component J), ported from
//! `orm/sqlbuilder/crud.go` and `orm/sqlbuilder/select.go`, generalised from
//! a concrete `*sql.DB`/`*sql.Tx` to the [`Handle`](crate::handle::Handle)
//! trait object.
//!
//! Every builder caches its rendered SQL (`sql_string(rebuild)`) and defers
//! identifier/prefix substitution to the handle (§4.7) at render time, so
//! the raw fragment buffer a builder assembles still contains the literal
//! `"col"`/`table.` markers until `sql_string` runs.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use delete::Delete;
pub use insert::Insert;
pub use select::Select;
pub use update::Update;

use std::sync::Arc;

use ormcraft_core::Value;

use crate::handle::Handle;

/// Renders a raw fragment (still containing `"col"`/`table.` markers) into
/// its final dialect-specific form via the handle's quote/prefix
/// substitution (§4.7).
pub(crate) fn finish(handle: &Arc<dyn Handle>, raw: &str) -> String {
    handle.replace_prefix(&handle.replace_quote(raw))
}

/// Joins column names with `,` for a `VALUES`/`SET` clause.
pub(crate) fn placeholders(n: usize) -> String {
    std::iter::repeat("?").take(n).collect::<Vec<_>>().join(",")
}

/// Picks explicitly supplied `args` over a builder's accumulated operand
/// list, matching §4.9's "Exec uses the accumulated values unless args are
/// supplied explicitly."
pub(crate) fn args_or<'a>(args: &'a [Value], fallback: &'a [Value]) -> &'a [Value] {
    if args.is_empty() {
        fallback
    } else {
        args
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ormcraft_core::{Backend, ExecResult, OrmResult, PreparedStatement, RowView, StmtCache, Value};
    use ormcraft_sql::dialect::{ColumnSpec, TableSpec};
    use ormcraft_sql::Dialect;

    use crate::handle::Handle;

    pub struct FakeDialect;

    #[async_trait]
    impl Dialect for FakeDialect {
        fn quote_chars(&self) -> (char, char) {
            ('[', ']')
        }
        fn db_name_from_dsn(&self, _dsn: &str) -> OrmResult<String> {
            Ok("fake".to_string())
        }
        fn limit_clause(&self, limit: u64, offset: u64) -> (String, Vec<Value>) {
            (" LIMIT ? OFFSET ? ".to_string(), vec![Value::UInt(limit), Value::UInt(offset)])
        }
        fn supports_last_insert_id(&self) -> bool {
            true
        }
        fn sql_type_for(&self, _col: &ColumnSpec) -> String {
            "TEXT".to_string()
        }
        async fn create_table(&self, _backend: &dyn Backend, _table: &TableSpec) -> OrmResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct Recorded {
        pub sql: String,
        pub args: Vec<Value>,
    }

    pub struct FakeHandle {
        pub dialect: Arc<dyn Dialect>,
        pub stmts: StmtCache,
        pub last: Mutex<Option<Recorded>>,
        pub rows: Mutex<Vec<RowView>>,
    }

    use std::sync::Arc;

    impl FakeHandle {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                dialect: Arc::new(FakeDialect),
                stmts: StmtCache::new(),
                last: Mutex::new(None),
                rows: Mutex::new(Vec::new()),
            })
        }

        pub fn last_sql(&self) -> String {
            self.last.lock().unwrap().as_ref().unwrap().sql.clone()
        }

        pub fn last_args(&self) -> Vec<Value> {
            self.last.lock().unwrap().as_ref().unwrap().args.clone()
        }

        pub fn set_rows(&self, rows: Vec<RowView>) {
            *self.rows.lock().unwrap() = rows;
        }
    }

    #[async_trait]
    impl Backend for FakeHandle {
        fn name(&self) -> &str {
            "fake"
        }
        fn prefix(&self) -> &str {
            "prefix_"
        }
        fn quote_chars(&self) -> (char, char) {
            self.dialect.quote_chars()
        }
        async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
            *self.last.lock().unwrap() = Some(Recorded { sql: sql.to_string(), args: args.to_vec() });
            Ok(ExecResult { rows_affected: 1, last_insert_id: Some(1) })
        }
        async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<RowView>> {
            *self.last.lock().unwrap() = Some(Recorded { sql: sql.to_string(), args: args.to_vec() });
            Ok(self.rows.lock().unwrap().clone())
        }
        async fn query_row(&self, sql: &str, args: &[Value]) -> OrmResult<Option<RowView>> {
            *self.last.lock().unwrap() = Some(Recorded { sql: sql.to_string(), args: args.to_vec() });
            Ok(self.rows.lock().unwrap().first().cloned())
        }
        async fn prepare(&self, sql: &str) -> OrmResult<PreparedStatement> {
            Ok(PreparedStatement::new(sql))
        }
        fn stmts(&self) -> &StmtCache {
            &self.stmts
        }
    }

    impl Handle for FakeHandle {
        fn dialect(&self) -> &Arc<dyn Dialect> {
            &self.dialect
        }
    }
}
