//! Delete builder (§4.9), ported from `orm/sqlbuilder/crud.go`'s `Delete`.

use std::sync::Arc;

use ormcraft_core::{ExecResult, OrmError, OrmResult, PreparedStatement, Value};

use crate::handle::Handle;
use crate::where_clause::WhereClause;

use super::finish;

/// `DELETE FROM tbl WHERE(…)`.
pub struct Delete {
    handle: Arc<dyn Handle>,
    table: String,
    where_: WhereClause,
    cached_sql: Option<String>,
}

impl Delete {
    pub fn new(handle: Arc<dyn Handle>) -> Self {
        Self { handle, table: String::new(), where_: WhereClause::new(), cached_sql: None }
    }

    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = name.into();
        self.cached_sql = None;
        self
    }

    pub fn and(&mut self, cond: &str, args: &[Value]) -> &mut Self {
        self.where_.and(cond, args);
        self.cached_sql = None;
        self
    }

    pub fn or(&mut self, cond: &str, args: &[Value]) -> &mut Self {
        self.where_.or(cond, args);
        self.cached_sql = None;
        self
    }

    pub fn and_in(&mut self, col: &str, values: &[Value]) -> &mut Self {
        self.where_.and_in(col, values);
        self.cached_sql = None;
        self
    }

    pub fn or_in(&mut self, col: &str, values: &[Value]) -> &mut Self {
        self.where_.or_in(col, values);
        self.cached_sql = None;
        self
    }

    pub fn and_between(&mut self, col: &str, start: Value, end: Value) -> &mut Self {
        self.where_.and_between(col, start, end);
        self.cached_sql = None;
        self
    }

    pub fn or_between(&mut self, col: &str, start: Value, end: Value) -> &mut Self {
        self.where_.or_between(col, start, end);
        self.cached_sql = None;
        self
    }

    pub fn errors(&self) -> &[OrmError] {
        self.where_.errors()
    }

    pub fn has_errors(&self) -> bool {
        self.where_.has_errors()
    }

    pub fn sql_string(&mut self, rebuild: bool) -> &str {
        if rebuild || self.cached_sql.is_none() {
            let raw = format!("DELETE FROM {}{}", self.table, self.where_.fragment());
            self.cached_sql = Some(finish(&self.handle, &raw));
        }
        self.cached_sql.as_deref().unwrap()
    }

    pub async fn stmt(&mut self, name: &str) -> OrmResult<PreparedStatement> {
        let sql = self.sql_string(false).to_string();
        let stmt = self.handle.prepare(&sql).await?;
        self.handle.stmts().set(name, stmt.clone());
        Ok(stmt)
    }

    pub async fn exec(&mut self, args: &[Value]) -> OrmResult<ExecResult> {
        if let Some(err) = self.where_.errors().first() {
            return Err(clone_error(err));
        }
        let sql = self.sql_string(false).to_string();
        let use_args = if args.is_empty() { self.where_.args() } else { args };
        self.handle.exec(&sql, use_args).await
    }

    pub fn reset(&mut self) -> &mut Self {
        self.table.clear();
        self.where_.reset();
        self.cached_sql = None;
        self
    }
}

fn clone_error(err: &OrmError) -> OrmError {
    OrmError::sql_build(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::FakeHandle;
    use super::*;

    #[test]
    fn scenario_3_delete_with_mixed_predicates() {
        let handle = FakeHandle::new();
        let mut delete = Delete::new(handle);
        delete
            .table("table.user")
            .and("username like ?", &[Value::Text("%admin%".into())])
            .or_in("uid", &[Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4), Value::Int(5)])
            .and_between(r#""group""#, Value::Int(1), Value::Int(10));

        assert_eq!(
            delete.sql_string(false),
            "DELETE FROM prefix_user WHERE(username like ?) OR(uid IN(?,?,?,?,?)) AND([group] BETWEEN ? AND ?)"
        );
    }

    #[tokio::test]
    async fn empty_in_list_surfaces_as_execution_error_instead_of_panicking() {
        let handle = FakeHandle::new();
        let mut delete = Delete::new(handle);
        delete.table("table.user").and_in("uid", &[]);
        assert!(delete.exec(&[]).await.is_err());
    }
}
