//! Update builder (§4.9), ported from `orm/sqlbuilder/crud.go`'s `Update`.

use std::sync::Arc;

use ormcraft_core::{ExecResult, OrmError, OrmResult, PreparedStatement, Value};

use crate::handle::Handle;
use crate::where_clause::WhereClause;

use super::{args_or, finish};

/// `UPDATE tbl SET col=?,… WHERE(…)`.
pub struct Update {
    handle: Arc<dyn Handle>,
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
    where_: WhereClause,
    cached_sql: Option<String>,
}

impl Update {
    pub fn new(handle: Arc<dyn Handle>) -> Self {
        Self {
            handle,
            table: String::new(),
            columns: Vec::new(),
            values: Vec::new(),
            where_: WhereClause::new(),
            cached_sql: None,
        }
    }

    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = name.into();
        self.cached_sql = None;
        self
    }

    pub fn columns<I, S>(&mut self, cols: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(cols.into_iter().map(Into::into));
        self.cached_sql = None;
        self
    }

    pub fn set(&mut self, col: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.columns.push(col.into());
        self.values.push(value.into());
        self.cached_sql = None;
        self
    }

    pub fn data<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in pairs {
            self.set(k, v);
        }
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
            let set_clause = self.columns.iter().map(|c| format!("{c}=?")).collect::<Vec<_>>().join(",");
            let raw = format!("UPDATE {} SET {}{}", self.table, set_clause, self.where_.fragment());
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
        let accumulated: Vec<Value> = self.values.iter().cloned().chain(self.where_.args().iter().cloned()).collect();
        let use_args = args_or(args, &accumulated).to_vec();
        self.handle.exec(&sql, &use_args).await
    }

    pub fn reset(&mut self) -> &mut Self {
        self.table.clear();
        self.columns.clear();
        self.values.clear();
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
    fn update_emits_set_then_where() {
        let handle = FakeHandle::new();
        let mut update = Update::new(handle);
        update.table("table.user").set("username", Value::Text("bob".into())).and("id = ?", &[Value::Int(1)]);

        assert_eq!(update.sql_string(false), "UPDATE prefix_user SET username=? WHERE(id = ?)");
    }

    #[tokio::test]
    async fn exec_orders_args_set_then_where() {
        let handle = FakeHandle::new();
        let mut update = Update::new(handle.clone());
        update
            .table("table.user")
            .set("username", Value::Text("bob".into()))
            .and("id = ?", &[Value::Int(1)]);
        update.exec(&[]).await.unwrap();
        assert_eq!(handle.last_args(), vec![Value::Text("bob".into()), Value::Int(1)]);
    }
}
