//! Insert builder (§4.9), ported from `orm/sqlbuilder/crud.go`'s `Insert`.

use std::sync::Arc;

use ormcraft_core::{ExecResult, OrmError, OrmResult, PreparedStatement, Value};

use crate::handle::Handle;

use super::{args_or, finish, placeholders};

/// `INSERT INTO tbl(cols…) VALUES(?,?,…)`.
pub struct Insert {
    handle: Arc<dyn Handle>,
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
    cached_sql: Option<String>,
    errors: Vec<OrmError>,
}

impl Insert {
    pub fn new(handle: Arc<dyn Handle>) -> Self {
        Self {
            handle,
            table: String::new(),
            columns: Vec::new(),
            values: Vec::new(),
            cached_sql: None,
            errors: Vec::new(),
        }
    }

    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = name.into();
        self.cached_sql = None;
        self
    }

    /// Appends columns, insertion order preserved (§4.9 "Column ordering
    /// within a builder is insertion order").
    pub fn columns<I, S>(&mut self, cols: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(cols.into_iter().map(Into::into));
        self.cached_sql = None;
        self
    }

    pub fn add(&mut self, col: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.columns.push(col.into());
        self.values.push(value.into());
        self.cached_sql = None;
        self
    }

    /// Ordered column/value pairs — the spec's `data(mapping)` restated as a
    /// sequence of tuples rather than an unordered mapping (REDESIGN FLAGS:
    /// "require ordered key-value pairs ... for reproducible SQL").
    pub fn data<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in pairs {
            self.add(k, v);
        }
        self
    }

    pub fn errors(&self) -> &[OrmError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn sql_string(&mut self, rebuild: bool) -> &str {
        if rebuild || self.cached_sql.is_none() {
            let raw = format!(
                "INSERT INTO {}({}) VALUES({})",
                self.table,
                self.columns.join(","),
                placeholders(self.columns.len())
            );
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
        if let Some(err) = self.errors.first() {
            return Err(clone_error(err));
        }
        let sql = self.sql_string(false).to_string();
        let use_args = args_or(args, &self.values).to_vec();
        self.handle.exec(&sql, &use_args).await
    }

    pub fn reset(&mut self) -> &mut Self {
        self.table.clear();
        self.columns.clear();
        self.values.clear();
        self.cached_sql = None;
        self.errors.clear();
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
    fn scenario_2_insert_emits_prefixed_quoted_sql() {
        let handle = FakeHandle::new();
        let mut insert = Insert::new(handle);
        insert
            .table("table.user")
            .columns(["uid", "username", r#""password""#])
            .columns(["group", "age"]);

        assert_eq!(
            insert.sql_string(false),
            "INSERT INTO prefix_user(uid,username,[password],group,age) VALUES(?,?,?,?,?)"
        );
    }

    #[tokio::test]
    async fn exec_falls_back_to_accumulated_values_when_no_args_given() {
        let handle = FakeHandle::new();
        let mut insert = Insert::new(handle.clone());
        insert.table("table.user").add("uid", Value::Int(1)).add("username", Value::Text("bob".into()));
        insert.exec(&[]).await.unwrap();
        assert_eq!(handle.last_args(), vec![Value::Int(1), Value::Text("bob".into())]);
    }

    #[tokio::test]
    async fn exec_prefers_explicit_args_over_accumulated_values() {
        let handle = FakeHandle::new();
        let mut insert = Insert::new(handle.clone());
        insert.table("table.user").add("uid", Value::Int(1));
        insert.exec(&[Value::Int(99)]).await.unwrap();
        assert_eq!(handle.last_args(), vec![Value::Int(99)]);
    }

    #[test]
    fn sql_string_is_cached_until_a_mutator_or_explicit_rebuild() {
        let handle = FakeHandle::new();
        let mut insert = Insert::new(handle);
        insert.table("table.user").columns(["uid"]);
        let first = insert.sql_string(false).to_string();
        assert_eq!(insert.sql_string(false), first);

        insert.columns(["age"]);
        assert_ne!(insert.sql_string(false), first);
    }
}
