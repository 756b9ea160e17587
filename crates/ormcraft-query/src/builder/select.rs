//! Select builder (§4.9, §4.10), ported from `orm/sqlbuilder/select.go`.
//!
//! `page(start, size)` panics in the original on `start < 1` or `size < 1`;
//! here it accumulates a builder error instead (REDESIGN FLAGS, §9 Open
//! Questions — resolved in favour of the error-returning path).

use std::collections::HashMap;
use std::sync::Arc;

use ormcraft_core::{FromValue, OrmError, OrmResult, RowView, Value};

use crate::fetch::{self, FromRow};
use crate::handle::Handle;
use crate::where_clause::WhereClause;

use super::finish;

#[derive(Debug, Clone, Copy)]
enum JoinKind {
    Left,
    Right,
    Inner,
    Full,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

/// `SELECT cols FROM tbl joins WHERE(…) ORDER BY … limit`.
pub struct Select {
    handle: Arc<dyn Handle>,
    columns: Vec<String>,
    table: String,
    joins: Vec<(JoinKind, String, String)>,
    where_: WhereClause,
    order: Vec<(String, bool)>,
    limit: Option<(String, Vec<Value>)>,
    errors: Vec<OrmError>,
    cached_sql: Option<String>,
}

impl Select {
    pub fn new(handle: Arc<dyn Handle>) -> Self {
        Self {
            handle,
            columns: Vec::new(),
            table: String::new(),
            joins: Vec::new(),
            where_: WhereClause::new(),
            order: Vec::new(),
            limit: None,
            errors: Vec::new(),
            cached_sql: None,
        }
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

    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = name.into();
        self.cached_sql = None;
        self
    }

    /// Alias for [`Select::table`] (§4.9: "`from`/`table`").
    pub fn from(&mut self, name: impl Into<String>) -> &mut Self {
        self.table(name)
    }

    fn join(&mut self, kind: JoinKind, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.joins.push((kind, table.into(), on.into()));
        self.cached_sql = None;
        self
    }

    pub fn left_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join(JoinKind::Left, table, on)
    }

    pub fn right_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join(JoinKind::Right, table, on)
    }

    pub fn inner_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join(JoinKind::Inner, table, on)
    }

    pub fn full_join(&mut self, table: impl Into<String>, on: impl Into<String>) -> &mut Self {
        self.join(JoinKind::Full, table, on)
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

    /// Order-preserving: repeated `asc`/`desc` calls append to the same
    /// clause in call order; the first call emits `ORDER BY`.
    pub fn asc<I, S>(&mut self, cols: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order.extend(cols.into_iter().map(|c| (c.into(), true)));
        self.cached_sql = None;
        self
    }

    pub fn desc<I, S>(&mut self, cols: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order.extend(cols.into_iter().map(|c| (c.into(), false)));
        self.cached_sql = None;
        self
    }

    pub fn limit(&mut self, limit: u64, offset: u64) -> &mut Self {
        let (fragment, args) = self.handle.dialect().limit_clause(limit, offset);
        self.limit = Some((fragment, args));
        self.cached_sql = None;
        self
    }

    /// 1-indexed page; `start < 1` or `size < 1` accumulates a builder error
    /// instead of panicking (§9 Open Questions).
    pub fn page(&mut self, start: u64, size: u64) -> &mut Self {
        if start < 1 || size < 1 {
            self.errors.push(OrmError::sql_build(format!(
                "page(start={start}, size={size}) requires start>=1 and size>=1"
            )));
            return self;
        }
        let offset = (start - 1) * size;
        self.limit(size, offset)
    }

    pub fn errors(&self) -> Vec<&OrmError> {
        self.errors.iter().chain(self.where_.errors()).collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.where_.has_errors()
    }

    pub fn sql_string(&mut self, rebuild: bool) -> &str {
        if rebuild || self.cached_sql.is_none() {
            let mut raw = format!(
                "SELECT {} FROM {}",
                if self.columns.is_empty() { "*".to_string() } else { self.columns.join(",") },
                self.table
            );
            for (kind, table, on) in &self.joins {
                raw.push(' ');
                raw.push_str(kind.keyword());
                raw.push(' ');
                raw.push_str(table);
                raw.push_str(" ON ");
                raw.push_str(on);
            }
            raw.push_str(self.where_.fragment());
            if !self.order.is_empty() {
                raw.push_str(" ORDER BY ");
                let parts: Vec<String> = self
                    .order
                    .iter()
                    .map(|(c, asc)| if *asc { c.clone() } else { format!("{c} DESC") })
                    .collect();
                raw.push_str(&parts.join(","));
            }
            if let Some((fragment, _)) = &self.limit {
                raw.push_str(fragment);
            }
            self.cached_sql = Some(finish(&self.handle, &raw));
        }
        self.cached_sql.as_deref().unwrap()
    }

    fn query_args(&self) -> Vec<Value> {
        let mut args = self.where_.args().to_vec();
        if let Some((_, limit_args)) = &self.limit {
            args.extend(limit_args.iter().cloned());
        }
        args
    }

    fn check_errors(&self) -> OrmResult<()> {
        if let Some(err) = self.errors.first() {
            return Err(OrmError::sql_build(err.to_string()));
        }
        if let Some(err) = self.where_.errors().first() {
            return Err(OrmError::sql_build(err.to_string()));
        }
        Ok(())
    }

    pub async fn query(&mut self) -> OrmResult<Vec<RowView>> {
        self.check_errors()?;
        let sql = self.sql_string(false).to_string();
        let args = self.query_args();
        self.handle.query(&sql, &args).await
    }

    pub async fn query_row(&mut self) -> OrmResult<Option<RowView>> {
        self.check_errors()?;
        let sql = self.sql_string(false).to_string();
        let args = self.query_args();
        self.handle.query_row(&sql, &args).await
    }

    pub async fn stmt(&mut self, name: &str) -> OrmResult<ormcraft_core::PreparedStatement> {
        self.check_errors()?;
        let sql = self.sql_string(false).to_string();
        let stmt = self.handle.prepare(&sql).await?;
        self.handle.stmts().set(name, stmt.clone());
        Ok(stmt)
    }

    pub async fn fetch_maps(&mut self) -> OrmResult<Vec<HashMap<String, Value>>> {
        Ok(fetch::fetch_maps(&self.query().await?))
    }

    pub async fn fetch_map(&mut self) -> OrmResult<Option<HashMap<String, Value>>> {
        Ok(fetch::fetch_map(&self.query().await?))
    }

    pub async fn fetch_records<T: FromRow>(&mut self) -> OrmResult<Vec<T>> {
        fetch::fetch_records(&self.query().await?)
    }

    pub async fn fetch_record<T: FromRow>(&mut self) -> OrmResult<Option<T>> {
        fetch::fetch_record(&self.query().await?)
    }

    pub async fn fetch_into<T: FromRow>(&mut self, dest: &mut Vec<T>) -> OrmResult<()> {
        let rows = self.query().await?;
        fetch::fetch_into(dest, &rows)
    }

    pub async fn fetch_into_slice<T: FromRow>(&mut self, dest: &mut [T]) -> OrmResult<usize> {
        let rows = self.query().await?;
        fetch::fetch_into_slice(dest, &rows)
    }

    pub async fn fetch_column<T: FromValue>(&mut self, column: &str) -> OrmResult<Vec<T>> {
        fetch::fetch_column(&self.query().await?, column)
    }

    pub async fn fetch_column_one<T: FromValue>(&mut self, column: &str) -> OrmResult<Option<T>> {
        fetch::fetch_column_one(&self.query().await?, column)
    }

    pub fn reset(&mut self) -> &mut Self {
        self.columns.clear();
        self.table.clear();
        self.joins.clear();
        self.where_.reset();
        self.order.clear();
        self.limit = None;
        self.errors.clear();
        self.cached_sql = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::FakeHandle;
    use super::*;

    #[test]
    fn scenario_5_pagination_dispatches_to_dialect() {
        let handle = FakeHandle::new();
        let mut select = Select::new(handle);
        select.table("table.user").limit(5, 10);
        assert_eq!(select.sql_string(false), "SELECT * FROM prefix_user LIMIT ? OFFSET ? ");
        assert_eq!(select.query_args(), vec![Value::UInt(5), Value::UInt(10)]);
    }

    #[test]
    fn page_computes_offset_from_1_indexed_start() {
        let handle = FakeHandle::new();
        let mut select = Select::new(handle);
        select.table("table.user").page(2, 20);
        assert_eq!(select.query_args(), vec![Value::UInt(20), Value::UInt(20)]);
    }

    #[test]
    fn invalid_page_args_accumulate_an_error_instead_of_panicking() {
        let handle = FakeHandle::new();
        let mut select = Select::new(handle);
        select.table("table.user").page(0, 20);
        assert!(select.has_errors());
    }

    #[test]
    fn order_by_preserves_call_order_across_asc_and_desc() {
        let handle = FakeHandle::new();
        let mut select = Select::new(handle);
        select.table("table.user").columns(["id"]).desc(["created_at"]).asc(["id"]);
        assert_eq!(select.sql_string(false), "SELECT id FROM prefix_user ORDER BY created_at DESC,id");
    }

    #[tokio::test]
    async fn scenario_4_fetch_records_materialises_rows() {
        #[derive(Debug, PartialEq, Default)]
        struct FetchUser {
            id: i64,
            email: String,
        }
        impl FromRow for FetchUser {
            fn from_row(row: &RowView) -> OrmResult<Self> {
                Ok(FetchUser {
                    id: row.get("id").map(|v| ormcraft_core::convert(v)).transpose()?.unwrap_or_default(),
                    email: row.get("Email").map(|v| ormcraft_core::convert(v)).transpose()?.unwrap_or_default(),
                })
            }
        }

        let handle = FakeHandle::new();
        handle.set_rows(vec![
            RowView::new(vec!["id".into(), "Email".into()], vec![Value::Int(0), Value::Text("email-0".into())]),
            RowView::new(vec!["id".into(), "Email".into()], vec![Value::Int(1), Value::Text("email-1".into())]),
        ]);
        let mut select = Select::new(handle);
        select.columns(["id", "Email"]).table("table.user").and("id < ?", &[Value::Int(2)]).asc(["id"]);
        let users: Vec<FetchUser> = select.fetch_records().await.unwrap();
        assert_eq!(users, vec![
            FetchUser { id: 0, email: "email-0".into() },
            FetchUser { id: 1, email: "email-1".into() },
        ]);
    }
}
