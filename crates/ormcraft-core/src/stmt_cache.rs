//! Prepared-statement cache (§4.5), scoped to one `Backend`.
//!
//! Ported from the original's `orm/stmts.go`: a plain mutex-guarded map from
//! caller-chosen name to statement, with `add` refusing to overwrite and
//! `set` always winning. Lives in `ormcraft-core` (re-exported at
//! `ormcraft_drivers::stmt_cache`, its spec-assigned home) purely to let the
//! `Backend` trait expose `stmts()` without a dependency cycle back into
//! `ormcraft-drivers` — see DESIGN.md.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::backend::Backend;
use crate::error::{OrmError, OrmResult};
use crate::stmt::PreparedStatement;

/// Mutex-protected name → statement map. No iteration is exposed to callers
/// (§4.5) — only add/set/get/clear/close.
#[derive(Debug, Default)]
pub struct StmtCache {
    items: Mutex<HashMap<String, PreparedStatement>>,
}

impl StmtCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `stmt` under `name` unless the name is already taken, in
    /// which case this is a no-op and `false` is returned.
    pub fn add(&self, name: &str, stmt: PreparedStatement) -> bool {
        let mut items = self.items.lock().expect("statement cache poisoned");
        if items.contains_key(name) {
            return false;
        }
        items.insert(name.to_string(), stmt);
        true
    }

    /// Inserts or replaces the statement stored under `name`.
    pub fn set(&self, name: &str, stmt: PreparedStatement) {
        self.items.lock().expect("statement cache poisoned").insert(name.to_string(), stmt);
    }

    /// Prepares `sql` against `backend` and [`add`](Self::add)s it under
    /// `name` (§4.5's `AddSQL`, ported from `orm/stmts.go`). Fails if `sql`
    /// doesn't prepare, or if `name` is already taken — either way the
    /// caller gets the error, not a statement.
    pub async fn add_sql(&self, backend: &dyn Backend, name: &str, sql: &str) -> OrmResult<PreparedStatement> {
        let stmt = backend.prepare(sql).await?;
        if !self.add(name, stmt.clone()) {
            return Err(OrmError::sql_build(format!("statement {name:?} is already registered")));
        }
        Ok(stmt)
    }

    /// Prepares `sql` against `backend` and [`set`](Self::set)s it under
    /// `name` (§4.5's `SetSQL`), overwriting whatever was there.
    pub async fn set_sql(&self, backend: &dyn Backend, name: &str, sql: &str) -> OrmResult<PreparedStatement> {
        let stmt = backend.prepare(sql).await?;
        self.set(name, stmt.clone());
        Ok(stmt)
    }

    /// Looks up a cached statement by name.
    pub fn get(&self, name: &str) -> Option<PreparedStatement> {
        self.items.lock().expect("statement cache poisoned").get(name).cloned()
    }

    /// Empties the cache. Statements are not otherwise "closed" — ours hold
    /// no live driver resource, only SQL text (see `PreparedStatement`).
    pub fn clear(&self) {
        self.items.lock().expect("statement cache poisoned").clear();
    }

    /// Alias for `clear`, named to match the spec's `close()` operation —
    /// kept distinct from `clear` so a caller's intent (tear down vs. reuse)
    /// is visible at the call site even though both currently do the same
    /// thing.
    pub fn close(&self) {
        self.clear();
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("statement cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_refuses_overwrite_set_always_wins() {
        let cache = StmtCache::new();
        assert!(cache.add("q1", PreparedStatement::new("SELECT 1")));
        assert!(!cache.add("q1", PreparedStatement::new("SELECT 2")));
        assert_eq!(cache.get("q1").unwrap().sql, "SELECT 1");

        cache.set("q1", PreparedStatement::new("SELECT 2"));
        cache.set("q1", PreparedStatement::new("SELECT 3"));
        assert_eq!(cache.get("q1").unwrap().sql, "SELECT 3");
    }

    #[test]
    fn clear_empties_and_subsequent_get_is_absent() {
        let cache = StmtCache::new();
        cache.add("q1", PreparedStatement::new("SELECT 1"));
        cache.clear();
        assert!(cache.get("q1").is_none());
        assert!(cache.is_empty());
    }

    struct FakeBackend {
        stmts: StmtCache,
    }

    #[async_trait::async_trait]
    impl Backend for FakeBackend {
        fn name(&self) -> &str {
            "fake"
        }

        fn prefix(&self) -> &str {
            ""
        }

        fn quote_chars(&self) -> (char, char) {
            ('"', '"')
        }

        async fn exec(&self, _sql: &str, _args: &[crate::value::Value]) -> OrmResult<crate::backend::ExecResult> {
            unimplemented!("not needed for this test")
        }

        async fn query(&self, _sql: &str, _args: &[crate::value::Value]) -> OrmResult<Vec<crate::backend::RowView>> {
            unimplemented!("not needed for this test")
        }

        async fn query_row(
            &self,
            _sql: &str,
            _args: &[crate::value::Value],
        ) -> OrmResult<Option<crate::backend::RowView>> {
            unimplemented!("not needed for this test")
        }

        async fn prepare(&self, sql: &str) -> OrmResult<PreparedStatement> {
            if sql == "BAD" {
                return Err(OrmError::sql_build("syntax error"));
            }
            Ok(PreparedStatement::new(sql))
        }

        fn stmts(&self) -> &StmtCache {
            &self.stmts
        }
    }

    #[tokio::test]
    async fn add_sql_prepares_then_adds_and_refuses_collision() {
        let backend = FakeBackend { stmts: StmtCache::new() };
        let stmt = backend.stmts().add_sql(&backend, "q1", "SELECT 1").await.unwrap();
        assert_eq!(stmt.sql, "SELECT 1");

        let err = backend.stmts().add_sql(&backend, "q1", "SELECT 2").await.unwrap_err();
        assert!(matches!(err, OrmError::SqlBuild { .. }));
        assert_eq!(backend.stmts().get("q1").unwrap().sql, "SELECT 1");
    }

    #[tokio::test]
    async fn add_sql_propagates_prepare_failure() {
        let backend = FakeBackend { stmts: StmtCache::new() };
        let err = backend.stmts().add_sql(&backend, "q1", "BAD").await.unwrap_err();
        assert!(matches!(err, OrmError::SqlBuild { .. }));
        assert!(backend.stmts().get("q1").is_none());
    }

    #[tokio::test]
    async fn set_sql_prepares_then_overwrites() {
        let backend = FakeBackend { stmts: StmtCache::new() };
        backend.stmts().add_sql(&backend, "q1", "SELECT 1").await.unwrap();
        let stmt = backend.stmts().set_sql(&backend, "q1", "SELECT 2").await.unwrap();
        assert_eq!(stmt.sql, "SELECT 2");
        assert_eq!(backend.stmts().get("q1").unwrap().sql, "SELECT 2");
    }
}
