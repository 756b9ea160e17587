//! Execution capability abstraction (§4.3, §5).
//!
//! `Dialect::create_table` (in `ormcraft-sql`) needs to run DDL against a
//! live connection, but the concrete connection-pool types live in
//! `ormcraft-drivers`, which itself depends on `ormcraft-sql` for dialect
//! lookups. [`Backend`] breaks that cycle: it is the minimal capability a
//! dialect needs, defined here in the dependency-free leaf crate, and
//! implemented by `ormcraft-drivers`'s `Engine`/`Transaction` against it as
//! `&dyn Backend` rather than a concrete generic — keeping the registry of
//! dialects (stored as `Arc<dyn Dialect>`) object-safe.

use async_trait::async_trait;

use crate::error::OrmResult;
use crate::stmt::PreparedStatement;
use crate::stmt_cache::StmtCache;
use crate::value::Value;

/// One row of a query result, as column name/value pairs in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowView {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl RowView {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Looks up a column by name. `None` if the row has no such column;
    /// does not distinguish "absent" from "present but null" — use the
    /// returned [`Value::is_null`] for that.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| &self.values[i])
    }
}

/// Outcome of a non-query statement.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// Capability a dialect needs to run SQL against a live connection, without
/// depending on any particular driver crate.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The target database's name (§4.6), extracted from the connection
    /// string at connect time via [`crate::Backend`]'s dialect
    /// (`Dialect::db_name_from_dsn`) — not the driver/registry name used to
    /// look the dialect up.
    fn name(&self) -> &str;

    /// Table-name prefix substituted for the `table.` marker in generated
    /// SQL (empty string if none configured).
    fn prefix(&self) -> &str;

    /// Open/close quote characters substituted for the `"` marker.
    fn quote_chars(&self) -> (char, char);

    /// Rewrites `"identifier"` markers in `sql` to this backend's quote
    /// pair. Provided so callers that only hold a `&dyn Backend` can still
    /// finish preparing a builder-emitted statement.
    fn replace_quote(&self, sql: &str) -> String {
        replace_quoted_identifiers(sql, self.quote_chars())
    }

    /// Rewrites the `table.` marker in `sql` to this backend's configured
    /// prefix.
    fn replace_prefix(&self, sql: &str) -> String {
        replace_table_prefix(sql, self.prefix())
    }

    /// Executes a statement that does not return rows (INSERT/UPDATE/DELETE/DDL).
    async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult>;

    /// Executes a query, returning every matching row.
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<RowView>>;

    /// Executes a query, returning at most one row.
    async fn query_row(&self, sql: &str, args: &[Value]) -> OrmResult<Option<RowView>>;

    /// Validates `sql` against the live connection and returns a
    /// [`PreparedStatement`] ready to be cached under a caller-chosen name
    /// (§4.5, §4.6).
    async fn prepare(&self, sql: &str) -> OrmResult<PreparedStatement>;

    /// The statement cache scoped to this handle. A `Transaction`'s cache is
    /// its parent `Engine`'s — see §4.5's "transactions reuse the engine's
    /// cache for name lookup."
    fn stmts(&self) -> &StmtCache;
}

/// Rewrites every `"identifier"` span in `sql` to use `quotes` instead of
/// double quotes. A span is only treated as an identifier marker if it
/// contains none of `.`, `*`, `,`, or whitespace — `"a.b"`-shaped literal
/// strings and ordinary string literals are left untouched.
pub fn replace_quoted_identifiers(sql: &str, quotes: (char, char)) -> String {
    let (open, close) = quotes;
    let mut out = String::with_capacity(sql.len());
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if let Some(rel_end) = sql[i + 1..].find('"') {
                let inner = &sql[i + 1..i + 1 + rel_end];
                if !inner.is_empty()
                    && !inner.contains(['.', '*', ',', ' ', '\t', '\n'])
                {
                    out.push(open);
                    out.push_str(inner);
                    out.push(close);
                    i = i + 1 + rel_end + 1;
                    continue;
                }
            }
        }
        let ch = sql[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Rewrites the literal `table.` marker to `prefix` (or strips it to
/// nothing if `prefix` is empty), matching it only when it starts a token:
/// at the very start of `sql`, or preceded by whitespace, `(`, `,`, or a
/// quote character (the latter covers `"table.user"` once the quote
/// rewrite above has not yet run).
pub fn replace_table_prefix(sql: &str, prefix: &str) -> String {
    const MARKER: &str = "table.";
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    let mut at_token_start = true;
    while let Some(pos) = rest.find(MARKER) {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);
        let preceding_ok = at_token_start
            || head
                .chars()
                .last()
                .map(|c| c.is_whitespace() || c == '(' || c == ',' || c == '"')
                .unwrap_or(true);
        if preceding_ok {
            out.push_str(prefix);
        } else {
            out.push_str(MARKER);
        }
        rest = &tail[MARKER.len()..];
        at_token_start = false;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_view_looks_up_by_name() {
        let row = RowView::new(vec!["id".into(), "name".into()], vec![Value::Int(1), Value::Text("a".into())]);
        assert_eq!(row.get("name"), Some(&Value::Text("a".into())));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn replaces_simple_identifier() {
        let sql = r#"select "id", "name" from "table.users""#;
        let out = replace_quoted_identifiers(sql, ('`', '`'));
        assert_eq!(out, "select `id`, `name` from `table.users`");
    }

    #[test]
    fn leaves_compound_or_wildcard_spans_untouched() {
        let sql = r#"select "a.b", "*" from x"#;
        let out = replace_quoted_identifiers(sql, ('[', ']'));
        assert_eq!(out, sql);
    }

    #[test]
    fn replaces_table_prefix_at_token_boundaries() {
        let sql = "select * from table.users where table.users.id = ?";
        let out = replace_table_prefix(sql, "app_");
        assert_eq!(out, "select * from app_users where app_users.id = ?");
    }

    #[test]
    fn empty_prefix_strips_marker() {
        let sql = "select * from table.users";
        assert_eq!(replace_table_prefix(sql, ""), "select * from users");
    }
}
