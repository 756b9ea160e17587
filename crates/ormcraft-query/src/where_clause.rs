//! Where clause builder (§4.8, component I), ported from
//! `orm/sqlbuilder/where.go`.
//!
//! The original's `in()` has a bug worth naming so it is not accidentally
//! reproduced: it sizes the placeholder list from `len(s.condArgs)` — the
//! builder's *already-accumulated* argument list — instead of `len(args)`,
//! the just-passed values, and then re-appends `s.condArgs` a second time
//! instead of the fresh `args`. Any call after the first misbuilds both the
//! placeholder count and the argument list. This implementation always
//! sizes and appends from the values actually passed to `and_in`/`or_in`.

use ormcraft_core::{OrmError, OrmResult, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
}

/// A composable boolean predicate plus its positional argument list (§4.8).
/// Misuse (an empty `IN` list) is accumulated into an internal error list
/// rather than failing the call immediately, so builders embedding a
/// `WhereClause` can surface it from `exec`/`query` alongside their own
/// builder errors (REDESIGN FLAGS).
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    fragment: String,
    args: Vec<Value>,
    errors: Vec<OrmError>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, op: Op, cond: &str, args: &[Value]) -> &mut Self {
        let keyword = if self.fragment.is_empty() {
            "WHERE"
        } else {
            match op {
                Op::And => "AND",
                Op::Or => "OR",
            }
        };
        self.fragment.push(' ');
        self.fragment.push_str(keyword);
        self.fragment.push('(');
        self.fragment.push_str(cond);
        self.fragment.push(')');
        self.args.extend_from_slice(args);
        self
    }

    pub fn and(&mut self, cond: &str, args: &[Value]) -> &mut Self {
        self.push(Op::And, cond, args)
    }

    pub fn or(&mut self, cond: &str, args: &[Value]) -> &mut Self {
        self.push(Op::Or, cond, args)
    }

    /// Bare alias for `and` (§4.8: "default alias: bare name = And-variant").
    pub fn where_(&mut self, cond: &str, args: &[Value]) -> &mut Self {
        self.and(cond, args)
    }

    fn in_fragment(col: &str, values: &[Value]) -> String {
        let placeholders = values.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        format!("{col} IN({placeholders})")
    }

    pub fn and_in(&mut self, col: &str, values: &[Value]) -> &mut Self {
        if values.is_empty() {
            self.errors.push(OrmError::sql_build(format!("in({col}) requires at least one value")));
            return self;
        }
        let cond = Self::in_fragment(col, values);
        self.and(&cond, values)
    }

    pub fn or_in(&mut self, col: &str, values: &[Value]) -> &mut Self {
        if values.is_empty() {
            self.errors.push(OrmError::sql_build(format!("in({col}) requires at least one value")));
            return self;
        }
        let cond = Self::in_fragment(col, values);
        self.or(&cond, values)
    }

    pub fn in_(&mut self, col: &str, values: &[Value]) -> &mut Self {
        self.and_in(col, values)
    }

    pub fn and_between(&mut self, col: &str, start: Value, end: Value) -> &mut Self {
        let cond = format!("{col} BETWEEN ? AND ?");
        self.and(&cond, &[start, end])
    }

    pub fn or_between(&mut self, col: &str, start: Value, end: Value) -> &mut Self {
        let cond = format!("{col} BETWEEN ? AND ?");
        self.or(&cond, &[start, end])
    }

    pub fn between(&mut self, col: &str, start: Value, end: Value) -> &mut Self {
        self.and_between(col, start, end)
    }

    pub fn and_is_null(&mut self, col: &str) -> &mut Self {
        let cond = format!("{col} IS NULL");
        self.and(&cond, &[])
    }

    pub fn or_is_null(&mut self, col: &str) -> &mut Self {
        let cond = format!("{col} IS NULL");
        self.or(&cond, &[])
    }

    pub fn is_null(&mut self, col: &str) -> &mut Self {
        self.and_is_null(col)
    }

    pub fn and_is_not_null(&mut self, col: &str) -> &mut Self {
        let cond = format!("{col} IS NOT NULL");
        self.and(&cond, &[])
    }

    pub fn or_is_not_null(&mut self, col: &str) -> &mut Self {
        let cond = format!("{col} IS NOT NULL");
        self.or(&cond, &[])
    }

    pub fn is_not_null(&mut self, col: &str) -> &mut Self {
        self.and_is_not_null(col)
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn errors(&self) -> &[OrmError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn reset(&mut self) {
        self.fragment.clear();
        self.args.clear();
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_3_delete_with_mixed_predicates() {
        let mut w = WhereClause::new();
        w.and("username like ?", &[Value::Text("%admin%".into())])
            .or_in(
                "uid",
                &[Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4), Value::Int(5)],
            )
            .and_between(r#""group""#, Value::Int(1), Value::Int(10));

        assert_eq!(
            w.fragment(),
            r#" WHERE(username like ?) OR(uid IN(?,?,?,?,?)) AND("group" BETWEEN ? AND ?)"#
        );
        assert_eq!(
            w.args(),
            &[
                Value::Text("%admin%".into()),
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(4),
                Value::Int(5),
                Value::Int(1),
                Value::Int(10),
            ]
        );
    }

    #[test]
    fn empty_in_list_is_a_builder_error_not_a_panic() {
        let mut w = WhereClause::new();
        w.and_in("uid", &[]);
        assert!(w.has_errors());
        assert_eq!(w.fragment(), "");
    }

    #[test]
    fn first_call_always_emits_where_regardless_of_operator() {
        let mut w = WhereClause::new();
        w.or("x = ?", &[Value::Int(1)]);
        assert!(w.fragment().starts_with(" WHERE("));
    }

    #[test]
    fn reset_clears_fragment_args_and_errors() {
        let mut w = WhereClause::new();
        w.and("x = ?", &[Value::Int(1)]);
        w.and_in("y", &[]);
        w.reset();
        assert_eq!(w.fragment(), "");
        assert!(w.args().is_empty());
        assert!(!w.has_errors());
    }

    #[test]
    fn is_null_and_is_not_null_take_no_args() {
        let mut w = WhereClause::new();
        w.is_null("deleted_at");
        assert_eq!(w.fragment(), " WHERE(deleted_at IS NULL)");
        assert!(w.args().is_empty());
    }
}
