//! The `Dialect` capability set (§4.3): everything that differs between
//! backends and nothing that differs between connections. Dialects hold no
//! mutable state and are shared behind `Arc<dyn Dialect>` once registered.

use async_trait::async_trait;
use ormcraft_core::{Backend, OrmResult, SqlType};

/// One column's shape, as handed to [`Dialect::sql_type_for`] and
/// [`Dialect::create_table`].
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: SqlType,
    pub is_ai: bool,
    pub nullable: bool,
}

/// A table's shape, as handed to [`Dialect::create_table`]. Constraints are
/// expressed separately from columns because reconciliation drops and
/// re-adds them as a unit (§4.3).
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    pub primary_key: Vec<String>,
    pub unique: Vec<(String, Vec<String>)>,
    pub meta: std::collections::BTreeMap<String, Vec<String>>,
}

/// Per-backend capability set. Every method is a pure function of its
/// arguments (plus, for `create_table`, the live [`Backend`] it is handed
/// to probe and mutate the schema through) — no dialect stores per-database
/// state, so one instance is shared process-wide via the registry.
#[async_trait]
pub trait Dialect: Send + Sync {
    /// The identifier-quote pair substituted for the `"col"` marker.
    fn quote_chars(&self) -> (char, char);

    /// Extracts the target database name from a connection string, using
    /// this backend's DSN conventions.
    fn db_name_from_dsn(&self, dsn: &str) -> OrmResult<String>;

    /// Builds a parameter-carrying pagination fragment plus its argument
    /// list, in this backend's native pagination syntax.
    fn limit_clause(&self, limit: u64, offset: u64) -> (String, Vec<ormcraft_core::Value>);

    /// Whether this backend reports an auto-increment id via
    /// `last_insert_id` (MySQL/SQLite) rather than a `RETURNING` clause or
    /// separate query (Postgres/SQL Server, per their `Engine` impls).
    fn supports_last_insert_id(&self) -> bool;

    /// Maps a column's logical [`SqlType`] (plus AI-ness) to this backend's
    /// DDL type expression, e.g. `SqlType::Int` + `is_ai` on MySQL becomes
    /// `INT AUTO_INCREMENT`.
    fn sql_type_for(&self, col: &ColumnSpec) -> String;

    /// Probes for an existing table; if absent, emits `CREATE TABLE`. If
    /// present, reconciles: drops existing constraints, adds missing
    /// columns, modifies existing ones, drops orphaned ones, then re-adds
    /// constraints.
    async fn create_table(&self, backend: &dyn Backend, table: &TableSpec) -> OrmResult<()>;
}
