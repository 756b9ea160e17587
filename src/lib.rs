//! `ormcraft` — a multi-dialect relational mapping engine: schema
//! derivation from hand-written tags, a dialect-agnostic SQL builder set,
//! and row materialisation into plain records.
//!
//! This crate is the facade (component L), ported from the original's
//! top-level `orm` package which re-exports `Engine`/`Tx`/the builder
//! constructors as the one entry point application code imports. The real
//! work lives in the sub-crates:
//!
//! - [`ormcraft_core`] — the dependency-free leaf: tag grammar, `Value`,
//!   conversions, `OrmError`, the `Backend` capability.
//! - [`ormcraft_sql`] — the `Dialect` trait and the four built-in dialects.
//! - [`ormcraft_query`] — schema derivation (`Entity`/`Model`), the
//!   where-clause and CRUD builders, row materialisation.
//! - [`ormcraft_drivers`] — `Engine`/`Transaction`, the pool-backed `Handle`
//!   implementations.

pub use ormcraft_core::{
    Backend, ExecResult, FromValue, OrmError, OrmResult, PreparedStatement, RowView, SqlType,
    StmtCache, Value,
};
pub use ormcraft_drivers::{ConnectOptions, Engine, Transaction};
pub use ormcraft_query::{
    free_models, AutoIncr, Column, Delete, Entity, FieldSpec, ForeignKey, FromRow, Handle, Insert,
    Model, Select, Update, WhereClause,
};
pub use ormcraft_sql::{ColumnSpec, Dialect, TableSpec};

use std::sync::Arc;

/// Registers the four built-in dialects under their conventional driver
/// names (postgres/mysql/sqlite/sqlserver), unless already registered.
/// Call once at process start before [`Orm::connect`] — mirrors the
/// original's `init()` side effect in `orm/dialects_builtin.go`, done
/// explicitly here rather than at crate load time so a process that only
/// ever talks to one backend doesn't pay for registering the other three's
/// `Arc`s, and so an application can register a replacement dialect under
/// one of these names before ever calling this function.
pub fn register_builtin_dialects() {
    ormcraft_sql::registry::register_builtins();
}

/// The facade most application code talks to: an open connection pool to
/// one backend (§2, §4.6), with `Entity`-driven table creation and the
/// four CRUD builder factories.
#[derive(Clone)]
pub struct Orm {
    engine: Arc<Engine>,
}

impl Orm {
    /// Opens a pool against `dsn` using the dialect registered as
    /// `driver_name` (see [`register_builtin_dialects`]).
    pub async fn connect(driver_name: &str, dsn: &str, options: ConnectOptions) -> OrmResult<Orm> {
        let engine = Engine::connect(driver_name, dsn, options).await?;
        Ok(Orm { engine })
    }

    /// Creates (or reconciles, if already present) the table for `T` (§4.3).
    pub async fn create<T: Entity>(&self) -> OrmResult<()> {
        let model = Model::of::<T>()?;
        let table = model.to_table_spec();
        self.engine.dialect().create_table(self.engine.as_ref(), &table).await
    }

    pub fn insert(&self) -> Insert {
        Insert::new(self.engine.clone())
    }

    pub fn update(&self) -> Update {
        Update::new(self.engine.clone())
    }

    pub fn delete(&self) -> Delete {
        Delete::new(self.engine.clone())
    }

    pub fn select(&self) -> Select {
        Select::new(self.engine.clone())
    }

    /// Begins a transaction (§4.6). The returned [`OrmTx`] offers the same
    /// four builder factories against a dedicated connection, plus
    /// `commit`/`rollback`.
    pub async fn begin(&self) -> OrmResult<OrmTx> {
        let tx = self.engine.begin().await?;
        Ok(OrmTx { tx: Arc::new(tx) })
    }

    pub fn close(&self) {
        self.engine.close();
    }
}

/// A single in-flight transaction (§4.6), offering the same builder
/// factories as [`Orm`] against its own dedicated connection.
#[derive(Clone)]
pub struct OrmTx {
    tx: Arc<Transaction>,
}

impl OrmTx {
    pub fn insert(&self) -> Insert {
        Insert::new(self.tx.clone())
    }

    pub fn update(&self) -> Update {
        Update::new(self.tx.clone())
    }

    pub fn delete(&self) -> Delete {
        Delete::new(self.tx.clone())
    }

    pub fn select(&self) -> Select {
        Select::new(self.tx.clone())
    }

    pub async fn commit(&self) -> OrmResult<()> {
        self.tx.commit().await
    }

    pub async fn rollback(&self) -> OrmResult<()> {
        self.tx.rollback().await
    }
}
