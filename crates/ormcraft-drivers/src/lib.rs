//! Driver layer (component H, §4.6): wraps each backend's real connection
//! pool behind `ormcraft_query::Handle`.
//!
//! `postgres`/`mysql`/`sqlite`/`sqlserver` hold only the row/parameter
//! conversion helpers each backend needs — none of them expose a `Handle`
//! on their own, because a `Handle` also needs a `Dialect` and a shared
//! statement cache, which is what [`handle::Engine`] and
//! [`handle::Transaction`] supply.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;
pub mod stmt_cache;

pub mod handle;

pub use handle::{ConnectOptions, Engine, Transaction};
pub use stmt_cache::StmtCache;
