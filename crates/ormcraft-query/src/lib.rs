//! Schema derivation, the fetch/materialisation helpers, the where-clause
//! builder, and the CRUD SQL builders (components C, D, I, J, K) — the part
//! of the workspace application record types and query code talk to
//! directly.

pub mod builder;
pub mod fetch;
pub mod handle;
pub mod model;
pub mod where_clause;

pub use builder::{Delete, Insert, Select, Update};
pub use fetch::FromRow;
pub use handle::Handle;
pub use model::{free_models, AutoIncr, Column, Entity, FieldSpec, ForeignKey, Model};
pub use where_clause::WhereClause;
