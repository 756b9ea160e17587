//! Shared primitives for the ormcraft workspace: tag grammar, the scalar
//! `Value` type, typed conversion, the unified error type, and the
//! `Backend` execution capability. Every other ormcraft crate depends on
//! this one; this one depends on nothing else in the workspace.

pub mod backend;
pub mod convert;
pub mod error;
pub mod sqltype;
pub mod stmt;
pub mod stmt_cache;
pub mod tag;
pub mod value;

pub use backend::{Backend, ExecResult, RowView};
pub use convert::{convert, is_empty, is_equal, FromValue};
pub use error::{OrmError, OrmResult};
pub use sqltype::SqlType;
pub use stmt::PreparedStatement;
pub use stmt_cache::StmtCache;
pub use tag::TagMap;
pub use value::Value;
