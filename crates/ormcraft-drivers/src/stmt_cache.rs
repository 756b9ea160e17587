//! Re-export point for the statement cache.
//!
//! The cache type itself lives in `ormcraft-core` (see that crate's
//! `stmt_cache` module) so `Backend::stmts()` can return a reference to it
//! without `ormcraft-core` depending back on this crate. Application code
//! reaches it through this path, matching where the teacher's driver layer
//! exposes its prepared-statement cache.

pub use ormcraft_core::StmtCache;
