//! The `Handle` capability (§4.6) the CRUD builders and fetch helpers are
//! generic over.
//!
//! `ormcraft_core::Backend` is deliberately minimal — just enough for a
//! `Dialect` to run DDL — because `ormcraft-core` cannot depend on
//! `ormcraft-sql` without an inverted dependency edge. The builders live in
//! `ormcraft-query`, which already depends on both crates, so they can close
//! over the fuller surface spec.md's Handle actually describes: everything
//! `Backend` offers, plus `dialect()` for pagination (`limit`/`page`) and
//! last-insert-id detection. `ormcraft-drivers`'s `Engine`/`Transaction`
//! implement this trait directly.

use std::sync::Arc;

use ormcraft_core::Backend;
use ormcraft_sql::Dialect;

/// Execution surface consumed by the builders (§4.6): a `Backend` plus the
/// `Dialect` it was opened with.
pub trait Handle: Backend {
    fn dialect(&self) -> &Arc<dyn Dialect>;
}
