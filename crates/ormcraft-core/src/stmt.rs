//! Prepared-statement representation shared by the cache (§4.5) and the
//! `Backend` capability (§4.6).
//!
//! Real per-backend prepared-statement handles (`sqlx::postgres::PgStatement`
//! and friends) are tied to the connection or pool that produced them and
//! cannot be named generically across four different driver crates without
//! an enum per backend. Since `sqlx` pools already cache prepared statements
//! per physical connection internally, this cache's actual job is to save
//! callers the cost of re-assembling a builder's SQL string under a given
//! name — so a `PreparedStatement` here is the finalised SQL text plus the
//! name it was validated under, not a live driver handle. `ormcraft-drivers`
//! still round-trips every `prepare()` call through the real pool once (see
//! `Engine::prepare`) to surface syntax errors eagerly, exactly as the
//! original's `sql.DB.Prepare` would.

/// A named, validated SQL statement, ready to be handed back to
/// `Backend::exec`/`query`/`query_row`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    pub sql: String,
}

impl PreparedStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}
