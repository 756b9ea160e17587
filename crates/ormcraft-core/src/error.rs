//! Shared error type for the ormcraft workspace.
//!
//! Every sub-crate returns [`OrmError`] so callers handling the facade never
//! have to match on crate-specific error types: one variant per failure
//! kind, a `Display` message, and a constructor function per variant.

use thiserror::Error;

/// Unified error type for all ormcraft operations.
#[derive(Debug, Error)]
pub enum OrmError {
    #[error("tag syntax error: {message}")]
    TagSyntax { message: String },

    #[error("model error: {message}")]
    Model { message: String },

    #[error("dialect error: {message}")]
    Dialect { message: String },

    #[error("SQL build error: {message}")]
    SqlBuild { message: String },

    #[error("conversion error: {message}")]
    Conversion { message: String },

    #[error("unknown column: {column}")]
    UnknownColumn { column: String },

    #[error("execution error: {message}")]
    Execution { message: String },
}

impl OrmError {
    pub fn tag_syntax(msg: impl Into<String>) -> Self {
        Self::TagSyntax { message: msg.into() }
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model { message: msg.into() }
    }

    pub fn dialect(msg: impl Into<String>) -> Self {
        Self::Dialect { message: msg.into() }
    }

    pub fn sql_build(msg: impl Into<String>) -> Self {
        Self::SqlBuild { message: msg.into() }
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion { message: msg.into() }
    }

    pub fn unknown_column(col: impl Into<String>) -> Self {
        Self::UnknownColumn { column: col.into() }
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution { message: msg.into() }
    }
}

/// Result type alias used throughout ormcraft.
pub type OrmResult<T> = Result<T, OrmError>;
