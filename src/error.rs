//! Crate-wide error taxonomy.
//!
//! Validation and syntax errors surface at spec-build time, before any query
//! runs. Database errors carry the query context that failed, never a bare
//! provider string. Format errors always name the offending row, since a
//! parallel-array misalignment is an upstream data-integrity defect.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed or out-of-range builder input, named by field.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Malformed boolean search expression under strict parsing.
    #[error("bad search expression near {fragment:?}: {message}")]
    QuerySyntax { fragment: String, message: String },

    /// Provider or transport failure. No automatic retry at this layer.
    #[error("database error during {context}")]
    Database {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Parallel attribute arrays within one row have mismatched lengths.
    #[error("misaligned {family} arrays in book {book_id}: {detail}")]
    Format {
        book_id: i64,
        family: &'static str,
        detail: String,
    },

    /// A lookup by identifier matched nothing. A valid empty result, not a
    /// system failure.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// No pooled connection became available within the acquire timeout.
    #[error("no connection available within {waited_ms}ms")]
    PoolExhausted { waited_ms: u64 },

    /// The statement deadline passed or the caller cancelled mid-query.
    #[error("query interrupted: {reason}")]
    Interrupted { reason: &'static str },
}

impl SearchError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        SearchError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn syntax(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        SearchError::QuerySyntax {
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    pub fn db(context: impl Into<String>, source: rusqlite::Error) -> Self {
        SearchError::Database {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
