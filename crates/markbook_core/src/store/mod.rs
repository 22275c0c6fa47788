//! Partitioned key-value store layer.
//!
//! # Responsibility
//! - Own every read/write against the physical key-value namespace.
//! - Map "logical key + active school" to a physical storage key.
//!
//! # Invariants
//! - No component above this layer constructs a physical key string.
//! - Quota-rejected writes never partially apply.
//! - Corrupted stored values degrade to the caller's default, never panic
//!   or surface as errors.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod backend;
pub mod keys;
mod namespaced;

pub use backend::{KvBackend, MemoryKvBackend, SqliteKvBackend};
pub use keys::TypedKey;
pub use namespaced::NamespacedStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error for encoding and physical persistence failures.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// The physical store is full; the write was not applied.
    Quota { key: String },
    /// The value could not be serialized to the textual encoding.
    Data { key: String, message: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Quota { key } => write!(
                f,
                "storage quota exceeded while writing `{key}`; remove unused entries and retry"
            ),
            Self::Data { key, message } => {
                write!(f, "value for `{key}` cannot be serialized: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Quota { .. } => None,
            Self::Data { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
