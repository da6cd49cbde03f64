//! Key-value storage contract for persisted app state.
//!
//! # Responsibility
//! - Define the string key-value contract the repository depends on.
//! - Provide a SQLite-backed store for devices and an in-memory store for
//!   tests and previews.
//!
//! # Invariants
//! - Values are opaque UTF-8 strings; JSON encoding happens above this layer.
//! - `set` replaces any previous value for the key.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;

/// JSON array of every stored item.
pub const ITEMS_KEY: &str = "knit_items";
/// Item list schema version as a decimal integer.
pub const DATA_VERSION_KEY: &str = "knit_data_version";
pub const SORT_CRITERIA_KEY: &str = "sort_criteria";
pub const SORT_ORDER_KEY: &str = "sort_order";
pub const SORT_MOVE_COMPLETED_KEY: &str = "sort_move_completed";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reading, decoding or writing persisted state.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
    UnsupportedDataVersion { stored: u32, latest_supported: u32 },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "item serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UnsupportedDataVersion {
                stored,
                latest_supported,
            } => write!(
                f,
                "stored data version {stored} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::UnsupportedDataVersion { .. } => None,
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

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// String key-value store.
///
/// Implementations use interior mutability; a handle is not shared across
/// threads.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
}
