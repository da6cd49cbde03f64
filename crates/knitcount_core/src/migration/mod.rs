//! Versioned migration chain for the persisted item list.
//!
//! # Responsibility
//! - Register item-list transforms in strictly increasing version order.
//! - Run pending transforms once against the stored list and record the
//!   resulting version.
//!
//! # Invariants
//! - Versions are monotonic; there is no rollback.
//! - Every step is pure and idempotent, so replaying the chain is safe.
//! - The list is only rewritten when migration changed its serialized form.
//! - After a successful run the stored version equals
//!   [`CURRENT_DATA_VERSION`], even when nothing was rewritten.

mod steps;

use crate::store::{KeyValueStore, StoreError, StoreResult, DATA_VERSION_KEY, ITEMS_KEY};
use log::{info, warn};
use serde_json::Value;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct DataMigration {
    version: u32,
    apply: fn(Vec<Value>) -> Vec<Value>,
}

const DATA_MIGRATIONS: &[DataMigration] = &[
    DataMigration {
        version: 1,
        apply: steps::rename_active_mode,
    },
    DataMigration {
        version: 2,
        apply: steps::split_activate_mode,
    },
    DataMigration {
        version: 3,
        apply: steps::backfill_defaults,
    },
    DataMigration {
        version: 4,
        apply: steps::restructure_rules_and_way,
    },
];

/// Item-list schema version written by this build.
pub const CURRENT_DATA_VERSION: u32 = 4;

/// Returns the newest registered data version.
pub fn latest_data_version() -> u32 {
    DATA_MIGRATIONS
        .last()
        .map_or(0, |migration| migration.version)
}

/// Applies every step with `from_version < version <= to_version`, in order.
pub fn run_migrations(items: Vec<Value>, from_version: u32, to_version: u32) -> Vec<Value> {
    DATA_MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version && migration.version <= to_version)
        .fold(items, |items, migration| (migration.apply)(items))
}

/// Outcome of [`migrate_store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Whether the item list was written back.
    pub rewritten: bool,
}

/// Brings the stored item list up to [`CURRENT_DATA_VERSION`].
///
/// # Errors
/// - `UnsupportedDataVersion` when the store was written by a newer build.
/// - `Serialization`/`InvalidData` when the stored list is not a JSON array.
/// - Store errors from reads and writes.
pub fn migrate_store<S: KeyValueStore + ?Sized>(store: &S) -> StoreResult<MigrationReport> {
    let started_at = Instant::now();
    let from_version = stored_data_version(store)?;
    let to_version = CURRENT_DATA_VERSION;

    if from_version > to_version {
        return Err(StoreError::UnsupportedDataVersion {
            stored: from_version,
            latest_supported: to_version,
        });
    }

    let mut rewritten = false;
    if from_version < to_version {
        if let Some(raw) = store.get(ITEMS_KEY)? {
            let original = parse_item_list(&raw)?;
            if !original.is_empty() {
                let before = serde_json::to_string(&original)?;
                let migrated = run_migrations(original, from_version, to_version);
                let after = serde_json::to_string(&migrated)?;
                if after != before {
                    store.set(ITEMS_KEY, &after)?;
                    rewritten = true;
                }
            }
        }
    }
    store.set(DATA_VERSION_KEY, &to_version.to_string())?;

    info!(
        "event=data_migrate module=migration status=ok from_version={} to_version={} rewritten={} duration_ms={}",
        from_version,
        to_version,
        rewritten,
        started_at.elapsed().as_millis()
    );

    Ok(MigrationReport {
        from_version,
        to_version,
        rewritten,
    })
}

/// Parses the raw list stored under [`ITEMS_KEY`].
pub(crate) fn parse_item_list(raw: &str) -> StoreResult<Vec<Value>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(StoreError::InvalidData(format!(
            "`{ITEMS_KEY}` must hold a JSON array, found {}",
            json_kind(&other)
        ))),
    }
}

fn stored_data_version<S: KeyValueStore + ?Sized>(store: &S) -> StoreResult<u32> {
    let Some(raw) = store.get(DATA_VERSION_KEY)? else {
        return Ok(0);
    };
    match raw.trim().parse::<u32>() {
        Ok(version) => Ok(version),
        Err(_) => {
            warn!(
                "event=data_migrate module=migration status=warn reason=unparsable_version value={}",
                raw.trim()
            );
            Ok(0)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
