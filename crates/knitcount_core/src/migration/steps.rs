//! Pure item-list transforms, one per data version.
//!
//! Each step takes the whole raw list and returns the migrated list. Steps
//! only touch keys they own and are safe to replay on migrated data.

use serde_json::{json, Map, Value};

const TYPE_KEY: &str = "type";
const COUNTER_TYPE: &str = "counter";
const PROJECT_TYPE: &str = "project";

const ACTIVATE_MODE_KEY: &str = "activateMode";
const LEGACY_ACTIVE_MODE: &str = "active";
const AUTO_MODE: &str = "auto";

const LEGACY_RULE_KEYS: [&str; 4] = [
    "repeatMessage",
    "repeatStartNumber",
    "repeatEndNumber",
    "repeatRuleNumber",
];

/// v1: `activateMode: "active"` is renamed to `"auto"`.
pub(super) fn rename_active_mode(items: Vec<Value>) -> Vec<Value> {
    map_records(items, |record| {
        if record.get(ACTIVATE_MODE_KEY).and_then(Value::as_str) == Some(LEGACY_ACTIVE_MODE) {
            record.insert(ACTIVATE_MODE_KEY.to_string(), json!(AUTO_MODE));
        }
    })
}

/// v2: `activateMode` is split into `mascotIsActive` and `wayIsChange`.
///
/// `"auto"` turns both on, any other value turns both off. Records without
/// the field are left alone.
pub(super) fn split_activate_mode(items: Vec<Value>) -> Vec<Value> {
    map_records(items, |record| {
        let Some(mode) = record.remove(ACTIVATE_MODE_KEY) else {
            return;
        };
        let enabled = mode.as_str() == Some(AUTO_MODE);
        record.insert("mascotIsActive".to_string(), json!(enabled));
        record.insert("wayIsChange".to_string(), json!(enabled));
    })
}

/// v3: fields introduced with sub counters, timers and section logs get
/// their defaults. Existing values are never overwritten.
pub(super) fn backfill_defaults(items: Vec<Value>) -> Vec<Value> {
    map_records(items, |record| {
        let is_counter = record_type(record) == Some(COUNTER_TYPE);
        let is_project = record_type(record) == Some(PROJECT_TYPE);
        if is_counter {
            for (key, default) in counter_defaults() {
                record.entry(key).or_insert(default);
            }
        } else if is_project {
            record
                .entry("counterIds")
                .or_insert_with(|| Value::Array(Vec::new()));
        }
    })
}

/// v4: the four flat repeat-rule fields become a `repeatRules` array and
/// `way` moves from `info` to the record itself.
///
/// Flat rule values are dropped, not converted. The v3 defaults are applied
/// again afterwards so a list that skipped v3 still ends up complete.
pub(super) fn restructure_rules_and_way(items: Vec<Value>) -> Vec<Value> {
    let items = map_records(items, |record| {
        if record_type(record) != Some(COUNTER_TYPE) {
            return;
        }

        for key in LEGACY_RULE_KEYS {
            record.remove(key);
        }
        if !record.get("repeatRules").is_some_and(Value::is_array) {
            record.insert("repeatRules".to_string(), Value::Array(Vec::new()));
        }

        let nested_way = record
            .get_mut("info")
            .and_then(Value::as_object_mut)
            .and_then(|info| info.remove("way"));
        if let Some(way) = nested_way {
            record.insert("way".to_string(), way);
        }
        record.entry("way").or_insert_with(|| json!("front"));
    });
    backfill_defaults(items)
}

fn counter_defaults() -> [(&'static str, Value); 11] {
    [
        ("targetCount", json!(0)),
        ("subCount", json!(0)),
        ("subRule", json!(0)),
        ("subRuleIsActive", json!(false)),
        ("mascotIsActive", json!(false)),
        ("wayIsChange", json!(false)),
        ("elapsedTime", json!(0)),
        ("timerIsActive", json!(false)),
        ("timerIsPlaying", json!(false)),
        ("sectionRecords", Value::Array(Vec::new())),
        ("updatedAt", json!(0)),
    ]
}

fn record_type(record: &Map<String, Value>) -> Option<&str> {
    record.get(TYPE_KEY).and_then(Value::as_str)
}

fn map_records(items: Vec<Value>, mut apply: impl FnMut(&mut Map<String, Value>)) -> Vec<Value> {
    items
        .into_iter()
        .map(|mut item| {
            if let Some(record) = item.as_object_mut() {
                apply(record);
            }
            item
        })
        .collect()
}
