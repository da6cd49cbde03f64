use knitcount_core::store::{DATA_VERSION_KEY, ITEMS_KEY};
use knitcount_core::{
    migrate_store, run_migrations, Item, ItemRepository, KeyValueStore, KvItemRepository,
    MemoryKeyValueStore, SqliteKeyValueStore, StoreError, Way, CURRENT_DATA_VERSION,
};
use serde_json::{json, Value};

fn legacy_items() -> Vec<Value> {
    vec![
        json!({
            "type": "project",
            "id": "proj_1600000000000",
            "title": "Cardigan",
            "counterIds": ["counter_1600000000001"],
            "info": {"startDate": "2020.09.13"}
        }),
        json!({
            "type": "counter",
            "id": "counter_1600000000001",
            "title": "Left sleeve",
            "count": 42,
            "parentProjectId": "proj_1600000000000",
            "activateMode": "active",
            "repeatMessage": "decrease",
            "repeatStartNumber": 4,
            "repeatEndNumber": 40,
            "repeatRuleNumber": 6,
            "info": {"way": "back", "description": "raglan"}
        }),
        json!({
            "type": "counter",
            "id": "counter_1600000000002",
            "title": "Swatch",
            "count": 3,
            "parentProjectId": null,
            "activateMode": "manual"
        }),
    ]
}

#[test]
fn active_mode_counter_migrates_to_current_shape() {
    let migrated = run_migrations(
        vec![json!({"type": "counter", "id": "counter_1", "activateMode": "active"})],
        0,
        CURRENT_DATA_VERSION,
    );
    let record = &migrated[0];

    assert!(record.get("activateMode").is_none());
    assert_eq!(record["wayIsChange"], true);
    assert_eq!(record["mascotIsActive"], true);
    assert_eq!(record["repeatRules"], json!([]));
    for key in [
        "targetCount",
        "subCount",
        "subRule",
        "subRuleIsActive",
        "elapsedTime",
        "timerIsActive",
        "timerIsPlaying",
        "sectionRecords",
        "updatedAt",
    ] {
        assert!(record.get(key).is_some(), "missing default for {key}");
    }
}

#[test]
fn rerunning_at_current_version_is_a_no_op() {
    let once = run_migrations(legacy_items(), 0, CURRENT_DATA_VERSION);
    let twice = run_migrations(once.clone(), CURRENT_DATA_VERSION, CURRENT_DATA_VERSION);
    assert_eq!(twice, once);

    let replayed = run_migrations(once.clone(), 0, CURRENT_DATA_VERSION);
    assert_eq!(replayed, once);
}

#[test]
fn migration_keeps_mapped_fields_and_drops_flat_rules() {
    let migrated = run_migrations(legacy_items(), 0, CURRENT_DATA_VERSION);

    let project = &migrated[0];
    assert_eq!(project["title"], "Cardigan");
    assert_eq!(project["counterIds"], json!(["counter_1600000000001"]));
    assert_eq!(project["info"]["startDate"], "2020.09.13");

    let sleeve = &migrated[1];
    assert_eq!(sleeve["count"], 42);
    assert_eq!(sleeve["parentProjectId"], "proj_1600000000000");
    assert_eq!(sleeve["way"], "back");
    assert_eq!(sleeve["info"], json!({"description": "raglan"}));
    assert_eq!(sleeve["repeatRules"], json!([]));
    for key in [
        "repeatMessage",
        "repeatStartNumber",
        "repeatEndNumber",
        "repeatRuleNumber",
    ] {
        assert!(sleeve.get(key).is_none(), "{key} should be dropped");
    }

    let swatch = &migrated[2];
    assert_eq!(swatch["mascotIsActive"], false);
    assert_eq!(swatch["wayIsChange"], false);
    assert_eq!(swatch["way"], "front");
}

#[test]
fn migrated_list_decodes_into_typed_items() {
    let migrated = run_migrations(legacy_items(), 0, CURRENT_DATA_VERSION);
    let items: Vec<Item> = serde_json::from_value(Value::Array(migrated)).unwrap();

    let sleeve = items[1].as_counter().unwrap();
    assert_eq!(sleeve.way, Way::Back);
    assert!(sleeve.mascot_is_active);
    assert!(sleeve.way_is_change);
    assert_eq!(sleeve.parent_project_id.as_deref(), Some("proj_1600000000000"));
}

#[test]
fn migrate_store_rewrites_legacy_list_and_bumps_version() {
    let raw = serde_json::to_string(&legacy_items()).unwrap();
    let store = MemoryKeyValueStore::with_entries([(ITEMS_KEY, raw.as_str())]);

    let report = migrate_store(&store).unwrap();
    assert_eq!(report.from_version, 0);
    assert_eq!(report.to_version, CURRENT_DATA_VERSION);
    assert!(report.rewritten);

    let version = store.get(DATA_VERSION_KEY).unwrap();
    assert_eq!(version, Some(CURRENT_DATA_VERSION.to_string()));
    let stored: Vec<Value> =
        serde_json::from_str(&store.get(ITEMS_KEY).unwrap().unwrap()).unwrap();
    assert!(stored[1].get("activateMode").is_none());
}

#[test]
fn migrate_store_skips_write_when_list_is_already_current() {
    let current = run_migrations(legacy_items(), 0, CURRENT_DATA_VERSION);
    let raw = serde_json::to_string(&current).unwrap();
    let store = MemoryKeyValueStore::with_entries([(ITEMS_KEY, raw.as_str())]);

    let report = migrate_store(&store).unwrap();
    assert!(!report.rewritten);
    assert_eq!(store.get(ITEMS_KEY).unwrap().as_deref(), Some(raw.as_str()));
    assert_eq!(
        store.get(DATA_VERSION_KEY).unwrap(),
        Some(CURRENT_DATA_VERSION.to_string())
    );
}

#[test]
fn migrate_store_on_empty_store_only_sets_version() {
    let store = MemoryKeyValueStore::new();
    let report = migrate_store(&store).unwrap();

    assert!(!report.rewritten);
    assert_eq!(store.get(ITEMS_KEY).unwrap(), None);
    assert_eq!(store.write_count(), 1);
    assert_eq!(
        store.get(DATA_VERSION_KEY).unwrap(),
        Some(CURRENT_DATA_VERSION.to_string())
    );
}

#[test]
fn migrate_store_rejects_newer_data_version() {
    let store = MemoryKeyValueStore::with_entries([(DATA_VERSION_KEY, "99")]);
    match migrate_store(&store).unwrap_err() {
        StoreError::UnsupportedDataVersion {
            stored,
            latest_supported,
        } => {
            assert_eq!(stored, 99);
            assert_eq!(latest_supported, CURRENT_DATA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn migrate_store_rejects_non_array_item_list() {
    let store = MemoryKeyValueStore::with_entries([(ITEMS_KEY, r#"{"type": "counter"}"#)]);
    assert!(matches!(
        migrate_store(&store).unwrap_err(),
        StoreError::InvalidData(_)
    ));
}

#[test]
fn repository_migrates_sqlite_store_once_before_first_read() {
    let store = SqliteKeyValueStore::open_in_memory().unwrap();
    store
        .set(ITEMS_KEY, &serde_json::to_string(&legacy_items()).unwrap())
        .unwrap();
    let repo = KvItemRepository::new(store);
    assert!(repo.migration_report().is_none());

    let items = repo.list_items().unwrap();
    assert_eq!(items.len(), 3);
    let first_report = repo.migration_report().unwrap();
    assert!(first_report.rewritten);

    repo.list_items().unwrap();
    assert_eq!(repo.migration_report(), Some(first_report));
    assert_eq!(
        repo.store().get(DATA_VERSION_KEY).unwrap(),
        Some(CURRENT_DATA_VERSION.to_string())
    );
}
