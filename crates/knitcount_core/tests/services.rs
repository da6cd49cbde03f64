use knitcount_core::rules::RULE_COLOR_SWATCHES;
use knitcount_core::{
    CounterService, Item, ItemInfo, ItemService, KvItemRepository, MemoryKeyValueStore,
    RepeatRule, RuleValidationError, SectionAction, ServiceError, SortCriteria, SortOptions,
    SortOrder, Way, MAX_COUNT,
};

const NOW: i64 = 1_700_000_000_000;

fn fixed_clock() -> i64 {
    NOW
}

fn services(
    store: &MemoryKeyValueStore,
) -> (
    ItemService<KvItemRepository<&MemoryKeyValueStore>>,
    CounterService<KvItemRepository<&MemoryKeyValueStore>>,
) {
    (
        ItemService::with_clock(KvItemRepository::new(store), fixed_clock),
        CounterService::with_clock(KvItemRepository::new(store), fixed_clock),
    )
}

#[test]
fn created_ids_encode_time_and_stay_unique() {
    let store = MemoryKeyValueStore::new();
    let (items, _) = services(&store);

    let project = items.create_project("  Shawl ").unwrap();
    assert_eq!(project.id, format!("proj_{NOW}"));
    assert_eq!(project.title, "Shawl");

    let first = items.create_counter("Edge", Some(project.id.as_str())).unwrap();
    let second = items.create_counter("Body", Some(project.id.as_str())).unwrap();
    assert_eq!(first.id, format!("counter_{NOW}"));
    assert_eq!(second.id, format!("counter_{}", NOW + 1));

    let Item::Project(stored) = items.get_item(&project.id).unwrap() else {
        panic!("project expected");
    };
    assert_eq!(stored.counter_ids, vec![first.id, second.id]);
}

#[test]
fn create_rejects_blank_titles_and_bad_parents() {
    let store = MemoryKeyValueStore::new();
    let (items, _) = services(&store);

    assert!(matches!(
        items.create_project("   ").unwrap_err(),
        ServiceError::EmptyTitle
    ));
    let counter = items.create_counter("Solo", None).unwrap();
    assert!(matches!(
        items.create_counter("Child", Some(counter.id.as_str())).unwrap_err(),
        ServiceError::NotAProject(_)
    ));
    assert!(matches!(
        items.create_counter("Child", Some("proj_0")).unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[test]
fn count_mutations_persist_with_section_log() {
    let store = MemoryKeyValueStore::new();
    let (items, counters) = services(&store);
    let counter = items.create_counter("Yoke", None).unwrap();

    counters.increase_count(&counter.id).unwrap();
    counters.increase_count(&counter.id).unwrap();
    counters.decrease_count(&counter.id).unwrap();
    counters.edit_sub_count(&counter.id, 4).unwrap();

    let stored = counters.get_counter(&counter.id).unwrap();
    assert_eq!(stored.count, 1);
    assert_eq!(stored.sub_count, 4);
    assert_eq!(stored.updated_at, NOW);
    let actions: Vec<SectionAction> = stored
        .section_records
        .iter()
        .map(|record| record.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            SectionAction::CountIncrease,
            SectionAction::CountIncrease,
            SectionAction::CountDecrease,
            SectionAction::SubCountEdit,
        ]
    );

    let edited = counters.edit_count(&counter.id, 100_000).unwrap();
    assert_eq!(edited.count, MAX_COUNT);
    let reset = counters.reset_count(&counter.id).unwrap();
    assert_eq!(reset.count, 0);
}

#[test]
fn counter_operations_reject_projects() {
    let store = MemoryKeyValueStore::new();
    let (items, counters) = services(&store);
    let project = items.create_project("Vest").unwrap();

    assert!(matches!(
        counters.increase_count(&project.id).unwrap_err(),
        ServiceError::NotACounter(_)
    ));
    assert!(matches!(
        counters.increase_count("counter_missing").unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[test]
fn sub_rule_wraps_sub_count() {
    let store = MemoryKeyValueStore::new();
    let (items, counters) = services(&store);
    let counter = items.create_counter("Lace", None).unwrap();

    counters.set_sub_rule(&counter.id, 2, true).unwrap();
    counters.increase_sub_count(&counter.id).unwrap();
    counters.increase_sub_count(&counter.id).unwrap();
    let wrapped = counters.increase_sub_count(&counter.id).unwrap();
    assert_eq!(wrapped.sub_count, 1);
    assert!(wrapped
        .section_records
        .iter()
        .any(|record| record.action == SectionAction::SubRuleActivate));
}

#[test]
fn rules_get_default_colors_and_validation() {
    let store = MemoryKeyValueStore::new();
    let (items, counters) = services(&store);
    let counter = items.create_counter("Raglan", None).unwrap();

    let first = counters
        .add_rule(&counter.id, RepeatRule::new("decrease", 2, 10, 2))
        .unwrap();
    assert_eq!(
        first.repeat_rules[0].color.as_deref(),
        Some(RULE_COLOR_SWATCHES[0])
    );
    let second = counters
        .add_rule(&counter.id, RepeatRule::new("cable", 0, 30, 6))
        .unwrap();
    assert_eq!(
        second.repeat_rules[1].color.as_deref(),
        Some(RULE_COLOR_SWATCHES[2])
    );

    let err = counters
        .add_rule(&counter.id, RepeatRule::new("bad", 10, 2, 2))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidRule(RuleValidationError::EndBeforeStart { .. })
    ));

    let updated = counters
        .update_rule(&counter.id, 0, RepeatRule::new("decrease both", 2, 12, 2))
        .unwrap();
    assert_eq!(updated.repeat_rules[0].message, "decrease both");
    assert_eq!(
        updated.repeat_rules[0].color.as_deref(),
        Some(RULE_COLOR_SWATCHES[0])
    );

    assert!(matches!(
        counters.delete_rule(&counter.id, 5).unwrap_err(),
        ServiceError::RuleIndexOutOfRange { index: 5, .. }
    ));
    let remaining = counters.delete_rule(&counter.id, 0).unwrap();
    assert_eq!(remaining.repeat_rules.len(), 1);
    assert_eq!(remaining.repeat_rules[0].message, "cable");
}

#[test]
fn applied_rules_follow_current_count() {
    let store = MemoryKeyValueStore::new();
    let (items, counters) = services(&store);
    let counter = items.create_counter("Yoke", None).unwrap();
    counters
        .add_rule(&counter.id, RepeatRule::new("even", 2, 10, 2))
        .unwrap();
    counters
        .add_rule(&counter.id, RepeatRule::new("every third", 0, 30, 3))
        .unwrap();

    counters.edit_count(&counter.id, 6).unwrap();
    let messages: Vec<String> = counters
        .applied_rules(&counter.id)
        .unwrap()
        .into_iter()
        .map(|rule| rule.message)
        .collect();
    assert_eq!(messages, vec!["even", "every third"]);

    counters.edit_count(&counter.id, 7).unwrap();
    assert!(counters.applied_rules(&counter.id).unwrap().is_empty());
}

#[test]
fn way_mascot_and_timer_state_persist() {
    let store = MemoryKeyValueStore::new();
    let (items, counters) = services(&store);
    let counter = items.create_counter("Heel", None).unwrap();

    counters.change_way(&counter.id, Way::Back).unwrap();
    counters.set_way_is_change(&counter.id, true).unwrap();
    counters.set_mascot_active(&counter.id, true).unwrap();
    counters.start_timer(&counter.id).unwrap();
    counters.add_elapsed_seconds(&counter.id, 90).unwrap();
    let paused = counters.pause_timer(&counter.id).unwrap();

    assert_eq!(paused.way, Way::Back);
    assert!(paused.way_is_change);
    assert!(paused.mascot_is_active);
    assert!(paused.timer_is_active);
    assert!(!paused.timer_is_playing);
    assert_eq!(paused.elapsed_time, 90);
}

#[test]
fn top_level_listing_uses_persisted_sort_options() {
    let store = MemoryKeyValueStore::new();
    let (items, counters) = services(&store);

    let project = items.create_project("Beanie").unwrap();
    let child = items.create_counter("Crown", Some(project.id.as_str())).unwrap();
    let solo = items.create_counter("Alpaca swatch", None).unwrap();
    counters.set_target_count(&solo.id, 10).unwrap();
    counters.edit_count(&solo.id, 10).unwrap();

    items
        .set_sort_options(&SortOptions {
            criteria: SortCriteria::Name,
            order: SortOrder::Asc,
            move_completed_to_bottom: true,
        })
        .unwrap();

    let listed: Vec<String> = items
        .list_top_level_sorted()
        .unwrap()
        .iter()
        .map(|item| item.id().to_string())
        .collect();
    assert_eq!(listed, vec![project.id.clone(), solo.id.clone()]);
    assert!(!listed.contains(&child.id));
    assert_eq!(items.progress(&solo.id).unwrap(), 100.0);
}

#[test]
fn project_children_listing_and_info_updates() {
    let store = MemoryKeyValueStore::new();
    let (items, _) = services(&store);
    let project = items.create_project("Mittens").unwrap();
    let left = items.create_counter("Left", Some(project.id.as_str())).unwrap();
    let right = items.create_counter("Right", Some(project.id.as_str())).unwrap();

    let options = SortOptions {
        criteria: SortCriteria::Created,
        order: SortOrder::Desc,
        move_completed_to_bottom: false,
    };
    let ids: Vec<String> = items
        .list_project_counters_sorted(&project.id, &options)
        .unwrap()
        .iter()
        .map(|item| item.id().to_string())
        .collect();
    assert_eq!(ids, vec![right.id.clone(), left.id.clone()]);

    let info = ItemInfo {
        end_date: Some("2024.12.24".to_string()),
        ..ItemInfo::default()
    };
    items.set_item_info(&project.id, Some(info)).unwrap();
    assert_eq!(items.progress(&project.id).unwrap(), 100.0);

    let renamed = items.rename_item(&left.id, "Left thumb").unwrap();
    assert_eq!(renamed.title(), "Left thumb");

    let removed = items.delete_item(&project.id).unwrap();
    assert_eq!(removed.len(), 3);
}
