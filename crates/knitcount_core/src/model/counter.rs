//! Counter domain model.
//!
//! # Responsibility
//! - Define the row counter record and its secondary counter state.
//! - Provide bounded mutation helpers that keep the section log in sync.
//!
//! # Invariants
//! - `count` and `sub_count` stay within `0..=MAX_COUNT` after any helper.
//! - `elapsed_time` stays within `0..=MAX_ELAPSED_SECONDS`.
//! - Every helper refreshes `updated_at`.
//! - `section_records` is append-only.

use crate::format::clamp_elapsed_time;
use crate::model::item::ItemInfo;
use crate::model::rule::RepeatRule;
use crate::rules::applied_rules;
use serde::{Deserialize, Serialize};

/// Upper bound for `count` and `sub_count`.
pub const MAX_COUNT: i64 = 9999;

/// Knitting side the current row is worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Way {
    #[default]
    Front,
    Back,
}

impl Way {
    pub fn flipped(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

/// Mutation kind recorded in the section log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionAction {
    CountIncrease,
    CountDecrease,
    CountReset,
    CountEdit,
    SubCountIncrease,
    SubCountDecrease,
    SubCountReset,
    SubCountEdit,
    SubRuleActivate,
    SubRuleDeactivate,
    MascotActivate,
    MascotDeactivate,
    WayChange,
}

/// One entry of the counter's append-only mutation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    /// Unix epoch milliseconds of the mutation.
    pub time: i64,
    pub action: SectionAction,
    /// Post-mutation main count.
    pub count: i64,
    /// Post-mutation sub count.
    pub sub_count: i64,
}

/// Row counter, either independent or owned by a project.
///
/// Every field has a default so partially written records still decode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Counter {
    /// `counter_<epochMillis>`.
    pub id: String,
    pub title: String,
    pub count: i64,
    /// Back-reference to the owning project. `None` for top-level counters.
    pub parent_project_id: Option<String>,
    /// `0` means no target.
    pub target_count: i64,
    pub sub_count: i64,
    /// Wrap length of the sub counter while `sub_rule_is_active`.
    pub sub_rule: i64,
    pub sub_rule_is_active: bool,
    pub repeat_rules: Vec<RepeatRule>,
    pub way: Way,
    pub mascot_is_active: bool,
    pub way_is_change: bool,
    /// Seconds.
    pub elapsed_time: i64,
    pub timer_is_active: bool,
    pub timer_is_playing: bool,
    pub section_records: Vec<SectionRecord>,
    /// Unix epoch milliseconds of the last mutation.
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ItemInfo>,
}

impl Counter {
    /// Creates a counter with default state.
    pub fn new(id: impl Into<String>, title: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            updated_at: now_ms,
            ..Self::default()
        }
    }

    pub fn increase_count(&mut self, now_ms: i64) {
        self.count = clamp_count(self.count + 1);
        self.record(SectionAction::CountIncrease, now_ms);
    }

    pub fn decrease_count(&mut self, now_ms: i64) {
        self.count = clamp_count(self.count - 1);
        self.record(SectionAction::CountDecrease, now_ms);
    }

    pub fn reset_count(&mut self, now_ms: i64) {
        self.count = 0;
        self.record(SectionAction::CountReset, now_ms);
    }

    pub fn edit_count(&mut self, value: i64, now_ms: i64) {
        self.count = clamp_count(value);
        self.record(SectionAction::CountEdit, now_ms);
    }

    /// Advances the sub counter.
    ///
    /// With an active sub rule, moving past `sub_rule` wraps back to 1.
    pub fn increase_sub_count(&mut self, now_ms: i64) {
        self.sub_count = if self.sub_rule_is_active
            && self.sub_rule > 0
            && self.sub_count >= self.sub_rule
        {
            1
        } else {
            clamp_count(self.sub_count + 1)
        };
        self.record(SectionAction::SubCountIncrease, now_ms);
    }

    pub fn decrease_sub_count(&mut self, now_ms: i64) {
        self.sub_count = clamp_count(self.sub_count - 1);
        self.record(SectionAction::SubCountDecrease, now_ms);
    }

    pub fn reset_sub_count(&mut self, now_ms: i64) {
        self.sub_count = 0;
        self.record(SectionAction::SubCountReset, now_ms);
    }

    pub fn edit_sub_count(&mut self, value: i64, now_ms: i64) {
        self.sub_count = clamp_count(value);
        self.record(SectionAction::SubCountEdit, now_ms);
    }

    /// Sets the wrap length and activation of the sub counter.
    pub fn set_sub_rule(&mut self, sub_rule: i64, is_active: bool, now_ms: i64) {
        self.sub_rule = clamp_count(sub_rule);
        self.sub_rule_is_active = is_active;
        let action = if is_active {
            SectionAction::SubRuleActivate
        } else {
            SectionAction::SubRuleDeactivate
        };
        self.record(action, now_ms);
    }

    pub fn set_mascot_active(&mut self, is_active: bool, now_ms: i64) {
        self.mascot_is_active = is_active;
        let action = if is_active {
            SectionAction::MascotActivate
        } else {
            SectionAction::MascotDeactivate
        };
        self.record(action, now_ms);
    }

    pub fn change_way(&mut self, way: Way, now_ms: i64) {
        self.way = way;
        self.record(SectionAction::WayChange, now_ms);
    }

    pub fn set_way_is_change(&mut self, enabled: bool, now_ms: i64) {
        self.way_is_change = enabled;
        self.updated_at = now_ms;
    }

    pub fn set_target_count(&mut self, target: i64, now_ms: i64) {
        self.target_count = clamp_count(target);
        self.updated_at = now_ms;
    }

    /// Knitting side for the current row.
    ///
    /// When `way_is_change` is on the side alternates every row: `way` on
    /// even counts, the opposite side on odd counts.
    pub fn current_way(&self) -> Way {
        if self.way_is_change && self.count % 2 != 0 {
            self.way.flipped()
        } else {
            self.way
        }
    }

    /// Rules matching the current count, in stored order.
    pub fn applied_rules(&self) -> Vec<&RepeatRule> {
        applied_rules(self.count, &self.repeat_rules)
    }

    pub fn start_timer(&mut self, now_ms: i64) {
        self.timer_is_active = true;
        self.timer_is_playing = true;
        self.updated_at = now_ms;
    }

    pub fn pause_timer(&mut self, now_ms: i64) {
        self.timer_is_playing = false;
        self.updated_at = now_ms;
    }

    pub fn add_elapsed_seconds(&mut self, seconds: i64, now_ms: i64) {
        self.elapsed_time = clamp_elapsed_time(self.elapsed_time.saturating_add(seconds));
        self.updated_at = now_ms;
    }

    fn record(&mut self, action: SectionAction, now_ms: i64) {
        self.updated_at = now_ms;
        self.section_records.push(SectionRecord {
            time: now_ms,
            action,
            count: self.count,
            sub_count: self.sub_count,
        });
    }
}

fn clamp_count(value: i64) -> i64 {
    value.clamp(0, MAX_COUNT)
}

#[cfg(test)]
mod tests {
    use super::{Counter, SectionAction, Way, MAX_COUNT};

    #[test]
    fn count_helpers_stay_in_bounds() {
        let mut counter = Counter::new("counter_1", "sleeve", 1);
        counter.decrease_count(2);
        assert_eq!(counter.count, 0);

        counter.edit_count(MAX_COUNT + 10, 3);
        assert_eq!(counter.count, MAX_COUNT);
        counter.increase_count(4);
        assert_eq!(counter.count, MAX_COUNT);
        assert_eq!(counter.updated_at, 4);
    }

    #[test]
    fn every_count_mutation_appends_a_section_record() {
        let mut counter = Counter::new("counter_1", "sleeve", 1);
        counter.increase_count(10);
        counter.increase_sub_count(11);
        counter.reset_count(12);

        let actions: Vec<SectionAction> = counter
            .section_records
            .iter()
            .map(|record| record.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                SectionAction::CountIncrease,
                SectionAction::SubCountIncrease,
                SectionAction::CountReset,
            ]
        );
        assert_eq!(counter.section_records[1].count, 1);
        assert_eq!(counter.section_records[1].sub_count, 1);
        assert_eq!(counter.section_records[2].count, 0);
    }

    #[test]
    fn sub_count_wraps_when_rule_is_active() {
        let mut counter = Counter::new("counter_1", "cable", 1);
        counter.set_sub_rule(3, true, 2);
        for _ in 0..3 {
            counter.increase_sub_count(3);
        }
        assert_eq!(counter.sub_count, 3);
        counter.increase_sub_count(4);
        assert_eq!(counter.sub_count, 1);

        counter.set_sub_rule(3, false, 5);
        counter.edit_sub_count(3, 6);
        counter.increase_sub_count(7);
        assert_eq!(counter.sub_count, 4);
    }

    #[test]
    fn current_way_alternates_when_enabled() {
        let mut counter = Counter::new("counter_1", "body", 1);
        counter.change_way(Way::Front, 2);
        counter.increase_count(3);
        assert_eq!(counter.current_way(), Way::Front);

        counter.set_way_is_change(true, 4);
        assert_eq!(counter.current_way(), Way::Back);
        counter.increase_count(5);
        assert_eq!(counter.current_way(), Way::Front);
    }

    #[test]
    fn decodes_sparse_record_with_defaults() {
        let counter: Counter = serde_json::from_value(serde_json::json!({
            "id": "counter_5",
            "title": "legacy",
            "count": 7
        }))
        .unwrap();
        assert_eq!(counter.count, 7);
        assert_eq!(counter.way, Way::Front);
        assert!(counter.repeat_rules.is_empty());
        assert_eq!(counter.parent_project_id, None);
    }
}
