//! Counter mutation service.
//!
//! # Responsibility
//! - Apply count, sub-count, rule and timer changes to stored counters.
//! - Validate rules before they are persisted.
//!
//! # Invariants
//! - Every mutation is a full read-modify-write of one counter record.
//! - Rules are stored only after `RepeatRule::validate` succeeds.
//! - New rules without a color get the first free palette swatch.

use crate::model::counter::{Counter, Way};
use crate::model::item::Item;
use crate::model::rule::RepeatRule;
use crate::repo::item_repo::ItemRepository;
use crate::rules::default_color_for_new_rule;
use crate::service::{system_clock, Clock, ServiceError, ServiceResult};

/// Use-case service for counter state changes.
pub struct CounterService<R: ItemRepository> {
    repo: R,
    clock: Clock,
}

impl<R: ItemRepository> CounterService<R> {
    /// Creates a service using the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, system_clock)
    }

    pub fn with_clock(repo: R, clock: Clock) -> Self {
        Self { repo, clock }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn get_counter(&self, counter_id: &str) -> ServiceResult<Counter> {
        match self.repo.get_item(counter_id)? {
            Some(Item::Counter(counter)) => Ok(counter),
            Some(Item::Project(_)) => Err(ServiceError::NotACounter(counter_id.to_string())),
            None => Err(ServiceError::NotFound(counter_id.to_string())),
        }
    }

    pub fn increase_count(&self, counter_id: &str) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.increase_count(now);
            Ok(())
        })
    }

    pub fn decrease_count(&self, counter_id: &str) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.decrease_count(now);
            Ok(())
        })
    }

    pub fn reset_count(&self, counter_id: &str) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.reset_count(now);
            Ok(())
        })
    }

    pub fn edit_count(&self, counter_id: &str, value: i64) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.edit_count(value, now);
            Ok(())
        })
    }

    pub fn increase_sub_count(&self, counter_id: &str) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.increase_sub_count(now);
            Ok(())
        })
    }

    pub fn decrease_sub_count(&self, counter_id: &str) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.decrease_sub_count(now);
            Ok(())
        })
    }

    pub fn reset_sub_count(&self, counter_id: &str) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.reset_sub_count(now);
            Ok(())
        })
    }

    pub fn edit_sub_count(&self, counter_id: &str, value: i64) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.edit_sub_count(value, now);
            Ok(())
        })
    }

    pub fn set_sub_rule(
        &self,
        counter_id: &str,
        sub_rule: i64,
        is_active: bool,
    ) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.set_sub_rule(sub_rule, is_active, now);
            Ok(())
        })
    }

    pub fn set_mascot_active(&self, counter_id: &str, is_active: bool) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.set_mascot_active(is_active, now);
            Ok(())
        })
    }

    pub fn change_way(&self, counter_id: &str, way: Way) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.change_way(way, now);
            Ok(())
        })
    }

    pub fn set_way_is_change(&self, counter_id: &str, enabled: bool) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.set_way_is_change(enabled, now);
            Ok(())
        })
    }

    pub fn set_target_count(&self, counter_id: &str, target: i64) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.set_target_count(target, now);
            Ok(())
        })
    }

    /// Appends a rule. A rule without a color gets a free palette swatch.
    pub fn add_rule(&self, counter_id: &str, rule: RepeatRule) -> ServiceResult<Counter> {
        self.apply(counter_id, move |counter, now| {
            let mut rule = rule;
            if rule.color.is_none() {
                rule.color = Some(default_color_for_new_rule(&counter.repeat_rules).to_string());
            }
            rule.validate()?;
            counter.repeat_rules.push(rule);
            counter.updated_at = now;
            Ok(())
        })
    }

    /// Replaces the rule at `index`. A missing color keeps the old one.
    pub fn update_rule(
        &self,
        counter_id: &str,
        index: usize,
        rule: RepeatRule,
    ) -> ServiceResult<Counter> {
        self.apply(counter_id, move |counter, now| {
            if index >= counter.repeat_rules.len() {
                return Err(ServiceError::RuleIndexOutOfRange {
                    counter_id: counter.id.clone(),
                    index,
                });
            }
            let slot = &mut counter.repeat_rules[index];
            let mut rule = rule;
            if rule.color.is_none() {
                rule.color = slot.color.clone();
            }
            rule.validate()?;
            *slot = rule;
            counter.updated_at = now;
            Ok(())
        })
    }

    pub fn delete_rule(&self, counter_id: &str, index: usize) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            if index >= counter.repeat_rules.len() {
                return Err(ServiceError::RuleIndexOutOfRange {
                    counter_id: counter.id.clone(),
                    index,
                });
            }
            counter.repeat_rules.remove(index);
            counter.updated_at = now;
            Ok(())
        })
    }

    /// Rules matching the counter's current count, in stored order.
    pub fn applied_rules(&self, counter_id: &str) -> ServiceResult<Vec<RepeatRule>> {
        let counter = self.get_counter(counter_id)?;
        Ok(counter.applied_rules().into_iter().cloned().collect())
    }

    pub fn start_timer(&self, counter_id: &str) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.start_timer(now);
            Ok(())
        })
    }

    pub fn pause_timer(&self, counter_id: &str) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.pause_timer(now);
            Ok(())
        })
    }

    pub fn add_elapsed_seconds(&self, counter_id: &str, seconds: i64) -> ServiceResult<Counter> {
        self.apply(counter_id, |counter, now| {
            counter.add_elapsed_seconds(seconds, now);
            Ok(())
        })
    }

    fn apply(
        &self,
        counter_id: &str,
        mutate: impl FnOnce(&mut Counter, i64) -> ServiceResult<()>,
    ) -> ServiceResult<Counter> {
        let mut counter = self.get_counter(counter_id)?;
        mutate(&mut counter, (self.clock)())?;
        self.repo.update_item(&Item::Counter(counter.clone()))?;
        Ok(counter)
    }
}
