//! Core domain logic for KnitCount.
//! This crate is the single source of truth for counter, rule and storage
//! invariants; UI layers call into it through plain function arguments.

pub mod db;
pub mod format;
pub mod logging;
pub mod migration;
pub mod model;
pub mod repo;
pub mod rules;
pub mod service;
pub mod sort;
pub mod store;

pub use format::{clamp_elapsed_time, format_elapsed_time, MAX_ELAPSED_SECONDS};
pub use logging::{default_log_level, init_logging, logging_status};
pub use migration::{
    latest_data_version, migrate_store, run_migrations, MigrationReport, CURRENT_DATA_VERSION,
};
pub use model::counter::{Counter, SectionAction, SectionRecord, Way, MAX_COUNT};
pub use model::item::{id_timestamp, Item, ItemInfo, Project};
pub use model::rule::{RepeatRule, RuleValidationError};
pub use repo::item_repo::{ItemRepository, KvItemRepository, RepoError, RepoResult};
pub use rules::{
    applied_rules, calculate_rule_preview, default_color_for_new_rule, is_rule_applied,
    rule_preview, DEFAULT_PREVIEW_COUNT,
};
pub use service::counter_service::CounterService;
pub use service::item_service::ItemService;
pub use service::{ServiceError, ServiceResult};
pub use sort::{
    is_item_completed, parse_date_key, progress_percentage, sort_items, SortCriteria, SortOptions,
    SortOrder,
};
pub use store::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError, StoreResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
