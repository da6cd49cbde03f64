//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Keep error semantics simple: envelopes carry `ok` plus a message.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Storage-backed calls open the store at `KNITCOUNT_DB_PATH` (or a temp
//!   default); the item list is migrated once per process, before its
//!   first read.

use knitcount_core::{
    calculate_rule_preview, core_version as core_version_inner, default_color_for_new_rule,
    format_elapsed_time, init_logging as init_logging_inner, is_rule_applied, ItemRepository,
    ping as ping_inner, Counter, CounterService, Item, ItemService, KeyValueStore,
    KvItemRepository, MigrationReport, RepeatRule,
    ServiceResult, SortCriteria, SortOptions, SortOrder, SqliteKeyValueStore,
    DEFAULT_PREVIEW_COUNT,
};
use log::error;
use std::path::PathBuf;
use std::sync::OnceLock;

const PREVIEW_LIMIT_MAX: u32 = 20;
const DB_FILE_NAME: &str = "knitcount.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static DATA_MIGRATION: OnceLock<MigrationReport> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
/// Safe to call repeatedly with the same `level + log_dir`.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Whether a rule with these bounds matches `count`.
///
/// # FFI contract
/// - Pure, sync, never fails. Inputs are not validated.
#[flutter_rust_bridge::frb(sync)]
pub fn rule_is_applied(count: i64, start_number: i64, end_number: i64, rule_number: i64) -> bool {
    let rule = RepeatRule::new("", start_number, end_number, rule_number);
    is_rule_applied(count, &rule)
}

/// Upcoming matching rows for the rule editor.
///
/// `max_count` of `None` or `0` uses the default preview length; larger
/// values are capped.
#[flutter_rust_bridge::frb(sync)]
pub fn rule_preview(
    start_number: i64,
    end_number: i64,
    rule_number: i64,
    max_count: Option<u32>,
) -> Vec<i64> {
    calculate_rule_preview(
        start_number,
        end_number,
        rule_number,
        normalize_preview_limit(max_count),
    )
}

/// Color for a new rule given the colors already used on the counter.
#[flutter_rust_bridge::frb(sync)]
pub fn default_rule_color(existing_colors: Vec<String>) -> String {
    let existing: Vec<RepeatRule> = existing_colors
        .into_iter()
        .map(|color| RepeatRule::new("", 0, 0, 0).with_color(color))
        .collect();
    default_color_for_new_rule(&existing).to_string()
}

/// `HH:MM:SS` rendering of a counter's elapsed seconds.
#[flutter_rust_bridge::frb(sync)]
pub fn format_elapsed(seconds: i64) -> String {
    format_elapsed_time(seconds)
}

/// Counter state returned after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    pub counter_id: Option<String>,
    pub count: i64,
    pub sub_count: i64,
    /// Messages of rules matching the new count, in stored order.
    pub applied_messages: Vec<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl CounterActionResponse {
    fn success(message: impl Into<String>, counter: &Counter) -> Self {
        Self {
            ok: true,
            counter_id: Some(counter.id.clone()),
            count: counter.count,
            sub_count: counter.sub_count,
            applied_messages: counter
                .applied_rules()
                .into_iter()
                .map(|rule| rule.message.clone())
                .collect(),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            counter_id: None,
            count: 0,
            sub_count: 0,
            applied_messages: Vec::new(),
            message: message.into(),
        }
    }
}

/// One row of a sorted item list.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSummary {
    pub item_id: String,
    /// `project|counter`.
    pub kind: String,
    pub title: String,
    pub progress: f64,
}

/// Envelope for sorted list queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemListResponse {
    pub ok: bool,
    pub items: Vec<ItemSummary>,
    pub message: String,
}

/// Creates a counter, optionally inside a project.
#[flutter_rust_bridge::frb(sync)]
pub fn create_counter(title: String, parent_project_id: Option<String>) -> CounterActionResponse {
    let result = with_item_service(|service| {
        service.create_counter(title.as_str(), parent_project_id.as_deref())
    });
    match result {
        Ok(counter) => CounterActionResponse::success("Counter created.", &counter),
        Err(err) => CounterActionResponse::failure(format!("create_counter failed: {err}")),
    }
}

/// Adds one row.
#[flutter_rust_bridge::frb(sync)]
pub fn counter_increase(counter_id: String) -> CounterActionResponse {
    match with_counter_service(|service| service.increase_count(counter_id.as_str())) {
        Ok(counter) => CounterActionResponse::success("Count increased.", &counter),
        Err(err) => CounterActionResponse::failure(format!("counter_increase failed: {err}")),
    }
}

/// Removes one row, never going below zero.
#[flutter_rust_bridge::frb(sync)]
pub fn counter_decrease(counter_id: String) -> CounterActionResponse {
    match with_counter_service(|service| service.decrease_count(counter_id.as_str())) {
        Ok(counter) => CounterActionResponse::success("Count decreased.", &counter),
        Err(err) => CounterActionResponse::failure(format!("counter_decrease failed: {err}")),
    }
}

/// Top-level items sorted by the given selection, which is also persisted.
///
/// `criteria` is one of `name|created|startDate|endDate|progress|elapsedTime`
/// and `order` one of `asc|desc`.
#[flutter_rust_bridge::frb(sync)]
pub fn list_items_sorted(
    criteria: String,
    order: String,
    move_completed_to_bottom: bool,
) -> ItemListResponse {
    let options = match parse_sort_options(&criteria, &order, move_completed_to_bottom) {
        Ok(options) => options,
        Err(message) => return list_failure(message),
    };

    let result = with_item_service(|service| {
        service.set_sort_options(&options)?;
        let all = service.repo().list_items()?;
        let sorted = service.list_top_level_sorted_with(&options)?;
        Ok(sorted
            .iter()
            .map(|item| to_item_summary(item, &all))
            .collect::<Vec<_>>())
    });

    match result {
        Ok(items) => {
            let message = if items.is_empty() {
                "No items.".to_string()
            } else {
                format!("Listed {} item(s).", items.len())
            };
            ItemListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => list_failure(format!("list_items_sorted failed: {err}")),
    }
}

fn list_failure(message: String) -> ItemListResponse {
    error!("event=ffi_call module=ffi status=error call=list_items_sorted");
    ItemListResponse {
        ok: false,
        items: Vec::new(),
        message,
    }
}

fn parse_sort_options(
    criteria: &str,
    order: &str,
    move_completed_to_bottom: bool,
) -> Result<SortOptions, String> {
    let criteria = criteria
        .trim()
        .parse::<SortCriteria>()
        .map_err(|err| format!("list_items_sorted failed: {err}"))?;
    let order = order
        .trim()
        .parse::<SortOrder>()
        .map_err(|err| format!("list_items_sorted failed: {err}"))?;
    Ok(SortOptions {
        criteria,
        order,
        move_completed_to_bottom,
    })
}

fn normalize_preview_limit(limit: Option<u32>) -> usize {
    match limit {
        Some(0) | None => DEFAULT_PREVIEW_COUNT,
        Some(value) => value.min(PREVIEW_LIMIT_MAX) as usize,
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("KNITCOUNT_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn open_repo() -> Result<KvItemRepository<SqliteKeyValueStore>, String> {
    let store = SqliteKeyValueStore::open(resolve_db_path())
        .map_err(|err| format!("store open failed: {err}"))?;
    gated_repo(store, &DATA_MIGRATION)
}

// Only the first handle in the process migrates; later ones reuse its report.
fn gated_repo<S: KeyValueStore>(
    store: S,
    gate: &OnceLock<MigrationReport>,
) -> Result<KvItemRepository<S>, String> {
    if let Some(report) = gate.get() {
        return Ok(KvItemRepository::with_migration_report(store, *report));
    }
    let repo = KvItemRepository::new(store);
    let report = repo
        .ensure_migrated()
        .map_err(|err| format!("data migration failed: {err}"))?;
    let _ = gate.set(report);
    Ok(repo)
}

fn with_item_service<T>(
    f: impl FnOnce(&ItemService<KvItemRepository<SqliteKeyValueStore>>) -> ServiceResult<T>,
) -> Result<T, String> {
    let service = ItemService::new(open_repo()?);
    f(&service).map_err(|err| err.to_string())
}

fn with_counter_service<T>(
    f: impl FnOnce(&CounterService<KvItemRepository<SqliteKeyValueStore>>) -> ServiceResult<T>,
) -> Result<T, String> {
    let service = CounterService::new(open_repo()?);
    f(&service).map_err(|err| err.to_string())
}

fn to_item_summary(item: &Item, all: &[Item]) -> ItemSummary {
    let kind = match item {
        Item::Project(_) => "project",
        Item::Counter(_) => "counter",
    };
    ItemSummary {
        item_id: item.id().to_string(),
        kind: kind.to_string(),
        title: item.title().to_string(),
        progress: knitcount_core::progress_percentage(item, all),
    }
}
