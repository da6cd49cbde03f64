//! Item repository contract and key-value implementation.
//!
//! # Responsibility
//! - Provide read-modify-write access to the flat item list.
//! - Maintain the counter `parent_project_id` / project `counter_ids` link.
//! - Persist the user's sort selection.
//!
//! # Invariants
//! - Data migration runs at most once per repository handle, before any
//!   read or write of the item list. A handle built with
//!   [`KvItemRepository::with_migration_report`] skips it entirely.
//! - Persisted records that do not decode are reported, never dropped.

use crate::migration::{migrate_store, parse_item_list, MigrationReport};
use crate::model::item::{Item, Project};
use crate::sort::{SortCriteria, SortOptions, SortOrder};
use crate::store::{
    KeyValueStore, StoreError, ITEMS_KEY, SORT_CRITERIA_KEY, SORT_MOVE_COMPLETED_KEY,
    SORT_ORDER_KEY,
};
use log::{info, warn};
use once_cell::unsync::OnceCell;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and link maintenance.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    NotFound(String),
    DuplicateId(String),
    /// Write would break the counter/project link.
    InvalidLink(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::DuplicateId(id) => write!(f, "item id already exists: {id}"),
            Self::InvalidLink(message) => write!(f, "invalid project link: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateId(_) | Self::InvalidLink(_) => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Store(StoreError::Serialization(value))
    }
}

/// Repository interface for the persisted item list.
pub trait ItemRepository {
    fn list_items(&self) -> RepoResult<Vec<Item>>;
    fn get_item(&self, id: &str) -> RepoResult<Option<Item>>;
    fn create_item(&self, item: &Item) -> RepoResult<()>;
    fn update_item(&self, item: &Item) -> RepoResult<()>;
    /// Deletes an item and returns every removed id. Deleting a project also
    /// deletes its counters.
    fn delete_item(&self, id: &str) -> RepoResult<Vec<String>>;
    /// Re-links a counter to `project_id`, or to the top level with `None`.
    fn move_counter(&self, counter_id: &str, project_id: Option<&str>) -> RepoResult<()>;
    fn load_sort_options(&self) -> RepoResult<SortOptions>;
    fn save_sort_options(&self, options: &SortOptions) -> RepoResult<()>;
}

/// Item repository backed by any [`KeyValueStore`].
pub struct KvItemRepository<S: KeyValueStore> {
    store: S,
    migration: OnceCell<MigrationReport>,
}

impl<S: KeyValueStore> KvItemRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            migration: OnceCell::new(),
        }
    }

    /// Creates a repository for a store that was already migrated in this
    /// process, so opening it performs no data-version write.
    pub fn with_migration_report(store: S, report: MigrationReport) -> Self {
        Self {
            store,
            migration: OnceCell::from(report),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs pending data migrations if this handle has not done so yet.
    pub fn ensure_migrated(&self) -> RepoResult<MigrationReport> {
        let report = self
            .migration
            .get_or_try_init(|| migrate_store(&self.store))?;
        Ok(*report)
    }

    /// Report of the migration run by this handle, if any ran yet.
    pub fn migration_report(&self) -> Option<MigrationReport> {
        self.migration.get().copied()
    }

    fn load(&self) -> RepoResult<Vec<Item>> {
        self.ensure_migrated()?;
        let Some(raw) = self.store.get(ITEMS_KEY)? else {
            return Ok(Vec::new());
        };
        let records = parse_item_list(&raw)?;
        serde_json::from_value::<Vec<Item>>(Value::Array(records)).map_err(|err| {
            RepoError::Store(StoreError::InvalidData(format!(
                "stored item failed to decode: {err}"
            )))
        })
    }

    fn save(&self, items: &[Item]) -> RepoResult<()> {
        self.ensure_migrated()?;
        let encoded = serde_json::to_string(items)?;
        self.store.set(ITEMS_KEY, &encoded)?;
        Ok(())
    }
}

impl<S: KeyValueStore> ItemRepository for KvItemRepository<S> {
    fn list_items(&self) -> RepoResult<Vec<Item>> {
        self.load()
    }

    fn get_item(&self, id: &str) -> RepoResult<Option<Item>> {
        Ok(self.load()?.into_iter().find(|item| item.id() == id))
    }

    fn create_item(&self, item: &Item) -> RepoResult<()> {
        let mut items = self.load()?;
        if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(RepoError::DuplicateId(item.id().to_string()));
        }

        if let Item::Counter(counter) = item {
            if let Some(parent_id) = counter.parent_project_id.as_deref() {
                let parent = find_project_mut(&mut items, parent_id)?;
                if !parent.counter_ids.iter().any(|id| id == &counter.id) {
                    parent.counter_ids.push(counter.id.clone());
                }
            }
        }

        items.push(item.clone());
        self.save(&items)?;
        info!(
            "event=item_create module=repo status=ok item_id={}",
            item.id()
        );
        Ok(())
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        let mut items = self.load()?;
        let slot = items
            .iter_mut()
            .find(|existing| existing.id() == item.id())
            .ok_or_else(|| RepoError::NotFound(item.id().to_string()))?;

        match (&*slot, item) {
            (Item::Counter(current), Item::Counter(next)) => {
                if current.parent_project_id != next.parent_project_id {
                    return Err(RepoError::InvalidLink(format!(
                        "counter `{}` changes parent on update; use move_counter",
                        next.id
                    )));
                }
            }
            (Item::Project(current), Item::Project(next)) => {
                let mut before = current.counter_ids.clone();
                let mut after = next.counter_ids.clone();
                before.sort();
                after.sort();
                if before != after {
                    return Err(RepoError::InvalidLink(format!(
                        "project `{}` counter_ids may only be reordered on update",
                        next.id
                    )));
                }
            }
            _ => {
                return Err(RepoError::InvalidLink(format!(
                    "item `{}` cannot change type",
                    item.id()
                )));
            }
        }

        *slot = item.clone();
        self.save(&items)
    }

    fn delete_item(&self, id: &str) -> RepoResult<Vec<String>> {
        let mut items = self.load()?;
        let target = items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;

        let mut removed = vec![id.to_string()];
        match &target {
            Item::Project(project) => {
                items.retain(|item| match item {
                    Item::Counter(counter) => {
                        let owned = counter.parent_project_id.as_deref() == Some(id)
                            || project.counter_ids.contains(&counter.id);
                        if owned {
                            removed.push(counter.id.clone());
                        }
                        !owned
                    }
                    Item::Project(other) => other.id != id,
                });
            }
            Item::Counter(counter) => {
                if let Some(parent_id) = counter.parent_project_id.as_deref() {
                    if let Ok(parent) = find_project_mut(&mut items, parent_id) {
                        parent.counter_ids.retain(|child| child != id);
                    }
                }
                items.retain(|item| item.id() != id);
            }
        }

        self.save(&items)?;
        info!(
            "event=item_delete module=repo status=ok item_id={} removed_count={}",
            id,
            removed.len()
        );
        Ok(removed)
    }

    fn move_counter(&self, counter_id: &str, project_id: Option<&str>) -> RepoResult<()> {
        let mut items = self.load()?;
        let previous_parent = items
            .iter()
            .find_map(|item| match item {
                Item::Counter(counter) if counter.id == counter_id => {
                    Some(counter.parent_project_id.clone())
                }
                _ => None,
            })
            .ok_or_else(|| RepoError::NotFound(counter_id.to_string()))?;

        if let Some(target_id) = project_id {
            // Validate before detaching so a bad target leaves the list untouched.
            find_project_mut(&mut items, target_id)?;
        }

        if let Some(old_parent_id) = previous_parent.as_deref() {
            if let Ok(old_parent) = find_project_mut(&mut items, old_parent_id) {
                old_parent.counter_ids.retain(|child| child != counter_id);
            }
        }
        if let Some(target_id) = project_id {
            let target = find_project_mut(&mut items, target_id)?;
            target.counter_ids.push(counter_id.to_string());
        }

        for item in &mut items {
            if let Item::Counter(counter) = item {
                if counter.id == counter_id {
                    counter.parent_project_id = project_id.map(str::to_string);
                }
            }
        }

        self.save(&items)
    }

    fn load_sort_options(&self) -> RepoResult<SortOptions> {
        let defaults = SortOptions::default();
        let criteria = match self.store.get(SORT_CRITERIA_KEY)? {
            Some(raw) => raw.parse::<SortCriteria>().unwrap_or_else(|err| {
                warn!("event=sort_options_load module=repo status=warn error={err}");
                defaults.criteria
            }),
            None => defaults.criteria,
        };
        let order = match self.store.get(SORT_ORDER_KEY)? {
            Some(raw) => raw.parse::<SortOrder>().unwrap_or_else(|err| {
                warn!("event=sort_options_load module=repo status=warn error={err}");
                defaults.order
            }),
            None => defaults.order,
        };
        let move_completed_to_bottom = self
            .store
            .get(SORT_MOVE_COMPLETED_KEY)?
            .map_or(defaults.move_completed_to_bottom, |raw| raw == "true");

        Ok(SortOptions {
            criteria,
            order,
            move_completed_to_bottom,
        })
    }

    fn save_sort_options(&self, options: &SortOptions) -> RepoResult<()> {
        self.store.set(SORT_CRITERIA_KEY, options.criteria.as_str())?;
        self.store.set(SORT_ORDER_KEY, options.order.as_str())?;
        self.store.set(
            SORT_MOVE_COMPLETED_KEY,
            if options.move_completed_to_bottom {
                "true"
            } else {
                "false"
            },
        )?;
        Ok(())
    }
}

fn find_project_mut<'a>(
    items: &'a mut [Item],
    project_id: &str,
) -> RepoResult<&'a mut Project> {
    items
        .iter_mut()
        .find_map(|item| match item {
            Item::Project(project) if project.id == project_id => Some(project),
            _ => None,
        })
        .ok_or_else(|| RepoError::NotFound(project_id.to_string()))
}
