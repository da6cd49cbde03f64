//! Project and counter lifecycle service.
//!
//! # Responsibility
//! - Create, rename, annotate, move and delete items.
//! - Produce the ordered lists shown on the home and project screens.
//!
//! # Invariants
//! - New ids are unique within the stored list.
//! - Sorted listings use the persisted sort selection unless one is passed.

use crate::model::counter::Counter;
use crate::model::item::{
    next_item_id, Item, ItemInfo, Project, COUNTER_ID_PREFIX, PROJECT_ID_PREFIX,
};
use crate::repo::item_repo::ItemRepository;
use crate::service::{normalize_title, system_clock, Clock, ServiceError, ServiceResult};
use crate::sort::{progress_percentage, sort_items, SortOptions};

/// Use-case service for item lifecycle and listings.
pub struct ItemService<R: ItemRepository> {
    repo: R,
    clock: Clock,
}

impl<R: ItemRepository> ItemService<R> {
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

    /// Creates an empty project.
    pub fn create_project(&self, title: &str) -> ServiceResult<Project> {
        let title = normalize_title(title)?;
        let items = self.repo.list_items()?;
        let id = next_item_id(PROJECT_ID_PREFIX, (self.clock)(), &items);
        let project = Project::new(id, title);
        self.repo.create_item(&Item::Project(project.clone()))?;
        Ok(project)
    }

    /// Creates a counter, optionally inside `parent_project_id`.
    pub fn create_counter(
        &self,
        title: &str,
        parent_project_id: Option<&str>,
    ) -> ServiceResult<Counter> {
        let title = normalize_title(title)?;
        let items = self.repo.list_items()?;
        if let Some(parent_id) = parent_project_id {
            match items.iter().find(|item| item.id() == parent_id) {
                Some(Item::Project(_)) => {}
                Some(Item::Counter(_)) => {
                    return Err(ServiceError::NotAProject(parent_id.to_string()))
                }
                None => return Err(ServiceError::NotFound(parent_id.to_string())),
            }
        }

        let now = (self.clock)();
        let id = next_item_id(COUNTER_ID_PREFIX, now, &items);
        let mut counter = Counter::new(id, title, now);
        counter.parent_project_id = parent_project_id.map(str::to_string);
        self.repo.create_item(&Item::Counter(counter.clone()))?;
        Ok(counter)
    }

    pub fn get_item(&self, id: &str) -> ServiceResult<Item> {
        self.repo
            .get_item(id)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    pub fn rename_item(&self, id: &str, title: &str) -> ServiceResult<Item> {
        let title = normalize_title(title)?;
        let mut item = self.get_item(id)?;
        item.set_title(title);
        self.touch(&mut item);
        self.repo.update_item(&item)?;
        Ok(item)
    }

    /// Replaces the descriptive info block (dates, description).
    pub fn set_item_info(&self, id: &str, info: Option<ItemInfo>) -> ServiceResult<Item> {
        let mut item = self.get_item(id)?;
        *item.info_mut() = info;
        self.touch(&mut item);
        self.repo.update_item(&item)?;
        Ok(item)
    }

    /// Deletes an item. Returns every removed id, including child counters.
    pub fn delete_item(&self, id: &str) -> ServiceResult<Vec<String>> {
        Ok(self.repo.delete_item(id)?)
    }

    pub fn move_counter(&self, counter_id: &str, project_id: Option<&str>) -> ServiceResult<()> {
        Ok(self.repo.move_counter(counter_id, project_id)?)
    }

    /// Progress of one item against the full stored list.
    pub fn progress(&self, id: &str) -> ServiceResult<f64> {
        let items = self.repo.list_items()?;
        let item = items
            .iter()
            .find(|item| item.id() == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        Ok(progress_percentage(item, &items))
    }

    pub fn sort_options(&self) -> ServiceResult<SortOptions> {
        Ok(self.repo.load_sort_options()?)
    }

    pub fn set_sort_options(&self, options: &SortOptions) -> ServiceResult<()> {
        Ok(self.repo.save_sort_options(options)?)
    }

    /// Projects and independent counters, sorted by the persisted selection.
    pub fn list_top_level_sorted(&self) -> ServiceResult<Vec<Item>> {
        let options = self.repo.load_sort_options()?;
        self.list_top_level_sorted_with(&options)
    }

    pub fn list_top_level_sorted_with(&self, options: &SortOptions) -> ServiceResult<Vec<Item>> {
        let items = self.repo.list_items()?;
        let top_level: Vec<Item> = items
            .iter()
            .filter(|item| item.is_top_level())
            .cloned()
            .collect();
        Ok(sort_items(top_level, &items, options))
    }

    /// Counters of one project, sorted by `options`.
    pub fn list_project_counters_sorted(
        &self,
        project_id: &str,
        options: &SortOptions,
    ) -> ServiceResult<Vec<Item>> {
        let items = self.repo.list_items()?;
        let project = match items.iter().find(|item| item.id() == project_id) {
            Some(Item::Project(project)) => project,
            Some(Item::Counter(_)) => return Err(ServiceError::NotAProject(project_id.to_string())),
            None => return Err(ServiceError::NotFound(project_id.to_string())),
        };
        let children: Vec<Item> = project
            .counter_ids
            .iter()
            .filter_map(|id| items.iter().find(|item| item.id() == id.as_str()).cloned())
            .collect();
        Ok(sort_items(children, &items, options))
    }

    fn touch(&self, item: &mut Item) {
        if let Item::Counter(counter) = item {
            counter.updated_at = (self.clock)();
        }
    }
}
