//! Progress computation and list ordering.
//!
//! # Responsibility
//! - Derive a clamped progress percentage for projects and counters.
//! - Sort item lists by user-selected criteria, optionally moving completed
//!   items to the end.
//!
//! # Invariants
//! - `progress_percentage` is always within `0.0..=100.0`.
//! - With `move_completed_to_bottom`, every completed item follows every
//!   incomplete one.
//! - Sorting is stable (`slice::sort_by`), so equal keys keep input order.

use crate::model::counter::Counter;
use crate::model::item::{Item, Project};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const MAX_DATE_YEAR: i64 = 9999;
const MAX_DATE_PART: i64 = 99;

/// Key used to order item lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortCriteria {
    Name,
    #[default]
    Created,
    StartDate,
    EndDate,
    Progress,
    /// Not ranked yet; every item compares equal.
    ElapsedTime,
}

impl SortCriteria {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Created => "created",
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
            Self::Progress => "progress",
            Self::ElapsedTime => "elapsedTime",
        }
    }
}

/// Direction applied on top of the criteria comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Error for unknown persisted sort strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortError(pub String);

impl Display for ParseSortError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown sort value `{}`", self.0)
    }
}

impl std::error::Error for ParseSortError {}

impl FromStr for SortCriteria {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "name" => Ok(Self::Name),
            "created" => Ok(Self::Created),
            "startDate" => Ok(Self::StartDate),
            "endDate" => Ok(Self::EndDate),
            "progress" => Ok(Self::Progress),
            "elapsedTime" => Ok(Self::ElapsedTime),
            other => Err(ParseSortError(other.to_string())),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ParseSortError(other.to_string())),
        }
    }
}

/// Full sort selection as chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOptions {
    pub criteria: SortCriteria,
    pub order: SortOrder,
    pub move_completed_to_bottom: bool,
}

/// Completion percentage of an item.
///
/// `all_items` is the full stored list, used to resolve project children.
pub fn progress_percentage(item: &Item, all_items: &[Item]) -> f64 {
    if item.info().is_some_and(|info| info.has_end_date()) {
        return 100.0;
    }

    let progress = match item {
        Item::Counter(counter) => counter_progress(counter),
        Item::Project(project) => project_progress(project, all_items),
    };
    progress.clamp(0.0, 100.0)
}

/// Whether an item has reached 100% progress.
pub fn is_item_completed(item: &Item, all_items: &[Item]) -> bool {
    progress_percentage(item, all_items) >= 100.0
}

fn counter_progress(counter: &Counter) -> f64 {
    if counter.target_count <= 0 {
        return 0.0;
    }
    (counter.count as f64 / counter.target_count as f64 * 100.0).min(100.0)
}

// Project progress is discounted by the share of children that have a target.
fn project_progress(project: &Project, all_items: &[Item]) -> f64 {
    let children: Vec<&Counter> = project
        .counter_ids
        .iter()
        .filter_map(|id| {
            all_items
                .iter()
                .filter_map(Item::as_counter)
                .find(|counter| &counter.id == id)
        })
        .collect();

    let targeted: Vec<&&Counter> = children
        .iter()
        .filter(|counter| counter.target_count > 0)
        .collect();
    if targeted.is_empty() {
        return 0.0;
    }

    let count_sum: i64 = targeted.iter().map(|counter| counter.count).sum();
    let target_sum: i64 = targeted.iter().map(|counter| counter.target_count).sum();
    let ratio = (count_sum as f64 / target_sum as f64 * 100.0).min(100.0);
    let coverage = targeted.len() as f64 / children.len() as f64;
    (ratio * coverage).min(100.0)
}

/// Parses `YYYY.MM.DD` (or any prefix of it) into `YYYYMMDD` as an integer.
///
/// Missing, empty or non-numeric components count as `0`, so an empty date
/// sorts first. `-` and `/` are accepted as separators too. Components are
/// clamped (year to `0..=9999`, month and day to `0..=99`) so the key never
/// overflows.
pub fn parse_date_key(value: &str) -> i64 {
    let mut parts = value
        .trim()
        .split(['.', '-', '/'])
        .map(|part| part.trim().parse::<i64>().unwrap_or(0));
    let year = parts.next().unwrap_or(0).clamp(0, MAX_DATE_YEAR);
    let month = parts.next().unwrap_or(0).clamp(0, MAX_DATE_PART);
    let day = parts.next().unwrap_or(0).clamp(0, MAX_DATE_PART);
    year * 10_000 + month * 100 + day
}

fn start_date_key(item: &Item) -> i64 {
    item.info()
        .and_then(|info| info.start_date.as_deref())
        .map_or(0, parse_date_key)
}

fn end_date_key(item: &Item) -> i64 {
    item.info()
        .and_then(|info| info.end_date.as_deref())
        .map_or(0, parse_date_key)
}

fn compare_names(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

fn compare_items(
    left: &Item,
    right: &Item,
    all_items: &[Item],
    options: &SortOptions,
) -> Ordering {
    let ordering = match options.criteria {
        SortCriteria::Name => compare_names(left.title(), right.title()),
        SortCriteria::Created => left.created_at().cmp(&right.created_at()),
        SortCriteria::StartDate => start_date_key(left).cmp(&start_date_key(right)),
        SortCriteria::EndDate => end_date_key(left).cmp(&end_date_key(right)),
        SortCriteria::Progress => progress_percentage(left, all_items)
            .total_cmp(&progress_percentage(right, all_items)),
        SortCriteria::ElapsedTime => Ordering::Equal,
    };

    match options.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Sorts `items` by `options`.
///
/// `all_items` resolves project children for progress-based ordering and
/// completion checks; it is usually the full stored list.
pub fn sort_items(mut items: Vec<Item>, all_items: &[Item], options: &SortOptions) -> Vec<Item> {
    let comparator = |left: &Item, right: &Item| compare_items(left, right, all_items, options);

    if !options.move_completed_to_bottom {
        items.sort_by(comparator);
        return items;
    }

    let (mut completed, mut incomplete): (Vec<Item>, Vec<Item>) = items
        .into_iter()
        .partition(|item| is_item_completed(item, all_items));
    incomplete.sort_by(comparator);
    completed.sort_by(comparator);
    incomplete.extend(completed);
    incomplete
}
