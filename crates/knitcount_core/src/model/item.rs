//! Stored item model: projects and counters.
//!
//! # Responsibility
//! - Define the tagged union persisted as one flat JSON list.
//! - Provide id generation and id timestamp parsing.
//!
//! # Invariants
//! - Ids are `proj_<epochMillis>` / `counter_<epochMillis>` and never reused.
//! - A counter's `parent_project_id` names a project whose `counter_ids`
//!   contains it. The repository maintains this link.

use crate::model::counter::Counter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROJECT_ID_PREFIX: &str = "proj";
pub const COUNTER_ID_PREFIX: &str = "counter";

/// Free-form descriptive data shared by projects and counters.
///
/// Unknown keys are kept in `extra` so that records written by newer
/// builds survive a read-modify-write cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `YYYY.MM.DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// `YYYY.MM.DD`. A non-empty value marks the item as finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemInfo {
    pub fn has_end_date(&self) -> bool {
        self.end_date
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }
}

/// Named group of counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    /// `proj_<epochMillis>`.
    pub id: String,
    pub title: String,
    /// Ordered child counter ids.
    pub counter_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ItemInfo>,
}

impl Project {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            counter_ids: Vec::new(),
            info: None,
        }
    }
}

/// One record of the persisted item list, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Project(Project),
    Counter(Counter),
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Self::Project(project) => &project.id,
            Self::Counter(counter) => &counter.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Project(project) => &project.title,
            Self::Counter(counter) => &counter.title,
        }
    }

    pub fn info(&self) -> Option<&ItemInfo> {
        match self {
            Self::Project(project) => project.info.as_ref(),
            Self::Counter(counter) => counter.info.as_ref(),
        }
    }

    pub fn info_mut(&mut self) -> &mut Option<ItemInfo> {
        match self {
            Self::Project(project) => &mut project.info,
            Self::Counter(counter) => &mut counter.info,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        match self {
            Self::Project(project) => project.title = title.into(),
            Self::Counter(counter) => counter.title = title.into(),
        }
    }

    pub fn as_counter(&self) -> Option<&Counter> {
        match self {
            Self::Counter(counter) => Some(counter),
            Self::Project(_) => None,
        }
    }

    pub fn as_project(&self) -> Option<&Project> {
        match self {
            Self::Project(project) => Some(project),
            Self::Counter(_) => None,
        }
    }

    /// Whether the item belongs on the top-level list (projects and
    /// counters without a parent).
    pub fn is_top_level(&self) -> bool {
        match self {
            Self::Project(_) => true,
            Self::Counter(counter) => counter.parent_project_id.is_none(),
        }
    }

    /// Creation time encoded in the id, or `0` for malformed ids.
    pub fn created_at(&self) -> i64 {
        id_timestamp(self.id())
    }
}

/// Builds an id from a prefix and epoch milliseconds.
pub fn make_item_id(prefix: &str, epoch_ms: i64) -> String {
    format!("{prefix}_{epoch_ms}")
}

/// Returns a fresh id at or after `epoch_ms` that no existing item uses.
pub fn next_item_id(prefix: &str, epoch_ms: i64, existing: &[Item]) -> String {
    let mut candidate_ms = epoch_ms;
    loop {
        let candidate = make_item_id(prefix, candidate_ms);
        if !existing.iter().any(|item| item.id() == candidate) {
            return candidate;
        }
        candidate_ms += 1;
    }
}

/// Parses the timestamp token of an id. Malformed ids yield `0`.
pub fn id_timestamp(id: &str) -> i64 {
    id.split('_')
        .nth(1)
        .and_then(|token| token.parse::<i64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{id_timestamp, next_item_id, Item, ItemInfo, Project, COUNTER_ID_PREFIX};
    use crate::model::counter::Counter;

    #[test]
    fn id_timestamp_handles_malformed_ids() {
        assert_eq!(id_timestamp("proj_1700000000000"), 1_700_000_000_000);
        assert_eq!(id_timestamp("counter_abc"), 0);
        assert_eq!(id_timestamp("nounderscore"), 0);
        assert_eq!(id_timestamp(""), 0);
    }

    #[test]
    fn next_item_id_skips_taken_ids() {
        let existing = vec![Item::Counter(Counter::new("counter_100", "a", 100))];
        assert_eq!(
            next_item_id(COUNTER_ID_PREFIX, 100, &existing),
            "counter_101"
        );
        assert_eq!(next_item_id(COUNTER_ID_PREFIX, 50, &existing), "counter_50");
    }

    #[test]
    fn item_serializes_with_type_tag() {
        let mut project = Project::new("proj_1", "Sweater");
        project.counter_ids.push("counter_2".to_string());
        let json = serde_json::to_value(Item::Project(project)).unwrap();
        assert_eq!(json["type"], "project");
        assert_eq!(json["counterIds"][0], "counter_2");

        let json = serde_json::to_value(Item::Counter(Counter::new("counter_2", "Body", 5))).unwrap();
        assert_eq!(json["type"], "counter");
        assert_eq!(json["way"], "front");
        assert_eq!(json["updatedAt"], 5);
    }

    #[test]
    fn info_keeps_unknown_keys() {
        let info: ItemInfo = serde_json::from_value(serde_json::json!({
            "startDate": "2024.01.02",
            "yarn": "merino"
        }))
        .unwrap();
        assert_eq!(info.start_date.as_deref(), Some("2024.01.02"));
        assert!(!info.has_end_date());
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["yarn"], "merino");
    }
}
