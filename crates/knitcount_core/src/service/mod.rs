//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.
//! - Stamp mutations with a time source that tests can replace.

use crate::model::rule::RuleValidationError;
use crate::repo::item_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod counter_service;
pub mod item_service;

/// Source of "now" as Unix epoch milliseconds.
pub type Clock = fn() -> i64;

/// Wall-clock time in epoch milliseconds.
pub fn system_clock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Service error for project and counter use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Titles must contain non-whitespace text.
    EmptyTitle,
    /// Target item does not exist.
    NotFound(String),
    /// Target item exists but is not a counter.
    NotACounter(String),
    /// Target item exists but is not a project.
    NotAProject(String),
    InvalidRule(RuleValidationError),
    RuleIndexOutOfRange { counter_id: String, index: usize },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::NotACounter(id) => write!(f, "item is not a counter: {id}"),
            Self::NotAProject(id) => write!(f, "item is not a project: {id}"),
            Self::InvalidRule(err) => write!(f, "invalid rule: {err}"),
            Self::RuleIndexOutOfRange { counter_id, index } => {
                write!(f, "counter {counter_id} has no rule at index {index}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRule(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<RuleValidationError> for ServiceError {
    fn from(value: RuleValidationError) -> Self {
        Self::InvalidRule(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub(crate) fn normalize_title(title: &str) -> ServiceResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}
