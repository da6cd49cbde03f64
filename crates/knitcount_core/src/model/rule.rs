//! Repeat rule model.
//!
//! # Responsibility
//! - Define the periodic reminder record attached to counters.
//! - Provide caller-side validation before rules are persisted.
//!
//! # Invariants
//! - `rule_number == 0` is an inert rule, never an error.
//! - A bound of `0` means "unbounded on this side".
//!
//! # See also
//! - crate::rules for matching and preview semantics.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});

/// Periodic reminder shown when a counter reaches matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepeatRule {
    /// Reminder text shown by the mascot hint.
    pub message: String,
    /// First matching row. `0` leaves the start unbounded.
    pub start_number: i64,
    /// Last row that may match. `0` leaves the end unbounded.
    pub end_number: i64,
    /// Step between matching rows. `0` makes the rule inert.
    pub rule_number: i64,
    /// Display color as `#RRGGBB` hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Validation failures for user-edited rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValidationError {
    NegativeBound { start: i64, end: i64 },
    NegativeRuleNumber(i64),
    EndBeforeStart { start: i64, end: i64 },
    InvalidColor(String),
}

impl Display for RuleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeBound { start, end } => write!(
                f,
                "rule bounds must not be negative (start={start}, end={end})"
            ),
            Self::NegativeRuleNumber(value) => {
                write!(f, "rule_number must not be negative, got {value}")
            }
            Self::EndBeforeStart { start, end } => {
                write!(f, "end_number ({end}) must be >= start_number ({start})")
            }
            Self::InvalidColor(value) => write!(f, "invalid rule color `{value}`"),
        }
    }
}

impl Error for RuleValidationError {}

impl RepeatRule {
    /// Creates a rule without a color. Callers usually assign one through
    /// [`crate::rules::default_color_for_new_rule`].
    pub fn new(
        message: impl Into<String>,
        start_number: i64,
        end_number: i64,
        rule_number: i64,
    ) -> Self {
        Self {
            message: message.into(),
            start_number,
            end_number,
            rule_number,
            color: None,
        }
    }

    /// Returns a copy carrying `color`.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Checks that the rule is inside the matching contract.
    ///
    /// The rule engine itself accepts any integers; this check belongs to
    /// the editing path so that out-of-contract values never get stored.
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.start_number < 0 || self.end_number < 0 {
            return Err(RuleValidationError::NegativeBound {
                start: self.start_number,
                end: self.end_number,
            });
        }
        if self.rule_number < 0 {
            return Err(RuleValidationError::NegativeRuleNumber(self.rule_number));
        }
        if self.start_number > 0 && self.end_number > 0 && self.end_number < self.start_number {
            return Err(RuleValidationError::EndBeforeStart {
                start: self.start_number,
                end: self.end_number,
            });
        }
        if let Some(color) = &self.color {
            if !HEX_COLOR_RE.is_match(color) {
                return Err(RuleValidationError::InvalidColor(color.clone()));
            }
        }
        Ok(())
    }
}
