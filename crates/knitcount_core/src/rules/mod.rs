//! Repeat rule matching and preview generation.
//!
//! # Responsibility
//! - Decide whether a rule applies to a given row count.
//! - Enumerate the first rows a rule will apply to, for editing previews.
//! - Pick display colors for new rules.
//!
//! # Invariants
//! - Every function here is pure and never fails.
//! - `calculate_rule_preview` only yields counts for which
//!   `is_rule_applied` is true.
//! - Without a start bound the progression is anchored at `rule_number`,
//!   not at zero. Previews and matching must agree on this.
//!
//! Negative inputs are outside the contract; callers validate with
//! [`RepeatRule::validate`] before storing rules.

use crate::model::rule::RepeatRule;

/// Number of preview entries shown while editing a rule.
pub const DEFAULT_PREVIEW_COUNT: usize = 5;

/// Rule color swatches. Index 1 matches the app background and is never
/// handed out for new rules.
pub const RULE_COLOR_SWATCHES: [&str; 11] = [
    "#E57373", "#FFF8F0", "#FFB74D", "#FFD54F", "#AED581", "#4DB6AC", "#4FC3F7", "#7986CB",
    "#BA68C8", "#F06292", "#A1887F",
];

/// Swatch indices in the order new rules receive them.
pub const NEW_RULE_COLOR_PRIORITY: [usize; 10] = [0, 2, 4, 6, 8, 10, 3, 5, 7, 9];

/// Returns whether `rule` matches `count`.
///
/// - `rule_number == 0`: never matches.
/// - Start and end set: `start, start + n, ...` up to `end`.
/// - Start only: `start, start + n, ...` without limit.
/// - End only: `n, 2n, ...` up to `end`.
/// - Neither set: never matches.
pub fn is_rule_applied(count: i64, rule: &RepeatRule) -> bool {
    let start = rule.start_number;
    let end = rule.end_number;
    let step = rule.rule_number;
    if step == 0 {
        return false;
    }

    match (start > 0, end > 0) {
        (true, true) => count >= start && count <= end && (count - start) % step == 0,
        (true, false) => count >= start && (count - start) % step == 0,
        (false, true) => count >= step && count <= end && count % step == 0,
        (false, false) => false,
    }
}

/// Lists up to `max_count` counts at which a rule with these bounds applies,
/// in increasing order.
///
/// An unbounded (start-only) rule always returns exactly `max_count` values;
/// the caller shows a continuation marker in that case.
pub fn calculate_rule_preview(
    start_number: i64,
    end_number: i64,
    rule_number: i64,
    max_count: usize,
) -> Vec<i64> {
    if rule_number == 0 {
        return Vec::new();
    }

    let anchor = if start_number > 0 {
        start_number
    } else if end_number > 0 {
        rule_number
    } else {
        return Vec::new();
    };
    let bounded = end_number > 0;

    let mut preview = Vec::with_capacity(max_count.min(DEFAULT_PREVIEW_COUNT));
    let mut next = Some(anchor);
    while let Some(value) = next {
        if preview.len() >= max_count || (bounded && value > end_number) {
            break;
        }
        preview.push(value);
        next = value.checked_add(rule_number);
    }
    preview
}

/// Preview for an existing rule using [`DEFAULT_PREVIEW_COUNT`].
pub fn rule_preview(rule: &RepeatRule) -> Vec<i64> {
    calculate_rule_preview(
        rule.start_number,
        rule.end_number,
        rule.rule_number,
        DEFAULT_PREVIEW_COUNT,
    )
}

/// Rules that match `count`, in their stored order.
pub fn applied_rules(count: i64, rules: &[RepeatRule]) -> Vec<&RepeatRule> {
    rules
        .iter()
        .filter(|rule| is_rule_applied(count, rule))
        .collect()
}

/// Picks the first swatch in priority order that no existing rule uses.
///
/// Falls back to the first priority swatch when all are taken.
pub fn default_color_for_new_rule(existing_rules: &[RepeatRule]) -> &'static str {
    let used: Vec<String> = existing_rules
        .iter()
        .filter_map(|rule| rule.color.as_deref())
        .map(str::to_ascii_uppercase)
        .collect();

    NEW_RULE_COLOR_PRIORITY
        .iter()
        .map(|&index| RULE_COLOR_SWATCHES[index])
        .find(|color| !used.iter().any(|taken| taken == color))
        .unwrap_or(RULE_COLOR_SWATCHES[NEW_RULE_COLOR_PRIORITY[0]])
}
