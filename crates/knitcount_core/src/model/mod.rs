//! Domain model for projects, counters and their repeat rules.
//!
//! # Responsibility
//! - Define canonical data structures persisted in the item list.
//! - Keep the wire shape (camelCase JSON with a `type` tag) in one place.
//!
//! # Invariants
//! - Every item is identified by a timestamp-encoded id that is never reused.
//! - Counter-to-project links are bidirectional.

pub mod counter;
pub mod item;
pub mod rule;
