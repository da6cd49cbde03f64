//! Repository layer over the key-value store.
//!
//! # Responsibility
//! - Define use-case oriented access to the persisted item list.
//! - Keep JSON encoding and migration gating out of services.
//!
//! # Invariants
//! - The item list is migrated before the first read through a repository.
//! - Counter/project links stay bidirectional after every write.

pub mod item_repo;
