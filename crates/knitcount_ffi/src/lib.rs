//! Flutter-facing bindings for KnitCount core.

pub mod api;
