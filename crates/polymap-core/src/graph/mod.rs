//! In-memory entity graphs and their insertion order
//!
//! References between entities are identifiers into an arena rather than
//! owned pointers, so bidirectional one-to-one links need no shared
//! ownership. The arena doubles as the identity map: each identifier is
//! materialized at most once.

pub mod arena;
pub mod order;

pub use arena::{EntityGraph, LoadedGraph};
pub use order::{insertion_order, reachable_from};
