//! Domain model for board containers, items and their change history.
//!
//! # Responsibility
//! - Define the records the ordering engine reads and writes.
//! - Keep soft-delete state a type-level fact (`Lifecycle`), not a NULL check.
//!
//! # Invariants
//! - Item and container identity never changes after creation.
//! - Deletion is represented by tombstones, never by row removal.

pub mod change;
pub mod container;
pub mod item;
pub mod lifecycle;
